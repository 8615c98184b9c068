//! Backing object-store abstraction for the Strata registry driver.
//!
//! The driver runs against a flat, message-bus-reachable object store: one
//! namespace ("bucket") of named blobs, each carrying a size, a multi-valued
//! header list, a modification time, and an optional link marker. This crate
//! models that store as a pair of traits so the driver never couples to a
//! concrete bus client:
//!
//! - [`Bucket`] -- operations on the objects of a single flat namespace
//! - [`StoreClient`] -- bucket lifecycle (create-or-get, delete)
//!
//! # Backends
//!
//! - [`MemoryClient`] / [`MemoryBucket`] -- `HashMap`-based backend for tests
//!   and embedding
//!
//! A production backend wraps the clustered bus client behind the same
//! traits; cluster formation and node discovery live with that backend, not
//! here.
//!
//! # Design rules
//!
//! 1. Objects are written whole; a `put` to an existing name replaces the
//!    object (last write wins per name).
//! 2. `get` is offset-unaware: it always returns the whole object. Offset
//!    semantics belong to the layer above.
//! 3. An empty namespace lists as an empty vector, never as an error.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryBucket, MemoryClient};
pub use object::{BucketConfig, BucketStatus, Headers, ObjectInfo, ObjectLink, ObjectMeta};
pub use traits::{Bucket, StoreClient};
