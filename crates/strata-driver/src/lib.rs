//! Registry storage driver over a flat, bus-backed object store.
//!
//! A container-image registry expects an arbitrarily large, appendable,
//! hierarchical byte-addressable filesystem. The backing store offers the
//! opposite: one flat namespace of size-bounded, immutable named blobs.
//! This crate bridges the two models:
//!
//! ```text
//! registry storage contract
//!   GetContent / PutContent / Reader / Writer
//!   Stat / List / Move / Delete / Walk
//!            |
//!            v
//!    +---------------+      resolves paths onto the
//!    | Driver facade | ---> single root bucket
//!    +---------------+
//!      |           |
//!      v           v
//! ObjectWriter  ObjectReader
//!   shards an     reconstructs a logical
//!   upload into   byte stream by walking
//!   immutable     a pointer's shard list
//!   blobs
//! ```
//!
//! # Object mapping
//!
//! A logical file at `<path>` is either a single blob named `<path>`, or a
//! zero-length *pointer object* of that name whose headers enumerate shard
//! blobs `<path>/0 .. <path>/N-1`. The pointer is written only on commit,
//! so readers and listers never observe a file mid-upload. See
//! [`ObjectWriter`] for the upload lifecycle and [`ObjectReader`] for
//! reconstruction.
//!
//! # Concurrency
//!
//! Every operation is an `async fn`; dropping the future aborts the
//! in-flight store call (it does not roll back shards already flushed --
//! that is what [`ObjectWriter::cancel`] is for). A write session belongs
//! exclusively to the upload that created it. Cross-path coordination is
//! the caller's concern.

pub mod driver;
pub mod error;
pub mod paths;
pub mod reader;
pub mod walk;
pub mod writer;

// Re-export primary types at crate root for ergonomic imports.
pub use driver::{Driver, DriverConfig, FileInfo, DRIVER_NAME};
pub use error::{DriverError, DriverResult};
pub use reader::ObjectReader;
pub use walk::WalkDecision;
pub use writer::{ObjectWriter, SessionState, MULTIPART_HEADER};
