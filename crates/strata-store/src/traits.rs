use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;
use crate::object::{BucketConfig, BucketStatus, ObjectInfo, ObjectMeta};

/// One flat namespace of named blobs.
///
/// All implementations must satisfy these invariants:
/// - `put` stores the object whole and atomically; a put to an existing
///   name replaces the previous object (last write wins per name).
/// - `get` is offset-unaware and returns the complete payload.
/// - `delete` of a missing name fails with `NotFound`; callers use that
///   sentinel to detect the end of a shard sequence.
/// - `list` of an empty namespace returns an empty vector, not an error.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Store `data` under `meta.name`, replacing any existing object.
    async fn put(&self, meta: ObjectMeta, data: Bytes) -> StoreResult<ObjectInfo>;

    /// Fetch the complete payload of the named object.
    async fn get(&self, name: &str) -> StoreResult<Bytes>;

    /// Fetch the stored description of the named object.
    async fn info(&self, name: &str) -> StoreResult<ObjectInfo>;

    /// Remove the named object. `NotFound` if it does not exist.
    async fn delete(&self, name: &str) -> StoreResult<()>;

    /// Describe every object in the bucket. Empty namespaces yield an
    /// empty vector.
    async fn list(&self) -> StoreResult<Vec<ObjectInfo>>;

    /// Probe the bucket itself. Used by health checks.
    async fn status(&self) -> StoreResult<BucketStatus>;
}

/// Bucket lifecycle operations on the backing store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Create the bucket if absent, then return a handle to it.
    /// Idempotent: repeated calls with the same identifier return handles
    /// onto the same namespace.
    async fn ensure_bucket(&self, config: BucketConfig) -> StoreResult<Arc<dyn Bucket>>;

    /// Remove a bucket and everything in it. `BucketNotFound` if absent.
    async fn delete_bucket(&self, bucket: &str) -> StoreResult<()>;
}
