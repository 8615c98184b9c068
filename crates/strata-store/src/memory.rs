use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::object::{BucketConfig, BucketStatus, ObjectInfo, ObjectMeta};
use crate::traits::{Bucket, StoreClient};

/// A stored blob: its description plus the payload split into transfer
/// frames, mirroring how a bus-backed store holds chunked objects.
#[derive(Clone, Debug)]
struct StoredBlob {
    info: ObjectInfo,
    frames: Vec<Bytes>,
}

/// In-memory, `HashMap`-based bucket.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock`
/// for safe concurrent access; the lock is never held across an await.
pub struct MemoryBucket {
    name: String,
    objects: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBucket {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the bucket holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Number of transfer frames held for the named object, if present.
    pub fn frame_count(&self, name: &str) -> Option<usize> {
        self.objects
            .read()
            .expect("lock poisoned")
            .get(name)
            .map(|blob| blob.frames.len())
    }
}

impl std::fmt::Debug for MemoryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBucket")
            .field("name", &self.name)
            .field("object_count", &self.len())
            .finish()
    }
}

/// Split a payload into frames of at most `frame_size` bytes.
/// An empty payload yields no frames.
fn split_frames(data: Bytes, frame_size: Option<usize>) -> Vec<Bytes> {
    let frame_size = match frame_size {
        Some(n) if n > 0 => n,
        _ => return if data.is_empty() { Vec::new() } else { vec![data] },
    };
    let mut rest = data;
    let mut frames = Vec::new();
    while rest.len() > frame_size {
        frames.push(rest.split_to(frame_size));
    }
    if !rest.is_empty() {
        frames.push(rest);
    }
    frames
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn put(&self, meta: ObjectMeta, data: Bytes) -> StoreResult<ObjectInfo> {
        let info = ObjectInfo {
            name: meta.name.clone(),
            size: data.len() as u64,
            headers: meta.headers,
            link: meta.link,
            modified: Utc::now(),
        };
        let blob = StoredBlob {
            info: info.clone(),
            frames: split_frames(data, meta.frame_size),
        };
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(meta.name, blob);
        Ok(info)
    }

    async fn get(&self, name: &str) -> StoreResult<Bytes> {
        let map = self.objects.read().expect("lock poisoned");
        let blob = map
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        match blob.frames.len() {
            0 => Ok(Bytes::new()),
            1 => Ok(blob.frames[0].clone()),
            _ => {
                let mut out = BytesMut::with_capacity(blob.info.size as usize);
                for frame in &blob.frames {
                    out.extend_from_slice(frame);
                }
                Ok(out.freeze())
            }
        }
    }

    async fn info(&self, name: &str) -> StoreResult<ObjectInfo> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(name)
            .map(|blob| blob.info.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        map.remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn list(&self) -> StoreResult<Vec<ObjectInfo>> {
        let map = self.objects.read().expect("lock poisoned");
        let mut infos: Vec<ObjectInfo> = map.values().map(|blob| blob.info.clone()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn status(&self) -> StoreResult<BucketStatus> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(BucketStatus {
            bucket: self.name.clone(),
            objects: map.len(),
            bytes: map.values().map(|blob| blob.info.size).sum(),
        })
    }
}

/// In-memory store client managing a set of [`MemoryBucket`]s.
#[derive(Default)]
pub struct MemoryClient {
    buckets: RwLock<HashMap<String, Arc<MemoryBucket>>>,
}

impl MemoryClient {
    /// Create a client with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets currently present.
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().expect("lock poisoned").len()
    }
}

impl std::fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryClient")
            .field("bucket_count", &self.bucket_count())
            .finish()
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    async fn ensure_bucket(&self, config: BucketConfig) -> StoreResult<Arc<dyn Bucket>> {
        let mut map = self.buckets.write().expect("lock poisoned");
        let bucket = map
            .entry(config.bucket.clone())
            .or_insert_with(|| Arc::new(MemoryBucket::new(config.bucket)))
            .clone();
        Ok(bucket)
    }

    async fn delete_bucket(&self, bucket: &str) -> StoreResult<()> {
        let mut map = self.buckets.write().expect("lock poisoned");
        map.remove(bucket)
            .map(|_| ())
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))
    }
}
