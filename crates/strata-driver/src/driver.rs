//! Driver façade: the full registry storage contract composed from the
//! path resolver, object writer, and object reader, over a single root
//! bucket handle.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use strata_store::{Bucket, BucketConfig, ObjectMeta, StoreClient, StoreError};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::{DriverError, DriverResult};
use crate::paths::{self, shard_name};
use crate::reader::ObjectReader;
use crate::writer::{is_multipart, ObjectWriter, DEFAULT_STAGING_CAPACITY};

/// Registration name of this driver.
pub const DRIVER_NAME: &str = "strata";

/// Default identifier of the root bucket.
pub const DEFAULT_ROOT_BUCKET: &str = "strata-registry-root";

/// Default store-level streaming frame size: 1 MiB.
pub const DEFAULT_FRAME_SIZE: usize = 1024 * 1024;

/// Driver configuration.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Identifier of the root bucket holding the entire namespace.
    pub bucket: String,
    /// Staging-buffer capacity per write session; one shard is flushed
    /// each time it fills.
    pub staging_capacity: usize,
    /// Streaming frame size passed down to the store for shard transfers.
    /// A store-level tuning knob, distinct from the shard size.
    pub frame_size: usize,
    /// Cap on concurrently in-flight backend calls. A throttling knob,
    /// not a correctness mechanism.
    pub max_in_flight: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_ROOT_BUCKET.to_string(),
            staging_capacity: DEFAULT_STAGING_CAPACITY,
            frame_size: DEFAULT_FRAME_SIZE,
            max_in_flight: 1,
        }
    }
}

/// Description of a logical file or directory, as reported by
/// [`Driver::stat`].
#[derive(Clone, Debug)]
pub struct FileInfo {
    /// Virtual path.
    pub path: String,
    /// Logical size in bytes; zero for directories.
    pub size: u64,
    /// Modification time, when the backing store reports one.
    pub modified: Option<DateTime<Utc>>,
    /// Whether the path names a directory.
    pub is_dir: bool,
}

/// Storage driver implementing the registry backend contract on top of a
/// flat, bus-backed object store.
pub struct Driver {
    root: Arc<dyn Bucket>,
    limiter: Semaphore,
    config: DriverConfig,
}

impl Driver {
    /// Connect to the backing store, ensure the root bucket exists, and
    /// write the root sentinel so existence checks on `/` succeed.
    pub async fn new(client: Arc<dyn StoreClient>, config: DriverConfig) -> DriverResult<Self> {
        let root = client
            .ensure_bucket(BucketConfig::new(&config.bucket, paths::ROOT))
            .await?;
        root.put(ObjectMeta::new(paths::ROOT_SENTINEL), Bytes::new())
            .await?;

        tracing::info!(bucket = %config.bucket, "storage driver ready");
        Ok(Self {
            limiter: Semaphore::new(config.max_in_flight.max(1)),
            root,
            config,
        })
    }

    /// Registration name of the driver.
    pub fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    /// Retrieve the full content stored at `path`. Primarily for small
    /// objects; use [`Driver::reader`] for streaming.
    pub async fn get_content(&self, path: &str) -> DriverResult<Vec<u8>> {
        let _permit = self.slot().await;
        let (bucket, name) = self.find(path)?;
        let mut reader = ObjectReader::open(Arc::clone(bucket), name, 0).await?;
        reader.read_to_end().await
    }

    /// Store `content` at `path`. Nonempty content becomes one single-part
    /// object. Zero-length content is pointer-shaped, so it goes through a
    /// full multipart commit to stay distinguishable from "absent".
    pub async fn put_content(&self, path: &str, content: &[u8]) -> DriverResult<()> {
        let _permit = self.slot().await;
        let (bucket, name) = self.make(path)?;

        if content.is_empty() {
            let mut writer = self.open_writer(bucket, name, false).await?;
            writer.commit().await?;
        } else {
            let meta = ObjectMeta::new(name).with_frame_size(self.config.frame_size);
            bucket.put(meta, Bytes::copy_from_slice(content)).await?;
        }
        Ok(())
    }

    /// Open a read session at `path` starting from `offset`.
    pub async fn reader(&self, path: &str, offset: u64) -> DriverResult<ObjectReader> {
        let _permit = self.slot().await;
        let (bucket, name) = self.find(path)?;
        ObjectReader::open(Arc::clone(bucket), name, offset).await
    }

    /// Open a write session at `path`. Content becomes visible only after
    /// [`ObjectWriter::commit`].
    pub async fn writer(&self, path: &str, append: bool) -> DriverResult<ObjectWriter> {
        let _permit = self.slot().await;
        let (bucket, name) = self.make(path)?;
        self.open_writer(bucket, name, append).await
    }

    /// Describe the file or directory at `path`.
    ///
    /// The namespace root always reports as a directory, but the backend
    /// is still probed so storage health checks exercise the bus. The size
    /// of a multipart file is computed by probing shards sequentially
    /// until one is missing, not by trusting the pointer headers.
    pub async fn stat(&self, path: &str) -> DriverResult<FileInfo> {
        let _permit = self.slot().await;

        if path == paths::ROOT {
            self.root.status().await?;
            return Ok(FileInfo {
                path: path.to_string(),
                size: 0,
                modified: None,
                is_dir: true,
            });
        }

        let (bucket, name) = self.find(path)?;
        let info = bucket
            .info(name)
            .await
            .map_err(|err| DriverError::for_path(err, path))?;

        if info.is_directory_marker() {
            return Ok(FileInfo {
                path: path.to_string(),
                size: 0,
                modified: Some(info.modified),
                is_dir: true,
            });
        }

        let size = if is_multipart(&info) {
            let mut size = 0;
            let mut index = 0;
            loop {
                match bucket.info(&shard_name(name, index)).await {
                    Ok(shard) => {
                        size += shard.size;
                        index += 1;
                    }
                    Err(StoreError::NotFound(_)) => break,
                    Err(err) => return Err(err.into()),
                }
            }
            size
        } else {
            info.size
        };

        Ok(FileInfo {
            path: path.to_string(),
            size,
            modified: Some(info.modified),
            is_dir: false,
        })
    }

    /// List the direct children of `path`, as full paths, sorted. An
    /// empty or missing directory yields an empty vector, never an error.
    pub async fn list(&self, path: &str) -> DriverResult<Vec<String>> {
        let _permit = self.slot().await;
        let (bucket, name) = self.find(path)?;

        let objects = bucket.list().await?;
        let mut children: Vec<String> = objects
            .iter()
            .filter_map(|obj| paths::child_of(name, &obj.name))
            .map(str::to_string)
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    }

    /// Move the logical file at `source` to `dest` by re-uploading its
    /// content and then deleting the source. Not atomic: a failure
    /// between the two halves leaves both paths populated, and a source
    /// deletion failure is reported rather than absorbed.
    pub async fn rename(&self, source: &str, dest: &str) -> DriverResult<()> {
        let _permit = self.slot().await;

        let (src_bucket, src_name) = self.find(source)?;
        let mut reader = ObjectReader::open(Arc::clone(src_bucket), src_name, 0).await?;
        let content = reader.read_to_end().await?;

        let (dst_bucket, dst_name) = self.make(dest)?;
        let mut writer = self.open_writer(dst_bucket, dst_name, false).await?;
        writer.write(&content).await?;
        writer.commit().await?;

        self.delete_inner(source).await
    }

    /// Delete the object at `path` -- including every shard, when it is a
    /// multipart pointer. If no object exists at `path`, it is treated as
    /// a directory prefix and every object under it is deleted.
    pub async fn delete(&self, path: &str) -> DriverResult<()> {
        let _permit = self.slot().await;
        self.delete_inner(path).await
    }

    /// Retrieval URL for direct client access. This backend has none;
    /// declining tells the registry to proxy content itself.
    pub async fn redirect_url(&self, _path: &str) -> DriverResult<Option<String>> {
        Ok(None)
    }

    async fn delete_inner(&self, path: &str) -> DriverResult<()> {
        let (bucket, name) = self.find(path)?;

        match bucket.info(name).await {
            Ok(info) => {
                if is_multipart(&info) {
                    let mut index = 0;
                    loop {
                        match bucket.delete(&shard_name(name, index)).await {
                            Ok(()) => index += 1,
                            Err(StoreError::NotFound(_)) => break,
                            Err(err) => return Err(err.into()),
                        }
                    }
                    tracing::debug!(path = %path, shards = index, "deleted multipart object");
                }
                bucket.delete(&info.name).await?;
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                // No object at this name: treat the path as a directory
                // prefix.
                let prefix = format!("{name}/");
                let objects = bucket.list().await?;
                let mut removed = 0usize;
                for obj in &objects {
                    if obj.name.starts_with(&prefix) {
                        bucket.delete(&obj.name).await?;
                        removed += 1;
                    }
                }
                if removed > 0 {
                    tracing::debug!(path = %path, removed, "deleted directory subtree");
                }
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn open_writer(
        &self,
        bucket: &Arc<dyn Bucket>,
        name: &str,
        append: bool,
    ) -> DriverResult<ObjectWriter> {
        ObjectWriter::open(
            Arc::clone(bucket),
            name,
            append,
            self.config.staging_capacity,
            self.config.frame_size,
        )
        .await
    }

    /// Resolve a virtual path for reading: validate it and map it onto
    /// the root bucket. The flat layout makes this an identity mapping.
    fn find<'a>(&self, path: &'a str) -> DriverResult<(&Arc<dyn Bucket>, &'a str)> {
        if !paths::is_valid(path) {
            return Err(DriverError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok((&self.root, path))
    }

    /// Resolve a virtual path for writing, creating any namespace the
    /// path needs. Identical to [`Driver::find`] in the flat layout.
    fn make<'a>(&self, path: &'a str) -> DriverResult<(&Arc<dyn Bucket>, &'a str)> {
        self.find(path)
    }

    async fn slot(&self) -> SemaphorePermit<'_> {
        self.limiter
            .acquire()
            .await
            .expect("in-flight limiter closed")
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("bucket", &self.config.bucket)
            .field("staging_capacity", &self.config.staging_capacity)
            .field("max_in_flight", &self.config.max_in_flight)
            .finish()
    }
}
