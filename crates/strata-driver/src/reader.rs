//! Read session: reconstructs a logical byte stream from a pointer
//! object's shard list, or directly from a single-part object.
//!
//! The session is seeded from a caller-supplied logical offset by skipping
//! whole shards -- via `info` only, without transferring their bytes --
//! until the offset falls inside one. Shard payloads are fetched lazily as
//! reads consume them.

use std::sync::Arc;

use bytes::{Buf, Bytes};
use strata_store::{Bucket, StoreError};

use crate::error::{DriverError, DriverResult};
use crate::writer::{is_multipart, MULTIPART_HEADER};

/// Ephemeral state of one download.
pub struct ObjectReader {
    bucket: Arc<dyn Bucket>,
    /// Ordered shard names still to be transferred (a single-part object
    /// is its own one-element list).
    shards: Vec<String>,
    /// Index of the next shard to fetch.
    next: usize,
    /// Bytes to discard from the front of the next fetched shard.
    skip: u64,
    /// Unconsumed remainder of the current shard.
    current: Bytes,
}

impl ObjectReader {
    /// Open a read session for `path` starting at logical `offset`.
    /// Fails with `PathNotFound` if no object exists at the path.
    pub(crate) async fn open(
        bucket: Arc<dyn Bucket>,
        path: &str,
        offset: u64,
    ) -> DriverResult<Self> {
        let info = bucket
            .info(path)
            .await
            .map_err(|err| DriverError::for_path(err, path))?;

        let shards: Vec<String> = if is_multipart(&info) {
            info.headers
                .values(MULTIPART_HEADER)
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            vec![info.name.clone()]
        };

        // Skip whole shards in front of the offset; only their info is
        // fetched, never their bytes.
        let mut next = 0;
        let mut skip = offset;
        while next < shards.len() {
            let shard = bucket.info(&shards[next]).await?;
            if skip < shard.size {
                break;
            }
            skip -= shard.size;
            next += 1;
        }

        Ok(Self {
            bucket,
            shards,
            next,
            skip,
            current: Bytes::new(),
        })
    }

    /// Fill `buf` with the next bytes of the logical stream, advancing to
    /// the following shard transparently when the current one is
    /// exhausted. Returns the number of bytes copied; `0` means end of
    /// stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> DriverResult<usize> {
        if buf.is_empty() || !self.fill().await? {
            return Ok(0);
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }

    /// Drain the remainder of the stream into a vector.
    pub async fn read_to_end(&mut self) -> DriverResult<Vec<u8>> {
        let mut out = Vec::new();
        while self.fill().await? {
            let chunk = std::mem::take(&mut self.current);
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Release any buffered shard bytes. Safe to call multiple times;
    /// subsequent reads report end of stream.
    pub fn close(&mut self) {
        self.current = Bytes::new();
        self.next = self.shards.len();
    }

    /// Ensure `current` holds unconsumed bytes, fetching shards as
    /// needed. Returns `false` once every shard is exhausted.
    async fn fill(&mut self) -> DriverResult<bool> {
        while self.current.is_empty() {
            if self.next >= self.shards.len() {
                return Ok(false);
            }
            let name = self.shards[self.next].clone();
            self.next += 1;

            let mut data = match self.bucket.get(&name).await {
                Ok(data) => data,
                Err(StoreError::NotFound(_)) => {
                    // A shard listed by the pointer has vanished.
                    return Err(DriverError::Store(StoreError::NotFound(name)));
                }
                Err(err) => return Err(err.into()),
            };
            if self.skip > 0 {
                let cut = (self.skip as usize).min(data.len());
                data.advance(cut);
                self.skip -= cut as u64;
            }
            self.current = data;
        }
        Ok(true)
    }
}

impl std::fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("shards", &self.shards.len())
            .field("next", &self.next)
            .field("buffered", &self.current.len())
            .finish()
    }
}
