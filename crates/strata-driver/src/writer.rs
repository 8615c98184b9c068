//! Write session: turns an append-only byte stream into immutable shard
//! objects plus a commit-visible pointer object.
//!
//! Bytes accumulate in a staging buffer; each time it fills, its contents
//! are flushed as the next shard `<path>/<index>`. Nothing is visible at
//! `<path>` until [`ObjectWriter::commit`] writes the zero-length pointer
//! object whose headers list the shard names in order -- the single
//! visibility-publishing operation in the system.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use strata_store::{Bucket, Headers, ObjectInfo, ObjectMeta};

use crate::error::{DriverError, DriverResult};
use crate::paths::shard_name;

/// Header key under which a pointer object enumerates its shard names.
/// The ordered value list is the sole source of truth for multipart
/// reconstruction.
pub const MULTIPART_HEADER: &str = "Strata-Multipart";

/// Default staging-buffer capacity: 32 MiB per shard.
pub const DEFAULT_STAGING_CAPACITY: usize = 32 * 1024 * 1024;

/// Lifecycle state of a write session. Transitions are monotonic and
/// terminal: the only legal moves are `Fresh` to one of the other three.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting writes; no terminal operation performed yet.
    Fresh,
    /// Closed without publishing. Flushed shards remain on the store but
    /// the path is logically unchanged.
    Closed,
    /// Committed: the pointer object is (being) published.
    Committed,
    /// Cancelled: flushed shards are (being) deleted.
    Cancelled,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Closed => write!(f, "closed"),
            Self::Committed => write!(f, "committed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Returns `true` if `info` describes a multipart pointer object: zero
/// size with the multipart header present. This is the only multipart
/// check in the driver; link markers mean directory nodes, never
/// multipart.
pub fn is_multipart(info: &ObjectInfo) -> bool {
    info.size == 0 && info.headers.get(MULTIPART_HEADER).is_some()
}

/// Ephemeral state of one upload.
pub struct ObjectWriter {
    bucket: Arc<dyn Bucket>,
    path: String,
    buf: BytesMut,
    capacity: usize,
    frame_size: usize,
    /// Next shard index to emit.
    index: u64,
    /// Cumulative bytes flushed to shards so far.
    size: u64,
    state: SessionState,
}

impl ObjectWriter {
    /// Open a write session for `path`.
    ///
    /// With `append = false` the session starts fresh at shard 0. With
    /// `append = true` the existing object must be a multipart pointer;
    /// the session resumes from its shard list, summing shard sizes from
    /// per-shard info. Appending to an absent path fails with
    /// `PathNotFound`, to a single-part object with `NotMultipart`.
    pub(crate) async fn open(
        bucket: Arc<dyn Bucket>,
        path: &str,
        append: bool,
        capacity: usize,
        frame_size: usize,
    ) -> DriverResult<Self> {
        let mut writer = Self {
            bucket,
            path: path.to_string(),
            buf: BytesMut::with_capacity(capacity),
            capacity,
            frame_size,
            index: 0,
            size: 0,
            state: SessionState::Fresh,
        };

        if append {
            let info = writer
                .bucket
                .info(path)
                .await
                .map_err(|err| DriverError::for_path(err, path))?;
            if !is_multipart(&info) {
                return Err(DriverError::NotMultipart {
                    path: path.to_string(),
                });
            }
            for part in info.headers.values(MULTIPART_HEADER) {
                let part_info = writer.bucket.info(part).await?;
                writer.index += 1;
                writer.size += part_info.size;
            }
        }

        Ok(writer)
    }

    /// Append `data` to the session, flushing a shard every time the
    /// staging buffer reaches capacity. Returns the number of bytes
    /// accepted, which on success is all of them.
    pub async fn write(&mut self, data: &[u8]) -> DriverResult<usize> {
        self.guard("write to")?;

        let mut rest = data;
        while !rest.is_empty() {
            let room = self.capacity - self.buf.len();
            let take = room.min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buf.len() == self.capacity {
                self.flush().await?;
            }
        }

        Ok(data.len())
    }

    /// Flush any buffered bytes as a final partial shard and mark the
    /// session closed. Publishes nothing: without a commit the path stays
    /// logically absent or unchanged, and the caller still owes either a
    /// commit or a cancel for a well-defined outcome.
    pub async fn close(&mut self) -> DriverResult<()> {
        self.guard("close")?;
        self.state = SessionState::Closed;

        if !self.buf.is_empty() {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush outstanding bytes and publish the pointer object.
    ///
    /// Every committed file has at least one shard: zero-length content
    /// still produces shard 0, so a committed empty file remains
    /// distinguishable from an absent path.
    pub async fn commit(&mut self) -> DriverResult<()> {
        self.guard("commit")?;
        self.state = SessionState::Committed;

        if !self.buf.is_empty() || self.index == 0 {
            self.flush().await?;
        }

        let mut headers = Headers::new();
        for i in 0..self.index {
            headers.add(MULTIPART_HEADER, shard_name(&self.path, i));
        }
        let meta = ObjectMeta::new(&self.path).with_headers(headers);
        self.bucket.put(meta, Bytes::new()).await?;

        tracing::debug!(
            path = %self.path,
            shards = self.index,
            bytes = self.size,
            "committed multipart object"
        );
        Ok(())
    }

    /// Delete every flushed shard, best-effort, and mark the session
    /// cancelled. Deletion failures are collected and reported together;
    /// the pointer object is never created or touched, so a cancelled
    /// upload leaves no content at the path.
    pub async fn cancel(&mut self) -> DriverResult<()> {
        self.guard("cancel")?;
        self.state = SessionState::Cancelled;

        let mut failures = Vec::new();
        for i in 0..self.index {
            if let Err(err) = self.bucket.delete(&shard_name(&self.path, i)).await {
                failures.push(err);
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                path = %self.path,
                failed = failures.len(),
                "cancel left shards behind"
            );
            return Err(DriverError::CancelIncomplete {
                path: self.path.clone(),
                failures,
            });
        }
        Ok(())
    }

    /// Cumulative number of bytes flushed to the store by this session.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn guard(&self, op: &'static str) -> DriverResult<()> {
        if self.state != SessionState::Fresh {
            return Err(DriverError::InvalidState {
                state: self.state,
                op,
            });
        }
        Ok(())
    }

    /// Write the staging buffer as shard `index` and advance.
    async fn flush(&mut self) -> DriverResult<()> {
        let meta =
            ObjectMeta::new(shard_name(&self.path, self.index)).with_frame_size(self.frame_size);
        let data = Bytes::copy_from_slice(&self.buf);
        self.buf.clear();

        let info = self.bucket.put(meta, data).await?;
        self.index += 1;
        self.size += info.size;
        Ok(())
    }
}

impl std::fmt::Debug for ObjectWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectWriter")
            .field("path", &self.path)
            .field("index", &self.index)
            .field("size", &self.size)
            .field("buffered", &self.buf.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::{BucketConfig, MemoryClient, StoreClient};

    const CAPACITY: usize = 8;
    const FRAME: usize = 4;

    async fn bucket() -> Arc<dyn Bucket> {
        MemoryClient::new()
            .ensure_bucket(BucketConfig::new("writer-tests", ""))
            .await
            .unwrap()
    }

    async fn open(bucket: &Arc<dyn Bucket>, path: &str, append: bool) -> DriverResult<ObjectWriter> {
        ObjectWriter::open(Arc::clone(bucket), path, append, CAPACITY, FRAME).await
    }

    async fn shard_count(bucket: &Arc<dyn Bucket>, path: &str) -> u64 {
        let mut count = 0;
        while bucket.info(&shard_name(path, count)).await.is_ok() {
            count += 1;
        }
        count
    }

    // -----------------------------------------------------------------------
    // Commit shapes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn commit_publishes_pointer_with_ordered_shards() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/file", false).await.unwrap();
        w.write(b"0123456789abcdef0").await.unwrap(); // 17 bytes, capacity 8
        w.commit().await.unwrap();

        let pointer = bucket.info("/file").await.unwrap();
        assert!(is_multipart(&pointer));
        assert_eq!(
            pointer.headers.values(MULTIPART_HEADER),
            vec!["/file/0", "/file/1", "/file/2"]
        );
        assert_eq!(shard_count(&bucket, "/file").await, 3);
        assert_eq!(w.size(), 17);
    }

    #[tokio::test]
    async fn commit_of_empty_content_produces_shard_zero() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/empty", false).await.unwrap();
        w.commit().await.unwrap();

        let pointer = bucket.info("/empty").await.unwrap();
        assert!(is_multipart(&pointer));
        assert_eq!(pointer.headers.values(MULTIPART_HEADER), vec!["/empty/0"]);
        assert_eq!(bucket.info("/empty/0").await.unwrap().size, 0);
    }

    #[tokio::test]
    async fn shard_count_is_ceil_of_len_over_capacity() {
        for (len, expected) in [(1usize, 1u64), (7, 1), (8, 1), (9, 2), (16, 2), (17, 3)] {
            let bucket = bucket().await;
            let mut w = open(&bucket, "/f", false).await.unwrap();
            w.write(&vec![0xAA; len]).await.unwrap();
            w.commit().await.unwrap();
            assert_eq!(
                shard_count(&bucket, "/f").await,
                expected,
                "len {len} should yield {expected} shards"
            );
        }
    }

    #[tokio::test]
    async fn nothing_visible_before_commit() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/pending", false).await.unwrap();
        w.write(&[0u8; 20]).await.unwrap();

        // Shards exist, but no pointer: the path is logically absent.
        assert!(bucket.info("/pending/0").await.is_ok());
        assert!(bucket.info("/pending").await.is_err());
        drop(w);
        assert!(bucket.info("/pending").await.is_err());
    }

    #[tokio::test]
    async fn close_flushes_partial_shard_without_publishing() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/closed", false).await.unwrap();
        w.write(b"abc").await.unwrap();
        w.close().await.unwrap();

        assert_eq!(bucket.info("/closed/0").await.unwrap().size, 3);
        assert!(bucket.info("/closed").await.is_err());
        assert_eq!(w.state(), SessionState::Closed);
    }

    // -----------------------------------------------------------------------
    // Write chunking
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn write_reports_full_input_length() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/n", false).await.unwrap();
        assert_eq!(w.write(&[1u8; 30]).await.unwrap(), 30);
        assert_eq!(w.write(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn many_small_writes_fill_shards() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/drip", false).await.unwrap();
        for b in 0..20u8 {
            w.write(&[b]).await.unwrap();
        }
        w.commit().await.unwrap();

        // 20 bytes at capacity 8: shards of 8, 8, 4.
        assert_eq!(shard_count(&bucket, "/drip").await, 3);
        assert_eq!(bucket.get("/drip/0").await.unwrap().len(), 8);
        assert_eq!(bucket.get("/drip/2").await.unwrap().len(), 4);
        assert_eq!(w.size(), 20);
    }

    // -----------------------------------------------------------------------
    // Append
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn append_resumes_without_rechunking() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/log", false).await.unwrap();
        w.write(&[1u8; 11]).await.unwrap(); // shards: 8 + 3
        w.commit().await.unwrap();
        assert_eq!(shard_count(&bucket, "/log").await, 2);

        let mut w = open(&bucket, "/log", true).await.unwrap();
        assert_eq!(w.size(), 11);
        w.write(&[2u8; 9]).await.unwrap(); // shards: 8 + 1
        w.commit().await.unwrap();

        // Prior shards untouched; new segment chunked independently.
        assert_eq!(shard_count(&bucket, "/log").await, 4);
        assert_eq!(bucket.get("/log/1").await.unwrap().len(), 3);
        assert_eq!(bucket.get("/log/3").await.unwrap().len(), 1);
        assert_eq!(w.size(), 20);

        let pointer = bucket.info("/log").await.unwrap();
        assert_eq!(pointer.headers.values(MULTIPART_HEADER).len(), 4);
    }

    #[tokio::test]
    async fn append_to_absent_path_fails() {
        let bucket = bucket().await;
        let err = open(&bucket, "/nope", true).await.unwrap_err();
        assert!(matches!(err, DriverError::PathNotFound { .. }));
    }

    #[tokio::test]
    async fn append_to_single_part_object_fails() {
        let bucket = bucket().await;
        bucket
            .put(ObjectMeta::new("/plain"), Bytes::from_static(b"direct"))
            .await
            .unwrap();
        let err = open(&bucket, "/plain", true).await.unwrap_err();
        assert!(matches!(err, DriverError::NotMultipart { .. }));
    }

    // -----------------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancel_removes_all_shards() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/aborted", false).await.unwrap();
        w.write(&[3u8; 25]).await.unwrap(); // 3 full shards flushed
        w.cancel().await.unwrap();

        assert_eq!(shard_count(&bucket, "/aborted").await, 0);
        assert!(bucket.info("/aborted").await.is_err());
        let listed = bucket.list().await.unwrap();
        assert!(listed.iter().all(|o| !o.name.starts_with("/aborted")));
    }

    #[tokio::test]
    async fn cancel_with_nothing_flushed() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/quick", false).await.unwrap();
        w.write(b"tiny").await.unwrap(); // stays in staging
        w.cancel().await.unwrap();
        assert!(bucket.list().await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn terminal_states_are_exclusive_and_final() {
        let bucket = bucket().await;

        let mut w = open(&bucket, "/s1", false).await.unwrap();
        w.commit().await.unwrap();
        assert!(matches!(
            w.commit().await.unwrap_err(),
            DriverError::InvalidState { state: SessionState::Committed, .. }
        ));
        assert!(w.close().await.is_err());
        assert!(w.cancel().await.is_err());
        assert!(w.write(b"x").await.is_err());

        let mut w = open(&bucket, "/s2", false).await.unwrap();
        w.close().await.unwrap();
        assert!(w.close().await.is_err());
        assert!(w.commit().await.is_err());
        assert!(w.cancel().await.is_err());

        let mut w = open(&bucket, "/s3", false).await.unwrap();
        w.cancel().await.unwrap();
        assert!(w.cancel().await.is_err());
        assert!(w.write(b"x").await.is_err());
    }

    #[tokio::test]
    async fn failed_terminal_call_has_no_side_effect() {
        let bucket = bucket().await;
        let mut w = open(&bucket, "/side", false).await.unwrap();
        w.write(&[7u8; 10]).await.unwrap();
        w.commit().await.unwrap();
        let shards_before = shard_count(&bucket, "/side").await;

        // A cancel on a committed session must not delete anything.
        let _ = w.cancel().await.unwrap_err();
        assert_eq!(shard_count(&bucket, "/side").await, shards_before);
        assert!(bucket.info("/side").await.is_ok());
    }

    // -----------------------------------------------------------------------
    // Multipart detection
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn zero_size_without_header_is_not_multipart() {
        let bucket = bucket().await;
        bucket
            .put(ObjectMeta::new("/marker"), Bytes::new())
            .await
            .unwrap();
        let info = bucket.info("/marker").await.unwrap();
        assert!(!is_multipart(&info));
    }

    #[tokio::test]
    async fn nonzero_size_with_header_is_not_multipart() {
        let bucket = bucket().await;
        let mut headers = Headers::new();
        headers.add(MULTIPART_HEADER, "/odd/0");
        bucket
            .put(
                ObjectMeta::new("/odd").with_headers(headers),
                Bytes::from_static(b"payload"),
            )
            .await
            .unwrap();
        let info = bucket.info("/odd").await.unwrap();
        assert!(!is_multipart(&info));
    }
}
