use chrono::{DateTime, Utc};

/// Ordered, multi-valued header list attached to an object.
///
/// Insertion order is preserved and observable through [`Headers::values`];
/// the driver's multipart pointers rely on it to keep shard names ordered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`, keeping any existing values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// First value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values under `key`, in insertion order.
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Total number of entries across all keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Link marker on an object: designates a namespace node or an alias
/// rather than object content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectLink {
    /// Target object name; empty for a directory marker.
    pub name: String,
    /// Target bucket.
    pub bucket: String,
}

impl ObjectLink {
    /// Marker for a directory / namespace node backed by `bucket`.
    pub fn directory(bucket: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            bucket: bucket.into(),
        }
    }

    /// Alias pointing at `name` inside `bucket`.
    pub fn object(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket: bucket.into(),
        }
    }
}

/// Write-side description of an object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object name within the bucket.
    pub name: String,
    /// Header list stored verbatim with the object.
    pub headers: Headers,
    /// Optional link marker.
    pub link: Option<ObjectLink>,
    /// Store-level streaming frame size hint, in bytes. Distinct from any
    /// chunking the layer above performs.
    pub frame_size: Option<usize>,
}

impl ObjectMeta {
    /// Metadata for a plain object named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Headers::new(),
            link: None,
            frame_size: None,
        }
    }

    /// Attach a header list.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a link marker.
    pub fn with_link(mut self, link: ObjectLink) -> Self {
        self.link = Some(link);
        self
    }

    /// Set the streaming frame size hint.
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = Some(frame_size);
        self
    }
}

/// Read-side description of a stored object.
#[derive(Clone, Debug)]
pub struct ObjectInfo {
    /// Object name within the bucket.
    pub name: String,
    /// Payload size in bytes.
    pub size: u64,
    /// Header list as stored.
    pub headers: Headers,
    /// Link marker as stored.
    pub link: Option<ObjectLink>,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl ObjectInfo {
    /// Returns `true` if this object marks a directory / namespace node:
    /// a link with an empty target name and a nonempty target bucket.
    pub fn is_directory_marker(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|l| l.name.is_empty() && !l.bucket.is_empty())
    }

    /// Returns `true` if this object is an alias for another object.
    pub fn is_object_link(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|l| !l.name.is_empty() && !l.bucket.is_empty())
    }
}

/// Configuration for creating or looking up a bucket.
#[derive(Clone, Debug)]
pub struct BucketConfig {
    /// Bucket identifier.
    pub bucket: String,
    /// Human-readable description.
    pub description: String,
}

impl BucketConfig {
    /// Configuration for `bucket` with the given description.
    pub fn new(bucket: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            description: description.into(),
        }
    }
}

/// Point-in-time status of a bucket.
#[derive(Clone, Debug)]
pub struct BucketStatus {
    /// Bucket identifier.
    pub bucket: String,
    /// Number of objects currently stored.
    pub objects: usize,
    /// Total payload bytes across all objects.
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_preserve_insertion_order() {
        let mut headers = Headers::new();
        headers.add("part", "/a/0");
        headers.add("part", "/a/1");
        headers.add("other", "x");
        headers.add("part", "/a/2");

        assert_eq!(headers.values("part"), vec!["/a/0", "/a/1", "/a/2"]);
        assert_eq!(headers.get("part"), Some("/a/0"));
        assert_eq!(headers.get("other"), Some("x"));
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn headers_missing_key() {
        let headers = Headers::new();
        assert!(headers.is_empty());
        assert_eq!(headers.get("absent"), None);
        assert!(headers.values("absent").is_empty());
    }

    #[test]
    fn directory_marker_shape() {
        let info = ObjectInfo {
            name: "dir".into(),
            size: 0,
            headers: Headers::new(),
            link: Some(ObjectLink::directory("sub-bucket")),
            modified: Utc::now(),
        };
        assert!(info.is_directory_marker());
        assert!(!info.is_object_link());
    }

    #[test]
    fn object_link_shape() {
        let info = ObjectInfo {
            name: "alias".into(),
            size: 0,
            headers: Headers::new(),
            link: Some(ObjectLink::object("bucket", "target")),
            modified: Utc::now(),
        };
        assert!(!info.is_directory_marker());
        assert!(info.is_object_link());
    }

    #[test]
    fn plain_object_is_neither() {
        let info = ObjectInfo {
            name: "plain".into(),
            size: 3,
            headers: Headers::new(),
            link: None,
            modified: Utc::now(),
        };
        assert!(!info.is_directory_marker());
        assert!(!info.is_object_link());
    }

    #[test]
    fn meta_builders() {
        let mut headers = Headers::new();
        headers.add("k", "v");
        let meta = ObjectMeta::new("obj")
            .with_headers(headers)
            .with_frame_size(4096);
        assert_eq!(meta.name, "obj");
        assert_eq!(meta.headers.get("k"), Some("v"));
        assert_eq!(meta.frame_size, Some(4096));
        assert!(meta.link.is_none());
    }
}
