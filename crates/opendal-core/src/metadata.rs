//! Metadata types describing objects and accessors

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use opendal_common::Scheme;

/// Mode of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectMode {
    /// A regular file holding bytes
    FILE,
    /// A directory that can be listed
    DIR,
    /// The service did not tell
    #[default]
    Unknown,
}

impl ObjectMode {
    pub fn is_file(self) -> bool {
        self == ObjectMode::FILE
    }

    pub fn is_dir(self) -> bool {
        self == ObjectMode::DIR
    }
}

impl Display for ObjectMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectMode::FILE => write!(f, "file"),
            ObjectMode::DIR => write!(f, "dir"),
            ObjectMode::Unknown => write!(f, "unknown"),
        }
    }
}

/// Metadata of an object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    mode: ObjectMode,
    /// Whether every field the service can provide is filled.
    complete: bool,

    content_length: Option<u64>,
    content_md5: Option<String>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

impl ObjectMetadata {
    pub fn new(mode: ObjectMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> ObjectMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ObjectMode) -> &mut Self {
        self.mode = mode;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn with_complete(mut self) -> Self {
        self.complete = true;
        self
    }

    /// Content length in bytes, `0` when unknown.
    pub fn content_length(&self) -> u64 {
        self.content_length.unwrap_or_default()
    }

    pub fn set_content_length(&mut self, v: u64) -> &mut Self {
        self.content_length = Some(v);
        self
    }

    pub fn with_content_length(mut self, v: u64) -> Self {
        self.content_length = Some(v);
        self
    }

    pub fn content_md5(&self) -> Option<&str> {
        self.content_md5.as_deref()
    }

    pub fn with_content_md5(mut self, v: &str) -> Self {
        self.content_md5 = Some(v.to_string());
        self
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn with_etag(mut self, v: &str) -> Self {
        self.etag = Some(v.to_string());
        self
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn set_last_modified(&mut self, v: DateTime<Utc>) -> &mut Self {
        self.last_modified = Some(v);
        self
    }

    pub fn with_last_modified(mut self, v: DateTime<Utc>) -> Self {
        self.last_modified = Some(v);
        self
    }
}

/// An entry returned while listing, path is relative to the accessor root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    path: String,
    meta: ObjectMetadata,
}

impl ObjectEntry {
    pub fn new(path: &str, meta: ObjectMetadata) -> Self {
        debug_assert!(
            meta.mode().is_dir() == path.ends_with('/'),
            "mode and path of {path} must agree"
        );

        Self {
            path: path.to_string(),
            meta,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> ObjectMode {
        self.meta.mode()
    }

    pub fn metadata(&self) -> &ObjectMetadata {
        &self.meta
    }

    pub fn into_parts(self) -> (String, ObjectMetadata) {
        (self.path, self.meta)
    }
}

/// What an accessor can do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capability {
    pub read: bool,
    pub write: bool,
    pub list: bool,
    pub blocking: bool,
}

impl Capability {
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    pub fn with_list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn with_blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

/// Metadata of an accessor
#[derive(Debug, Clone)]
pub struct AccessorMetadata {
    scheme: Scheme,
    root: String,
    name: String,
    capability: Capability,
}

impl AccessorMetadata {
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            root: "/".to_string(),
            name: String::new(),
            capability: Capability::default(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn set_root(&mut self, root: &str) -> &mut Self {
        self.root = root.to_string();
        self
    }

    /// Name of the backend, e.g. the redis endpoint or the rocksdb datadir.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn set_capability(&mut self, capability: Capability) -> &mut Self {
        self.capability = capability;
        self
    }
}
