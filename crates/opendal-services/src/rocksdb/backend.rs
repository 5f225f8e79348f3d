use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Error, ErrorKind, Result, Scheme};
use opendal_core::Builder;
use opendal_core::raw::adapters::kv;
use opendal_core::raw::{AccessorMetadata, Capability};
use rocksdb::DB;
use tracing::debug;

/// Embedded RocksDB service
///
/// The storage layout is one rocksdb key per object, the value is the
/// object content.
#[derive(Debug, Default, Clone)]
pub struct RocksdbBuilder {
    datadir: Option<String>,
    root: Option<String>,
}

impl RocksdbBuilder {
    /// Path of the rocksdb data directory, created if missing.
    pub fn datadir(&mut self, path: &str) -> &mut Self {
        if !path.is_empty() {
            self.datadir = Some(path.to_string());
        }
        self
    }

    pub fn root(&mut self, root: &str) -> &mut Self {
        if !root.is_empty() {
            self.root = Some(root.to_string());
        }
        self
    }
}

impl Builder for RocksdbBuilder {
    const SCHEME: Scheme = Scheme::Rocksdb;
    type Accessor = RocksdbBackend;

    fn from_map(map: HashMap<String, String>) -> Self {
        let mut builder = RocksdbBuilder::default();

        if let Some(v) = map.get("datadir") {
            builder.datadir(v);
        }
        if let Some(v) = map.get("root") {
            builder.root(v);
        }

        builder
    }

    fn build(&mut self) -> Result<Self::Accessor> {
        debug!(builder = ?self, "rocksdb backend build started");

        let datadir = self.datadir.take().ok_or_else(|| {
            Error::new(ErrorKind::BackendConfigInvalid, "datadir is required but not set")
                .with_context("service", Scheme::Rocksdb)
        })?;

        let db = DB::open_default(&datadir).map_err(|err| {
            Error::new(ErrorKind::BackendConfigInvalid, "open rocksdb")
                .with_context("service", Scheme::Rocksdb)
                .with_context("datadir", &datadir)
                .set_source(err)
        })?;

        let root = self.root.take().unwrap_or_else(|| "/".to_string());
        debug!(datadir = %datadir, root = %root, "rocksdb backend build finished");
        Ok(RocksdbBackend::new(Adapter { db: Arc::new(db) }).with_root(&root))
    }
}

pub type RocksdbBackend = kv::Backend<Adapter>;

#[derive(Clone)]
pub struct Adapter {
    db: Arc<DB>,
}

impl Debug for Adapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("path", &self.db.path())
            .finish()
    }
}

fn parse_rocksdb_error(err: rocksdb::Error) -> Error {
    Error::new(ErrorKind::Unexpected, "got rocksdb error").set_source(err)
}

#[async_trait]
impl kv::Adapter for Adapter {
    fn metadata(&self) -> AccessorMetadata {
        let mut am = AccessorMetadata::new(Scheme::Rocksdb);
        am.set_name(&self.db.path().to_string_lossy())
            .set_capability(Capability::read_write().with_list().with_blocking());
        am
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        self.blocking_get(path)
    }

    async fn set(&self, path: &str, value: Bytes) -> Result<()> {
        self.blocking_set(path, value)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        kv::Adapter::blocking_delete(self, path)
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        self.blocking_scan(prefix)
    }

    fn blocking_get(&self, path: &str) -> Result<Option<Bytes>> {
        let value = self.db.get(path).map_err(parse_rocksdb_error)?;
        Ok(value.map(Bytes::from))
    }

    fn blocking_set(&self, path: &str, value: Bytes) -> Result<()> {
        self.db.put(path, &value).map_err(parse_rocksdb_error)
    }

    fn blocking_delete(&self, path: &str) -> Result<()> {
        self.db.delete(path).map_err(parse_rocksdb_error)
    }

    fn blocking_scan(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, _) = item.map_err(parse_rocksdb_error)?;
            let key = String::from_utf8_lossy(&key);
            // Without a prefix extractor the iterator runs past the prefix.
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.into_owned());
        }

        Ok(keys)
    }
}
