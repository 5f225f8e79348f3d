//! In-memory accessor shared by unit tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Result, Scheme};
use parking_lot::Mutex;

use crate::metadata::{AccessorMetadata, Capability};
use crate::raw::adapters::kv;

#[derive(Debug, Default)]
pub struct MapAdapter {
    pub inner: Mutex<BTreeMap<String, Bytes>>,
}

#[async_trait]
impl kv::Adapter for MapAdapter {
    fn metadata(&self) -> AccessorMetadata {
        let mut am = AccessorMetadata::new(Scheme::Memory);
        am.set_name("test")
            .set_capability(Capability::default().with_list().with_blocking());
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
        Ok(self.inner.lock().get(path).cloned())
    }

    fn blocking_set(&self, path: &str, value: Bytes) -> Result<()> {
        self.inner.lock().insert(path.to_string(), value);
        Ok(())
    }

    fn blocking_delete(&self, path: &str) -> Result<()> {
        self.inner.lock().remove(path);
        Ok(())
    }

    fn blocking_scan(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

pub fn map_backend() -> kv::Backend<MapAdapter> {
    kv::Backend::new(MapAdapter::default())
}
