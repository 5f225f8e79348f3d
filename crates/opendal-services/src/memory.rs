use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Result, Scheme};
use opendal_core::Builder;
use opendal_core::raw::adapters::kv;
use opendal_core::raw::{AccessorMetadata, Capability};
use parking_lot::Mutex;
use tracing::debug;

/// In-process memory service
///
/// Every accessor built owns its own map, data is gone once the last
/// clone is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryBuilder {
    root: Option<String>,
}

impl MemoryBuilder {
    pub fn root(&mut self, root: &str) -> &mut Self {
        if !root.is_empty() {
            self.root = Some(root.to_string());
        }
        self
    }
}

impl Builder for MemoryBuilder {
    const SCHEME: Scheme = Scheme::Memory;
    type Accessor = MemoryBackend;

    fn from_map(map: HashMap<String, String>) -> Self {
        let mut builder = MemoryBuilder::default();
        if let Some(v) = map.get("root") {
            builder.root(v);
        }
        builder
    }

    fn build(&mut self) -> Result<Self::Accessor> {
        let root = self.root.take().unwrap_or_else(|| "/".to_string());
        debug!(root = %root, "building memory backend");

        let adapter = Adapter {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
        };
        Ok(MemoryBackend::new(adapter).with_root(&root))
    }
}

pub type MemoryBackend = kv::Backend<Adapter>;

#[derive(Debug, Clone)]
pub struct Adapter {
    inner: Arc<Mutex<BTreeMap<String, Bytes>>>,
}

#[async_trait]
impl kv::Adapter for Adapter {
    fn metadata(&self) -> AccessorMetadata {
        let mut am = AccessorMetadata::new(Scheme::Memory);
        am.set_name(&format!("{:p}", Arc::as_ptr(&self.inner)))
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
        let map = self.inner.lock();
        Ok(map
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use opendal_core::{ErrorKind, Operator};

    use super::*;

    #[tokio::test]
    async fn test_memory_operator() {
        let op = Operator::create(MemoryBuilder::default()).unwrap().finish();
        assert_eq!(op.metadata().scheme(), Scheme::Memory);
        assert!(op.metadata().can_blocking());

        op.object("dir/a").write("1").await.unwrap();
        op.object("dir/b/c").write("2").await.unwrap();
        op.object("dirx").write("3").await.unwrap();

        let names: Vec<String> = op
            .object("dir/")
            .list()
            .await
            .unwrap()
            .map_ok(|o| o.name().to_string())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(names, vec!["a", "b/"]);

        let err = op.object("nothing").read().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
    }

    #[test]
    fn test_from_map_root() {
        let map = HashMap::from([("root".to_string(), "/mem/root".to_string())]);
        let op = Operator::from_map::<MemoryBuilder>(map).unwrap().finish();
        assert_eq!(op.metadata().root(), "/mem/root/");

        op.object("x").blocking_write("y").unwrap();
        assert_eq!(op.object("x").blocking_read().unwrap(), b"y");
    }
}
