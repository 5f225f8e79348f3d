use std::collections::HashMap;
use std::sync::Arc;

use opendal_common::{ErrorKind, Result, Scheme};

use crate::builder::Builder;
use crate::layers::{ErrorContextLayer, Layer};
use crate::metadata::{AccessorMetadata, Capability};
use crate::object::Object;
use crate::raw::{Accessor, FusedAccessor};

/// Entry point for every storage operation
///
/// ```ignore
/// let op = Operator::from_env::<Redis>()?.finish();
/// let o = op.object("path/to/file");
/// o.write("hello").await?;
/// ```
#[derive(Clone, Debug)]
pub struct Operator {
    accessor: FusedAccessor,
}

impl Operator {
    /// Start from an already built accessor.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(accessor: impl Accessor) -> OperatorBuilder {
        OperatorBuilder::new(accessor)
    }

    pub fn create<B: Builder>(mut builder: B) -> Result<OperatorBuilder> {
        let acc = builder.build()?;
        Ok(OperatorBuilder::new(acc))
    }

    /// Build from `OPENDAL_<SCHEME>_*` environment variables.
    pub fn from_env<B: Builder>() -> Result<OperatorBuilder> {
        Self::create(B::from_env())
    }

    pub fn from_map<B: Builder>(map: HashMap<String, String>) -> Result<OperatorBuilder> {
        Self::create(B::from_map(map))
    }

    /// Wrap the current accessor with one more layer.
    #[must_use]
    pub fn layer(self, layer: impl Layer) -> Self {
        Self {
            accessor: layer.layer(self.accessor),
        }
    }

    pub fn inner(&self) -> FusedAccessor {
        self.accessor.clone()
    }

    pub fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata(self.accessor.metadata())
    }

    pub fn object(&self, path: &str) -> Object {
        Object::new(self.accessor.clone(), path)
    }

    /// Check the service is reachable by stating the root.
    ///
    /// A root that does not exist yet is fine.
    pub async fn check(&self) -> Result<()> {
        match self.object("/").metadata().await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Collects layers before the [`Operator`] is finished
#[derive(Debug)]
pub struct OperatorBuilder {
    accessor: FusedAccessor,
}

impl OperatorBuilder {
    pub fn new(accessor: impl Accessor) -> Self {
        Self {
            accessor: Arc::new(accessor),
        }
    }

    /// Use an accessor that is already shared.
    pub fn from_fused(accessor: FusedAccessor) -> Self {
        Self { accessor }
    }

    #[must_use]
    pub fn layer(self, layer: impl Layer) -> Self {
        Self {
            accessor: layer.layer(self.accessor),
        }
    }

    pub fn finish(self) -> Operator {
        Operator {
            accessor: ErrorContextLayer.layer(self.accessor),
        }
    }
}

/// Read-only view of the accessor metadata
#[derive(Debug, Clone)]
pub struct OperatorMetadata(AccessorMetadata);

impl OperatorMetadata {
    pub fn scheme(&self) -> Scheme {
        self.0.scheme()
    }

    pub fn root(&self) -> &str {
        self.0.root()
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn capability(&self) -> Capability {
        self.0.capability()
    }

    pub fn can_read(&self) -> bool {
        self.0.capability().read
    }

    pub fn can_write(&self) -> bool {
        self.0.capability().write
    }

    pub fn can_list(&self) -> bool {
        self.0.capability().list
    }

    pub fn can_blocking(&self) -> bool {
        self.0.capability().blocking
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::layers::{ConcurrentLimitLayer, LoggingLayer, RetryLayer};
    use crate::raw::adapters::kv;
    use crate::test_util::{MapAdapter, map_backend};

    #[derive(Default)]
    struct MapBuilder {
        root: Option<String>,
    }

    impl Builder for MapBuilder {
        const SCHEME: Scheme = Scheme::Memory;
        type Accessor = kv::Backend<MapAdapter>;

        fn from_map(map: HashMap<String, String>) -> Self {
            Self {
                root: map.get("root").cloned(),
            }
        }

        fn build(&mut self) -> Result<Self::Accessor> {
            let backend = map_backend();
            Ok(match self.root.take() {
                Some(root) => backend.with_root(&root),
                None => backend,
            })
        }
    }

    #[tokio::test]
    async fn test_operator_from_map() {
        let map = HashMap::from([("root".to_string(), "/tmp/op".to_string())]);
        let op = Operator::from_map::<MapBuilder>(map)
            .unwrap()
            .layer(RetryLayer::new().with_min_delay(Duration::from_millis(1)))
            .layer(ConcurrentLimitLayer::new(8))
            .finish()
            .layer(LoggingLayer);

        let meta = op.metadata();
        assert_eq!(meta.scheme(), Scheme::Memory);
        assert_eq!(meta.root(), "/tmp/op/");
        assert_eq!(meta.name(), "test");
        assert!(meta.can_read() && meta.can_write() && meta.can_list());

        op.check().await.unwrap();

        op.object("a").write("abc").await.unwrap();
        assert_eq!(op.object("a").read().await.unwrap(), b"abc");
        assert_eq!(op.object("a").id(), "/tmp/op/a");
    }

    #[tokio::test]
    async fn test_finish_adds_error_context() {
        let op = Operator::new(map_backend()).finish();

        let err = op.object("missing").metadata().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
        assert_eq!(err.operation(), "stat");
        assert_eq!(err.context("path"), Some("missing"));
    }
}
