use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Error, Operation, Result, Scheme};

use crate::layers::Layer;
use crate::metadata::{AccessorMetadata, ObjectEntry};
use crate::raw::*;

/// Attach operation, service and path to every error.
///
/// Applied by [`crate::OperatorBuilder::finish`] on top of all other layers.
pub(crate) struct ErrorContextLayer;

impl Layer for ErrorContextLayer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor {
        let scheme = inner.metadata().scheme();
        Arc::new(ErrorContextAccessor { scheme, inner })
    }
}

#[derive(Debug)]
struct ErrorContextAccessor {
    scheme: Scheme,
    inner: FusedAccessor,
}

impl ErrorContextAccessor {
    fn wrap(&self, op: Operation, path: &str) -> impl FnOnce(Error) -> Error {
        let scheme = self.scheme;
        let path = path.to_string();
        move |err| {
            err.with_operation(op)
                .with_context("service", scheme)
                .with_context("path", path)
        }
    }
}

#[async_trait]
impl Accessor for ErrorContextAccessor {
    fn metadata(&self) -> AccessorMetadata {
        self.inner.metadata()
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.inner
            .create(path, args)
            .await
            .map_err(self.wrap(Operation::Create, path))
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        self.inner.read(path, args).await.map_err(|err| {
            self.wrap(Operation::Read, path)(err).with_context("range", args.range())
        })
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.inner
            .write(path, args, bs)
            .await
            .map_err(self.wrap(Operation::Write, path))
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.inner
            .stat(path, args)
            .await
            .map_err(self.wrap(Operation::Stat, path))
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.inner
            .delete(path, args)
            .await
            .map_err(self.wrap(Operation::Delete, path))
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        let (rp, pager) = self
            .inner
            .list(path, args)
            .await
            .map_err(self.wrap(Operation::List, path))?;

        let pager = ErrorContextPager {
            scheme: self.scheme,
            path: path.to_string(),
            inner: pager,
        };
        Ok((rp, Box::new(pager)))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.inner
            .blocking_create(path, args)
            .map_err(self.wrap(Operation::BlockingCreate, path))
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        self.inner.blocking_read(path, args).map_err(|err| {
            self.wrap(Operation::BlockingRead, path)(err).with_context("range", args.range())
        })
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.inner
            .blocking_write(path, args, bs)
            .map_err(self.wrap(Operation::BlockingWrite, path))
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.inner
            .blocking_stat(path, args)
            .map_err(self.wrap(Operation::BlockingStat, path))
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.inner
            .blocking_delete(path, args)
            .map_err(self.wrap(Operation::BlockingDelete, path))
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let (rp, pager) = self
            .inner
            .blocking_list(path, args)
            .map_err(self.wrap(Operation::BlockingList, path))?;

        let pager = ErrorContextPager {
            scheme: self.scheme,
            path: path.to_string(),
            inner: pager,
        };
        Ok((rp, Box::new(pager)))
    }
}

struct ErrorContextPager<P> {
    scheme: Scheme,
    path: String,
    inner: P,
}

#[async_trait]
impl ObjectPage for ErrorContextPager<ObjectPager> {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        self.inner.next_page().await.map_err(|err| {
            err.with_operation("ObjectPager::next_page")
                .with_context("service", self.scheme)
                .with_context("path", &self.path)
        })
    }
}

impl BlockingObjectPage for ErrorContextPager<BlockingObjectPager> {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        self.inner.next_page().map_err(|err| {
            err.with_operation("BlockingObjectPager::next_page")
                .with_context("service", self.scheme)
                .with_context("path", &self.path)
        })
    }
}

#[cfg(test)]
mod tests {
    use opendal_common::ErrorKind;

    use super::*;
    use crate::test_util::map_backend;

    #[tokio::test]
    async fn test_error_carries_context() {
        let acc = ErrorContextLayer.layer(Arc::new(map_backend()));

        let err = acc.stat("not_exist", OpStat).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
        assert_eq!(err.operation(), "stat");
        assert_eq!(err.context("service"), Some("memory"));
        assert_eq!(err.context("path"), Some("not_exist"));

        let err = acc
            .blocking_read("not_exist", OpRead::new().with_range((1..3).into()))
            .err()
            .unwrap();
        assert_eq!(err.operation(), "blocking_read");
        assert_eq!(err.context("range"), Some("1-2"));
    }
}
