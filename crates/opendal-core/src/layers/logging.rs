use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Error, ErrorKind, Operation, Result, Scheme};
use tracing::{debug, warn};

use crate::layers::Layer;
use crate::metadata::{AccessorMetadata, ObjectEntry};
use crate::raw::*;

const LOGGING_TARGET: &str = "opendal::services";

/// Log every operation with `tracing`
///
/// - Starts and successes are `debug`.
/// - Expected failures (`ObjectNotFound`, `Unsupported`) are `debug` too.
/// - Everything else is `warn`.
///
/// All events use the target `opendal::services`, so
/// `RUST_LOG=opendal::services=debug` shows them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl Layer for LoggingLayer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor {
        let scheme = inner.metadata().scheme();
        Arc::new(LoggingAccessor { scheme, inner })
    }
}

#[derive(Debug)]
struct LoggingAccessor {
    scheme: Scheme,
    inner: FusedAccessor,
}

impl LoggingAccessor {
    fn start(&self, op: Operation, path: &str) {
        debug!(
            target: LOGGING_TARGET,
            service = %self.scheme,
            operation = %op,
            path,
            "started"
        );
    }

    fn finish<T>(&self, op: Operation, path: &str, res: Result<T>) -> Result<T> {
        match &res {
            Ok(_) => debug!(
                target: LOGGING_TARGET,
                service = %self.scheme,
                operation = %op,
                path,
                "finished"
            ),
            Err(err) => self.failed(op, path, err),
        }
        res
    }

    fn failed(&self, op: Operation, path: &str, err: &Error) {
        if matches!(
            err.kind(),
            ErrorKind::ObjectNotFound | ErrorKind::Unsupported
        ) {
            debug!(
                target: LOGGING_TARGET,
                service = %self.scheme,
                operation = %op,
                path,
                error = %err,
                "failed"
            );
        } else {
            warn!(
                target: LOGGING_TARGET,
                service = %self.scheme,
                operation = %op,
                path,
                error = %err,
                "failed"
            );
        }
    }
}

#[async_trait]
impl Accessor for LoggingAccessor {
    fn metadata(&self) -> AccessorMetadata {
        debug!(target: LOGGING_TARGET, service = %self.scheme, operation = %Operation::Metadata, "started");
        self.inner.metadata()
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.start(Operation::Create, path);
        let res = self.inner.create(path, args).await;
        self.finish(Operation::Create, path, res)
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        debug!(
            target: LOGGING_TARGET,
            service = %self.scheme,
            operation = %Operation::Read,
            path,
            range = %args.range(),
            "started"
        );
        let res = self.inner.read(path, args).await;
        if let Ok((rp, _)) = &res {
            debug!(
                target: LOGGING_TARGET,
                service = %self.scheme,
                operation = %Operation::Read,
                path,
                size = rp.size(),
                "got reader"
            );
        }
        res.inspect_err(|err| self.failed(Operation::Read, path, err))
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        debug!(
            target: LOGGING_TARGET,
            service = %self.scheme,
            operation = %Operation::Write,
            path,
            size = args.content_length(),
            "started"
        );
        let res = self.inner.write(path, args, bs).await;
        self.finish(Operation::Write, path, res)
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.start(Operation::Stat, path);
        let res = self.inner.stat(path, args).await;
        self.finish(Operation::Stat, path, res)
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.start(Operation::Delete, path);
        let res = self.inner.delete(path, args).await;
        self.finish(Operation::Delete, path, res)
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        self.start(Operation::List, path);
        let (rp, pager) = self
            .inner
            .list(path, args)
            .await
            .inspect_err(|err| self.failed(Operation::List, path, err))?;

        let pager = LoggingPager {
            scheme: self.scheme,
            path: path.to_string(),
            listed: 0,
            inner: pager,
        };
        Ok((rp, Box::new(pager)))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.start(Operation::BlockingCreate, path);
        let res = self.inner.blocking_create(path, args);
        self.finish(Operation::BlockingCreate, path, res)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        debug!(
            target: LOGGING_TARGET,
            service = %self.scheme,
            operation = %Operation::BlockingRead,
            path,
            range = %args.range(),
            "started"
        );
        self.inner
            .blocking_read(path, args)
            .inspect_err(|err| self.failed(Operation::BlockingRead, path, err))
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.start(Operation::BlockingWrite, path);
        let res = self.inner.blocking_write(path, args, bs);
        self.finish(Operation::BlockingWrite, path, res)
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.start(Operation::BlockingStat, path);
        let res = self.inner.blocking_stat(path, args);
        self.finish(Operation::BlockingStat, path, res)
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.start(Operation::BlockingDelete, path);
        let res = self.inner.blocking_delete(path, args);
        self.finish(Operation::BlockingDelete, path, res)
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        self.start(Operation::BlockingList, path);
        let (rp, pager) = self
            .inner
            .blocking_list(path, args)
            .inspect_err(|err| self.failed(Operation::BlockingList, path, err))?;

        let pager = LoggingPager {
            scheme: self.scheme,
            path: path.to_string(),
            listed: 0,
            inner: pager,
        };
        Ok((rp, Box::new(pager)))
    }
}

struct LoggingPager<P> {
    scheme: Scheme,
    path: String,
    listed: usize,
    inner: P,
}

impl<P> LoggingPager<P> {
    fn observe(
        &mut self,
        res: Result<Option<Vec<ObjectEntry>>>,
    ) -> Result<Option<Vec<ObjectEntry>>> {
        match &res {
            Ok(Some(page)) => self.listed += page.len(),
            Ok(None) => debug!(
                target: LOGGING_TARGET,
                service = %self.scheme,
                path = %self.path,
                listed = self.listed,
                "list finished"
            ),
            Err(err) => warn!(
                target: LOGGING_TARGET,
                service = %self.scheme,
                path = %self.path,
                error = %err,
                "list failed"
            ),
        }
        res
    }
}

#[async_trait]
impl ObjectPage for LoggingPager<ObjectPager> {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        let res = self.inner.next_page().await;
        self.observe(res)
    }
}

impl BlockingObjectPage for LoggingPager<BlockingObjectPager> {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        let res = self.inner.next_page();
        self.observe(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::map_backend;

    #[tokio::test]
    async fn test_logging_is_transparent() {
        let acc = LoggingLayer.layer(Arc::new(map_backend()));

        acc.write("a/b", OpWrite::new(3), Bytes::from_static(b"abc"))
            .await
            .unwrap();
        let meta = acc.stat("a/b", OpStat).await.unwrap().into_metadata();
        assert_eq!(meta.content_length(), 3);

        let err = acc.stat("a/c", OpStat).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);

        let (_, mut pager) = acc.blocking_list("a/", OpList).unwrap();
        let page = pager.next_page().unwrap().unwrap();
        assert_eq!(page.len(), 1);
        assert!(pager.next_page().unwrap().is_none());
    }
}
