use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Error, ErrorKind, Operation, Result};

use crate::metadata::AccessorMetadata;
use crate::raw::{
    BlockingObjectPager, ObjectPager, OpCreate, OpDelete, OpList, OpRead, OpStat, OpWrite,
    RpCreate, RpDelete, RpList, RpRead, RpStat, RpWrite,
};

/// Reader returned by [`Accessor::read`]
pub type Reader = Box<dyn tokio::io::AsyncRead + Unpin + Send>;

/// Reader returned by [`Accessor::blocking_read`]
pub type BlockingReader = Box<dyn std::io::Read + Send>;

/// Raw API every storage service implements
///
/// Paths passed in are already normalized and relative to the accessor
/// root. Every operation defaults to [`ErrorKind::Unsupported`] so services
/// only implement what they can do.
#[async_trait]
pub trait Accessor: Send + Sync + Debug + 'static {
    fn metadata(&self) -> AccessorMetadata;

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::Create))
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::Read))
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let (_, _, _) = (path, args, bs);
        Err(unsupported(self, Operation::Write))
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::Stat))
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::Delete))
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::List))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::BlockingCreate))
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::BlockingRead))
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let (_, _, _) = (path, args, bs);
        Err(unsupported(self, Operation::BlockingWrite))
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::BlockingStat))
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::BlockingDelete))
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let (_, _) = (path, args);
        Err(unsupported(self, Operation::BlockingList))
    }
}

/// Accessors are shared behind `Arc` by operators and layers.
pub type FusedAccessor = Arc<dyn Accessor>;

fn unsupported<A: Accessor + ?Sized>(acc: &A, op: Operation) -> Error {
    Error::new(ErrorKind::Unsupported, "operation is not supported")
        .with_operation(op)
        .with_context("service", acc.metadata().scheme())
}

/// Forward every call to the inner accessor.
///
/// Layers only override what they change.
#[async_trait]
impl Accessor for FusedAccessor {
    fn metadata(&self) -> AccessorMetadata {
        self.as_ref().metadata()
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.as_ref().create(path, args).await
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        self.as_ref().read(path, args).await
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.as_ref().write(path, args, bs).await
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.as_ref().stat(path, args).await
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.as_ref().delete(path, args).await
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        self.as_ref().list(path, args).await
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.as_ref().blocking_create(path, args)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        self.as_ref().blocking_read(path, args)
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.as_ref().blocking_write(path, args, bs)
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.as_ref().blocking_stat(path, args)
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.as_ref().blocking_delete(path, args)
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        self.as_ref().blocking_list(path, args)
    }
}

#[cfg(test)]
mod tests {
    use opendal_common::Scheme;

    use super::*;
    use crate::metadata::Capability;

    #[derive(Debug)]
    struct Nothing;

    impl Accessor for Nothing {
        fn metadata(&self) -> AccessorMetadata {
            let mut am = AccessorMetadata::new(Scheme::Memory);
            am.set_capability(Capability::default());
            am
        }
    }

    #[tokio::test]
    async fn test_default_operations_are_unsupported() {
        let acc: FusedAccessor = Arc::new(Nothing);

        let err = acc.stat("abc", OpStat).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.operation(), "stat");
        assert_eq!(err.context("service"), Some("memory"));

        let err = acc.blocking_delete("abc", OpDelete).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.operation(), "blocking_delete");
    }
}
