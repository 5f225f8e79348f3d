use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Error, ErrorKind, Operation, Result};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::layers::Layer;
use crate::metadata::{AccessorMetadata, ObjectEntry};
use crate::raw::*;

/// Limit how many requests may be in flight against a service
///
/// Readers and pagers hold their permit until they are dropped. Blocking
/// calls never wait: without a free permit they fail with a temporary
/// [`ErrorKind::ObjectRateLimited`], which `RetryLayer` can retry.
///
/// ```ignore
/// let op = Operator::from_env::<Fs>()?
///     .layer(ConcurrentLimitLayer::new(1024))
///     .finish();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConcurrentLimitLayer {
    permits: usize,
}

impl ConcurrentLimitLayer {
    pub fn new(permits: usize) -> Self {
        Self { permits }
    }
}

impl Layer for ConcurrentLimitLayer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor {
        Arc::new(ConcurrentLimitAccessor {
            inner,
            semaphore: Arc::new(Semaphore::new(self.permits)),
        })
    }
}

#[derive(Debug)]
struct ConcurrentLimitAccessor {
    inner: FusedAccessor,
    semaphore: Arc<Semaphore>,
}

impl ConcurrentLimitAccessor {
    async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| Error::new(ErrorKind::Unexpected, "semaphore closed").set_source(err))
    }

    fn try_acquire(&self, op: Operation) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|err| match err {
                TryAcquireError::NoPermits => {
                    Error::new(ErrorKind::ObjectRateLimited, "no permits left for blocking call")
                        .with_operation(op)
                        .with_context("permits", self.semaphore.available_permits())
                        .set_temporary()
                }
                TryAcquireError::Closed => {
                    Error::new(ErrorKind::Unexpected, "semaphore closed").with_operation(op)
                }
            })
    }
}

#[async_trait]
impl Accessor for ConcurrentLimitAccessor {
    fn metadata(&self) -> AccessorMetadata {
        self.inner.metadata()
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let _permit = self.acquire().await?;
        self.inner.create(path, args).await
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let permit = self.acquire().await?;
        let (rp, r) = self.inner.read(path, args).await?;
        Ok((rp, Box::new(ConcurrentLimitReader::new(r, permit))))
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let _permit = self.acquire().await?;
        self.inner.write(path, args, bs).await
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let _permit = self.acquire().await?;
        self.inner.stat(path, args).await
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let _permit = self.acquire().await?;
        self.inner.delete(path, args).await
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        let permit = self.acquire().await?;
        let (rp, pager) = self.inner.list(path, args).await?;
        Ok((rp, Box::new(ConcurrentLimitPager::new(pager, permit))))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let _permit = self.try_acquire(Operation::BlockingCreate)?;
        self.inner.blocking_create(path, args)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        let permit = self.try_acquire(Operation::BlockingRead)?;
        let (rp, r) = self.inner.blocking_read(path, args)?;
        Ok((rp, Box::new(ConcurrentLimitReader::new(r, permit))))
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let _permit = self.try_acquire(Operation::BlockingWrite)?;
        self.inner.blocking_write(path, args, bs)
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let _permit = self.try_acquire(Operation::BlockingStat)?;
        self.inner.blocking_stat(path, args)
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let _permit = self.try_acquire(Operation::BlockingDelete)?;
        self.inner.blocking_delete(path, args)
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let permit = self.try_acquire(Operation::BlockingList)?;
        let (rp, pager) = self.inner.blocking_list(path, args)?;
        Ok((rp, Box::new(ConcurrentLimitPager::new(pager, permit))))
    }
}

struct ConcurrentLimitReader<R> {
    inner: R,

    // Held until the reader is dropped.
    _permit: OwnedSemaphorePermit,
}

impl<R> ConcurrentLimitReader<R> {
    fn new(inner: R, permit: OwnedSemaphorePermit) -> Self {
        Self {
            inner,
            _permit: permit,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ConcurrentLimitReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<R: io::Read> io::Read for ConcurrentLimitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

struct ConcurrentLimitPager<P> {
    inner: P,

    // Held until the pager is dropped.
    _permit: OwnedSemaphorePermit,
}

impl<P> ConcurrentLimitPager<P> {
    fn new(inner: P, permit: OwnedSemaphorePermit) -> Self {
        Self {
            inner,
            _permit: permit,
        }
    }
}

#[async_trait]
impl ObjectPage for ConcurrentLimitPager<ObjectPager> {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        self.inner.next_page().await
    }
}

impl BlockingObjectPage for ConcurrentLimitPager<BlockingObjectPager> {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        self.inner.next_page()
    }
}
