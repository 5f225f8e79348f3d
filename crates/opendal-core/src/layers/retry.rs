use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Error, Operation, Result};
use tracing::warn;

use crate::layers::Layer;
use crate::metadata::{AccessorMetadata, ObjectEntry};
use crate::raw::*;

/// Retry temporary errors with exponential backoff
///
/// Only errors marked temporary (`Error::is_temporary`) are retried. Once
/// the retries are used up the error is marked persistent and carries the
/// context `retried`.
///
/// ```ignore
/// let op = Operator::from_env::<Redis>()?
///     .layer(RetryLayer::new().with_max_times(5))
///     .finish();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryLayer {
    backoff: Backoff,
}

#[derive(Debug, Clone, Copy)]
struct Backoff {
    max_times: usize,
    min_delay: Duration,
    max_delay: Duration,
    factor: f64,
    jitter: f64,
}

impl Default for RetryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryLayer {
    /// Three retries starting at one second, doubling up to a minute, no jitter.
    pub fn new() -> Self {
        Self {
            backoff: Backoff {
                max_times: 3,
                min_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(60),
                factor: 2.0,
                jitter: 0.0,
            },
        }
    }

    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.backoff.max_times = max_times;
        self
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.backoff.min_delay = min_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.backoff.max_delay = max_delay;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.backoff.factor = factor;
        self
    }

    /// Randomize each delay by up to `jitter` of itself, e.g. `0.1` for ±10%.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.backoff.jitter = jitter.clamp(0.0, 1.0);
        self
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (starting at 1).
    fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.min_delay.as_millis() as f64 * self.factor.powi(attempt as i32 - 1);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * capped * self.jitter;
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    async fn run<T, F, Fut>(&self, op: Operation, path: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Err(err) if err.is_temporary() => {
                    if attempt >= self.max_times {
                        return Err(exhausted(err, attempt));
                    }
                    attempt += 1;
                    let delay = self.delay(attempt);
                    log_retry(op, path, attempt, delay, &err);
                    tokio::time::sleep(delay).await;
                }
                res => return res,
            }
        }
    }

    fn blocking_run<T, F>(&self, op: Operation, path: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            match f() {
                Err(err) if err.is_temporary() => {
                    if attempt >= self.max_times {
                        return Err(exhausted(err, attempt));
                    }
                    attempt += 1;
                    let delay = self.delay(attempt);
                    log_retry(op, path, attempt, delay, &err);
                    std::thread::sleep(delay);
                }
                res => return res,
            }
        }
    }
}

fn exhausted(err: Error, attempt: usize) -> Error {
    err.set_persistent().with_context("retried", attempt)
}

fn log_retry(op: Operation, path: &str, attempt: usize, delay: Duration, err: &Error) {
    warn!(
        target: "opendal::layers::retry",
        operation = %op,
        path,
        attempt,
        delay_ms = delay.as_millis() as u64,
        error = %err,
        "retrying after temporary error"
    );
}

impl Layer for RetryLayer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor {
        Arc::new(RetryAccessor {
            inner,
            backoff: self.backoff,
        })
    }
}

#[derive(Debug)]
struct RetryAccessor {
    inner: FusedAccessor,
    backoff: Backoff,
}

#[async_trait]
impl Accessor for RetryAccessor {
    fn metadata(&self) -> AccessorMetadata {
        self.inner.metadata()
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.backoff
            .run(Operation::Create, path, || self.inner.create(path, args))
            .await
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        self.backoff
            .run(Operation::Read, path, || self.inner.read(path, args))
            .await
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.backoff
            .run(Operation::Write, path, || {
                self.inner.write(path, args, bs.clone())
            })
            .await
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.backoff
            .run(Operation::Stat, path, || self.inner.stat(path, args))
            .await
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.backoff
            .run(Operation::Delete, path, || self.inner.delete(path, args))
            .await
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        let (rp, pager) = self
            .backoff
            .run(Operation::List, path, || self.inner.list(path, args))
            .await?;

        let pager = RetryPager {
            backoff: self.backoff,
            path: path.to_string(),
            inner: pager,
        };
        Ok((rp, Box::new(pager)))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.backoff
            .blocking_run(Operation::BlockingCreate, path, || {
                self.inner.blocking_create(path, args)
            })
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        self.backoff
            .blocking_run(Operation::BlockingRead, path, || {
                self.inner.blocking_read(path, args)
            })
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.backoff
            .blocking_run(Operation::BlockingWrite, path, || {
                self.inner.blocking_write(path, args, bs.clone())
            })
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.backoff
            .blocking_run(Operation::BlockingStat, path, || {
                self.inner.blocking_stat(path, args)
            })
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.backoff
            .blocking_run(Operation::BlockingDelete, path, || {
                self.inner.blocking_delete(path, args)
            })
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let (rp, pager) = self
            .backoff
            .blocking_run(Operation::BlockingList, path, || {
                self.inner.blocking_list(path, args)
            })?;

        let pager = RetryPager {
            backoff: self.backoff,
            path: path.to_string(),
            inner: pager,
        };
        Ok((rp, Box::new(pager)))
    }
}

struct RetryPager<P> {
    backoff: Backoff,
    path: String,
    inner: P,
}

#[async_trait]
impl ObjectPage for RetryPager<ObjectPager> {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        let mut attempt = 0;
        loop {
            match self.inner.next_page().await {
                Err(err) if err.is_temporary() => {
                    if attempt >= self.backoff.max_times {
                        return Err(exhausted(err, attempt));
                    }
                    attempt += 1;
                    let delay = self.backoff.delay(attempt);
                    log_retry(Operation::List, &self.path, attempt, delay, &err);
                    tokio::time::sleep(delay).await;
                }
                res => return res,
            }
        }
    }
}

impl BlockingObjectPage for RetryPager<BlockingObjectPager> {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        let backoff = self.backoff;
        let inner = &mut self.inner;
        backoff.blocking_run(Operation::BlockingList, &self.path, || inner.next_page())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use opendal_common::{ErrorKind, Scheme};

    use super::*;

    /// Fails `stat` with a temporary error until `failures` runs out.
    #[derive(Debug)]
    struct Flaky {
        failures: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
            })
        }

        fn attempt(&self) -> Result<RpStat> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(Error::new(ErrorKind::Unexpected, "connection reset").set_temporary());
            }
            Ok(RpStat::new(crate::metadata::ObjectMetadata::new(
                crate::metadata::ObjectMode::FILE,
            )))
        }
    }

    #[async_trait]
    impl Accessor for Flaky {
        fn metadata(&self) -> AccessorMetadata {
            AccessorMetadata::new(Scheme::Memory)
        }

        async fn stat(&self, _: &str, _: OpStat) -> Result<RpStat> {
            self.attempt()
        }

        async fn delete(&self, _: &str, _: OpDelete) -> Result<RpDelete> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::new(ErrorKind::ObjectPermissionDenied, "denied"))
        }

        fn blocking_stat(&self, _: &str, _: OpStat) -> Result<RpStat> {
            self.attempt()
        }
    }

    fn layer() -> RetryLayer {
        RetryLayer::new()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(4))
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let flaky = Flaky::new(2);
        let acc = layer().layer(flaky.clone());

        assert!(acc.stat("a", OpStat).await.is_ok());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_is_persistent() {
        let flaky = Flaky::new(10);
        let acc = layer().with_max_times(2).layer(flaky.clone());

        let err = acc.stat("a", OpStat).await.unwrap_err();
        assert!(err.is_persistent());
        assert!(!err.is_temporary());
        assert_eq!(err.context("retried"), Some("2"));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let flaky = Flaky::new(0);
        let acc = layer().layer(flaky.clone());

        let err = acc.delete("a", OpDelete).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectPermissionDenied);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocking_retry() {
        let flaky = Flaky::new(1);
        let acc = layer().layer(flaky.clone());

        assert!(acc.blocking_stat("a", OpStat).is_ok());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_delay() {
        let backoff = RetryLayer::new()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
            .backoff;

        assert_eq!(backoff.delay(0), Duration::ZERO);
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(350));

        let jittered = RetryLayer::new()
            .with_min_delay(Duration::from_millis(100))
            .with_jitter(0.5)
            .backoff;
        for _ in 0..16 {
            let d = jittered.delay(1);
            assert!(d >= Duration::from_millis(50) && d <= Duration::from_millis(150));
        }
    }
}
