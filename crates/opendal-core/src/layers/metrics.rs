use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use opendal_common::{Operation, Result, Scheme};

use crate::layers::Layer;
use crate::metadata::AccessorMetadata;
use crate::raw::*;

const METRIC_REQUESTS_TOTAL: &str = "opendal_requests_total";
const METRIC_ERRORS_TOTAL: &str = "opendal_errors_total";
const METRIC_REQUESTS_DURATION_SECONDS: &str = "opendal_requests_duration_seconds";

/// Record request counts, errors and latency through the `metrics` facade
///
/// Every metric is labelled with `service` and `operation`; errors also
/// carry `kind`. Installing a recorder is left to the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsLayer;

impl Layer for MetricsLayer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor {
        describe_counter!(METRIC_REQUESTS_TOTAL, "Total number of storage operations");
        describe_counter!(METRIC_ERRORS_TOTAL, "Total number of failed storage operations");
        describe_histogram!(
            METRIC_REQUESTS_DURATION_SECONDS,
            "Storage operation duration in seconds"
        );

        let scheme = inner.metadata().scheme();
        Arc::new(MetricsAccessor { scheme, inner })
    }
}

#[derive(Debug)]
struct MetricsAccessor {
    scheme: Scheme,
    inner: FusedAccessor,
}

impl MetricsAccessor {
    fn record<T>(&self, op: Operation, start: Instant, res: Result<T>) -> Result<T> {
        let service = self.scheme.as_str();
        let operation = op.into_static();

        counter!(METRIC_REQUESTS_TOTAL, "service" => service, "operation" => operation)
            .increment(1);
        histogram!(METRIC_REQUESTS_DURATION_SECONDS, "service" => service, "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        if let Err(err) = &res {
            counter!(METRIC_ERRORS_TOTAL, "service" => service, "operation" => operation, "kind" => err.kind().as_str())
                .increment(1);
        }
        res
    }
}

#[async_trait]
impl Accessor for MetricsAccessor {
    fn metadata(&self) -> AccessorMetadata {
        let start = Instant::now();
        let meta = self.inner.metadata();
        let _ = self.record(Operation::Metadata, start, Ok(()));
        meta
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let start = Instant::now();
        let res = self.inner.create(path, args).await;
        self.record(Operation::Create, start, res)
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let start = Instant::now();
        let res = self.inner.read(path, args).await;
        self.record(Operation::Read, start, res)
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let start = Instant::now();
        let res = self.inner.write(path, args, bs).await;
        self.record(Operation::Write, start, res)
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let start = Instant::now();
        let res = self.inner.stat(path, args).await;
        self.record(Operation::Stat, start, res)
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let start = Instant::now();
        let res = self.inner.delete(path, args).await;
        self.record(Operation::Delete, start, res)
    }

    async fn list(&self, path: &str, args: OpList) -> Result<(RpList, ObjectPager)> {
        let start = Instant::now();
        let res = self.inner.list(path, args).await;
        self.record(Operation::List, start, res)
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let start = Instant::now();
        let res = self.inner.blocking_create(path, args);
        self.record(Operation::BlockingCreate, start, res)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        let start = Instant::now();
        let res = self.inner.blocking_read(path, args);
        self.record(Operation::BlockingRead, start, res)
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let start = Instant::now();
        let res = self.inner.blocking_write(path, args, bs);
        self.record(Operation::BlockingWrite, start, res)
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let start = Instant::now();
        let res = self.inner.blocking_stat(path, args);
        self.record(Operation::BlockingStat, start, res)
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let start = Instant::now();
        let res = self.inner.blocking_delete(path, args);
        self.record(Operation::BlockingDelete, start, res)
    }

    fn blocking_list(&self, path: &str, args: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let start = Instant::now();
        let res = self.inner.blocking_list(path, args);
        self.record(Operation::BlockingList, start, res)
    }
}

#[cfg(test)]
mod tests {
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;
    use crate::test_util::map_backend;

    /// Name, sorted `key=value` labels and value of every recorded metric.
    fn recorded(f: impl FnOnce()) -> Vec<(String, String, DebugValue)> {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, f);

        snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, value)| {
                let key = key.key();
                let mut labels: Vec<String> = key
                    .labels()
                    .map(|l| format!("{}={}", l.key(), l.value()))
                    .collect();
                labels.sort();
                (key.name().to_string(), labels.join(","), value)
            })
            .collect()
    }

    fn find<'a>(
        metrics: &'a [(String, String, DebugValue)],
        name: &str,
        labels: &str,
    ) -> Option<&'a DebugValue> {
        metrics
            .iter()
            .find(|(n, l, _)| n == name && l == labels)
            .map(|(_, _, v)| v)
    }

    #[test]
    fn test_records_requests_errors_and_duration() {
        let metrics = recorded(|| {
            let acc = MetricsLayer.layer(Arc::new(map_backend()));

            acc.blocking_write("a", OpWrite::new(1), Bytes::from_static(b"a"))
                .unwrap();
            assert!(acc.blocking_stat("a", OpStat).is_ok());
            assert!(acc.blocking_stat("b", OpStat).is_err());
        });

        let stat = "operation=blocking_stat,service=memory";
        let write = "operation=blocking_write,service=memory";

        assert!(matches!(
            find(&metrics, METRIC_REQUESTS_TOTAL, stat),
            Some(DebugValue::Counter(2))
        ));
        assert!(matches!(
            find(&metrics, METRIC_REQUESTS_TOTAL, write),
            Some(DebugValue::Counter(1))
        ));
        assert!(matches!(
            find(
                &metrics,
                METRIC_ERRORS_TOTAL,
                "kind=ObjectNotFound,operation=blocking_stat,service=memory"
            ),
            Some(DebugValue::Counter(1))
        ));
        let write_errors = format!("kind=ObjectNotFound,{write}");
        assert!(find(&metrics, METRIC_ERRORS_TOTAL, &write_errors).is_none());

        match find(&metrics, METRIC_REQUESTS_DURATION_SECONDS, stat) {
            Some(DebugValue::Histogram(samples)) => assert_eq!(samples.len(), 2),
            other => panic!("unexpected duration metric: {other:?}"),
        }
    }
}
