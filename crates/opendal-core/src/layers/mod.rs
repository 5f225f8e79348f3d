//! Layers add cross cutting behavior around an [`Accessor`].
//!
//! ```ignore
//! let op = Operator::from_env::<Fs>()?
//!     .layer(RetryLayer::new())
//!     .layer(LoggingLayer)
//!     .finish();
//! ```

use crate::raw::FusedAccessor;

mod concurrent_limit;
pub use concurrent_limit::ConcurrentLimitLayer;

mod error_context;
pub(crate) use error_context::ErrorContextLayer;

mod immutable_index;
pub use immutable_index::ImmutableIndexLayer;

mod logging;
pub use logging::LoggingLayer;

#[cfg(feature = "layers-metrics")]
mod metrics;
#[cfg(feature = "layers-metrics")]
pub use self::metrics::MetricsLayer;

mod retry;
pub use retry::RetryLayer;

/// Wrap an accessor into a new one
///
/// The returned accessor usually forwards to `inner` and changes behavior
/// before or after the call.
pub trait Layer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor;
}
