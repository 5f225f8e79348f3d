//! OpenDAL Common - Shared types for every OpenDAL crate
//!
//! This crate provides:
//! - The structured `Error` returned by all storage operations
//! - `Scheme` identifying a storage service
//! - `Operation` naming the accessor APIs
//! - Path normalization helpers

pub mod error;
pub mod operation;
pub mod path;
pub mod scheme;

pub use error::{Error, ErrorKind, Result};
pub use operation::Operation;
pub use path::*;
pub use scheme::Scheme;

/// Prefix of every environment variable read by `Builder::from_env`.
pub const ENV_PREFIX: &str = "opendal";

/// Build the environment variable prefix for a scheme, e.g. `opendal_redis_`.
pub fn env_prefix(scheme: Scheme) -> String {
    format!("{}_{}_", ENV_PREFIX, scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix(Scheme::Redis), "opendal_redis_");
        assert_eq!(env_prefix(Scheme::Hdfs), "opendal_hdfs_");
    }
}
