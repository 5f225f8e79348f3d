//! OpenDAL Services - storage backends
//!
//! `memory` and `fs` are always available, the others sit behind
//! `services-*` features. [`build`] and [`from_env`] pick a backend by
//! [`Scheme`] at runtime.

use std::collections::HashMap;
use std::env;

use opendal_common::{Error, ErrorKind, Result, Scheme};
use opendal_core::builder::scheme_envs;
use opendal_core::{Operator, OperatorBuilder};

mod fs;
pub use fs::{FsBackend, FsBuilder};

mod memory;
pub use memory::{MemoryBackend, MemoryBuilder};

#[cfg(feature = "services-hdfs")]
mod hdfs;
#[cfg(feature = "services-hdfs")]
pub use hdfs::{HdfsBackend, HdfsBuilder};

#[cfg(feature = "services-ipmfs")]
mod ipmfs;
#[cfg(feature = "services-ipmfs")]
pub use ipmfs::{IpmfsBackend, IpmfsBuilder};

#[cfg(feature = "services-redis")]
mod redis;
#[cfg(feature = "services-redis")]
pub use redis::{RedisBackend, RedisBuilder};

#[cfg(feature = "services-rocksdb")]
mod rocksdb;
#[cfg(feature = "services-rocksdb")]
pub use rocksdb::{RocksdbBackend, RocksdbBuilder};

/// Build the operator of `scheme` from a config map.
pub fn build(scheme: Scheme, map: HashMap<String, String>) -> Result<OperatorBuilder> {
    match scheme {
        Scheme::Fs => Operator::from_map::<FsBuilder>(map),
        Scheme::Memory => Operator::from_map::<MemoryBuilder>(map),
        #[cfg(feature = "services-hdfs")]
        Scheme::Hdfs => Operator::from_map::<HdfsBuilder>(map),
        #[cfg(feature = "services-ipmfs")]
        Scheme::Ipmfs => Operator::from_map::<IpmfsBuilder>(map),
        #[cfg(feature = "services-redis")]
        Scheme::Redis => Operator::from_map::<RedisBuilder>(map),
        #[cfg(feature = "services-rocksdb")]
        Scheme::Rocksdb => Operator::from_map::<RocksdbBuilder>(map),
        _ => Err(
            Error::new(ErrorKind::Unsupported, "service is not enabled in this build")
                .with_context("service", scheme),
        ),
    }
}

/// Build the operator of `scheme` from `OPENDAL_<SCHEME>_*` variables.
pub fn from_env(scheme: Scheme) -> Result<OperatorBuilder> {
    build(scheme, scheme_envs(scheme, env::vars()))
}

/// Whether the service of `scheme` is compiled in.
pub fn is_enabled(scheme: Scheme) -> bool {
    match scheme {
        Scheme::Fs | Scheme::Memory => true,
        Scheme::Hdfs => cfg!(feature = "services-hdfs"),
        Scheme::Ipmfs => cfg!(feature = "services-ipmfs"),
        Scheme::Redis => cfg!(feature = "services-redis"),
        Scheme::Rocksdb => cfg!(feature = "services-rocksdb"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_build_memory() {
        let op = build(Scheme::Memory, HashMap::new()).unwrap().finish();
        assert_eq!(op.metadata().scheme(), Scheme::Memory);
        assert_eq!(op.metadata().root(), "/");
    }

    #[test]
    fn test_build_fs_requires_root() {
        let err = build(Scheme::Fs, HashMap::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::BackendConfigInvalid);
    }

    #[cfg(not(feature = "services-rocksdb"))]
    #[test]
    fn test_disabled_service_is_unsupported() {
        assert!(!is_enabled(Scheme::Rocksdb));
        let err = build(Scheme::Rocksdb, HashMap::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.context("service"), Some("rocksdb"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // SAFETY: env tests are serialized.
        unsafe { env::set_var("OPENDAL_MEMORY_ROOT", "/from/env") };
        let op = from_env(Scheme::Memory);
        unsafe { env::remove_var("OPENDAL_MEMORY_ROOT") };

        assert_eq!(op.unwrap().finish().metadata().root(), "/from/env/");
    }
}
