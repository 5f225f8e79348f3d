use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage services OpenDAL knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Scheme {
    /// Local filesystem
    Fs,
    /// Hadoop Distributed File System
    Hdfs,
    /// IPFS Mutable File System
    Ipmfs,
    /// In-process memory map
    Memory,
    /// Redis key-value store
    Redis,
    /// Embedded RocksDB
    Rocksdb,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Fs => "fs",
            Scheme::Hdfs => "hdfs",
            Scheme::Ipmfs => "ipmfs",
            Scheme::Memory => "memory",
            Scheme::Redis => "redis",
            Scheme::Rocksdb => "rocksdb",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fs" => Ok(Scheme::Fs),
            "hdfs" => Ok(Scheme::Hdfs),
            "ipmfs" | "ipfs" => Ok(Scheme::Ipmfs),
            "memory" => Ok(Scheme::Memory),
            "redis" => Ok(Scheme::Redis),
            "rocksdb" => Ok(Scheme::Rocksdb),
            _ => Err(format!("unknown scheme: {}", s)),
        }
    }
}

impl From<Scheme> for &'static str {
    fn from(v: Scheme) -> &'static str {
        v.as_str()
    }
}
