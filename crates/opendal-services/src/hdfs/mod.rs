//! Hadoop Distributed File System through libhdfs
//!
//! Needs `JAVA_HOME` and `HADOOP_HOME` at runtime, and `LD_LIBRARY_PATH`
//! pointing at `libjvm.so` on most distributions.

mod backend;
pub use backend::{HdfsBackend, HdfsBuilder};
