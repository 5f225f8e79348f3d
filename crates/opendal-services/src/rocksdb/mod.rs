mod backend;
pub use backend::{RocksdbBackend, RocksdbBuilder};
