mod backend;
pub use backend::{RedisBackend, RedisBuilder};
