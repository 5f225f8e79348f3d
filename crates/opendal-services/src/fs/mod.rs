mod backend;
pub use backend::{FsBackend, FsBuilder};

mod pager;
