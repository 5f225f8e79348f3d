//! IPFS Mutable File System through the Kubo RPC API

mod backend;
pub use backend::{IpmfsBackend, IpmfsBuilder};

mod error;
mod pager;
