//! Adapters that turn simpler storage models into an [`Accessor`](crate::raw::Accessor).

pub mod kv;
