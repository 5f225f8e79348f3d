//! OpenDAL Core - Accessor abstraction, layers and the Operator API
//!
//! This crate provides:
//! - The raw [`raw::Accessor`] trait every service implements
//! - The kv adapter turning get/set/delete stores into accessors
//! - [`layers`] wrapping accessors with retries, limits, logging and metrics
//! - [`Operator`] and [`Object`], the API users work with

pub mod builder;
pub mod layers;
pub mod metadata;
pub mod object;
pub mod operator;
pub mod raw;

#[cfg(test)]
mod test_util;

pub use builder::Builder;
pub use metadata::{ObjectEntry, ObjectMetadata, ObjectMode};
pub use object::{BlockingObjectLister, Object, ObjectLister};
pub use opendal_common::{Error, ErrorKind, Operation, Result, Scheme};
pub use operator::{Operator, OperatorBuilder, OperatorMetadata};
