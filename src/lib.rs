//! OpenDAL: one object API over many storage services
//!
//! ```ignore
//! use opendal::services::MemoryBuilder;
//! use opendal::layers::RetryLayer;
//! use opendal::Operator;
//!
//! let op = Operator::create(MemoryBuilder::default())?
//!     .layer(RetryLayer::new())
//!     .finish();
//! op.object("hello.txt").write("Hello, World!").await?;
//! ```
//!
//! The crate also hosts `oli`, a small command line client that works on
//! named profiles, see [`cli`] and [`config`].

pub use opendal_common::{Error, ErrorKind, Operation, Result, Scheme};
pub use opendal_core::builder::scheme_envs;
pub use opendal_core::{
    BlockingObjectLister, Builder, Object, ObjectEntry, ObjectLister, ObjectMetadata, ObjectMode,
    Operator, OperatorBuilder, OperatorMetadata,
};

pub mod layers {
    pub use opendal_core::layers::*;
}

pub mod raw {
    pub use opendal_core::raw::*;
}

pub mod services {
    pub use opendal_services::*;
}

pub mod cli;
pub mod config;
pub mod startup;
