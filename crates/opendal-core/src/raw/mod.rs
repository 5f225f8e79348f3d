//! Raw API for service implementors
//!
//! Users should go through [`crate::Operator`] instead.

mod accessor;
pub use accessor::Accessor;
pub use accessor::BlockingReader;
pub use accessor::FusedAccessor;
pub use accessor::Reader;

mod ops;
pub use ops::*;

mod pager;
pub use pager::BlockingObjectPage;
pub use pager::BlockingObjectPager;
pub use pager::ObjectPage;
pub use pager::ObjectPager;

mod range;
pub use range::BytesRange;

pub mod adapters;

pub use crate::metadata::{AccessorMetadata, Capability, ObjectEntry, ObjectMetadata, ObjectMode};
pub use opendal_common::path::*;
