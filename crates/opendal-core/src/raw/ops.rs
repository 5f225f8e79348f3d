//! Arguments (`Op*`) and replies (`Rp*`) of accessor operations

use crate::metadata::{ObjectMetadata, ObjectMode};
use crate::raw::BytesRange;

/// Args for `create`
#[derive(Debug, Clone, Copy)]
pub struct OpCreate {
    mode: ObjectMode,
}

impl OpCreate {
    pub fn new(mode: ObjectMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ObjectMode {
        self.mode
    }
}

/// Args for `read`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpRead {
    range: BytesRange,
}

impl OpRead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: BytesRange) -> Self {
        self.range = range;
        self
    }

    pub fn range(&self) -> BytesRange {
        self.range
    }
}

/// Args for `write`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpWrite {
    content_length: u64,
}

impl OpWrite {
    pub fn new(content_length: u64) -> Self {
        Self { content_length }
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpStat;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpDelete;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpList;

#[derive(Debug, Clone, Copy, Default)]
pub struct RpCreate;

/// Reply of `read`, carrying the number of bytes the reader will yield
#[derive(Debug, Clone, Copy)]
pub struct RpRead {
    size: u64,
}

impl RpRead {
    pub fn new(size: u64) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Reply of `write`, carrying the number of bytes written
#[derive(Debug, Clone, Copy)]
pub struct RpWrite {
    written: u64,
}

impl RpWrite {
    pub fn new(written: u64) -> Self {
        Self { written }
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

#[derive(Debug, Clone)]
pub struct RpStat {
    meta: ObjectMetadata,
}

impl RpStat {
    pub fn new(meta: ObjectMetadata) -> Self {
        Self { meta }
    }

    pub fn into_metadata(self) -> ObjectMetadata {
        self.meta
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RpDelete;

#[derive(Debug, Clone, Copy, Default)]
pub struct RpList;
