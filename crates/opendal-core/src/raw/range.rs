use std::fmt::{Display, Formatter};
use std::ops::{Bound, RangeBounds};

/// A byte range of an object
///
/// - `offset: Some, size: Some` reads `size` bytes starting at `offset`
/// - `offset: Some, size: None` reads from `offset` to the end
/// - `offset: None, size: Some` reads the last `size` bytes
/// - `offset: None, size: None` reads everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BytesRange {
    offset: Option<u64>,
    size: Option<u64>,
}

impl BytesRange {
    pub fn new(offset: Option<u64>, size: Option<u64>) -> Self {
        Self { offset, size }
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn is_full(&self) -> bool {
        self.offset.unwrap_or_default() == 0 && self.size.is_none()
    }

    /// Resolve this range against an object of `total` bytes into `[start, end)`.
    pub fn resolve(&self, total: u64) -> (u64, u64) {
        match (self.offset, self.size) {
            (Some(offset), Some(size)) => {
                let start = offset.min(total);
                (start, offset.saturating_add(size).min(total))
            }
            (Some(offset), None) => (offset.min(total), total),
            (None, Some(size)) => (total.saturating_sub(size), total),
            (None, None) => (0, total),
        }
    }

    /// Apply this range to an in-memory buffer.
    pub fn apply_on_bytes(&self, bs: bytes::Bytes) -> bytes::Bytes {
        let (start, end) = self.resolve(bs.len() as u64);
        bs.slice(start as usize..end as usize)
    }
}

impl Display for BytesRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.offset, self.size) {
            (Some(offset), Some(size)) => {
                write!(f, "{}-{}", offset, offset.saturating_add(size).saturating_sub(1))
            }
            (Some(offset), None) => write!(f, "{}-", offset),
            (None, Some(size)) => write!(f, "-{}", size),
            (None, None) => write!(f, "0-"),
        }
    }
}

impl<T> From<T> for BytesRange
where
    T: RangeBounds<u64>,
{
    /// `..n` reads the first `n` bytes; only [`BytesRange::new`] builds a suffix range.
    fn from(range: T) -> Self {
        let start = match range.start_bound() {
            Bound::Included(v) => Some(*v),
            Bound::Excluded(v) => Some(v.saturating_add(1)),
            Bound::Unbounded => None,
        };

        // `..=u64::MAX` has no representable end and reads to the end.
        let end = match range.end_bound() {
            Bound::Included(v) => v.checked_add(1),
            Bound::Excluded(v) => Some(*v),
            Bound::Unbounded => None,
        };

        match (start, end) {
            (None, None) => BytesRange::new(None, None),
            (start, None) => BytesRange::new(Some(start.unwrap_or_default()), None),
            (start, Some(end)) => {
                let offset = start.unwrap_or_default();
                BytesRange::new(Some(offset), Some(end.saturating_sub(offset)))
            }
        }
    }
}
