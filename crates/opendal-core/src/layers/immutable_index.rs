use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{Result, normalize_path};

use crate::layers::Layer;
use crate::metadata::{AccessorMetadata, ObjectEntry, ObjectMetadata, ObjectMode};
use crate::raw::*;

/// Answer `list` from a fixed set of paths
///
/// Useful for services that cannot list at all, or whose content never
/// changes. Every parent of an inserted path becomes a listable directory.
///
/// ```ignore
/// let mut index = ImmutableIndexLayer::default();
/// index.extend_iter(["a/b", "a/c/d"]);
/// let op = Operator::from_env::<Ipmfs>()?.layer(index).finish();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImmutableIndexLayer {
    set: BTreeSet<String>,
}

impl ImmutableIndexLayer {
    pub fn insert(&mut self, path: String) {
        self.set.insert(normalize_path(&path));
    }

    pub fn extend_iter<I, S>(&mut self, iter: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set
            .extend(iter.into_iter().map(|p| normalize_path(p.as_ref())));
    }

    /// Direct children of `path`, directories derived from deeper entries.
    fn children(&self, path: &str) -> Vec<ObjectEntry> {
        let prefix = if path == "/" { "" } else { path };

        let mut entries: BTreeMap<String, ObjectMode> = BTreeMap::new();
        for item in self.set.range(prefix.to_string()..) {
            let Some(rest) = item.strip_prefix(prefix) else {
                break;
            };
            if rest.is_empty() || item == "/" {
                continue;
            }
            match rest.find('/') {
                Some(idx) => {
                    entries.insert(format!("{prefix}{}", &rest[..=idx]), ObjectMode::DIR);
                }
                None => {
                    entries.insert(item.clone(), ObjectMode::FILE);
                }
            }
        }

        entries
            .into_iter()
            .map(|(path, mode)| ObjectEntry::new(&path, ObjectMetadata::new(mode)))
            .collect()
    }
}

impl Layer for ImmutableIndexLayer {
    fn layer(&self, inner: FusedAccessor) -> FusedAccessor {
        Arc::new(ImmutableIndexAccessor {
            inner,
            index: self.clone(),
        })
    }
}

#[derive(Debug)]
struct ImmutableIndexAccessor {
    inner: FusedAccessor,
    index: ImmutableIndexLayer,
}

#[async_trait]
impl Accessor for ImmutableIndexAccessor {
    fn metadata(&self) -> AccessorMetadata {
        let mut meta = self.inner.metadata();
        let cap = meta.capability().with_list();
        meta.set_capability(cap);
        meta
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.inner.create(path, args).await
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        self.inner.read(path, args).await
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.inner.write(path, args, bs).await
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.inner.stat(path, args).await
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.inner.delete(path, args).await
    }

    async fn list(&self, path: &str, _: OpList) -> Result<(RpList, ObjectPager)> {
        Ok((RpList, Box::new(Some(self.index.children(path)))))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        self.inner.blocking_create(path, args)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        self.inner.blocking_read(path, args)
    }

    fn blocking_write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        self.inner.blocking_write(path, args, bs)
    }

    fn blocking_stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        self.inner.blocking_stat(path, args)
    }

    fn blocking_delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        self.inner.blocking_delete(path, args)
    }

    fn blocking_list(&self, path: &str, _: OpList) -> Result<(RpList, BlockingObjectPager)> {
        Ok((RpList, Box::new(Some(self.index.children(path)))))
    }
}
