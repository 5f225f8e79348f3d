//! Key-value adapter
//!
//! Services that only know `get`/`set`/`delete` (redis, rocksdb, memory)
//! implement [`Adapter`] and get a full [`Accessor`] through [`Backend`].
//! Directories are virtual: they exist as long as some key lives below them.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal_common::{
    Error, ErrorKind, Operation, Result, build_abs_path, build_rel_path, normalize_root,
};

use crate::metadata::{AccessorMetadata, Capability, ObjectEntry, ObjectMetadata, ObjectMode};
use crate::raw::{
    Accessor, BlockingObjectPager, BlockingReader, ObjectPager, OpCreate, OpDelete, OpList,
    OpRead, OpStat, OpWrite, Reader, RpCreate, RpDelete, RpList, RpRead, RpStat, RpWrite,
};

/// Minimal key-value storage
///
/// Keys are absolute and never start with `/`.
#[async_trait]
pub trait Adapter: Send + Sync + Debug + 'static {
    /// Scheme, name and capability of this adapter.
    ///
    /// `capability.list` means [`Adapter::scan`] is implemented and
    /// `capability.blocking` means the blocking functions are.
    fn metadata(&self) -> AccessorMetadata;

    async fn get(&self, path: &str) -> Result<Option<Bytes>>;

    async fn set(&self, path: &str, value: Bytes) -> Result<()>;

    /// Deleting a missing key must succeed.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Return every key starting with `prefix`.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        let _ = prefix;
        Err(Error::new(ErrorKind::Unsupported, "kv adapter doesn't support scan")
            .with_operation(Operation::List))
    }

    fn blocking_get(&self, path: &str) -> Result<Option<Bytes>> {
        let _ = path;
        Err(Error::new(ErrorKind::Unsupported, "kv adapter doesn't support blocking")
            .with_operation(Operation::BlockingRead))
    }

    fn blocking_set(&self, path: &str, value: Bytes) -> Result<()> {
        let (_, _) = (path, value);
        Err(Error::new(ErrorKind::Unsupported, "kv adapter doesn't support blocking")
            .with_operation(Operation::BlockingWrite))
    }

    fn blocking_delete(&self, path: &str) -> Result<()> {
        let _ = path;
        Err(Error::new(ErrorKind::Unsupported, "kv adapter doesn't support blocking")
            .with_operation(Operation::BlockingDelete))
    }

    fn blocking_scan(&self, prefix: &str) -> Result<Vec<String>> {
        let _ = prefix;
        Err(Error::new(ErrorKind::Unsupported, "kv adapter doesn't support blocking scan")
            .with_operation(Operation::BlockingList))
    }
}

/// [`Accessor`] built on top of a kv [`Adapter`]
#[derive(Debug)]
pub struct Backend<S: Adapter> {
    kv: Arc<S>,
    root: String,
}

impl<S: Adapter> Clone for Backend<S> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            root: self.root.clone(),
        }
    }
}

impl<S: Adapter> Backend<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv: Arc::new(kv),
            root: "/".to_string(),
        }
    }

    /// Set the root, every key will be stored below it.
    pub fn with_root(mut self, root: &str) -> Self {
        self.root = normalize_root(root);
        self
    }

    fn key(&self, path: &str) -> String {
        build_abs_path(&self.root, path)
    }

    /// Fold scanned keys into the direct children of `path`.
    fn children(&self, path: &str, keys: Vec<String>) -> Vec<ObjectEntry> {
        let prefix = self.key(path);

        let mut entries: BTreeMap<String, ObjectMode> = BTreeMap::new();
        for key in keys {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.find('/') {
                Some(idx) => {
                    entries.insert(format!("{prefix}{}", &rest[..=idx]), ObjectMode::DIR);
                }
                None => {
                    entries.insert(key, ObjectMode::FILE);
                }
            }
        }

        entries
            .into_iter()
            .map(|(key, mode)| {
                let rel = build_rel_path(&self.root, &key);
                ObjectEntry::new(&rel, ObjectMetadata::new(mode))
            })
            .collect()
    }
}

fn not_found() -> Error {
    Error::new(ErrorKind::ObjectNotFound, "kv doesn't have this path")
}

fn file_metadata(bs: &Bytes) -> ObjectMetadata {
    ObjectMetadata::new(ObjectMode::FILE)
        .with_content_length(bs.len() as u64)
        .with_complete()
}

#[async_trait]
impl<S: Adapter> Accessor for Backend<S> {
    fn metadata(&self) -> AccessorMetadata {
        let kv = self.kv.metadata();
        let kv_cap = kv.capability();

        let mut cap = Capability::read_write();
        cap.list = kv_cap.list;
        cap.blocking = kv_cap.blocking;

        let mut am = kv;
        am.set_root(&self.root).set_capability(cap);
        am
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        if args.mode().is_file() {
            self.kv.set(&self.key(path), Bytes::new()).await?;
        }
        Ok(RpCreate)
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let bs = self.kv.get(&self.key(path)).await?.ok_or_else(not_found)?;
        let bs = args.range().apply_on_bytes(bs);

        Ok((RpRead::new(bs.len() as u64), Box::new(Cursor::new(bs))))
    }

    async fn write(&self, path: &str, _: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let written = bs.len() as u64;
        self.kv.set(&self.key(path), bs).await?;
        Ok(RpWrite::new(written))
    }

    async fn stat(&self, path: &str, _: OpStat) -> Result<RpStat> {
        if path.ends_with('/') {
            return Ok(RpStat::new(ObjectMetadata::new(ObjectMode::DIR)));
        }

        let bs = self.kv.get(&self.key(path)).await?.ok_or_else(not_found)?;
        Ok(RpStat::new(file_metadata(&bs)))
    }

    async fn delete(&self, path: &str, _: OpDelete) -> Result<RpDelete> {
        self.kv.delete(&self.key(path)).await?;
        Ok(RpDelete)
    }

    async fn list(&self, path: &str, _: OpList) -> Result<(RpList, ObjectPager)> {
        let keys = self.kv.scan(&self.key(path)).await?;
        Ok((RpList, Box::new(Some(self.children(path, keys)))))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        if args.mode().is_file() {
            self.kv.blocking_set(&self.key(path), Bytes::new())?;
        }
        Ok(RpCreate)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        let bs = self.kv.blocking_get(&self.key(path))?.ok_or_else(not_found)?;
        let bs = args.range().apply_on_bytes(bs);

        Ok((RpRead::new(bs.len() as u64), Box::new(Cursor::new(bs))))
    }

    fn blocking_write(&self, path: &str, _: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let written = bs.len() as u64;
        self.kv.blocking_set(&self.key(path), bs)?;
        Ok(RpWrite::new(written))
    }

    fn blocking_stat(&self, path: &str, _: OpStat) -> Result<RpStat> {
        if path.ends_with('/') {
            return Ok(RpStat::new(ObjectMetadata::new(ObjectMode::DIR)));
        }

        let bs = self.kv.blocking_get(&self.key(path))?.ok_or_else(not_found)?;
        Ok(RpStat::new(file_metadata(&bs)))
    }

    fn blocking_delete(&self, path: &str, _: OpDelete) -> Result<RpDelete> {
        self.kv.blocking_delete(&self.key(path))?;
        Ok(RpDelete)
    }

    fn blocking_list(&self, path: &str, _: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let keys = self.kv.blocking_scan(&self.key(path))?;
        Ok((RpList, Box::new(Some(self.children(path, keys)))))
    }
}

#[cfg(test)]
mod tests {
    use opendal_common::Scheme;
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::raw::ObjectPage;
    use crate::test_util::map_backend;

    /// Adapter without any blocking support.
    #[derive(Debug)]
    struct AsyncOnly;

    #[async_trait]
    impl Adapter for AsyncOnly {
        fn metadata(&self) -> AccessorMetadata {
            AccessorMetadata::new(Scheme::Memory)
        }

        async fn get(&self, _: &str) -> Result<Option<Bytes>> {
            Ok(None)
        }

        async fn set(&self, _: &str, _: Bytes) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_read_write_with_root() {
        let backend = map_backend().with_root("/data");

        backend
            .write("hello", OpWrite::new(11), Bytes::from_static(b"hello world"))
            .await
            .unwrap();
        assert!(backend.kv.inner.lock().contains_key("data/hello"));

        let (rp, mut r) = backend
            .read("hello", OpRead::new().with_range((6..).into()))
            .await
            .unwrap();
        assert_eq!(rp.size(), 5);
        let mut buf = String::new();
        r.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "world");

        let meta = backend.stat("hello", OpStat).await.unwrap().into_metadata();
        assert_eq!(meta.mode(), ObjectMode::FILE);
        assert_eq!(meta.content_length(), 11);
    }

    #[tokio::test]
    async fn test_missing_and_delete() {
        let backend = map_backend();

        let err = backend.stat("nothing", OpStat).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);

        // Deleting twice is fine.
        backend.delete("nothing", OpDelete).await.unwrap();
        backend.delete("nothing", OpDelete).await.unwrap();

        let meta = backend.stat("dir/", OpStat).await.unwrap().into_metadata();
        assert!(meta.mode().is_dir());
    }

    #[tokio::test]
    async fn test_list_direct_children() {
        let backend = map_backend().with_root("/r/");
        for p in ["a/x", "a/b/c", "a/b/d", "a/e/", "top"] {
            backend
                .write(p, OpWrite::new(0), Bytes::new())
                .await
                .unwrap();
        }

        let (_, mut pager) = backend.list("a/", OpList).await.unwrap();
        let page = pager.next_page().await.unwrap().unwrap();
        let paths: Vec<_> = page.iter().map(|e| (e.path(), e.mode())).collect();
        assert_eq!(
            paths,
            vec![
                ("a/b/", ObjectMode::DIR),
                ("a/e/", ObjectMode::DIR),
                ("a/x", ObjectMode::FILE),
            ]
        );
        assert!(pager.next_page().await.unwrap().is_none());

        let (_, mut pager) = backend.list("/", OpList).await.unwrap();
        let page = pager.next_page().await.unwrap().unwrap();
        let paths: Vec<_> = page.iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["a/", "top"]);
    }

    #[test]
    fn test_blocking_is_unsupported_by_default() {
        let backend = Backend::new(AsyncOnly);
        assert!(!backend.metadata().capability().blocking);

        let err = backend.blocking_stat("abc", OpStat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
