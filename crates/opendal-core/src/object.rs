use std::collections::VecDeque;
use std::io::Read;
use std::ops::RangeBounds;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use opendal_common::{
    Error, ErrorKind, Result, build_rooted_abs_path, get_basename, normalize_path,
};
use tokio::io::AsyncReadExt;

use crate::metadata::{ObjectEntry, ObjectMetadata, ObjectMode};
use crate::raw::*;

/// Handle to one file or directory of a service
///
/// Creating an `Object` does no IO; it is a normalized path bound to an
/// accessor and is cheap to clone.
#[derive(Clone, Debug)]
pub struct Object {
    acc: FusedAccessor,
    path: String,
}

impl Object {
    pub(crate) fn new(acc: FusedAccessor, path: &str) -> Self {
        Self {
            acc,
            path: normalize_path(path),
        }
    }

    /// Absolute path including the operator root, e.g. `/root/dir/file`.
    pub fn id(&self) -> String {
        build_rooted_abs_path(self.acc.metadata().root(), &self.path)
    }

    /// Path relative to the operator root, directories end with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path, `dir/` for directories.
    pub fn name(&self) -> &str {
        get_basename(&self.path)
    }

    fn is_dir_path(&self) -> bool {
        self.path.ends_with('/')
    }

    fn ensure_file(&self, op: &'static str) -> Result<()> {
        if self.is_dir_path() {
            return Err(
                Error::new(ErrorKind::ObjectIsADirectory, "object is a directory")
                    .with_operation(op)
                    .with_context("path", &self.path),
            );
        }
        Ok(())
    }

    fn ensure_dir(&self, op: &'static str) -> Result<()> {
        if !self.is_dir_path() {
            return Err(
                Error::new(ErrorKind::ObjectNotADirectory, "object is not a directory")
                    .with_operation(op)
                    .with_context("path", &self.path),
            );
        }
        Ok(())
    }

    fn create_args(&self) -> OpCreate {
        if self.is_dir_path() {
            OpCreate::new(ObjectMode::DIR)
        } else {
            OpCreate::new(ObjectMode::FILE)
        }
    }

    /// Create an empty file, or a directory when the path ends with `/`.
    pub async fn create(&self) -> Result<()> {
        self.acc.create(&self.path, self.create_args()).await?;
        Ok(())
    }

    pub fn blocking_create(&self) -> Result<()> {
        self.acc.blocking_create(&self.path, self.create_args())?;
        Ok(())
    }

    pub async fn metadata(&self) -> Result<ObjectMetadata> {
        let rp = self.acc.stat(&self.path, OpStat).await?;
        Ok(rp.into_metadata())
    }

    pub fn blocking_metadata(&self) -> Result<ObjectMetadata> {
        let rp = self.acc.blocking_stat(&self.path, OpStat)?;
        Ok(rp.into_metadata())
    }

    /// Check existence, only `ObjectNotFound` counts as missing.
    pub async fn is_exist(&self) -> Result<bool> {
        match self.metadata().await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn blocking_is_exist(&self) -> Result<bool> {
        match self.blocking_metadata() {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Read the whole object into memory.
    pub async fn read(&self) -> Result<Vec<u8>> {
        self.range_read(..).await
    }

    pub async fn range_read(&self, range: impl RangeBounds<u64>) -> Result<Vec<u8>> {
        self.ensure_file("Object::range_read")?;

        let (rp, mut r) = self
            .acc
            .read(&self.path, OpRead::new().with_range(range.into()))
            .await?;

        let mut buf = Vec::with_capacity(rp.size() as usize);
        r.read_to_end(&mut buf).await.map_err(|err| {
            Error::from(err)
                .with_operation("Object::range_read")
                .with_context("path", &self.path)
        })?;
        Ok(buf)
    }

    pub fn blocking_read(&self) -> Result<Vec<u8>> {
        self.blocking_range_read(..)
    }

    pub fn blocking_range_read(&self, range: impl RangeBounds<u64>) -> Result<Vec<u8>> {
        self.ensure_file("Object::blocking_range_read")?;

        let (rp, mut r) = self
            .acc
            .blocking_read(&self.path, OpRead::new().with_range(range.into()))?;

        let mut buf = Vec::with_capacity(rp.size() as usize);
        r.read_to_end(&mut buf).map_err(|err| {
            Error::from(err)
                .with_operation("Object::blocking_range_read")
                .with_context("path", &self.path)
        })?;
        Ok(buf)
    }

    /// Open a streaming reader over the whole object.
    pub async fn reader(&self) -> Result<Reader> {
        self.range_reader(..).await
    }

    pub async fn range_reader(&self, range: impl RangeBounds<u64>) -> Result<Reader> {
        self.ensure_file("Object::range_reader")?;

        let (_, r) = self
            .acc
            .read(&self.path, OpRead::new().with_range(range.into()))
            .await?;
        Ok(r)
    }

    pub fn blocking_reader(&self) -> Result<BlockingReader> {
        self.blocking_range_reader(..)
    }

    pub fn blocking_range_reader(&self, range: impl RangeBounds<u64>) -> Result<BlockingReader> {
        self.ensure_file("Object::blocking_range_reader")?;

        let (_, r) = self
            .acc
            .blocking_read(&self.path, OpRead::new().with_range(range.into()))?;
        Ok(r)
    }

    /// Replace the content of this object.
    pub async fn write(&self, bs: impl Into<Bytes>) -> Result<()> {
        self.ensure_file("Object::write")?;

        let bs = bs.into();
        self.acc
            .write(&self.path, OpWrite::new(bs.len() as u64), bs)
            .await?;
        Ok(())
    }

    pub fn blocking_write(&self, bs: impl Into<Bytes>) -> Result<()> {
        self.ensure_file("Object::blocking_write")?;

        let bs = bs.into();
        self.acc
            .blocking_write(&self.path, OpWrite::new(bs.len() as u64), bs)?;
        Ok(())
    }

    /// Delete this object, deleting a missing object succeeds.
    pub async fn delete(&self) -> Result<()> {
        self.acc.delete(&self.path, OpDelete).await?;
        Ok(())
    }

    pub fn blocking_delete(&self) -> Result<()> {
        self.acc.blocking_delete(&self.path, OpDelete)?;
        Ok(())
    }

    /// List the direct children of this directory.
    pub async fn list(&self) -> Result<ObjectLister> {
        self.ensure_dir("Object::list")?;

        let (_, pager) = self.acc.list(&self.path, OpList).await?;
        Ok(ObjectLister::new(self.acc.clone(), pager))
    }

    pub fn blocking_list(&self) -> Result<BlockingObjectLister> {
        self.ensure_dir("Object::blocking_list")?;

        let (_, pager) = self.acc.blocking_list(&self.path, OpList)?;
        Ok(BlockingObjectLister::new(self.acc.clone(), pager))
    }
}

/// Stream of the children of a directory
pub struct ObjectLister {
    inner: BoxStream<'static, Result<Object>>,
}

impl ObjectLister {
    fn new(acc: FusedAccessor, pager: ObjectPager) -> Self {
        let stream = futures::stream::try_unfold(
            (pager, VecDeque::<ObjectEntry>::new()),
            move |(mut pager, mut buf)| {
                let acc = acc.clone();
                async move {
                    loop {
                        if let Some(entry) = buf.pop_front() {
                            let obj = Object::new(acc, entry.path());
                            return Ok(Some((obj, (pager, buf))));
                        }
                        match pager.next_page().await? {
                            Some(page) => buf.extend(page),
                            None => return Ok(None),
                        }
                    }
                }
            },
        );

        Self {
            inner: stream.boxed(),
        }
    }
}

impl Stream for ObjectLister {
    type Item = Result<Object>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Blocking iterator over the children of a directory
pub struct BlockingObjectLister {
    acc: FusedAccessor,
    pager: BlockingObjectPager,
    buf: VecDeque<ObjectEntry>,
    done: bool,
}

impl BlockingObjectLister {
    fn new(acc: FusedAccessor, pager: BlockingObjectPager) -> Self {
        Self {
            acc,
            pager,
            buf: VecDeque::new(),
            done: false,
        }
    }
}

impl Iterator for BlockingObjectLister {
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buf.pop_front() {
                return Some(Ok(Object::new(self.acc.clone(), entry.path())));
            }
            if self.done {
                return None;
            }
            match self.pager.next_page() {
                Ok(Some(page)) => self.buf.extend(page),
                Ok(None) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::TryStreamExt;

    use super::*;
    use crate::test_util::map_backend;

    fn object(path: &str) -> Object {
        Object::new(Arc::new(map_backend().with_root("/data/")), path)
    }

    #[test]
    fn test_object_path() {
        let o = object("//dir///file ");
        assert_eq!(o.path(), "dir/file");
        assert_eq!(o.name(), "file");
        assert_eq!(o.id(), "/data/dir/file");

        let o = object("dir/sub/");
        assert_eq!(o.name(), "sub/");
        assert_eq!(o.id(), "/data/dir/sub/");

        assert_eq!(object("").path(), "/");
        assert_eq!(object("/").id(), "/data/");
    }

    #[tokio::test]
    async fn test_object_read_write() {
        let o = object("hello.txt");
        assert!(!o.is_exist().await.unwrap());

        o.write("Hello, World!").await.unwrap();
        assert!(o.is_exist().await.unwrap());
        assert_eq!(o.read().await.unwrap(), b"Hello, World!");
        assert_eq!(o.range_read(7..12).await.unwrap(), b"World");
        assert_eq!(o.range_read(..5).await.unwrap(), b"Hello");

        let meta = o.metadata().await.unwrap();
        assert_eq!(meta.mode(), ObjectMode::FILE);
        assert_eq!(meta.content_length(), 13);

        o.delete().await.unwrap();
        assert!(!o.is_exist().await.unwrap());
    }

    #[tokio::test]
    async fn test_range_read_bounds() {
        let o = object("range");
        o.write("0123456789").await.unwrap();

        assert_eq!(o.range_read(..3).await.unwrap(), b"012");
        assert_eq!(o.range_read(..=3).await.unwrap(), b"0123");
        assert_eq!(o.range_read(7..).await.unwrap(), b"789");
        assert_eq!(o.range_read(1..=u64::MAX).await.unwrap(), b"123456789");
        assert_eq!(o.blocking_range_read(..=u64::MAX).unwrap(), b"0123456789");
        assert!(o.range_read(20..30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dir_checks() {
        let err = object("dir/").read().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectIsADirectory);

        let err = object("dir/").write("abc").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectIsADirectory);

        let err = object("file").list().await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ObjectNotADirectory);

        let err = object("file").blocking_list().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ObjectNotADirectory);
    }

    #[tokio::test]
    async fn test_list_and_blocking_list() {
        let acc: FusedAccessor = Arc::new(map_backend());
        for p in ["d/a", "d/b", "d/sub/c"] {
            Object::new(acc.clone(), p).write("x").await.unwrap();
        }

        let dir = Object::new(acc.clone(), "d/");
        let paths: Vec<String> = dir
            .list()
            .await
            .unwrap()
            .map_ok(|o| o.path().to_string())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(paths, vec!["d/a", "d/b", "d/sub/"]);

        let paths: Vec<String> = dir
            .blocking_list()
            .unwrap()
            .map(|o| o.map(|o| o.path().to_string()))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(paths, vec!["d/a", "d/b", "d/sub/"]);
    }

    #[test]
    fn test_blocking_read_write() {
        let o = object("blocking");
        o.blocking_write(vec![1u8, 2, 3, 4]).unwrap();
        assert_eq!(o.blocking_read().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(o.blocking_range_read(1..=2).unwrap(), vec![2, 3]);

        let mut r = o.blocking_reader().unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4]);

        o.blocking_create().unwrap();
        assert_eq!(o.blocking_metadata().unwrap().content_length(), 0);
    }
}
