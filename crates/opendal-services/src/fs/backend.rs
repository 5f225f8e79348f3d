use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal_common::{Error, ErrorKind, Result, Scheme};
use opendal_core::Builder;
use opendal_core::raw::*;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use super::pager::FsPager;

/// Local filesystem service
///
/// `root` is required. A relative root is resolved against the current
/// directory and created on build.
#[derive(Debug, Default, Clone)]
pub struct FsBuilder {
    root: Option<String>,
}

impl FsBuilder {
    pub fn root(&mut self, root: &str) -> &mut Self {
        self.root = if root.is_empty() {
            None
        } else {
            Some(root.to_string())
        };
        self
    }
}

impl Builder for FsBuilder {
    const SCHEME: Scheme = Scheme::Fs;
    type Accessor = FsBackend;

    fn from_map(map: HashMap<String, String>) -> Self {
        let mut builder = FsBuilder::default();
        if let Some(v) = map.get("root") {
            builder.root(v);
        }
        builder
    }

    fn build(&mut self) -> Result<Self::Accessor> {
        debug!(builder = ?self, "fs backend build started");

        let root = self.root.take().ok_or_else(|| {
            Error::new(ErrorKind::BackendConfigInvalid, "root is required but not set")
                .with_context("service", Scheme::Fs)
        })?;

        let mut path = PathBuf::from(&root);
        if path.is_relative() {
            let cwd = std::env::current_dir().map_err(|err| {
                Error::new(ErrorKind::BackendConfigInvalid, "get current dir")
                    .with_context("service", Scheme::Fs)
                    .set_source(err)
            })?;
            path = cwd.join(path);
        }

        std::fs::create_dir_all(&path).map_err(|err| {
            Error::new(ErrorKind::BackendConfigInvalid, "create root dir")
                .with_context("service", Scheme::Fs)
                .with_context("root", path.display())
                .set_source(err)
        })?;

        let root = normalize_root(&path.to_string_lossy());
        debug!(root = %root, "fs backend build finished");
        Ok(FsBackend { root })
    }
}

#[derive(Debug, Clone)]
pub struct FsBackend {
    root: String,
}

impl FsBackend {
    fn abs(&self, path: &str) -> String {
        build_rooted_abs_path(&self.root, path)
    }

    fn parent_of(p: &str) -> Result<PathBuf> {
        Path::new(p).parent().map(Path::to_path_buf).ok_or_else(|| {
            Error::new(ErrorKind::Unexpected, "path should have parent but not")
                .with_context("input", p)
        })
    }
}

fn is_a_directory(p: &str) -> Error {
    Error::new(ErrorKind::ObjectIsADirectory, "cannot read a directory").with_context("input", p)
}

fn to_metadata(meta: &std::fs::Metadata) -> ObjectMetadata {
    let mode = if meta.is_dir() {
        ObjectMode::DIR
    } else if meta.is_file() {
        ObjectMode::FILE
    } else {
        ObjectMode::Unknown
    };

    let mut m = ObjectMetadata::new(mode).with_content_length(meta.len());
    if let Ok(t) = meta.modified() {
        m.set_last_modified(DateTime::<Utc>::from(t));
    }
    m
}

#[async_trait]
impl Accessor for FsBackend {
    fn metadata(&self) -> AccessorMetadata {
        let mut am = AccessorMetadata::new(Scheme::Fs);
        am.set_root(&self.root)
            .set_name(&self.root)
            .set_capability(Capability::read_write().with_list().with_blocking());
        am
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let p = self.abs(path);

        if args.mode().is_dir() {
            tokio::fs::create_dir_all(&p).await?;
        } else {
            tokio::fs::create_dir_all(Self::parent_of(&p)?).await?;
            tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&p)
                .await?;
        }
        Ok(RpCreate)
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let p = self.abs(path);

        let mut f = tokio::fs::File::open(&p).await?;
        let meta = f.metadata().await?;
        if meta.is_dir() {
            return Err(is_a_directory(&p));
        }

        let (start, end) = args.range().resolve(meta.len());
        f.seek(SeekFrom::Start(start)).await?;

        Ok((RpRead::new(end - start), Box::new(f.take(end - start))))
    }

    async fn write(&self, path: &str, _: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let p = self.abs(path);

        tokio::fs::create_dir_all(Self::parent_of(&p)?).await?;
        tokio::fs::write(&p, &bs).await?;
        Ok(RpWrite::new(bs.len() as u64))
    }

    async fn stat(&self, path: &str, _: OpStat) -> Result<RpStat> {
        let meta = tokio::fs::metadata(self.abs(path)).await?;
        Ok(RpStat::new(to_metadata(&meta)))
    }

    async fn delete(&self, path: &str, _: OpDelete) -> Result<RpDelete> {
        let p = self.abs(path);

        let meta = match tokio::fs::metadata(&p).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RpDelete),
            Err(err) => return Err(err.into()),
        };

        if meta.is_dir() {
            tokio::fs::remove_dir(&p).await?;
        } else {
            tokio::fs::remove_file(&p).await?;
        }
        Ok(RpDelete)
    }

    async fn list(&self, path: &str, _: OpList) -> Result<(RpList, ObjectPager)> {
        let rd = match tokio::fs::read_dir(self.abs(path)).await {
            Ok(rd) => rd,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok((RpList, Box::new(())));
            }
            Err(err) => return Err(err.into()),
        };

        Ok((RpList, Box::new(FsPager::new(&self.root, rd))))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let p = self.abs(path);

        if args.mode().is_dir() {
            std::fs::create_dir_all(&p)?;
        } else {
            std::fs::create_dir_all(Self::parent_of(&p)?)?;
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&p)?;
        }
        Ok(RpCreate)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        let p = self.abs(path);

        let mut f = std::fs::File::open(&p)?;
        let meta = f.metadata()?;
        if meta.is_dir() {
            return Err(is_a_directory(&p));
        }

        let (start, end) = args.range().resolve(meta.len());
        f.seek(SeekFrom::Start(start))?;

        Ok((RpRead::new(end - start), Box::new(f.take(end - start))))
    }

    fn blocking_write(&self, path: &str, _: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let p = self.abs(path);

        std::fs::create_dir_all(Self::parent_of(&p)?)?;
        std::fs::write(&p, &bs)?;
        Ok(RpWrite::new(bs.len() as u64))
    }

    fn blocking_stat(&self, path: &str, _: OpStat) -> Result<RpStat> {
        let meta = std::fs::metadata(self.abs(path))?;
        Ok(RpStat::new(to_metadata(&meta)))
    }

    fn blocking_delete(&self, path: &str, _: OpDelete) -> Result<RpDelete> {
        let p = self.abs(path);

        let meta = match std::fs::metadata(&p) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RpDelete),
            Err(err) => return Err(err.into()),
        };

        if meta.is_dir() {
            std::fs::remove_dir(&p)?;
        } else {
            std::fs::remove_file(&p)?;
        }
        Ok(RpDelete)
    }

    fn blocking_list(&self, path: &str, _: OpList) -> Result<(RpList, BlockingObjectPager)> {
        let rd = match std::fs::read_dir(self.abs(path)) {
            Ok(rd) => rd,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok((RpList, Box::new(())));
            }
            Err(err) => return Err(err.into()),
        };

        Ok((RpList, Box::new(FsPager::new(&self.root, rd))))
    }
}
