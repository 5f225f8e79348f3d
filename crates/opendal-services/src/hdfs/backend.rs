use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal_common::{Error, ErrorKind, Result, Scheme};
use opendal_core::Builder;
use opendal_core::raw::*;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct HdfsBuilder {
    root: Option<String>,
    name_node: Option<String>,
}

impl HdfsBuilder {
    pub fn root(&mut self, root: &str) -> &mut Self {
        self.root = if root.is_empty() {
            None
        } else {
            Some(root.to_string())
        };
        self
    }

    /// `default` uses the hadoop configuration, otherwise an address like
    /// `hdfs://127.0.0.1:9000`.
    pub fn name_node(&mut self, name_node: &str) -> &mut Self {
        if !name_node.is_empty() {
            self.name_node = Some(name_node.trim_end_matches('/').to_string());
        }
        self
    }
}

impl Builder for HdfsBuilder {
    const SCHEME: Scheme = Scheme::Hdfs;
    type Accessor = HdfsBackend;

    fn from_map(map: HashMap<String, String>) -> Self {
        let mut builder = HdfsBuilder::default();

        if let Some(v) = map.get("root") {
            builder.root(v);
        }
        if let Some(v) = map.get("name_node") {
            builder.name_node(v);
        }

        builder
    }

    fn build(&mut self) -> Result<Self::Accessor> {
        debug!(builder = ?self, "hdfs backend build started");

        let name_node = self.name_node.take().ok_or_else(|| {
            Error::new(ErrorKind::BackendConfigInvalid, "name node is empty")
                .with_context("service", Scheme::Hdfs)
        })?;
        let root = normalize_root(&self.root.take().unwrap_or_default());

        let client = hdrs::Client::connect(&name_node).map_err(|err| {
            Error::from(err)
                .with_context("service", Scheme::Hdfs)
                .with_context("name_node", &name_node)
        })?;

        match client.metadata(&root) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(root = %root, "hdfs root does not exist, creating");
                client.create_dir(&root)?;
            }
            Err(err) => return Err(err.into()),
        }

        debug!(root = %root, name_node = %name_node, "hdfs backend build finished");
        Ok(HdfsBackend {
            root,
            client: Arc::new(client),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HdfsBackend {
    root: String,
    client: Arc<hdrs::Client>,
}

// SAFETY: libhdfs file system handles can be shared between threads.
unsafe impl Send for HdfsBackend {}
unsafe impl Sync for HdfsBackend {}

impl HdfsBackend {
    fn abs(&self, path: &str) -> String {
        build_rooted_abs_path(&self.root, path)
    }

    fn create_parent(&self, p: &str) -> Result<()> {
        let parent = Path::new(p).parent().ok_or_else(|| {
            Error::new(ErrorKind::Unexpected, "path should have parent but not")
                .with_context("input", p)
        })?;
        self.client.create_dir(&parent.to_string_lossy())?;
        Ok(())
    }

    /// Run a blocking call on the tokio blocking pool.
    async fn spawn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(HdfsBackend) -> Result<T> + Send + 'static,
    {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || f(backend))
            .await
            .map_err(|err| {
                Error::new(ErrorKind::Unexpected, "hdfs blocking task failed").set_source(err)
            })?
    }

    fn read_range(&self, path: &str, range: BytesRange) -> Result<Bytes> {
        let p = self.abs(path);

        let meta = self.client.metadata(&p)?;
        if meta.is_dir() {
            return Err(Error::new(ErrorKind::ObjectIsADirectory, "cannot read a directory")
                .with_context("input", &p));
        }

        let (start, end) = range.resolve(meta.len());
        let mut f = self.client.open_file().read(true).open(&p)?;
        f.seek(SeekFrom::Start(start))?;

        let mut buf = Vec::with_capacity((end - start) as usize);
        f.take(end - start).read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn list_entries(&self, path: &str) -> Result<Option<Vec<ObjectEntry>>> {
        let p = self.abs(path);

        let rd = match self.client.read_dir(&p) {
            Ok(rd) => rd,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let entries: Vec<ObjectEntry> = rd
            .map(|meta| {
                let rel = build_rel_path(&self.root, meta.path());
                if meta.is_dir() {
                    let rel = format!("{}/", rel.trim_end_matches('/'));
                    ObjectEntry::new(&rel, ObjectMetadata::new(ObjectMode::DIR))
                } else {
                    ObjectEntry::new(&rel, to_metadata(&meta))
                }
            })
            .collect();

        Ok(if entries.is_empty() {
            None
        } else {
            Some(entries)
        })
    }
}

fn to_metadata(meta: &hdrs::Metadata) -> ObjectMetadata {
    let mode = if meta.is_dir() {
        ObjectMode::DIR
    } else if meta.is_file() {
        ObjectMode::FILE
    } else {
        ObjectMode::Unknown
    };

    ObjectMetadata::new(mode)
        .with_content_length(meta.len())
        .with_last_modified(DateTime::<Utc>::from(meta.modified()))
}

#[async_trait]
impl Accessor for HdfsBackend {
    fn metadata(&self) -> AccessorMetadata {
        let mut am = AccessorMetadata::new(Scheme::Hdfs);
        am.set_root(&self.root)
            .set_name(&self.root)
            .set_capability(Capability::read_write().with_list().with_blocking());
        am
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let path = path.to_string();
        self.spawn(move |b| b.blocking_create(&path, args)).await
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let path = path.to_string();
        let bs = self
            .spawn(move |b| b.read_range(&path, args.range()))
            .await?;
        Ok((RpRead::new(bs.len() as u64), Box::new(Cursor::new(bs))))
    }

    async fn write(&self, path: &str, args: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let path = path.to_string();
        self.spawn(move |b| b.blocking_write(&path, args, bs)).await
    }

    async fn stat(&self, path: &str, args: OpStat) -> Result<RpStat> {
        let path = path.to_string();
        self.spawn(move |b| b.blocking_stat(&path, args)).await
    }

    async fn delete(&self, path: &str, args: OpDelete) -> Result<RpDelete> {
        let path = path.to_string();
        self.spawn(move |b| b.blocking_delete(&path, args)).await
    }

    async fn list(&self, path: &str, _: OpList) -> Result<(RpList, ObjectPager)> {
        let path = path.to_string();
        let entries = self.spawn(move |b| b.list_entries(&path)).await?;
        Ok((RpList, Box::new(entries)))
    }

    fn blocking_create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let p = self.abs(path);

        if args.mode().is_dir() {
            self.client.create_dir(&p)?;
        } else {
            self.create_parent(&p)?;
            self.client
                .open_file()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&p)?;
        }
        Ok(RpCreate)
    }

    fn blocking_read(&self, path: &str, args: OpRead) -> Result<(RpRead, BlockingReader)> {
        let bs = self.read_range(path, args.range())?;
        Ok((RpRead::new(bs.len() as u64), Box::new(Cursor::new(bs))))
    }

    fn blocking_write(&self, path: &str, _: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let p = self.abs(path);

        self.create_parent(&p)?;
        let mut f = self
            .client
            .open_file()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&p)?;
        f.write_all(&bs)?;
        f.flush()?;

        Ok(RpWrite::new(bs.len() as u64))
    }

    fn blocking_stat(&self, path: &str, _: OpStat) -> Result<RpStat> {
        let meta = self.client.metadata(&self.abs(path))?;
        Ok(RpStat::new(to_metadata(&meta)))
    }

    fn blocking_delete(&self, path: &str, _: OpDelete) -> Result<RpDelete> {
        let p = self.abs(path);

        let meta = match self.client.metadata(&p) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RpDelete),
            Err(err) => return Err(err.into()),
        };

        if meta.is_dir() {
            self.client.remove_dir(&p)?;
        } else {
            self.client.remove_file(&p)?;
        }
        Ok(RpDelete)
    }

    fn blocking_list(&self, path: &str, _: OpList) -> Result<(RpList, BlockingObjectPager)> {
        Ok((RpList, Box::new(self.list_entries(path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_node_is_required() {
        let mut builder = HdfsBuilder::default();
        builder.root("/tmp/opendal");

        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendConfigInvalid);
        assert_eq!(err.context("service"), Some("hdfs"));
    }

    #[test]
    fn test_from_map() {
        let map = HashMap::from([
            ("root".to_string(), "/tmp/opendal".to_string()),
            ("name_node".to_string(), "hdfs://127.0.0.1:9000/".to_string()),
        ]);
        let builder = HdfsBuilder::from_map(map);

        assert_eq!(builder.root.as_deref(), Some("/tmp/opendal"));
        assert_eq!(builder.name_node.as_deref(), Some("hdfs://127.0.0.1:9000"));
    }
}
