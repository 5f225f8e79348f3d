use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use opendal_common::{Error, ErrorKind, Result, Scheme};
use opendal_core::Builder;
use opendal_core::raw::*;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::error::{parse_error, parse_json_error, parse_reqwest_error};
use super::pager::IpmfsPager;

const DEFAULT_IPMFS_ENDPOINT: &str = "http://localhost:5001";

/// IPFS Mutable File System service
///
/// Keys from the environment: `root` (default `/`) and `endpoint`
/// (default `http://localhost:5001`).
#[derive(Debug, Default, Clone)]
pub struct IpmfsBuilder {
    root: Option<String>,
    endpoint: Option<String>,
    client: Option<Client>,
}

impl IpmfsBuilder {
    pub fn root(&mut self, root: &str) -> &mut Self {
        if !root.is_empty() {
            self.root = Some(root.to_string());
        }
        self
    }

    /// Address of the Kubo RPC API, e.g. `http://127.0.0.1:5001`.
    pub fn endpoint(&mut self, endpoint: &str) -> &mut Self {
        if !endpoint.is_empty() {
            self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        }
        self
    }

    /// Use a customized HTTP client.
    pub fn http_client(&mut self, client: Client) -> &mut Self {
        self.client = Some(client);
        self
    }
}

impl Builder for IpmfsBuilder {
    const SCHEME: Scheme = Scheme::Ipmfs;
    type Accessor = IpmfsBackend;

    fn from_map(map: HashMap<String, String>) -> Self {
        let mut builder = IpmfsBuilder::default();

        if let Some(v) = map.get("root") {
            builder.root(v);
        }
        if let Some(v) = map.get("endpoint") {
            builder.endpoint(v);
        }

        builder
    }

    fn build(&mut self) -> Result<Self::Accessor> {
        debug!(builder = ?self, "ipmfs backend build started");

        let root = normalize_root(&self.root.take().unwrap_or_default());
        let endpoint = self
            .endpoint
            .take()
            .unwrap_or_else(|| DEFAULT_IPMFS_ENDPOINT.to_string());

        let client = match self.client.take() {
            Some(client) => client,
            None => Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Unexpected, "build http client")
                        .with_context("service", Scheme::Ipmfs)
                        .set_source(err)
                })?,
        };

        debug!(root = %root, endpoint = %endpoint, "ipmfs backend build finished");
        Ok(IpmfsBackend {
            root,
            endpoint,
            client,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IpmfsBackend {
    root: String,
    endpoint: String,
    client: Client,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct IpfsStat {
    #[serde(rename = "Size")]
    size: u64,
    #[serde(rename = "Type")]
    file_type: String,
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpmfsBackend {
    fn url(&self, cmd: &str) -> String {
        format!("{}/api/v0/files/{}", self.endpoint, cmd)
    }

    async fn send(&self, cmd: &str, query: &[(&str, String)], form: Option<Form>) -> Result<Response> {
        let mut req = self.client.post(self.url(cmd)).query(query);
        if let Some(form) = form {
            req = req.multipart(form);
        }
        req.send().await.map_err(parse_reqwest_error)
    }

    async fn ipmfs_stat(&self, p: &str) -> Result<IpfsStat> {
        let resp = self.send("stat", &[("arg", p.to_string())], None).await?;
        if resp.status() != StatusCode::OK {
            return Err(parse_error(resp).await);
        }

        let bs = resp.bytes().await.map_err(parse_reqwest_error)?;
        serde_json::from_slice(&bs).map_err(parse_json_error)
    }

    async fn ipmfs_read(&self, p: &str, offset: Option<u64>, count: Option<u64>) -> Result<Bytes> {
        let mut query = vec![("arg", p.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(count) = count {
            query.push(("count", count.to_string()));
        }

        let resp = self.send("read", &query, None).await?;
        if resp.status() != StatusCode::OK {
            return Err(parse_error(resp).await);
        }
        resp.bytes().await.map_err(parse_reqwest_error)
    }

    async fn ipmfs_write(&self, p: &str, bs: Bytes) -> Result<()> {
        let query = [
            ("arg", p.to_string()),
            ("parents", "true".to_string()),
            ("create", "true".to_string()),
            ("truncate", "true".to_string()),
        ];
        let form = Form::new().part("data", Part::bytes(bs.to_vec()));

        let resp = self.send("write", &query, Some(form)).await?;
        if resp.status() != StatusCode::OK {
            return Err(parse_error(resp).await);
        }
        Ok(())
    }

    async fn ipmfs_mkdir(&self, p: &str) -> Result<()> {
        let query = [("arg", p.to_string()), ("parents", "true".to_string())];

        let resp = self.send("mkdir", &query, None).await?;
        if resp.status() != StatusCode::OK {
            return Err(parse_error(resp).await);
        }
        Ok(())
    }

    async fn ipmfs_rm(&self, p: &str) -> Result<()> {
        let query = [("arg", p.to_string()), ("recursive", "true".to_string())];

        let resp = self.send("rm", &query, None).await?;
        if resp.status() != StatusCode::OK {
            return Err(parse_error(resp).await);
        }
        Ok(())
    }

    pub(super) async fn ipmfs_ls(&self, p: &str) -> Result<Response> {
        let query = [("arg", p.to_string()), ("long", "true".to_string())];
        self.send("ls", &query, None).await
    }
}

#[async_trait]
impl Accessor for IpmfsBackend {
    fn metadata(&self) -> AccessorMetadata {
        let mut am = AccessorMetadata::new(Scheme::Ipmfs);
        am.set_root(&self.root)
            .set_name(&self.endpoint)
            .set_capability(Capability::read_write().with_list());
        am
    }

    async fn create(&self, path: &str, args: OpCreate) -> Result<RpCreate> {
        let p = build_rooted_abs_path(&self.root, path);

        if args.mode().is_dir() {
            self.ipmfs_mkdir(&p).await?;
        } else {
            self.ipmfs_write(&p, Bytes::new()).await?;
        }
        Ok(RpCreate)
    }

    async fn read(&self, path: &str, args: OpRead) -> Result<(RpRead, Reader)> {
        let p = build_rooted_abs_path(&self.root, path);
        let range = args.range();

        let (offset, count) = match (range.offset(), range.size()) {
            (None, Some(_)) => {
                let total = self.ipmfs_stat(&p).await?.size;
                let (start, end) = range.resolve(total);
                (Some(start), Some(end - start))
            }
            (offset, size) => (offset, size),
        };

        let bs = self.ipmfs_read(&p, offset, count).await?;
        Ok((RpRead::new(bs.len() as u64), Box::new(Cursor::new(bs))))
    }

    async fn write(&self, path: &str, _: OpWrite, bs: Bytes) -> Result<RpWrite> {
        let p = build_rooted_abs_path(&self.root, path);

        let written = bs.len() as u64;
        self.ipmfs_write(&p, bs).await?;
        Ok(RpWrite::new(written))
    }

    async fn stat(&self, path: &str, _: OpStat) -> Result<RpStat> {
        let p = build_rooted_abs_path(&self.root, path);
        let stat = self.ipmfs_stat(&p).await?;

        let mode = match stat.file_type.as_str() {
            "file" => ObjectMode::FILE,
            "directory" => ObjectMode::DIR,
            _ => ObjectMode::Unknown,
        };

        let mut meta = ObjectMetadata::new(mode).with_content_length(stat.size);
        if !stat.hash.is_empty() {
            meta = meta.with_etag(&stat.hash);
        }
        Ok(RpStat::new(meta))
    }

    async fn delete(&self, path: &str, _: OpDelete) -> Result<RpDelete> {
        let p = build_rooted_abs_path(&self.root, path);

        match self.ipmfs_rm(&p).await {
            Ok(()) => Ok(RpDelete),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(RpDelete),
            Err(err) => Err(err),
        }
    }

    async fn list(&self, path: &str, _: OpList) -> Result<(RpList, ObjectPager)> {
        Ok((RpList, Box::new(IpmfsPager::new(self.clone(), path))))
    }
}

impl IpmfsBackend {
    pub(super) fn root(&self) -> &str {
        &self.root
    }
}
