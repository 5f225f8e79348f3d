use async_trait::async_trait;
use http::StatusCode;
use opendal_common::{ErrorKind, Result};
use opendal_core::raw::*;
use serde::Deserialize;

use super::backend::IpmfsBackend;
use super::error::{parse_error, parse_json_error, parse_reqwest_error};

/// `files/ls` returns the whole directory at once, so the pager yields a
/// single page.
pub(super) struct IpmfsPager {
    backend: IpmfsBackend,
    path: String,
    done: bool,
}

impl IpmfsPager {
    pub(super) fn new(backend: IpmfsBackend, path: &str) -> Self {
        Self {
            backend,
            path: path.to_string(),
            done: false,
        }
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct IpfsLsResponse {
    #[serde(rename = "Entries")]
    entries: Option<Vec<IpfsLsEntry>>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct IpfsLsEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    file_type: i64,
    #[serde(rename = "Size")]
    size: u64,
}

impl IpfsLsEntry {
    fn into_entry(self, parent: &str) -> ObjectEntry {
        if self.file_type == 1 {
            ObjectEntry::new(
                &format!("{parent}{}/", self.name),
                ObjectMetadata::new(ObjectMode::DIR),
            )
        } else {
            ObjectEntry::new(
                &format!("{parent}{}", self.name),
                ObjectMetadata::new(ObjectMode::FILE).with_content_length(self.size),
            )
        }
    }
}

#[async_trait]
impl ObjectPage for IpmfsPager {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let p = build_rooted_abs_path(self.backend.root(), &self.path);
        let resp = self.backend.ipmfs_ls(&p).await?;

        if resp.status() != StatusCode::OK {
            let err = parse_error(resp).await;
            return match err.kind() {
                ErrorKind::ObjectNotFound => Ok(None),
                _ => Err(err),
            };
        }

        let bs = resp.bytes().await.map_err(parse_reqwest_error)?;
        let listed: IpfsLsResponse = serde_json::from_slice(&bs).map_err(parse_json_error)?;

        let parent = if self.path == "/" { "" } else { &self.path };
        let entries: Vec<ObjectEntry> = listed
            .entries
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.into_entry(parent))
            .collect();

        Ok(if entries.is_empty() {
            None
        } else {
            Some(entries)
        })
    }
}
