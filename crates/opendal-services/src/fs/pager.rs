use std::fs::FileType;
use std::path::Path;

use async_trait::async_trait;
use opendal_common::Result;
use opendal_core::raw::*;

const PAGE_SIZE: usize = 256;

pub(super) struct FsPager<R> {
    root: String,
    rd: R,
}

impl<R> FsPager<R> {
    pub(super) fn new(root: &str, rd: R) -> Self {
        Self {
            root: root.to_string(),
            rd,
        }
    }

    fn entry(&self, path: &Path, ft: FileType) -> ObjectEntry {
        let rel = build_rel_path(&self.root, &path.to_string_lossy());

        if ft.is_dir() {
            ObjectEntry::new(&format!("{rel}/"), ObjectMetadata::new(ObjectMode::DIR))
        } else if ft.is_file() {
            ObjectEntry::new(&rel, ObjectMetadata::new(ObjectMode::FILE))
        } else {
            ObjectEntry::new(&rel, ObjectMetadata::new(ObjectMode::Unknown))
        }
    }
}

#[async_trait]
impl ObjectPage for FsPager<tokio::fs::ReadDir> {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        let mut entries = Vec::with_capacity(PAGE_SIZE);

        while entries.len() < PAGE_SIZE {
            let Some(de) = self.rd.next_entry().await? else {
                break;
            };
            let ft = de.file_type().await?;
            entries.push(self.entry(&de.path(), ft));
        }

        Ok(if entries.is_empty() {
            None
        } else {
            Some(entries)
        })
    }
}

impl BlockingObjectPage for FsPager<std::fs::ReadDir> {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        let mut entries = Vec::with_capacity(PAGE_SIZE);

        while entries.len() < PAGE_SIZE {
            let Some(de) = self.rd.next() else {
                break;
            };
            let de = de?;
            entries.push(self.entry(&de.path(), de.file_type()?));
        }

        Ok(if entries.is_empty() {
            None
        } else {
            Some(entries)
        })
    }
}
