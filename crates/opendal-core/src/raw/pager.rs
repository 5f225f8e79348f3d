use async_trait::async_trait;
use opendal_common::Result;

use crate::metadata::ObjectEntry;

/// Page-by-page listing of a directory
#[async_trait]
pub trait ObjectPage: Send {
    /// Fetch the next page, `None` means the listing is finished.
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>>;
}

pub type ObjectPager = Box<dyn ObjectPage>;

#[async_trait]
impl ObjectPage for () {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        Ok(None)
    }
}

/// A listing that is fully known up front yields it as a single page.
#[async_trait]
impl ObjectPage for Option<Vec<ObjectEntry>> {
    async fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        Ok(self.take())
    }
}

/// Blocking version of [`ObjectPage`]
pub trait BlockingObjectPage: Send {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>>;
}

pub type BlockingObjectPager = Box<dyn BlockingObjectPage>;

impl BlockingObjectPage for () {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        Ok(None)
    }
}

impl BlockingObjectPage for Option<Vec<ObjectEntry>> {
    fn next_page(&mut self) -> Result<Option<Vec<ObjectEntry>>> {
        Ok(self.take())
    }
}
