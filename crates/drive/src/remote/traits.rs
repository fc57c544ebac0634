//! DriveApi trait definition

use anyhow::Result;

use super::ItemError;
use crate::models::{FileId, FileNode, TransferRequest};

/// One page of a folder listing
#[derive(Debug, Clone, Default)]
pub struct ChildrenPage {
    pub nodes: Vec<FileNode>,
    /// Token for the next page; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Permission created by a successful ownership transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub permission_id: String,
    pub role: String,
}

/// Outcome of one item inside a batch
pub type ItemOutcome = std::result::Result<PermissionGrant, ItemError>;

/// Operations the transfer engine needs from the storage provider
pub trait DriveApi {
    /// List one page of non-trashed entries directly inside `folder_id`
    fn list_children(&self, folder_id: &FileId, page_token: Option<&str>) -> Result<ChildrenPage>;

    /// Fetch the display name of a single entry
    fn file_name(&self, file_id: &FileId) -> Result<String>;

    /// Submit one batch of ownership transfers
    ///
    /// Returns one outcome per request, in request order. An `Err` means the
    /// batch exchange itself failed and no per-item outcome is known.
    fn transfer_ownership_batch(&self, requests: &[TransferRequest]) -> Result<Vec<ItemOutcome>>;
}
