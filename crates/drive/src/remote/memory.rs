//! In-memory drive implementation
//!
//! Used by tests and for dry experiments with the transfer engine. Keeps a
//! folder tree in HashMaps, serves it in fixed-size pages, and records every
//! call so tests can assert on pagination and batching behavior.

use anyhow::{Result, anyhow, bail};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::{ChildrenPage, DriveApi, ItemError, ItemOutcome, PermissionGrant};
use crate::models::{FileId, FileNode, TransferRequest};

/// Default number of entries per listing page
const DEFAULT_PAGE_SIZE: usize = 100;

/// Prefix of the page tokens handed out by the fake
const PAGE_TOKEN_PREFIX: &str = "offset:";

#[derive(Default)]
struct DriveState {
    nodes: HashMap<FileId, FileNode>,
    /// Folder id -> child ids in listing order
    children: HashMap<FileId, Vec<FileId>>,
    /// Current owner of each entry that changed hands
    owners: HashMap<FileId, String>,
    list_calls: Vec<(FileId, Option<String>)>,
    name_lookups: Vec<FileId>,
    batches: Vec<Vec<FileId>>,
    listing_failures: HashSet<FileId>,
    item_failures: HashMap<FileId, VecDeque<ItemError>>,
    batch_failures: VecDeque<String>,
    /// Outcome counts the next batches are cut down to
    batch_truncations: VecDeque<usize>,
}

/// Fake drive serving a folder tree from memory
pub struct InMemoryDrive {
    page_size: usize,
    state: Mutex<DriveState>,
}

impl InMemoryDrive {
    /// Create a drive containing only the root folder ("My Drive")
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty drive that lists `page_size` entries per page
    pub fn with_page_size(page_size: usize) -> Self {
        let mut state = DriveState::default();
        let root = FileNode::folder(FileId::root(), "My Drive", false);
        state.children.insert(root.id.clone(), Vec::new());
        state.nodes.insert(root.id.clone(), root);

        Self {
            page_size: page_size.max(1),
            state: Mutex::new(state),
        }
    }

    /// Add a folder under `parent` and return its id
    pub fn add_folder(&self, parent: &FileId, id: &str, name: &str, owned: bool) -> FileId {
        let node = FileNode::folder(id, name, owned);
        let mut state = self.lock();
        state.children.entry(node.id.clone()).or_default();
        Self::insert(&mut state, parent, node)
    }

    /// Add a file under `parent` and return its id
    pub fn add_file(&self, parent: &FileId, id: &str, name: &str, owned: bool) -> FileId {
        let node = FileNode::file(id, name, owned);
        let mut state = self.lock();
        Self::insert(&mut state, parent, node)
    }

    fn insert(state: &mut DriveState, parent: &FileId, node: FileNode) -> FileId {
        let id = node.id.clone();
        state.children.entry(parent.clone()).or_default().push(id.clone());
        state.nodes.insert(id.clone(), node);
        id
    }

    /// Make every listing of `folder` fail
    pub fn fail_listing(&self, folder: &FileId) {
        self.lock().listing_failures.insert(folder.clone());
    }

    /// Make the next transfer of `file` fail with `error` (queued, one per call)
    pub fn fail_transfer(&self, file: &FileId, error: ItemError) {
        self.lock()
            .item_failures
            .entry(file.clone())
            .or_default()
            .push_back(error);
    }

    /// Make the next batch exchange fail as a whole
    pub fn fail_next_batch(&self, message: &str) {
        self.lock().batch_failures.push_back(message.to_string());
    }

    /// Make the next batch answer only its first `outcomes` items
    pub fn truncate_next_batch(&self, outcomes: usize) {
        self.lock().batch_truncations.push_back(outcomes);
    }

    /// All listing calls made so far, as (folder, page token)
    pub fn list_calls(&self) -> Vec<(FileId, Option<String>)> {
        self.lock().list_calls.clone()
    }

    /// Ids whose name was looked up
    pub fn name_lookups(&self) -> Vec<FileId> {
        self.lock().name_lookups.clone()
    }

    /// Every batch submitted so far, as the file ids it carried
    pub fn submitted_batches(&self) -> Vec<Vec<FileId>> {
        self.lock().batches.clone()
    }

    /// New owner of `file`, if its ownership was transferred
    pub fn owner_of(&self, file: &FileId) -> Option<String> {
        self.lock().owners.get(file).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DriveState> {
        // A panic while holding the lock only happens inside a failing test
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn parse_offset(token: Option<&str>) -> Result<usize> {
        match token {
            None => Ok(0),
            Some(token) => token
                .strip_prefix(PAGE_TOKEN_PREFIX)
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| anyhow!("Invalid page token: {}", token)),
        }
    }

    fn transfer_one(state: &mut DriveState, request: &TransferRequest) -> ItemOutcome {
        if let Some(error) = state
            .item_failures
            .get_mut(&request.file_id)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let Some(node) = state.nodes.get_mut(&request.file_id) else {
            return Err(ItemError::new(
                404,
                Some("notFound".to_string()),
                format!("File not found: {}", request.file_id),
            ));
        };
        node.is_owned_by_caller = false;
        state
            .owners
            .insert(request.file_id.clone(), request.new_owner.clone());

        Ok(PermissionGrant {
            permission_id: format!("perm-{}", request.file_id),
            role: "owner".to_string(),
        })
    }
}

impl Default for InMemoryDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveApi for InMemoryDrive {
    fn list_children(&self, folder_id: &FileId, page_token: Option<&str>) -> Result<ChildrenPage> {
        let mut state = self.lock();
        state
            .list_calls
            .push((folder_id.clone(), page_token.map(str::to_string)));

        if state.listing_failures.contains(folder_id) {
            bail!("Listing failed for folder {}", folder_id);
        }

        let children = state
            .children
            .get(folder_id)
            .ok_or_else(|| anyhow!("Folder not found: {}", folder_id))?;

        let offset = Self::parse_offset(page_token)?;
        let end = (offset + self.page_size).min(children.len());
        let nodes = children
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| state.nodes.get(id).cloned())
            .collect();
        let next_page_token = (end < children.len()).then(|| format!("{PAGE_TOKEN_PREFIX}{end}"));

        Ok(ChildrenPage {
            nodes,
            next_page_token,
        })
    }

    fn file_name(&self, file_id: &FileId) -> Result<String> {
        let mut state = self.lock();
        state.name_lookups.push(file_id.clone());
        state
            .nodes
            .get(file_id)
            .map(|node| node.name.clone())
            .ok_or_else(|| anyhow!("File not found: {}", file_id))
    }

    fn transfer_ownership_batch(&self, requests: &[TransferRequest]) -> Result<Vec<ItemOutcome>> {
        let mut state = self.lock();
        state
            .batches
            .push(requests.iter().map(|r| r.file_id.clone()).collect());

        if let Some(message) = state.batch_failures.pop_front() {
            bail!("Batch request failed: {}", message);
        }

        let answered = state
            .batch_truncations
            .pop_front()
            .unwrap_or(requests.len())
            .min(requests.len());

        Ok(requests[..answered]
            .iter()
            .map(|request| Self::transfer_one(&mut state, request))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_tokens() {
        let drive = InMemoryDrive::with_page_size(2);
        let root = FileId::root();
        for i in 0..5 {
            drive.add_file(&root, &format!("f{i}"), &format!("file {i}"), true);
        }

        let first = drive.list_children(&root, None).unwrap();
        assert_eq!(first.nodes.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("offset:2"));

        let last = drive.list_children(&root, Some("offset:4")).unwrap();
        assert_eq!(last.nodes.len(), 1);
        assert_eq!(last.next_page_token, None);
        assert_eq!(drive.list_calls().len(), 2);
    }

    #[test]
    fn test_transfer_changes_owner() {
        let drive = InMemoryDrive::new();
        let file = drive.add_file(&FileId::root(), "f1", "doc", true);

        let outcomes = drive
            .transfer_ownership_batch(&[TransferRequest::new(file.clone(), "doc", "new@example.com")])
            .unwrap();

        assert!(outcomes[0].is_ok());
        assert_eq!(drive.owner_of(&file).as_deref(), Some("new@example.com"));
        let page = drive.list_children(&FileId::root(), None).unwrap();
        assert!(!page.nodes[0].is_owned_by_caller);
    }

    #[test]
    fn test_injected_item_failure_is_consumed_once() {
        let drive = InMemoryDrive::new();
        let file = drive.add_file(&FileId::root(), "f1", "doc", true);
        drive.fail_transfer(&file, ItemError::new(500, None, "boom"));
        let request = TransferRequest::new(file.clone(), "doc", "new@example.com");

        let first = drive.transfer_ownership_batch(std::slice::from_ref(&request)).unwrap();
        assert_eq!(first[0].as_ref().unwrap_err().status, 500);

        let second = drive.transfer_ownership_batch(&[request]).unwrap();
        assert!(second[0].is_ok());
    }

    #[test]
    fn test_truncated_batch_leaves_tail_untouched() {
        let drive = InMemoryDrive::new();
        let first = drive.add_file(&FileId::root(), "f1", "one", true);
        let second = drive.add_file(&FileId::root(), "f2", "two", true);
        drive.truncate_next_batch(1);

        let outcomes = drive
            .transfer_ownership_batch(&[
                TransferRequest::new(first.clone(), "one", "new@example.com"),
                TransferRequest::new(second.clone(), "two", "new@example.com"),
            ])
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(drive.owner_of(&first).is_some());
        assert!(drive.owner_of(&second).is_none());
    }

    #[test]
    fn test_unknown_folder_and_listing_failure() {
        let drive = InMemoryDrive::new();
        assert!(drive.list_children(&FileId::new("missing"), None).is_err());

        let folder = drive.add_folder(&FileId::root(), "a", "A", true);
        drive.fail_listing(&folder);
        assert!(drive.list_children(&folder, None).is_err());
    }
}
