//! Pending ownership transfer

use super::{FileId, FileNode};

/// One ownership-transfer operation waiting in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub file_id: FileId,
    /// Display name, used for logging and dead-letter records only
    pub file_name: String,
    /// E-mail address of the new owner
    pub new_owner: String,
    /// Number of previous submissions of this request that failed
    pub attempts: u32,
}

impl TransferRequest {
    pub fn new(file_id: FileId, file_name: impl Into<String>, new_owner: impl Into<String>) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
            new_owner: new_owner.into(),
            attempts: 0,
        }
    }

    /// Build a request transferring `node` to `new_owner`
    pub fn for_node(node: &FileNode, new_owner: &str) -> Self {
        Self::new(node.id.clone(), node.name.clone(), new_owner)
    }

    /// The same request, marked as having failed once more
    pub fn next_attempt(mut self) -> Self {
        self.attempts += 1;
        self
    }
}
