//! Statistics and dead letters collected during a transfer

use serde::Serialize;

use crate::models::TransferRequest;
use crate::remote::ItemError;

/// Counters from a transfer run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    /// Folders whose children were listed
    pub folders_listed: usize,
    /// Listing pages fetched
    pub pages_listed: usize,
    /// Entries seen in listings
    pub nodes_seen: usize,
    /// Entries owned by the caller and queued for transfer
    pub queued: usize,
    /// Batches submitted
    pub batches: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failed transfers queued again
    pub retried: usize,
    pub dropped: usize,
    pub dead_lettered: usize,
}

/// A failed transfer kept for manual follow-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadLetterEntry {
    pub file_id: String,
    pub file_name: String,
    pub new_owner: String,
    pub attempts: u32,
    pub status: u16,
    pub reason: Option<String>,
    pub message: String,
}

impl DeadLetterEntry {
    pub fn new(request: &TransferRequest, error: &ItemError) -> Self {
        Self {
            file_id: request.file_id.to_string(),
            file_name: request.file_name.clone(),
            new_owner: request.new_owner.clone(),
            attempts: request.attempts + 1,
            status: error.status,
            reason: error.reason.clone(),
            message: error.message.clone(),
        }
    }
}

/// Result of a completed transfer run
#[derive(Debug, Default, Clone, Serialize)]
pub struct TransferReport {
    pub stats: TransferStats,
    pub dead_letters: Vec<DeadLetterEntry>,
}
