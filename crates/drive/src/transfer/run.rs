//! Top-level ownership transfer

use anyhow::Result;
use log::{info, warn};

use super::accumulator::{BatchAccumulator, MAX_BATCH_SIZE};
use super::backoff::Backoff;
use super::policy::FailurePolicy;
use super::report::TransferReport;
use super::walker::TreeWalker;
use crate::models::{FileId, FileNode, TransferRequest};
use crate::remote::DriveApi;

/// Parameters of a transfer run
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// E-mail address of the new owner
    pub new_owner: String,
    /// Folder whose tree is transferred
    pub folder: FileId,
    /// Display name of `folder`; looked up when `None`
    pub folder_name: Option<String>,
    pub batch_size: usize,
    pub max_depth: usize,
}

impl TransferOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    /// Transfer the caller's whole drive to `new_owner`
    pub fn new(new_owner: impl Into<String>) -> Self {
        Self {
            new_owner: new_owner.into(),
            folder: FileId::root(),
            folder_name: None,
            batch_size: MAX_BATCH_SIZE,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn folder(mut self, folder: FileId) -> Self {
        self.folder = folder;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Transfer every caller-owned entry below `options.folder` to the new owner
///
/// Entries are queued as the tree is walked and submitted in batches of
/// `options.batch_size`. A listing failure aborts the run: the error is
/// returned and the open batch is discarded unsubmitted.
pub fn transfer_ownership<'a>(
    api: &'a dyn DriveApi,
    options: &TransferOptions,
    policy: Box<dyn FailurePolicy + 'a>,
    backoff: Backoff,
) -> Result<TransferReport> {
    info!("Changing all files to owner '{}'", options.new_owner);

    let mut accumulator = BatchAccumulator::new(api, options.batch_size, policy, backoff);
    let mut walker = TreeWalker::new(api, options.max_depth);

    let walked = walker.walk(
        &options.folder,
        options.folder_name.as_deref(),
        &mut |node: &FileNode| {
            if node.is_owned_by_caller {
                accumulator.add(TransferRequest::for_node(node, &options.new_owner));
            }
            Ok(())
        },
    );

    if let Err(e) = walked {
        let discarded = accumulator.discard();
        if discarded > 0 {
            warn!("{} queued transfers were not submitted", discarded);
        }
        return Err(e);
    }

    let mut report = accumulator.finish();
    let listing = walker.stats();
    report.stats.folders_listed = listing.folders_listed;
    report.stats.pages_listed = listing.pages_listed;
    report.stats.nodes_seen = listing.nodes_seen;

    info!(
        "Transfer finished: {} succeeded, {} failed, {} batches",
        report.stats.succeeded, report.stats.failed, report.stats.batches
    );
    Ok(report)
}
