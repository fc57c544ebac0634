//! Drive crate - recursive ownership transfer for Google Drive
//!
//! This crate provides:
//! - Domain models (FileId, FileNode, TransferRequest)
//! - The `DriveApi` seam plus an in-memory drive for tests
//! - Google Drive v3 client, batch codec and OAuth authentication
//! - The transfer engine: tree walker, batch accumulator, backoff and
//!   failure policies
//!
//! The engine is synchronous and single-threaded; all mutable state lives in
//! the accumulator passed through the traversal.

pub mod config;
pub mod google;
pub mod models;
pub mod remote;
pub mod transfer;

pub use config::DriveCredentials;
pub use google::{AuthOptions, DriveAuth, DriveClient};
pub use models::{FileId, FileNode, TransferRequest};
pub use remote::{ChildrenPage, DriveApi, InMemoryDrive, ItemError, ItemOutcome, PermissionGrant};
pub use transfer::{
    Backoff, BackoffOptions, BatchAccumulator, DeadLetterEntry, DeadLetterFailed, DropFailed,
    FailureAction, FailurePolicy, MAX_BATCH_SIZE, RetryFailed, Sleeper, ThreadSleeper,
    TransferOptions, TransferReport, TransferStats, TraversalError, TreeWalker,
    transfer_ownership,
};
