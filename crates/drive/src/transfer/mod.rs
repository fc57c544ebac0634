//! Recursive ownership transfer engine
//!
//! - `walker`: depth-first traversal of a folder tree through paginated listings
//! - `accumulator`: bounded batch of pending transfers, flushed when full
//! - `backoff`: quadratic delay applied after each failed item
//! - `policy`: what happens to a failed transfer (drop, retry, dead-letter)
//! - `report`: counters and dead-letter records of a run

mod accumulator;
mod backoff;
mod policy;
mod report;
mod run;
mod walker;

pub use accumulator::{BatchAccumulator, MAX_BATCH_SIZE};
pub use backoff::{Backoff, BackoffOptions, Sleeper, ThreadSleeper};
pub use policy::{DeadLetterFailed, DropFailed, FailureAction, FailurePolicy, RetryFailed};
pub use report::{DeadLetterEntry, TransferReport, TransferStats};
pub use run::{TransferOptions, transfer_ownership};
pub use walker::{TraversalError, TreeWalker};
