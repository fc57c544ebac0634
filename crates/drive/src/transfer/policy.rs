//! Failure policies for ownership transfers
//!
//! A failed batch item is handed to a `FailurePolicy`, which decides whether
//! the request is dropped, queued again, or kept as a dead letter.

use crate::models::TransferRequest;
use crate::remote::ItemError;

/// What to do with a failed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Forget the request
    Drop,
    /// Queue the request again in the open batch
    Retry,
    /// Record the request in the report's dead-letter list
    DeadLetter,
}

/// Decides the fate of failed transfers
pub trait FailurePolicy {
    fn on_failure(&mut self, request: &TransferRequest, error: &ItemError) -> FailureAction;
}

/// Drop every failed transfer
#[derive(Debug, Default, Clone, Copy)]
pub struct DropFailed;

impl FailurePolicy for DropFailed {
    fn on_failure(&mut self, _request: &TransferRequest, _error: &ItemError) -> FailureAction {
        FailureAction::Drop
    }
}

/// Record every failed transfer as a dead letter
#[derive(Debug, Default, Clone, Copy)]
pub struct DeadLetterFailed;

impl FailurePolicy for DeadLetterFailed {
    fn on_failure(&mut self, _request: &TransferRequest, _error: &ItemError) -> FailureAction {
        FailureAction::DeadLetter
    }
}

/// Retry failed transfers a bounded number of times
#[derive(Debug, Clone, Copy)]
pub struct RetryFailed {
    max_retries: u32,
    transient_only: bool,
    exhausted: FailureAction,
}

impl RetryFailed {
    /// Retry each request up to `max_retries` times, then drop it
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            transient_only: false,
            exhausted: FailureAction::Drop,
        }
    }

    /// Only retry errors that may go away (rate limits, server errors)
    pub fn transient_only(mut self) -> Self {
        self.transient_only = true;
        self
    }

    /// Dead-letter requests instead of dropping them once retries are exhausted
    pub fn then_dead_letter(mut self) -> Self {
        self.exhausted = FailureAction::DeadLetter;
        self
    }
}

impl FailurePolicy for RetryFailed {
    fn on_failure(&mut self, request: &TransferRequest, error: &ItemError) -> FailureAction {
        let retryable = !self.transient_only || error.is_transient();
        if retryable && request.attempts < self.max_retries {
            FailureAction::Retry
        } else {
            self.exhausted
        }
    }
}
