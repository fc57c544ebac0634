//! Batch accumulator for ownership transfers
//!
//! Holds at most one open batch. The batch is opened on the first request,
//! executed synchronously as soon as it is full, and replaced by an empty
//! one. `finish` executes whatever is left and returns the run's report.

use log::{debug, info, warn};
use std::iter;

use super::backoff::Backoff;
use super::policy::{FailureAction, FailurePolicy};
use super::report::{DeadLetterEntry, TransferReport};
use crate::models::TransferRequest;
use crate::remote::{DriveApi, ItemError, ItemOutcome};

/// Largest batch the Drive batch endpoint accepts
pub const MAX_BATCH_SIZE: usize = 100;

/// Buffers transfer requests and submits them in batches
pub struct BatchAccumulator<'a> {
    api: &'a dyn DriveApi,
    capacity: usize,
    /// `None` until the first request arrives and again after `finish`
    pending: Option<Vec<TransferRequest>>,
    policy: Box<dyn FailurePolicy + 'a>,
    backoff: Backoff,
    report: TransferReport,
}

impl<'a> BatchAccumulator<'a> {
    /// Create an accumulator flushing every `capacity` requests (at most 100)
    pub fn new(
        api: &'a dyn DriveApi,
        capacity: usize,
        policy: Box<dyn FailurePolicy + 'a>,
        backoff: Backoff,
    ) -> Self {
        Self {
            api,
            capacity: capacity.clamp(1, MAX_BATCH_SIZE),
            pending: None,
            policy,
            backoff,
            report: TransferReport::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of requests in the open batch
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, Vec::len)
    }

    /// True when no batch is open
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Queue a new transfer, executing the batch if it becomes full
    pub fn add(&mut self, request: TransferRequest) {
        self.report.stats.queued += 1;
        self.push(request);
    }

    fn push(&mut self, request: TransferRequest) {
        let batch = self.pending.get_or_insert_with(Vec::new);
        batch.push(request);
        if batch.len() < self.capacity {
            return;
        }

        let full = std::mem::replace(batch, Vec::with_capacity(self.capacity));
        info!("Maximum batch size reached. Executing batch…");
        self.execute(full);
        info!("Batch execution finished.");
    }

    /// Execute the remaining batch and return the report
    pub fn finish(mut self) -> TransferReport {
        // Retries queued while executing land in a new batch, hence the loop
        while let Some(batch) = self.pending.take().filter(|b| !b.is_empty()) {
            info!("Executing final batch…");
            self.execute(batch);
            info!("Batch execution finished.");
        }
        self.report
    }

    /// Drop the open batch without executing it, returning how many requests it held
    pub fn discard(mut self) -> usize {
        self.pending.take().map_or(0, |batch| batch.len())
    }

    fn execute(&mut self, batch: Vec<TransferRequest>) {
        self.report.stats.batches += 1;
        debug!("Submitting batch of {} transfers", batch.len());

        // A failed exchange is throttled once, not once per item it carried
        let mut exchange_failed = false;
        let outcomes: Vec<ItemOutcome> = match self.api.transfer_ownership_batch(&batch) {
            Ok(outcomes) => {
                if outcomes.len() != batch.len() {
                    warn!(
                        "Batch returned {} outcomes for {} requests",
                        outcomes.len(),
                        batch.len()
                    );
                }
                outcomes
            }
            Err(e) => {
                warn!("Batch execution failed: {:#}", e);
                exchange_failed = true;
                self.backoff.on_failure();
                let error = ItemError::transport(format!("{:#}", e));
                vec![Err(error); batch.len()]
            }
        };

        let outcomes = outcomes
            .into_iter()
            .map(Some)
            .chain(iter::repeat_with(|| None));

        let mut retries = Vec::new();
        for (request, outcome) in batch.into_iter().zip(outcomes) {
            let outcome = outcome
                .unwrap_or_else(|| Err(ItemError::transport("No outcome reported for item")));
            if let Some(retry) = self.dispatch(request, outcome, !exchange_failed) {
                retries.push(retry);
            }
        }

        for request in retries {
            self.push(request);
        }
    }

    /// Handle one item outcome; returns the request if it must be queued again
    ///
    /// `throttle` is false when the backoff was already applied to the whole exchange.
    fn dispatch(
        &mut self,
        request: TransferRequest,
        outcome: ItemOutcome,
        throttle: bool,
    ) -> Option<TransferRequest> {
        let stats = &mut self.report.stats;
        match outcome {
            Ok(grant) => {
                stats.succeeded += 1;
                debug!(
                    "[✓] '{}' ({}) now owned by {} [{}]",
                    request.file_name, request.file_id, request.new_owner, grant.permission_id
                );
                self.backoff.on_success();
                None
            }
            Err(error) => {
                stats.failed += 1;
                warn!(
                    "Transfer of '{}' ({}) failed: {}",
                    request.file_name, request.file_id, error
                );
                if throttle {
                    self.backoff.on_failure();
                }

                match self.policy.on_failure(&request, &error) {
                    FailureAction::Drop => {
                        self.report.stats.dropped += 1;
                        None
                    }
                    FailureAction::Retry => {
                        self.report.stats.retried += 1;
                        Some(request.next_attempt())
                    }
                    FailureAction::DeadLetter => {
                        self.report.stats.dead_lettered += 1;
                        self.report
                            .dead_letters
                            .push(DeadLetterEntry::new(&request, &error));
                        None
                    }
                }
            }
        }
    }
}
