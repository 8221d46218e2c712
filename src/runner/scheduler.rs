//! Batched bounded-concurrency dispatch of pending addresses.
//!
//! Pending rows are processed in sequential batches of `max_workers`; within
//! a batch every address runs concurrently, each awaiting its per-domain
//! delay (plus jitter in anti-abuse mode) before invoking the engine. Batch
//! N+1 never starts before batch N has fully completed, which bounds peak
//! concurrency to the batch size.

use std::sync::Arc;

use futures::future::join_all;

use crate::core::error::Result;
use crate::io::csv::{InputRow, ResultSink};
use crate::verification::{ValidationOutcome, ValidationReason, Validator};

/// Aggregate counts for one run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub total_rows: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Already-processed duplicates and resumed addresses.
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &ValidationOutcome) {
        if outcome.reason == ValidationReason::AlreadyProcessed {
            self.skipped += 1;
        } else if outcome.is_deliverable {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
    }
}

/// Drives the engine over all pending rows, streaming finalized outcomes
/// into the sink. Progress and sink state are flushed after every completed
/// batch and additionally every `flush_every` finalized addresses.
pub async fn run_batches(
    validator: Arc<Validator>,
    rows: &[InputRow],
    sink: &mut ResultSink,
    flush_every: usize,
    batch_size: usize,
    mut on_finalized: impl FnMut(&ValidationOutcome),
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        total_rows: rows.len(),
        ..RunSummary::default()
    };
    let mut since_flush = 0usize;

    for (batch_index, batch) in rows.chunks(batch_size.max(1)).enumerate() {
        tracing::debug!(target: "scheduler",
            "Dispatching batch {} ({} addresses)", batch_index + 1, batch.len());

        let tasks = batch.iter().map(|row| {
            let validator = validator.clone();
            async move {
                let delay = validator.pre_probe_delay(&row.email_raw);
                tokio::time::sleep(delay).await;
                let outcome = validator.validate(&row.email_raw).await;
                (row, outcome)
            }
        });

        // Completion order within the batch is not input order; every
        // address is still finalized exactly once.
        for (row, outcome) in join_all(tasks).await {
            summary.record(&outcome);
            sink.append(row, &outcome)?;
            on_finalized(&outcome);

            since_flush += 1;
            if since_flush >= flush_every {
                validator.progress().flush()?;
                sink.flush()?;
                since_flush = 0;
            }
        }

        validator.progress().flush()?;
        sink.flush()?;
        since_flush = 0;
    }

    Ok(summary)
}
