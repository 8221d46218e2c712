//! Run orchestration: wires input, engine, scheduler, sink and progress
//! store together for one validation run.

pub mod progress;
pub mod scheduler;

pub use progress::ProgressStore;
pub use scheduler::{run_batches, RunSummary};

use std::path::Path;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::io::csv::{read_input, ResultSink};
use crate::verification::identity::ThreadRngSource;
use crate::verification::mx::DnsMxSource;
use crate::verification::smtp::LettreProber;
use crate::verification::{ValidationOutcome, Validator};

/// Validates every address in `input_path`, writing the three output files
/// derived from `output_base`. `on_finalized` fires once per finalized
/// address, in completion order.
pub async fn run_validation(
    config: Arc<Config>,
    input_path: &Path,
    output_base: &Path,
    on_finalized: impl FnMut(&ValidationOutcome),
) -> Result<RunSummary> {
    let input = read_input(input_path)?;
    tracing::info!("Processing {} emails from {}", input.rows.len(), input_path.display());

    let progress = Arc::new(ProgressStore::open(input_path, config.resume)?);
    // A resumed run appends: truncating here would drop the rows the
    // interrupted run already emitted for addresses the progress store
    // will never finalize again.
    let resuming = config.resume && !progress.is_empty();

    let mx_source = Arc::new(DnsMxSource::new(&config));
    let prober = Arc::new(LettreProber::new(&config));
    let rng = Arc::new(ThreadRngSource);

    let validator = Arc::new(Validator::new(
        config.clone(),
        mx_source,
        prober,
        progress,
        rng,
    ));
    let mut sink = ResultSink::create(output_base, &input.headers, input.email_index, resuming)?;

    let summary = run_batches(
        validator.clone(),
        &input.rows,
        &mut sink,
        config.flush_every,
        config.max_workers,
        on_finalized,
    )
    .await?;

    validator.progress().flush()?;
    sink.flush()?;

    log_summary(&summary, &sink);
    Ok(summary)
}

fn log_summary(summary: &RunSummary, sink: &ResultSink) {
    let finalized = summary.valid + summary.invalid;
    if finalized == 0 && summary.skipped == 0 {
        tracing::warn!("No emails were processed.");
        return;
    }
    tracing::info!("=== SUMMARY ===");
    tracing::info!("Total emails processed: {}", finalized);
    if finalized > 0 {
        tracing::info!(
            "Valid emails: {} ({:.1}%)",
            summary.valid,
            summary.valid as f64 / finalized as f64 * 100.0
        );
        tracing::info!(
            "Invalid emails: {} ({:.1}%)",
            summary.invalid,
            summary.invalid as f64 / finalized as f64 * 100.0
        );
    }
    if summary.skipped > 0 {
        tracing::info!("Skipped (already processed): {}", summary.skipped);
    }
    tracing::info!("Valid emails written to: {}", sink.valid_path.display());
    tracing::info!("Invalid emails written to: {}", sink.invalid_path.display());
    tracing::info!("Combined results written to: {}", sink.results_path.display());
}
