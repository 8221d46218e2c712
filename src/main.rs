//! mailprobe command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use mailprobe_core::{run_validation, ConfigBuilder};

#[derive(Parser, Debug)]
#[command(
    name = "mailprobe",
    version,
    about = "Validate bulk email lists via syntax checks, MX lookups and SMTP probing."
)]
struct Cli {
    /// Input CSV file with an `email` column.
    input: PathBuf,

    /// Output base path; `_valid`, `_invalid` and `_results` files are
    /// derived from it.
    #[arg(default_value = "cleaned_emails.csv")]
    output: PathBuf,

    /// Delay in seconds awaited before each probe.
    #[arg(long, default_value_t = 1.0)]
    delay: f64,

    /// Maximum number of addresses validated concurrently.
    #[arg(long, default_value_t = 20)]
    max_workers: usize,

    /// Skip live SMTP probing; accept any address whose domain has a mail
    /// exchanger.
    #[arg(long)]
    skip_smtp: bool,

    /// Disable anti-abuse behavior (randomized identities, jitter and
    /// per-domain rate limiting).
    #[arg(long)]
    no_anti_abuse: bool,

    /// Ignore the progress file and revalidate every address.
    #[arg(long)]
    no_resume: bool,

    /// TOML configuration file.
    #[arg(long, env = "MAILPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut builder = ConfigBuilder::new();
    if let Some(path) = &cli.config {
        builder = builder.with_config_file(path)?;
    }
    let config = builder
        .base_delay(cli.delay)
        .max_workers(cli.max_workers)
        .skip_smtp(cli.skip_smtp)
        .anti_abuse(!cli.no_anti_abuse)
        .resume(!cli.no_resume)
        .build()?;

    tracing::info!("Input file: {}", cli.input.display());
    tracing::info!("Output base: {}", cli.output.display());
    tracing::info!(
        "Delay between checks: {:.1} seconds, {} workers, SMTP {}, anti-abuse {}, resume {}",
        config.base_delay.as_secs_f64(),
        config.max_workers,
        if config.skip_smtp { "off" } else { "on" },
        if config.anti_abuse { "on" } else { "off" },
        if config.resume { "on" } else { "off" },
    );
    if let Some(path) = &config.loaded_config_path {
        tracing::info!("Loaded config file: {}", path);
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {pos} finalized | {msg}")
            .expect("progress bar template failed to parse. This is a bug."),
    );

    let summary = run_validation(Arc::new(config), &cli.input, &cli.output, |outcome| {
        bar.inc(1);
        bar.set_message(format!("{} [{}]", outcome.address, outcome.reason));
    })
    .await?;
    bar.finish_and_clear();

    tracing::info!(
        "Done: {} valid, {} invalid, {} skipped of {} rows",
        summary.valid,
        summary.invalid,
        summary.skipped,
        summary.total_rows
    );
    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
