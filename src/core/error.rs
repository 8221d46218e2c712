//! Defines the custom error types for the mailprobe application.

use std::io;
use thiserror::Error;

/// The primary error type for the validation pipeline.
///
/// File-level variants (`InputNotFound`, `InputMalformed`, `Io`, ...) abort a
/// run; per-address failures never surface here, they are folded into the
/// address's [`ValidationOutcome`](crate::verification::ValidationOutcome).
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// The input file does not exist or cannot be opened.
    #[error("Input Not Found: {0}")]
    InputNotFound(String),

    /// The input file is unreadable or structurally unusable (e.g. missing
    /// the required `email` column, unparsable rows).
    #[error("Input Malformed: {0}")]
    InputMalformed(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing delimited records.
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    /// Error during DNS resolution.
    #[error("DNS Resolution Error: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    /// Error during SMTP communication setup or command execution.
    #[error("SMTP Error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
