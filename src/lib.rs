//! mailprobe core: validates bulk lists of email addresses by combining
//! syntax checks, DNS MX lookups and live SMTP probing, under bounded
//! concurrency with per-domain rate limiting, adaptive backoff and
//! crash-resumable progress tracking.

pub mod core;
pub mod io;
pub mod runner;
pub mod verification;

pub use crate::core::config::{Config, ConfigBuilder};
pub use crate::core::error::{AppError, Result};
pub use crate::runner::{run_validation, RunSummary};
pub use crate::verification::{ValidationOutcome, ValidationReason, Validator};
