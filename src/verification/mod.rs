//! The validation engine and its leaves: syntax checking, cached MX
//! resolution, rate limiting, adaptive backoff, probe identities, and the
//! live SMTP probe.

pub mod backoff;
pub mod engine;
pub mod format;
pub mod identity;
pub mod mx;
pub mod outcome;
pub mod ratelimit;
pub mod smtp;

pub use engine::Validator;
pub use outcome::{normalize_address, ValidationOutcome, ValidationReason};
