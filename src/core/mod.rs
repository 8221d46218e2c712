//! Core shared infrastructure: configuration and error types.

pub mod config;
pub mod error;
