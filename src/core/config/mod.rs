//! Defines the core runtime `Config` struct, its defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use std::time::Duration;

/// Runtime configuration settings used by the mailprobe core logic.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base delay awaited before every probe, also the floor for adaptive
    /// per-domain backoff.
    pub base_delay: Duration,
    /// Maximum number of addresses validated concurrently (batch size).
    pub max_workers: usize,
    /// Skip the live SMTP probe and accept any address with a mail exchanger.
    pub skip_smtp: bool,
    /// Randomized identities, jitter and per-domain rate limiting.
    pub anti_abuse: bool,
    /// Load the progress file and skip already-finalized addresses.
    pub resume: bool,

    pub dns_timeout: Duration,
    pub dns_servers: Vec<String>,

    pub smtp_timeout: Duration,
    /// HELO identity and envelope sender used when anti-abuse mode is off.
    pub default_helo_host: String,
    pub default_sender: String,
    /// Identity pools sampled when anti-abuse mode is on.
    pub helo_hosts: Vec<String>,
    pub sender_addresses: Vec<String>,

    /// Probe ceiling per domain per window (coarse hourly window).
    pub max_probes_per_hour: u32,
    /// Consecutive failures tolerated before the domain delay escalates.
    pub backoff_failure_threshold: u32,
    pub backoff_multiplier: f64,
    pub max_domain_delay: Duration,

    /// Jitter range in seconds added before each probe in anti-abuse mode.
    pub jitter_range: (f32, f32),
    /// Progress is flushed durably every this many finalized addresses
    /// (and after every completed batch).
    pub flush_every: usize,

    pub loaded_config_path: Option<String>,
}

impl Config {
    fn build_default() -> Self {
        let helo_hosts = vec![
            "gmail.com".to_string(),
            "outlook.com".to_string(),
            "yahoo.com".to_string(),
            "icloud.com".to_string(),
            "aol.com".to_string(),
        ];
        let sender_addresses = vec![
            "test@gmail.com".to_string(),
            "contact@outlook.com".to_string(),
            "hello@yahoo.com".to_string(),
            "check@icloud.com".to_string(),
            "info@aol.com".to_string(),
        ];
        let dns_servers = vec![
            "8.8.8.8".to_string(),
            "8.8.4.4".to_string(),
            "1.1.1.1".to_string(),
            "1.0.0.1".to_string(),
        ];

        Config {
            base_delay: Duration::from_secs_f64(1.0),
            max_workers: 20,
            skip_smtp: false,
            anti_abuse: true,
            resume: true,
            dns_timeout: Duration::from_secs(5),
            dns_servers,
            smtp_timeout: Duration::from_secs(10),
            default_helo_host: "gmail.com".to_string(),
            default_sender: "test@gmail.com".to_string(),
            helo_hosts,
            sender_addresses,
            max_probes_per_hour: 100,
            backoff_failure_threshold: 3,
            backoff_multiplier: 1.5,
            max_domain_delay: Duration::from_secs(10),
            jitter_range: (0.1, 0.5),
            flush_every: 50,
            loaded_config_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}
