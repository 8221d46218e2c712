//! Fluent builder producing a validated runtime [`Config`].

use std::path::Path;
use std::time::Duration;

use crate::core::config::file::ConfigFile;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};

/// Builds a [`Config`] from defaults, an optional TOML file, and
/// programmatic overrides, in that precedence order (overrides win).
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    file: Option<ConfigFile>,
    loaded_config_path: Option<String>,

    base_delay: Option<f64>,
    max_workers: Option<usize>,
    skip_smtp: Option<bool>,
    anti_abuse: Option<bool>,
    resume: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a TOML configuration file and records its path.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let parsed: ConfigFile = toml::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Cannot parse config file {}: {}", path.display(), e))
        })?;
        self.file = Some(parsed);
        self.loaded_config_path = Some(path.display().to_string());
        Ok(self)
    }

    pub fn base_delay(mut self, seconds: f64) -> Self {
        self.base_delay = Some(seconds);
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    pub fn skip_smtp(mut self, skip: bool) -> Self {
        self.skip_smtp = Some(skip);
        self
    }

    pub fn anti_abuse(mut self, enabled: bool) -> Self {
        self.anti_abuse = Some(enabled);
        self
    }

    pub fn resume(mut self, enabled: bool) -> Self {
        self.resume = Some(enabled);
        self
    }

    /// Merges file values over defaults, applies overrides, validates.
    pub fn build(self) -> Result<Config> {
        let mut config = Config::default();
        config.loaded_config_path = self.loaded_config_path;

        if let Some(file) = self.file {
            if let Some(t) = file.dns.dns_timeout {
                config.dns_timeout = Duration::from_secs(t);
            }
            if let Some(servers) = file.dns.dns_servers {
                config.dns_servers = servers;
            }
            if let Some(t) = file.smtp.smtp_timeout {
                config.smtp_timeout = Duration::from_secs(t);
            }
            if let Some(host) = file.smtp.default_helo_host {
                config.default_helo_host = host;
            }
            if let Some(sender) = file.smtp.default_sender {
                config.default_sender = sender;
            }
            if let Some(hosts) = file.smtp.helo_hosts {
                config.helo_hosts = hosts;
            }
            if let Some(senders) = file.smtp.sender_addresses {
                config.sender_addresses = senders;
            }
            if let Some(n) = file.limits.max_probes_per_hour {
                config.max_probes_per_hour = n;
            }
            if let Some(n) = file.limits.backoff_failure_threshold {
                config.backoff_failure_threshold = n;
            }
            if let Some(m) = file.limits.backoff_multiplier {
                config.backoff_multiplier = m;
            }
            if let Some(s) = file.limits.max_domain_delay {
                config.max_domain_delay = duration_from_file("max_domain_delay", s)?;
            }
            if let Some(min) = file.limits.min_jitter {
                config.jitter_range.0 = min;
            }
            if let Some(max) = file.limits.max_jitter {
                config.jitter_range.1 = max;
            }
            if let Some(d) = file.validation.delay {
                config.base_delay = duration_from_file("delay", d)?;
            }
            if let Some(w) = file.validation.max_workers {
                config.max_workers = w;
            }
            if let Some(v) = file.validation.skip_smtp {
                config.skip_smtp = v;
            }
            if let Some(v) = file.validation.anti_abuse {
                config.anti_abuse = v;
            }
            if let Some(v) = file.validation.resume {
                config.resume = v;
            }
            if let Some(n) = file.validation.flush_every {
                config.flush_every = n;
            }
        }

        if let Some(d) = self.base_delay {
            if !d.is_finite() || d < 0.0 {
                return Err(AppError::Config(format!(
                    "delay must be a non-negative number of seconds, got {d}"
                )));
            }
            config.base_delay = Duration::from_secs_f64(d);
        }
        if let Some(w) = self.max_workers {
            config.max_workers = w;
        }
        if let Some(v) = self.skip_smtp {
            config.skip_smtp = v;
        }
        if let Some(v) = self.anti_abuse {
            config.anti_abuse = v;
        }
        if let Some(v) = self.resume {
            config.resume = v;
        }

        validate(&config)?;
        Ok(config)
    }
}

fn duration_from_file(field: &str, seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AppError::Config(format!(
            "{field} must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn validate(config: &Config) -> Result<()> {
    if config.max_workers == 0 {
        return Err(AppError::Config("max_workers must be at least 1".into()));
    }
    if config.backoff_multiplier <= 1.0 {
        return Err(AppError::Config(
            "backoff_multiplier must be greater than 1.0".into(),
        ));
    }
    if config.max_domain_delay < config.base_delay {
        return Err(AppError::Config(
            "max_domain_delay must not be below the base delay".into(),
        ));
    }
    if config.jitter_range.0 < 0.0 || config.jitter_range.1 < config.jitter_range.0 {
        return Err(AppError::Config(
            "jitter range must satisfy 0 <= min <= max".into(),
        ));
    }
    if config.helo_hosts.is_empty() || config.sender_addresses.is_empty() {
        return Err(AppError::Config(
            "identity pools must contain at least one entry".into(),
        ));
    }
    if config.flush_every == 0 {
        return Err(AppError::Config("flush_every must be at least 1".into()));
    }
    Ok(())
}
