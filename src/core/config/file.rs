//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) dns: DnsConfig,
    #[serde(default)]
    pub(crate) smtp: SmtpConfig,
    #[serde(default)]
    pub(crate) limits: LimitsConfig,
    #[serde(default)]
    pub(crate) validation: ValidationConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsConfig {
    pub(crate) dns_timeout: Option<u64>,
    pub(crate) dns_servers: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpConfig {
    pub(crate) smtp_timeout: Option<u64>,
    pub(crate) default_helo_host: Option<String>,
    pub(crate) default_sender: Option<String>,
    pub(crate) helo_hosts: Option<Vec<String>>,
    pub(crate) sender_addresses: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct LimitsConfig {
    pub(crate) max_probes_per_hour: Option<u32>,
    pub(crate) backoff_failure_threshold: Option<u32>,
    pub(crate) backoff_multiplier: Option<f64>,
    pub(crate) max_domain_delay: Option<f64>,
    pub(crate) min_jitter: Option<f32>,
    pub(crate) max_jitter: Option<f32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ValidationConfig {
    pub(crate) delay: Option<f64>,
    pub(crate) max_workers: Option<usize>,
    pub(crate) skip_smtp: Option<bool>,
    pub(crate) anti_abuse: Option<bool>,
    pub(crate) resume: Option<bool>,
    pub(crate) flush_every: Option<usize>,
}
