//! Mail-exchanger resolution with per-run memoization.
//!
//! The cache guarantees at most one upstream MX query per distinct domain
//! per run: concurrent first lookups for the same domain share a single
//! in-flight resolution through a per-domain `OnceCell`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::core::config::Config;
use crate::core::error::Result;

/// One MX record as advertised by DNS. Lower preference is preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

/// Narrow DNS collaborator contract consumed by the cache.
#[async_trait]
pub trait MailExchangeLookup: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>>;
}

/// Production lookup backed by trust-dns.
pub struct DnsMxSource {
    resolver: TokioAsyncResolver,
}

impl DnsMxSource {
    pub fn new(config: &Config) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = config.dns_timeout;

        let ips: Vec<IpAddr> = config
            .dns_servers
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        let resolver = if ips.is_empty() {
            TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
        } else {
            let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
            TokioAsyncResolver::tokio(ResolverConfig::from_parts(None, vec![], group), opts)
        };
        Self { resolver }
    }
}

#[async_trait]
impl MailExchangeLookup for DnsMxSource {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>> {
        let lookup = self.resolver.mx_lookup(domain).await?;
        Ok(lookup
            .iter()
            .map(|mx| MxRecord {
                preference: mx.preference(),
                exchange: mx.exchange().to_utf8(),
            })
            .collect())
    }
}

/// Domain -> preferred mail-exchanger host, memoized for the run.
///
/// Resolution failures of any class (NXDOMAIN, timeout, empty answer) are
/// cached uniformly as `None`, so a permanently-bad domain costs one network
/// round trip per run.
pub struct MxCache {
    source: Arc<dyn MailExchangeLookup>,
    entries: Mutex<HashMap<String, Arc<OnceCell<Option<String>>>>>,
}

impl MxCache {
    pub fn new(source: Arc<dyn MailExchangeLookup>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lowest-preference exchanger for `domain`, with any
    /// trailing root-label dot stripped, or `None` when the domain cannot
    /// receive mail.
    pub async fn resolve(&self, domain: &str) -> Option<String> {
        let cell = {
            let mut entries = self.entries.lock();
            entries
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_init(|| async {
            match self.source.lookup_mx(domain).await {
                Ok(records) => {
                    let best = records.into_iter().min_by_key(|r| r.preference);
                    match best {
                        Some(record) => {
                            let host = record.exchange.trim_end_matches('.').to_string();
                            tracing::debug!(target: "mx_task",
                                "MX for {}: {} (preference {})", domain, host, record.preference);
                            Some(host)
                        }
                        None => {
                            tracing::debug!(target: "mx_task", "No MX records for {}", domain);
                            None
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(target: "mx_task", "MX lookup failed for {}: {}", domain, e);
                    None
                }
            }
        })
        .await
        .clone()
    }
}
