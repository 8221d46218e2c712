//! The per-address decision pipeline.
//!
//! Checks run in strict order, each a short-circuit exit: duplicate/resumed,
//! format, rate limit, mail exchanger, then the live SMTP probe. Every exit
//! marks durable progress except the rate-limited one, which deliberately
//! leaves the address eligible for a future attempt.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::config::Config;
use crate::runner::progress::ProgressStore;
use crate::verification::backoff::BackoffTracker;
use crate::verification::format::is_valid_format;
use crate::verification::identity::{IdentityPool, RandomSource};
use crate::verification::mx::{MailExchangeLookup, MxCache};
use crate::verification::outcome::{domain_of, normalize_address, ValidationOutcome, ValidationReason};
use crate::verification::ratelimit::RateLimiter;
use crate::verification::smtp::{ProbeVerdict, SmtpProbe};

/// All per-run validation state, shared by every concurrent task.
pub struct Validator {
    config: Arc<Config>,
    mx_cache: MxCache,
    rate_limiter: RateLimiter,
    backoff: BackoffTracker,
    identities: IdentityPool,
    prober: Arc<dyn SmtpProbe>,
    progress: Arc<ProgressStore>,
    rng: Arc<dyn RandomSource>,
    /// Addresses claimed this run, including ones whose outcome is still in
    /// flight. Kept separate from the durable progress set so a rate-limit
    /// denial can release its claim.
    seen: Mutex<HashSet<String>>,
}

impl Validator {
    pub fn new(
        config: Arc<Config>,
        mx_source: Arc<dyn MailExchangeLookup>,
        prober: Arc<dyn SmtpProbe>,
        progress: Arc<ProgressStore>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            mx_cache: MxCache::new(mx_source),
            rate_limiter: RateLimiter::new(&config),
            backoff: BackoffTracker::new(&config),
            identities: IdentityPool::new(&config, rng.clone()),
            prober,
            progress,
            rng,
            seen: Mutex::new(HashSet::new()),
            config,
        }
    }

    /// Delay to await before dispatching `raw` to [`validate`], combining the
    /// domain's adaptive backoff with jitter in anti-abuse mode.
    ///
    /// [`validate`]: Validator::validate
    pub fn pre_probe_delay(&self, raw: &str) -> Duration {
        let address = normalize_address(raw);
        let base = match domain_of(&address) {
            Some(domain) => self.backoff.current_delay(domain),
            None => self.config.base_delay,
        };
        if !self.config.anti_abuse {
            return base;
        }
        let (min, max) = self.config.jitter_range;
        base + Duration::from_secs_f32(self.rng.uniform_secs(min, max))
    }

    /// Runs the full decision pipeline for one address.
    pub async fn validate(&self, raw: &str) -> ValidationOutcome {
        let address = normalize_address(raw);

        {
            let mut seen = self.seen.lock();
            if seen.contains(&address) || self.progress.contains(&address) {
                tracing::debug!(target: "engine", "Skipping already-processed {}", address);
                return ValidationOutcome::undeliverable(
                    &address,
                    ValidationReason::AlreadyProcessed,
                );
            }
            seen.insert(address.clone());
        }

        if !is_valid_format(&address) {
            self.progress.mark(&address);
            return ValidationOutcome::undeliverable(&address, ValidationReason::InvalidFormat);
        }

        let Some(domain) = domain_of(&address).map(str::to_string) else {
            // Unreachable for addresses the format checker accepted.
            self.progress.mark(&address);
            return ValidationOutcome::undeliverable(&address, ValidationReason::InvalidFormat);
        };

        if !self.rate_limiter.admit(&domain) {
            // Transient denial: release the claim and leave progress
            // unmarked so a later attempt can retry.
            self.seen.lock().remove(&address);
            let mut outcome =
                ValidationOutcome::undeliverable(&address, ValidationReason::RateLimitExceeded);
            outcome.format_valid = true;
            return outcome;
        }

        let Some(mx_host) = self.mx_cache.resolve(&domain).await else {
            self.progress.mark(&address);
            let mut outcome =
                ValidationOutcome::undeliverable(&address, ValidationReason::NoMailExchanger);
            outcome.format_valid = true;
            return outcome;
        };

        if self.config.skip_smtp {
            self.progress.mark(&address);
            return ValidationOutcome {
                address,
                is_deliverable: true,
                reason: ValidationReason::SmtpSkipped,
                detail: None,
                format_valid: true,
                domain_has_mail_exchanger: true,
                smtp_accepted: false,
            };
        }

        let identity = self.identities.select();
        let verdict = self.prober.probe(&address, &mx_host, &identity).await;

        let accepted = verdict.is_accepted();
        if accepted {
            self.backoff.on_success(&domain);
        } else {
            self.backoff.on_failure(&domain);
        }
        let detail = verdict.message().to_string();
        let reason = match verdict {
            ProbeVerdict::Accepted { .. } => ValidationReason::SmtpVerified,
            ProbeVerdict::Rejected { .. } => ValidationReason::SmtpRejected,
            ProbeVerdict::ConnectionFailed { .. } => ValidationReason::SmtpConnectionFailure,
            ProbeVerdict::ProtocolError { .. } => ValidationReason::SmtpProtocolError,
        };

        self.progress.mark(&address);
        ValidationOutcome {
            address,
            is_deliverable: accepted,
            reason,
            detail: Some(detail),
            format_valid: true,
            domain_has_mail_exchanger: true,
            smtp_accepted: accepted,
        }
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }
}
