//! Adaptive per-domain delay driven by consecutive probe failures.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::config::Config;

#[derive(Debug)]
struct DomainBackoff {
    consecutive_failures: u32,
    delay: Duration,
}

/// Tracks consecutive failures per domain and escalates the pre-probe delay
/// once a domain keeps failing.
///
/// The delay is monotonically non-decreasing within a run: a success resets
/// the failure counter but leaves the escalated delay in place.
pub struct BackoffTracker {
    base_delay: Duration,
    max_delay: Duration,
    failure_threshold: u32,
    multiplier: f64,
    state: Mutex<HashMap<String, DomainBackoff>>,
}

impl BackoffTracker {
    pub fn new(config: &Config) -> Self {
        Self {
            base_delay: config.base_delay,
            max_delay: config.max_domain_delay,
            failure_threshold: config.backoff_failure_threshold,
            multiplier: config.backoff_multiplier,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Records a failed probe. Once the consecutive-failure count exceeds
    /// the threshold, every further failure multiplies the delay, capped at
    /// the configured maximum.
    pub fn on_failure(&self, domain: &str) {
        let mut state = self.state.lock();
        let entry = state
            .entry(domain.to_string())
            .or_insert_with(|| DomainBackoff {
                consecutive_failures: 0,
                delay: self.base_delay,
            });
        entry.consecutive_failures += 1;
        if entry.consecutive_failures > self.failure_threshold {
            let escalated = entry.delay.mul_f64(self.multiplier);
            entry.delay = escalated.min(self.max_delay);
            tracing::debug!(target: "backoff",
                "Domain {} at {} consecutive failures, delay now {:?}",
                domain, entry.consecutive_failures, entry.delay);
        }
    }

    /// Records a successful probe, resetting the failure counter.
    pub fn on_success(&self, domain: &str) {
        if let Some(entry) = self.state.lock().get_mut(domain) {
            entry.consecutive_failures = 0;
        }
    }

    /// Current pre-probe delay for `domain`; the base delay until the
    /// domain has escalated.
    pub fn current_delay(&self, domain: &str) -> Duration {
        self.state
            .lock()
            .get(domain)
            .map_or(self.base_delay, |entry| entry.delay)
    }

    #[cfg(test)]
    pub(crate) fn consecutive_failures(&self, domain: &str) -> u32 {
        self.state
            .lock()
            .get(domain)
            .map_or(0, |entry| entry.consecutive_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> BackoffTracker {
        BackoffTracker::new(&Config {
            base_delay: Duration::from_secs(1),
            max_domain_delay: Duration::from_secs(10),
            backoff_failure_threshold: 3,
            backoff_multiplier: 1.5,
            ..Config::default()
        })
    }

    #[test]
    fn delay_starts_at_base() {
        let tracker = tracker();
        assert_eq!(tracker.current_delay("example.com"), Duration::from_secs(1));
    }

    #[test]
    fn delay_escalates_above_threshold() {
        let tracker = tracker();
        for _ in 0..3 {
            tracker.on_failure("example.com");
        }
        // At the threshold, still the base delay.
        assert_eq!(tracker.current_delay("example.com"), Duration::from_secs(1));

        tracker.on_failure("example.com");
        let after_four = tracker.current_delay("example.com");
        assert!(after_four > Duration::from_secs(1));
        assert_eq!(after_four, Duration::from_secs(1).mul_f64(1.5));

        tracker.on_failure("example.com");
        assert!(tracker.current_delay("example.com") > after_four);
    }

    #[test]
    fn delay_is_capped() {
        let tracker = tracker();
        for _ in 0..40 {
            tracker.on_failure("example.com");
        }
        assert_eq!(
            tracker.current_delay("example.com"),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn success_resets_counter_but_not_delay() {
        let tracker = tracker();
        for _ in 0..4 {
            tracker.on_failure("example.com");
        }
        let escalated = tracker.current_delay("example.com");
        assert!(escalated > Duration::from_secs(1));

        tracker.on_success("example.com");
        assert_eq!(tracker.consecutive_failures("example.com"), 0);
        assert_eq!(tracker.current_delay("example.com"), escalated);
    }

    #[test]
    fn domains_escalate_independently() {
        let tracker = tracker();
        for _ in 0..5 {
            tracker.on_failure("slow.com");
        }
        assert!(tracker.current_delay("slow.com") > Duration::from_secs(1));
        assert_eq!(tracker.current_delay("fine.com"), Duration::from_secs(1));
    }
}
