//! Per-domain admission control for outbound probes.
//!
//! Deliberately a coarse fixed window, not a precise sliding one: the count
//! resets on the first admit-check after the window has elapsed. Coarse
//! protection is the point; precision is not.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::config::Config;

const WINDOW: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Admits or denies probes per domain. Disabled outside anti-abuse mode.
pub struct RateLimiter {
    enabled: bool,
    ceiling: u32,
    window: Duration,
    state: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.anti_abuse,
            ceiling: config.max_probes_per_hour,
            window: WINDOW,
            state: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    fn with_window(ceiling: u32, window: Duration) -> Self {
        Self {
            enabled: true,
            ceiling,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether a probe against `domain` may proceed, counting it if
    /// so. Always true (and side-effect free) when disabled.
    pub fn admit(&self, domain: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut state = self.state.lock();
        let window = state.entry(domain.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.ceiling {
            tracing::warn!(target: "ratelimit",
                "Probe ceiling reached for {} ({}/{} this window)",
                domain, window.count, self.ceiling);
            return false;
        }
        window.count += 1;
        true
    }
}
