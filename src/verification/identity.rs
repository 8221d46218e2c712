//! Probe identity selection with a pluggable randomness source.
//!
//! In anti-abuse mode the HELO hostname and envelope sender are drawn at
//! random from small pools of plausible public-provider values so the probe
//! traffic does not present a single fingerprint. Randomness is injected so
//! tests can pin the exact identities used.

use std::sync::Arc;

use crate::core::config::Config;

/// Source of randomness for identity selection and pre-probe jitter.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `[0, len)`. `len` is always at least 1.
    fn pick_index(&self, len: usize) -> usize;
    /// Uniform value in `[min, max)` seconds.
    fn uniform_secs(&self, min: f32, max: f32) -> f32;
}

/// Production source backed by [`rand::thread_rng`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick_index(&self, len: usize) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..len)
    }

    fn uniform_secs(&self, min: f32, max: f32) -> f32 {
        use rand::Rng;
        if min >= max {
            return min.max(0.0);
        }
        rand::thread_rng().gen_range(min..max)
    }
}

/// HELO hostname and envelope sender used for one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeIdentity {
    pub helo_host: String,
    pub sender: String,
}

/// Selects probe identities, randomized only in anti-abuse mode.
pub struct IdentityPool {
    helo_hosts: Vec<String>,
    sender_addresses: Vec<String>,
    default_identity: ProbeIdentity,
    anti_abuse: bool,
    rng: Arc<dyn RandomSource>,
}

impl IdentityPool {
    pub fn new(config: &Config, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            helo_hosts: config.helo_hosts.clone(),
            sender_addresses: config.sender_addresses.clone(),
            default_identity: ProbeIdentity {
                helo_host: config.default_helo_host.clone(),
                sender: config.default_sender.clone(),
            },
            anti_abuse: config.anti_abuse,
            rng,
        }
    }

    /// Picks the identity for the next probe. HELO host and sender are drawn
    /// independently.
    pub fn select(&self) -> ProbeIdentity {
        if !self.anti_abuse {
            return self.default_identity.clone();
        }
        let helo_host = self.helo_hosts[self.rng.pick_index(self.helo_hosts.len())].clone();
        let sender =
            self.sender_addresses[self.rng.pick_index(self.sender_addresses.len())].clone();
        ProbeIdentity { helo_host, sender }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic source yielding a fixed index sequence, cycling.
    pub(crate) struct SequenceSource {
        indices: Vec<usize>,
        cursor: AtomicUsize,
    }

    impl SequenceSource {
        pub(crate) fn new(indices: Vec<usize>) -> Self {
            Self {
                indices,
                cursor: AtomicUsize::new(0),
            }
        }
    }

    impl RandomSource for SequenceSource {
        fn pick_index(&self, len: usize) -> usize {
            let at = self.cursor.fetch_add(1, Ordering::Relaxed);
            self.indices[at % self.indices.len()] % len
        }

        fn uniform_secs(&self, min: f32, _max: f32) -> f32 {
            min
        }
    }

    #[test]
    fn anti_abuse_off_uses_fixed_defaults() {
        let config = Config::default();
        let pool = IdentityPool::new(
            &Config {
                anti_abuse: false,
                ..config
            },
            Arc::new(SequenceSource::new(vec![3])),
        );
        let identity = pool.select();
        assert_eq!(identity.helo_host, "gmail.com");
        assert_eq!(identity.sender, "test@gmail.com");
    }

    #[test]
    fn anti_abuse_on_draws_from_pools() {
        let config = Config::default();
        let pool = IdentityPool::new(&config, Arc::new(SequenceSource::new(vec![1, 2])));
        let identity = pool.select();
        assert_eq!(identity.helo_host, config.helo_hosts[1]);
        assert_eq!(identity.sender, config.sender_addresses[2]);
    }

    #[test]
    fn thread_rng_source_respects_bounds() {
        let source = ThreadRngSource;
        for _ in 0..100 {
            assert!(source.pick_index(5) < 5);
            let jitter = source.uniform_secs(0.1, 0.5);
            assert!((0.1..0.5).contains(&jitter));
        }
    }
}
