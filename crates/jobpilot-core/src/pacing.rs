//! Randomized inter-action delays.
//!
//! Outbound actions against a recruiting site are separated by a uniform
//! random pause so request timing looks human. This is anti-automation
//! camouflage, not a correctness mechanism.

use std::time::Duration;

use crate::config::PacingConfig;

/// Uniform random delay within `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct JitterDelay {
    pub min: Duration,
    pub max: Duration,
}

impl JitterDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    /// Zero-length delay, for tests and dry runs.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Delay used between filter-stage detail fetches.
    pub fn for_filtering(cfg: &PacingConfig) -> Self {
        Self::from_secs(cfg.filter_delay_min_secs, cfg.filter_delay_max_secs)
    }

    /// Delay used between apply attempts.
    pub fn for_applying(cfg: &PacingConfig) -> Self {
        Self::from_secs(cfg.apply_delay_min_secs, cfg.apply_delay_max_secs)
    }

    /// Pick a concrete duration for one wait.
    pub fn sample(&self) -> Duration {
        let span_ms = self.max.as_millis().saturating_sub(self.min.as_millis()) as u64;
        if span_ms == 0 {
            return self.min;
        }
        self.min + Duration::from_millis(rand_ms(span_ms))
    }

    /// Sleep for one sampled duration.
    pub async fn pause(&self) {
        let duration = self.sample();
        if duration.is_zero() {
            return;
        }
        tracing::debug!(sleep_ms = %duration.as_millis(), "Jitter pause");
        tokio::time::sleep(duration).await;
    }
}

// Clock-seeded xorshift — good enough for jitter, not crypto, and avoids
// pulling in the `rand` crate.
fn rand_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
