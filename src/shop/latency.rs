//! Simulated stage latency.

use rand::Rng;
use std::time::Duration;

use crate::config::schema::LatencyRange;

/// Uniform draw within `range`.
pub fn sample<R: Rng + ?Sized>(range: LatencyRange, rng: &mut R) -> Duration {
    if range.min_ms >= range.max_ms {
        return Duration::from_millis(range.min_ms);
    }
    let ms = rng.gen_range(range.min_ms as f64..range.max_ms as f64);
    Duration::from_secs_f64(ms / 1000.0)
}

/// Suspend for a drawn delay without blocking other requests. Returns the delay.
pub async fn simulate<R: Rng + ?Sized>(range: LatencyRange, rng: &mut R) -> Duration {
    let delay = sample(range, rng);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    delay
}
