use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter for one retry attempt.
///
/// The ceiling is `base * 2^attempt`; the result is half the ceiling plus a
/// uniform draw over the other half, so delays center on 75% of the ceiling
/// with a ±25% spread. That spread keeps independent senders from
/// re-attempting in lockstep.
///
/// The rng is passed in so tests can seed it.
pub fn delay_with_jitter(base: Duration, attempt: u32, rng: &mut impl Rng) -> Duration {
    let max_delay = base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let half = max_delay / 2;
    // Saturated products can exceed u64 nanos; clamp instead of truncating
    // so the draw window never wraps.
    let half_nanos = u64::try_from(half.as_nanos()).unwrap_or(u64::MAX);
    // A zero base gives a zero-width range; gen_range panics on those.
    let jitter = if half_nanos == 0 {
        Duration::ZERO
    } else {
        Duration::from_nanos(rng.gen_range(0..half_nanos))
    };
    half + jitter
}
