//! Retry backoff policy.
//!
//! Failed jobs are rescheduled with an exponentially growing delay. The
//! schedule is deterministic so tests can assert exact reschedule times.

use std::time::Duration;

/// Floor for the per-attempt delay when a job carries no hint of its own.
pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Ceiling for the per-attempt delay. Without a cap the doubling schedule
/// outgrows any useful retry horizon after ~20 attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

/// Delay before the next attempt of a job that has failed `attempt` times.
///
/// `hint` is the job's own retry-delay hint; it replaces [`BASE_RETRY_DELAY`]
/// as the seed when larger. The result is `seed * 2^attempt`, capped at
/// [`MAX_RETRY_DELAY`].
pub fn retry_delay(attempt: u32, hint: Option<Duration>) -> Duration {
    let seed = hint.unwrap_or(BASE_RETRY_DELAY).max(BASE_RETRY_DELAY);
    // Clamp the exponent so large attempt counts cannot overflow; the cap
    // is reached long before 2^20 anyway.
    let factor = 2u32.saturating_pow(attempt.min(20));
    let delay = seed.saturating_mul(factor);
    delay.min(MAX_RETRY_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_uses_base_delay() {
        assert_eq!(retry_delay(0, None), BASE_RETRY_DELAY);
    }

    #[test]
    fn delay_doubles_per_attempt() {
        assert_eq!(retry_delay(1, None), Duration::from_secs(10));
        assert_eq!(retry_delay(2, None), Duration::from_secs(20));
        assert_eq!(retry_delay(3, None), Duration::from_secs(40));
    }

    #[test]
    fn hint_replaces_base_when_larger() {
        let hint = Some(Duration::from_secs(30));
        assert_eq!(retry_delay(0, hint), Duration::from_secs(30));
        assert_eq!(retry_delay(1, hint), Duration::from_secs(60));
    }

    #[test]
    fn hint_below_base_is_ignored() {
        let hint = Some(Duration::from_secs(1));
        assert_eq!(retry_delay(0, hint), BASE_RETRY_DELAY);
    }

    #[test]
    fn delay_is_capped() {
        assert_eq!(retry_delay(30, None), MAX_RETRY_DELAY);
    }

    #[test]
    fn huge_attempt_count_does_not_overflow() {
        assert_eq!(retry_delay(u32::MAX, None), MAX_RETRY_DELAY);
    }

    #[test]
    fn schedule_is_monotonic() {
        let mut prev = Duration::ZERO;
        for attempt in 0..16 {
            let d = retry_delay(attempt, None);
            assert!(d >= prev, "delay shrank at attempt {attempt}");
            prev = d;
        }
    }
}
