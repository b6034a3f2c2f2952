//! Timing policy: how long to wait between rotations.

use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound, in seconds, for every computed wait.
pub const MIN_WAIT_SECONDS: u64 = 10;

/// Default fixed interval in seconds.
pub const DEFAULT_INTERVAL_SECONDS: u64 = 300;

/// Default lower bound of the randomized interval in seconds.
pub const DEFAULT_RANDOM_MIN_SECONDS: u64 = 60;

/// Default upper bound of the randomized interval in seconds.
pub const DEFAULT_RANDOM_MAX_SECONDS: u64 = 600;

/// Errors raised when a timing policy is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    /// A duration is shorter than [`MIN_WAIT_SECONDS`].
    #[error("{field} must be at least 10 seconds (got {value})")]
    BelowMinimum { field: &'static str, value: u64 },
    /// The randomized range is inverted.
    #[error("random maximum ({max}s) must be greater than or equal to the minimum ({min}s)")]
    InvertedRange { min: u64, max: u64 },
}

/// How the wait between rotations is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Wait the same interval every time.
    #[default]
    Fixed,
    /// Draw a fresh wait uniformly from `[min, max]` every time.
    Randomized,
}

/// Immutable snapshot of the timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingPolicy {
    pub mode: TimingMode,
    pub fixed_seconds: u64,
    pub min_seconds: u64,
    pub max_seconds: u64,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            mode: TimingMode::Fixed,
            fixed_seconds: DEFAULT_INTERVAL_SECONDS,
            min_seconds: DEFAULT_RANDOM_MIN_SECONDS,
            max_seconds: DEFAULT_RANDOM_MAX_SECONDS,
        }
    }
}

impl TimingPolicy {
    /// A fixed-interval policy with default random bounds.
    #[must_use]
    pub fn fixed(seconds: u64) -> Self {
        Self {
            mode: TimingMode::Fixed,
            fixed_seconds: seconds,
            ..Self::default()
        }
    }

    /// A randomized policy drawing from `[min, max]`.
    #[must_use]
    pub fn randomized(min: u64, max: u64) -> Self {
        Self {
            mode: TimingMode::Randomized,
            min_seconds: min,
            max_seconds: max,
            ..Self::default()
        }
    }

    /// Checks the bounds.
    ///
    /// The interval of the inactive mode is not checked, so a randomized
    /// policy may carry any leftover fixed interval and vice versa.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError`] when a value is below the minimum wait or the
    /// randomized range is inverted.
    pub const fn validate(&self) -> Result<(), TimingError> {
        match self.mode {
            TimingMode::Fixed => {
                if self.fixed_seconds < MIN_WAIT_SECONDS {
                    return Err(TimingError::BelowMinimum {
                        field: "interval",
                        value: self.fixed_seconds,
                    });
                }
            }
            TimingMode::Randomized => {
                if self.min_seconds < MIN_WAIT_SECONDS {
                    return Err(TimingError::BelowMinimum {
                        field: "randomMin",
                        value: self.min_seconds,
                    });
                }
                if self.max_seconds < MIN_WAIT_SECONDS {
                    return Err(TimingError::BelowMinimum {
                        field: "randomMax",
                        value: self.max_seconds,
                    });
                }
                if self.max_seconds < self.min_seconds {
                    return Err(TimingError::InvertedRange {
                        min: self.min_seconds,
                        max: self.max_seconds,
                    });
                }
            }
        }
        Ok(())
    }

    /// Computes the next wait in seconds. Never below [`MIN_WAIT_SECONDS`].
    pub fn next_wait_seconds<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match self.mode {
            TimingMode::Fixed => self.fixed_seconds.max(MIN_WAIT_SECONDS),
            TimingMode::Randomized => {
                let low = self.min_seconds.max(MIN_WAIT_SECONDS);
                let high = self.max_seconds.max(low);
                rng.random_range(low..=high)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_default_policy_is_valid_fixed() {
        let policy = TimingPolicy::default();
        assert_eq!(policy.mode, TimingMode::Fixed);
        assert_eq!(policy.fixed_seconds, DEFAULT_INTERVAL_SECONDS);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_fixed_wait_is_floored() {
        let mut rng = StdRng::seed_from_u64(1);
        for seconds in [0, 1, 9, 10, 11, 300, 86_400] {
            let policy = TimingPolicy::fixed(seconds);
            assert_eq!(policy.next_wait_seconds(&mut rng), seconds.max(10));
        }
    }

    #[test]
    fn test_randomized_waits_stay_in_range_and_vary() {
        let policy = TimingPolicy::randomized(60, 600);
        let mut rng = StdRng::seed_from_u64(7);

        let waits: Vec<u64> = (0..1000).map(|_| policy.next_wait_seconds(&mut rng)).collect();
        assert!(waits.iter().all(|w| (60..=600).contains(w)));

        let distinct: HashSet<u64> = waits.into_iter().collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_randomized_clamps_bad_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let low = TimingPolicy::randomized(2, 5);
        for _ in 0..50 {
            assert_eq!(low.next_wait_seconds(&mut rng), 10);
        }

        let inverted = TimingPolicy::randomized(40, 20);
        for _ in 0..50 {
            assert_eq!(inverted.next_wait_seconds(&mut rng), 40);
        }
    }

    #[test]
    fn test_validate_rejects_short_interval() {
        assert_eq!(
            TimingPolicy::fixed(9).validate(),
            Err(TimingError::BelowMinimum { field: "interval", value: 9 })
        );
    }

    #[test]
    fn test_validate_rejects_short_random_bounds() {
        assert!(matches!(
            TimingPolicy::randomized(5, 60).validate(),
            Err(TimingError::BelowMinimum { field: "randomMin", .. })
        ));
        assert!(matches!(
            TimingPolicy::randomized(10, 9).validate(),
            Err(TimingError::BelowMinimum { field: "randomMax", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        assert_eq!(
            TimingPolicy::randomized(120, 60).validate(),
            Err(TimingError::InvertedRange { min: 120, max: 60 })
        );
    }

    #[test]
    fn test_validate_ignores_inactive_mode() {
        let policy = TimingPolicy {
            fixed_seconds: 1,
            ..TimingPolicy::randomized(30, 30)
        };
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_timing_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TimingMode::Randomized).unwrap(), r#""randomized""#);
        let mode: TimingMode = serde_json::from_str(r#""fixed""#).unwrap();
        assert_eq!(mode, TimingMode::Fixed);
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = TimingError::BelowMinimum { field: "randomMax", value: 3 };
        assert!(err.to_string().contains("randomMax"));
        assert!(err.to_string().contains("10"));
    }
}
