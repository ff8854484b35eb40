use serde::{Deserialize, Serialize};

use crate::core::{SignalError, SignalResult};

/// How sample time stamps are laid out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeBase {
    /// `points` evenly spaced stamps from `start` to `stop`, both included
    Linspace { start: f64, stop: f64, points: usize },

    /// One stamp per sample period, `i / sample_rate`, covering `duration`
    Sampled { sample_rate: f64, duration: f64 },
}

impl TimeBase {
    /// Largest point count a valid sample rate and signal length can produce
    pub const MAX_POINTS: usize = 100_000_000;

    /// Number of stamps [`samples`](Self::samples) will produce
    pub fn point_count(&self) -> SignalResult<usize> {
        let requested = match *self {
            TimeBase::Linspace { points, .. } => points as f64,
            TimeBase::Sampled { sample_rate, duration } => {
                if !(sample_rate > 0.0 && duration >= 0.0) {
                    return Ok(0);
                }
                (duration * sample_rate).round().max(1.0)
            }
        };

        // NaN and infinity fall through to the error
        if !(requested <= Self::MAX_POINTS as f64) {
            return Err(SignalError::TimeBaseTooLarge {
                requested,
                max: Self::MAX_POINTS,
            });
        }
        Ok(requested as usize)
    }

    pub fn samples(&self) -> SignalResult<Vec<f64>> {
        let n = self.point_count()?;
        let t = match *self {
            TimeBase::Linspace { start, stop, .. } => {
                if n == 1 {
                    return Ok(vec![start]);
                }
                let step = (stop - start) / (n - 1) as f64;
                let mut t: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
                if let Some(last) = t.last_mut() {
                    *last = stop;
                }
                t
            }
            TimeBase::Sampled { sample_rate, .. } => (0..n).map(|i| i as f64 / sample_rate).collect(),
        };
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_includes_endpoints() {
        let t = TimeBase::Linspace { start: 0.0, stop: 1.0, points: 5 }.samples().unwrap();
        assert_eq!(t, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_linspace_degenerate_counts() {
        assert!(TimeBase::Linspace { start: 0.0, stop: 1.0, points: 0 }.samples().unwrap().is_empty());
        assert_eq!(TimeBase::Linspace { start: 2.0, stop: 3.0, points: 1 }.samples().unwrap(), vec![2.0]);
    }

    #[test]
    fn test_sampled_spacing() {
        let base = TimeBase::Sampled { sample_rate: 8.0, duration: 1.0 };
        assert_eq!(base.point_count().unwrap(), 8);
        let t = base.samples().unwrap();
        assert_eq!(t[0], 0.0);
        assert_eq!(t[4], 0.5);
        assert_eq!(t[7], 0.875);
    }

    #[test]
    fn test_sampled_keeps_at_least_one_point() {
        let base = TimeBase::Sampled { sample_rate: 100.0, duration: 1e-4 };
        assert_eq!(base.samples().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_sampled_rejects_unrepresentable_counts() {
        for sample_rate in [1e300, f64::INFINITY] {
            let base = TimeBase::Sampled { sample_rate, duration: 1.0 };
            assert!(matches!(base.samples(), Err(SignalError::TimeBaseTooLarge { .. })));
        }
    }

    #[test]
    fn test_largest_valid_configuration_fits() {
        let base = TimeBase::Sampled { sample_rate: 1_000_000.0, duration: 100.0 };
        assert_eq!(base.point_count().unwrap(), TimeBase::MAX_POINTS);

        let base = TimeBase::Linspace { start: 0.0, stop: 1.0, points: TimeBase::MAX_POINTS + 1 };
        assert!(base.point_count().is_err());
    }

    #[test]
    fn test_non_positive_rate_is_empty() {
        let base = TimeBase::Sampled { sample_rate: 0.0, duration: 1.0 };
        assert_eq!(base.point_count().unwrap(), 0);
    }
}
