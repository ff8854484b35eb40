pub mod driver;
pub mod time_base;

use std::f64::consts::PI;

pub use driver::SignalSynthesisDriver;
pub use time_base::TimeBase;

/// Evaluate `sin(2πft)` and `cos(2πft)` at every time stamp
pub fn synthesize(frequency: f64, time_base: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let angular = 2.0 * PI * frequency;
    let mut in_phase = Vec::with_capacity(time_base.len());
    let mut quadrature = Vec::with_capacity(time_base.len());

    for &t in time_base {
        let (sin, cos) = (angular * t).sin_cos();
        in_phase.push(sin);
        quadrature.push(cos);
    }

    (in_phase, quadrature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_period_values() {
        // 1 Hz over 4 samples: 0°, 90°, 180°, 270°
        let t = [0.0, 0.25, 0.5, 0.75];
        let (sin, cos) = synthesize(1.0, &t);

        assert!(sin[0].abs() < 1e-12);
        assert!((sin[1] - 1.0).abs() < 1e-12);
        assert!((cos[0] - 1.0).abs() < 1e-12);
        assert!((cos[2] + 1.0).abs() < 1e-12);
        assert!((sin[3] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_channels_are_orthogonal_unit_circle() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 1000.0).collect();
        let (sin, cos) = synthesize(50.0, &t);
        for (s, c) in sin.iter().zip(&cos) {
            assert!((s * s + c * c - 1.0).abs() < 1e-12);
        }
    }
}
