use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Easing curves used by the background timelines
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Ease {
    #[default]
    Linear,
    /// Half cosine, slow at both ends
    SineInOut,
    /// Quadratic in-out
    Power1InOut,
    /// Cubic in-out
    Power2InOut,
    /// Cubic deceleration
    Power2Out,
}

impl Ease {
    /// Map linear progress (clamped to 0..=1) to eased progress
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Ease::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 5] = [
        Ease::Linear,
        Ease::SineInOut,
        Ease::Power1InOut,
        Ease::Power2InOut,
        Ease::Power2Out,
    ];

    #[test]
    fn test_endpoints_are_fixed() {
        for ease in ALL {
            assert!(ease.apply(0.0).abs() < 1e-6, "{:?} at 0", ease);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{:?} at 1", ease);
        }
    }

    #[test]
    fn test_in_out_curves_are_symmetric_at_midpoint() {
        for ease in [Ease::SineInOut, Ease::Power1InOut, Ease::Power2InOut] {
            assert!((ease.apply(0.5) - 0.5).abs() < 1e-6, "{:?}", ease);
        }
    }

    #[test]
    fn test_out_curve_leads_linear() {
        assert!(Ease::Power2Out.apply(0.25) > 0.25);
        assert!(Ease::Power2InOut.apply(0.25) < 0.25);
    }

    #[test]
    fn test_monotonic() {
        for ease in ALL {
            let mut last = 0.0;
            for i in 1..=100 {
                let v = ease.apply(i as f32 / 100.0);
                assert!(v >= last - 1e-6, "{:?} not monotonic at {}", ease, i);
                last = v;
            }
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Ease::Power2Out.apply(-3.0), 0.0);
        assert!((Ease::SineInOut.apply(4.0) - 1.0).abs() < 1e-6);
    }
}
