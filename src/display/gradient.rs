// Gradient - Keypoint table sampled by the animated inset rectangle
//
// A gradient is an ordered list of (color, position) keypoints. Consecutive
// keypoints form segments; sampling a position finds the first segment that
// contains it and blends its endpoints perceptually.

use super::color::Rgb;
use serde::{Deserialize, Serialize};

/// A color anchored at a normalized position in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorKeypoint {
    pub color: Rgb,
    pub position: f64,
}

impl ColorKeypoint {
    pub const fn new(color: Rgb, position: f64) -> Self {
        Self { color, position }
    }
}

/// Ordered set of color keypoints
///
/// Positions are expected to be non-decreasing. The table is immutable once
/// built and can be shared freely between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientTable {
    keypoints: Vec<ColorKeypoint>,
}

impl GradientTable {
    /// Build a table from keypoints in segment order
    ///
    /// # Panics
    /// Panics if `keypoints` is empty
    pub fn new(keypoints: Vec<ColorKeypoint>) -> Self {
        assert!(!keypoints.is_empty(), "gradient needs at least one keypoint");
        Self { keypoints }
    }

    /// Red → green → blue → red, a full hue cycle over [0, 1]
    pub fn hue_cycle() -> Self {
        Self::new(vec![
            ColorKeypoint::new(Rgb::RED, 0.0),
            ColorKeypoint::new(Rgb::GREEN, 0.33),
            ColorKeypoint::new(Rgb::BLUE, 0.66),
            ColorKeypoint::new(Rgb::RED, 1.0),
        ])
    }

    pub fn keypoints(&self) -> &[ColorKeypoint] {
        &self.keypoints
    }

    /// Sample the gradient at `t`
    ///
    /// Positions that fall outside every segment (past the last keypoint, or
    /// in a malformed table) return the last keypoint's color unmodified.
    pub fn color_at(&self, t: f64) -> Rgb {
        for pair in self.keypoints.windows(2) {
            let (k0, k1) = (pair[0], pair[1]);
            if k0.position <= t && t <= k1.position {
                let span = k1.position - k0.position;
                if span <= 0.0 {
                    // Zero-width segment: both ends sit at t
                    return k0.color;
                }
                let u = (t - k0.position) / span;
                return k0.color.blend_hcl(k1.color, u);
            }
        }

        self.last().color
    }

    fn last(&self) -> ColorKeypoint {
        // Non-empty by construction
        self.keypoints[self.keypoints.len() - 1]
    }
}

impl Default for GradientTable {
    fn default() -> Self {
        Self::hue_cycle()
    }
}
