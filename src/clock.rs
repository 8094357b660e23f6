// Frame clock - Turns host refresh timestamps into frame deltas
//
// The host hands every frame callback a timestamp in milliseconds since an
// arbitrary epoch. The clock converts successive timestamps into a delta in
// seconds and accumulates a wrapping progress phase in [0, 1) that drives
// the gradient animation.

/// Seconds for one full trip through the gradient
pub const DEFAULT_CYCLE_SECONDS: f64 = 3.0;

/// Frame timer state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    previous_timestamp_ms: f64,
    progress: f64,
    cycle_seconds: f64,
}

impl FrameClock {
    /// Create a clock with the given gradient cycle length
    ///
    /// # Panics
    /// Panics if `cycle_seconds` is not a positive finite number
    pub fn new(cycle_seconds: f64) -> Self {
        assert!(
            cycle_seconds.is_finite() && cycle_seconds > 0.0,
            "gradient cycle must be positive, got {}",
            cycle_seconds
        );
        Self {
            previous_timestamp_ms: 0.0,
            progress: 0.0,
            cycle_seconds,
        }
    }

    /// Record a new timestamp and return the seconds elapsed since the last one
    ///
    /// The very first call measures from 0 ms, so its delta may be zero or
    /// arbitrarily large. Callers deriving a rate from the delta must cope
    /// with zero, negative and non-finite values.
    pub fn advance(&mut self, timestamp_ms: f64) -> f64 {
        let delta = (timestamp_ms - self.previous_timestamp_ms) / 1000.0;
        self.previous_timestamp_ms = timestamp_ms;

        if delta.is_finite() {
            self.progress += delta / self.cycle_seconds;
            if !(0.0..1.0).contains(&self.progress) {
                self.progress = self.progress.rem_euclid(1.0);
                if self.progress >= 1.0 {
                    self.progress = 0.0;
                }
            }
        }

        delta
    }

    /// Current phase through the gradient, in [0, 1)
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn cycle_seconds(&self) -> f64 {
        self.cycle_seconds
    }

    pub fn previous_timestamp_ms(&self) -> f64 {
        self.previous_timestamp_ms
    }

    /// Forget all timing history
    pub fn reset(&mut self) {
        self.previous_timestamp_ms = 0.0;
        self.progress = 0.0;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_SECONDS)
    }
}

/// Instantaneous frame rate for display, `None` when it cannot be derived
pub fn instantaneous_fps(delta_seconds: f64) -> Option<f64> {
    if delta_seconds.is_finite() && delta_seconds > 0.0 {
        Some(1.0 / delta_seconds)
    } else {
        None
    }
}

/// Human-readable FPS line for the status surface
pub fn format_fps(delta_seconds: f64) -> String {
    match instantaneous_fps(delta_seconds) {
        Some(fps) => format!("fps: {:.0}", fps),
        None => "fps: n/a".to_string(),
    }
}
