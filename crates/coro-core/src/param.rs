//! Linear ramps for crossfades and recording fades.
//!
//! A [`Ramp`] moves from its current value to a target at a constant rate,
//! reaching the target after exactly `duration * sample_rate` samples. A
//! duration of zero jumps straight to the target.
//!
//! ```rust
//! use coro_core::Ramp;
//!
//! let mut fade = Ramp::with_config(0.0, 48000.0, 0.01);
//! fade.set_target(1.0);
//! for _ in 0..480 {
//!     fade.advance();
//! }
//! assert!(fade.is_settled());
//! ```

/// A value that ramps linearly towards a target.
#[derive(Debug, Clone)]
pub struct Ramp {
    /// Current value
    current: f32,
    /// Target value
    target: f32,
    /// Increment per sample
    increment: f32,
    /// Samples left until the target is reached
    samples_remaining: u32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Ramp length in seconds
    duration_secs: f32,
}

impl Ramp {
    /// Create a settled ramp at `initial` with a zero duration.
    pub fn new(initial: f32) -> Self {
        Self::with_config(initial, 44100.0, 0.0)
    }

    /// Create a settled ramp with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, duration_secs: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            duration_secs: duration_secs.max(0.0),
        }
    }

    /// Start ramping towards `target` from the current value.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
        let samples = (self.duration_secs * self.sample_rate) as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Jump to `value` and stop ramping.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Update sample rate. Takes effect on the next [`set_target`](Self::set_target).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set the ramp length in seconds. Takes effect on the next target.
    pub fn set_duration_secs(&mut self, secs: f32) {
        self.duration_secs = secs.max(0.0);
    }

    /// Ramp length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Samples left before the target is reached.
    #[inline]
    pub fn samples_remaining(&self) -> u32 {
        self.samples_remaining
    }

    /// Returns `true` once the target has been reached.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new(0.0)
    }
}
