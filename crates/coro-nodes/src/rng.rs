//! Per-voice pseudo-random source.
//!
//! A 32-bit linear congruential generator (Numerical Recipes constants). No
//! heap allocation, and every voice gets its own seed so runs are
//! reproducible and voices decorrelated.

/// Linear congruential generator.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
    seed: u32,
}

impl Lcg {
    /// Generator for voice `voice` of a node, derived from the engine seed.
    pub fn for_voice(seed: u32, voice: usize) -> Self {
        Self::new(0x1234_5678 ^ seed ^ (voice as u32).wrapping_mul(0x9E37_79B9))
    }

    /// Generator with an explicit seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed, seed }
    }

    /// Restart the sequence from the seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }

    /// Next value in `[0, 1)`.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        // Upper 16 bits have the longest period.
        (self.state >> 16) as f32 / 65536.0
    }

    /// Next value in `[min, max)`.
    #[inline]
    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_unit()
    }

    /// Next index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn next_index(&mut self, len: usize) -> usize {
        ((self.next_unit() * len as f32) as usize).min(len - 1)
    }
}
