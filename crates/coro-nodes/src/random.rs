//! Periodic random generators.
//!
//! Each voice draws from its own [`Lcg`], restarted whenever the node is
//! played, so renders are reproducible.

use std::sync::Arc;

use coro_core::{
    AuxKind, BlockOut, ChannelUnit, EngineConfig, NodeKind, ParamDomain, ParamFlags,
    ParamSpec, VoiceValue,
};

use crate::control::{self, Control};
use crate::rng::Lcg;

const FREQ: ParamSpec = ParamSpec::number("freq", "New values per second", 0.0, 24000.0, 1.0);

/// Phase accumulator that fires once per period, and on the first sample
/// after a reset.
#[derive(Debug, Clone, Default)]
struct Clock {
    phase: f32,
    primed: bool,
}

impl Clock {
    /// Advance by one sample; returns whether a new value is due and the
    /// phase within the current period.
    #[inline]
    fn tick(&mut self, inc: f32) -> (bool, f32) {
        let fire = if !self.primed {
            self.primed = true;
            self.phase = 0.0;
            true
        } else if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
            true
        } else {
            false
        };
        let phase = self.phase;
        self.phase += inc.max(0.0);
        (fire, phase)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

const RANGE_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("min", "Lowest value", f32::NEG_INFINITY, f32::INFINITY, 0.0),
    ParamSpec::number("max", "Highest value", f32::NEG_INFINITY, f32::INFINITY, 1.0),
    FREQ,
    ParamSpec::mul(),
    ParamSpec::add(),
];

/// Parameter table of [`RandiKind`].
pub const RANDI_PARAMS: &[ParamSpec] = RANGE_PARAMS;

/// Parameter table of [`RandhKind`].
pub const RANDH_PARAMS: &[ParamSpec] = RANGE_PARAMS;

/// `min`, `max` and `freq` controls shared by [`Randi`] and [`Randh`].
struct Range {
    min: Control,
    max: Control,
    freq: Control,
}

impl Range {
    fn new(voice: &[VoiceValue], block_size: usize) -> Self {
        Self {
            min: Control::new(&voice[0], block_size),
            max: Control::new(&voice[1], block_size),
            freq: Control::new(&voice[2], block_size),
        }
    }

    fn set(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.min.set(value),
            1 => self.max.set(value),
            2 => self.freq.set(value),
            _ => {}
        }
    }
}

// ============================================================================
// Randi / Randh
// ============================================================================

/// Kind for [`Randi`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandiKind;

struct RandiUnit {
    range: Range,
    clock: Clock,
    rng: Lcg,
    old: f32,
    new: Option<f32>,
}

impl ChannelUnit for RandiUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        self.range.set(slot, value);
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let min = self.range.min.block(n);
        let max = self.range.max.block(n);
        let freq = self.range.freq.block(n);
        for i in 0..n {
            let (fire, phase) = self.clock.tick(freq[i] / sr);
            if fire {
                self.old = match self.new {
                    Some(v) => v,
                    None => self.rng.next_range(min[i], max[i]),
                };
                self.new = Some(self.rng.next_range(min[i], max[i]));
            }
            let new = self.new.unwrap_or(self.old);
            out.signal[i] = self.old + (new - self.old) * phase;
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.clock.reset();
        self.new = None;
    }
}

impl NodeKind for RandiKind {
    fn name(&self) -> &'static str {
        "Randi"
    }

    fn params(&self) -> &'static [ParamSpec] {
        RANDI_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(RandiUnit {
            range: Range::new(voice, config.block_size),
            clock: Clock::default(),
            rng: Lcg::for_voice(config.seed, index),
            old: 0.0,
            new: None,
        }))
    }
}

node_type! {
    /// Random values in `[min, max)` at `freq`, linearly interpolated.
    Randi(RandiKind, RANDI_PARAMS) {
        [0] "min" => min, set_min;
        [1] "max" => max, set_max;
        [2] "freq" => freq, set_freq;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

/// Kind for [`Randh`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandhKind;

struct RandhUnit {
    range: Range,
    clock: Clock,
    rng: Lcg,
    value: f32,
}

impl ChannelUnit for RandhUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        self.range.set(slot, value);
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let min = self.range.min.block(n);
        let max = self.range.max.block(n);
        let freq = self.range.freq.block(n);
        for i in 0..n {
            if self.clock.tick(freq[i] / sr).0 {
                self.value = self.rng.next_range(min[i], max[i]);
            }
            out.signal[i] = self.value;
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.clock.reset();
    }
}

impl NodeKind for RandhKind {
    fn name(&self) -> &'static str {
        "Randh"
    }

    fn params(&self) -> &'static [ParamSpec] {
        RANDH_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(RandhUnit {
            range: Range::new(voice, config.block_size),
            clock: Clock::default(),
            rng: Lcg::for_voice(config.seed, index),
            value: 0.0,
        }))
    }
}

node_type! {
    /// Random values in `[min, max)` at `freq`, held between draws.
    Randh(RandhKind, RANDH_PARAMS) {
        [0] "min" => min, set_min;
        [1] "max" => max, set_max;
        [2] "freq" => freq, set_freq;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

// ============================================================================
// RandInt
// ============================================================================

/// Kind for [`RandInt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandIntKind;

/// Parameter table of [`RandIntKind`].
pub const RAND_INT_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("max", "Exclusive upper bound", 0.0, f32::INFINITY, 100.0),
    FREQ,
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct RandIntUnit {
    max: Control,
    freq: Control,
    clock: Clock,
    rng: Lcg,
    value: f32,
}

impl ChannelUnit for RandIntUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.max.set(value),
            1 => self.freq.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let freq = self.freq.block(n);
        let max = self.max.block(n);
        for i in 0..n {
            if self.clock.tick(freq[i] / sr).0 {
                self.value = libm::floorf(self.rng.next_unit() * max[i].max(0.0));
            }
            out.signal[i] = self.value;
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.clock.reset();
    }
}

impl NodeKind for RandIntKind {
    fn name(&self) -> &'static str {
        "RandInt"
    }

    fn params(&self) -> &'static [ParamSpec] {
        RAND_INT_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(RandIntUnit {
            max: Control::new(&voice[0], config.block_size),
            freq: Control::new(&voice[1], config.block_size),
            clock: Clock::default(),
            rng: Lcg::for_voice(config.seed, index),
            value: 0.0,
        }))
    }
}

node_type! {
    /// Random integers in `[0, max)` at `freq`, held between draws.
    RandInt(RandIntKind, RAND_INT_PARAMS) {
        [0] "max" => max, set_max;
        [1] "freq" => freq, set_freq;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

// ============================================================================
// Choice
// ============================================================================

/// Kind for [`Choice`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceKind;

/// Parameter table of [`ChoiceKind`].
pub const CHOICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("choice", "Values to pick from", ParamDomain::List)
        .with_flags(ParamFlags::WHOLE),
    FREQ,
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct ChoiceUnit {
    choice: Arc<[f32]>,
    freq: Control,
    clock: Clock,
    rng: Lcg,
    value: f32,
}

impl ChannelUnit for ChoiceUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => {
                if let Ok(list) = control::list(value, "choice") {
                    self.choice = list;
                }
            }
            1 => self.freq.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let freq = self.freq.block(n);
        for i in 0..n {
            if self.clock.tick(freq[i] / sr).0 {
                self.value = self.choice[self.rng.next_index(self.choice.len())];
            }
            out.signal[i] = self.value;
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.clock.reset();
    }
}

impl NodeKind for ChoiceKind {
    fn name(&self) -> &'static str {
        "Choice"
    }

    fn params(&self) -> &'static [ParamSpec] {
        CHOICE_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(ChoiceUnit {
            choice: control::list(&voice[0], "choice")?,
            freq: Control::new(&voice[1], config.block_size),
            clock: Clock::default(),
            rng: Lcg::for_voice(config.seed, index),
            value: 0.0,
        }))
    }
}

node_type! {
    /// Picks a random element of `choice` at `freq`.
    Choice(ChoiceKind, CHOICE_PARAMS) {
        [0] "choice" => choice, set_choice;
        [1] "freq" => freq, set_freq;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

// ============================================================================
// Urn
// ============================================================================

/// Kind for [`Urn`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UrnKind;

/// Parameter table of [`UrnKind`].
pub const URN_PARAMS: &[ParamSpec] = &[
    ParamSpec::integer("max", "Values are drawn from 0 to max - 1", 1, 1 << 20, 100),
    FREQ,
    ParamSpec::mul(),
    ParamSpec::add(),
];

/// Integers `0..max`, each drawn once per cycle.
#[derive(Debug, Clone)]
struct Pool {
    max: u32,
    left: Vec<u32>,
}

impl Pool {
    fn new(max: u32) -> Self {
        Self {
            max: max.max(1),
            left: Vec::new(),
        }
    }

    fn set_max(&mut self, max: u32) {
        self.max = max.max(1);
        self.left.clear();
    }

    /// Draw one value; the flag is set when that draw emptied the pool.
    fn draw(&mut self, rng: &mut Lcg) -> (u32, bool) {
        if self.left.is_empty() {
            self.left.extend(0..self.max);
        }
        let value = self.left.swap_remove(rng.next_index(self.left.len()));
        (value, self.left.is_empty())
    }
}

struct UrnUnit {
    pool: Pool,
    freq: Control,
    clock: Clock,
    rng: Lcg,
    value: f32,
}

impl ChannelUnit for UrnUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.pool.set_max(control::number(value) as u32),
            1 => self.freq.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let freq = self.freq.block(n);
        for i in 0..n {
            if self.clock.tick(freq[i] / sr).0 {
                let (value, emptied) = self.pool.draw(&mut self.rng);
                self.value = value as f32;
                if emptied {
                    out.trig[i] = 1.0;
                }
            }
            out.signal[i] = self.value;
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.clock.reset();
        self.pool.left.clear();
    }
}

impl NodeKind for UrnKind {
    fn name(&self) -> &'static str {
        "Urn"
    }

    fn params(&self) -> &'static [ParamSpec] {
        URN_PARAMS
    }

    fn aux_streams(&self) -> &'static [AuxKind] {
        &[AuxKind::Trig]
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(UrnUnit {
            pool: Pool::new(control::number(&voice[0]) as u32),
            freq: Control::new(&voice[1], config.block_size),
            clock: Clock::default(),
            rng: Lcg::for_voice(config.seed, index),
            value: 0.0,
        }))
    }
}

node_type! {
    /// Draws integers below `max` without repetition at `freq`.
    ///
    /// `trig` pulses on the draw that empties the pool; the next draw
    /// starts a fresh cycle.
    Urn(UrnKind, URN_PARAMS) {
        [0] "max" => max, set_max;
        [1] "freq" => freq, set_freq;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}
