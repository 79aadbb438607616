//! Trigger generators and trigger-driven nodes.
//!
//! Triggers are single-sample pulses of 1.0 on an otherwise silent stream.
//! [`Metro`] produces them; the other kinds here react to them.

use std::sync::Arc;

use coro_core::{
    AuxKind, BlockOut, ChannelUnit, EngineConfig, NodeKind, ParamDomain, ParamFlags,
    ParamSpec, Table, VoiceValue,
};

use crate::control::{self, Control, is_trigger};
use crate::rng::Lcg;

// ============================================================================
// Metro
// ============================================================================

/// Kind for [`Metro`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetroKind;

/// Parameter table of [`MetroKind`].
pub const METRO_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("time", "Seconds between triggers", 0.001, 3600.0, 1.0),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct MetroUnit {
    time: Control,
    remaining: f32,
}

impl ChannelUnit for MetroUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        if slot == 0 {
            self.time.set(value);
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let time = self.time.block(n);
        for i in 0..n {
            // Fire on the nearest sample.
            if self.remaining < 0.5 {
                out.signal[i] = 1.0;
                self.remaining += (time[i] * sr).max(1.0);
            }
            self.remaining -= 1.0;
        }
    }

    fn reset(&mut self) {
        self.remaining = 0.0;
    }
}

impl NodeKind for MetroKind {
    fn name(&self) -> &'static str {
        "Metro"
    }

    fn params(&self) -> &'static [ParamSpec] {
        METRO_PARAMS
    }

    fn autoplay(&self) -> bool {
        false
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(MetroUnit {
            time: Control::new(&voice[0], config.block_size),
            remaining: 0.0,
        }))
    }
}

node_type! {
    /// Periodic trigger generator. Starts stopped; call `play`.
    Metro(MetroKind, METRO_PARAMS) {
        [0] "time" => time, set_time;
        [1] "mul" => mul, set_mul;
        [2] "add" => add, set_add;
    }
}

// ============================================================================
// TrigRand / TrigChoice
// ============================================================================

/// Glide from the current value to a new target over a fixed sample count.
#[derive(Debug, Clone)]
struct Glide {
    current: f32,
    target: f32,
    step: f32,
    count: u32,
    steps: u32,
    init: f32,
}

impl Glide {
    fn new(init: f32) -> Self {
        Self {
            current: init,
            target: init,
            step: 0.0,
            count: 0,
            steps: 0,
            init,
        }
    }

    fn retarget(&mut self, target: f32, steps: u32) {
        self.target = target;
        self.count = 0;
        self.steps = steps;
        if steps == 0 {
            self.current = target;
        } else {
            self.step = (target - self.current) / steps as f32;
        }
    }

    #[inline]
    fn tick(&mut self) -> f32 {
        if self.count < self.steps {
            self.count += 1;
            if self.count == self.steps {
                self.current = self.target;
            } else {
                self.current += self.step;
            }
        }
        self.current
    }

    fn reset(&mut self) {
        *self = Self::new(self.init);
    }
}

const PORT: ParamSpec = ParamSpec::number("port", "Glide time to a new value in seconds", 0.0, 60.0, 0.0);
const INIT: ParamSpec =
    ParamSpec::number("init", "Value before the first trigger", f32::NEG_INFINITY, f32::INFINITY, 0.0)
        .with_flags(ParamFlags::FIXED);

/// Kind for [`TrigRand`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigRandKind;

/// Parameter table of [`TrigRandKind`].
pub const TRIG_RAND_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Trigger stream"),
    ParamSpec::number("min", "Lowest value", f32::NEG_INFINITY, f32::INFINITY, 0.0),
    ParamSpec::number("max", "Highest value", f32::NEG_INFINITY, f32::INFINITY, 1.0),
    PORT,
    INIT,
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct TrigRandUnit {
    input: Control,
    min: Control,
    max: Control,
    port: f32,
    glide: Glide,
    rng: Lcg,
}

impl ChannelUnit for TrigRandUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => self.min.set(value),
            2 => self.max.set(value),
            3 => self.port = control::number(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let steps = libm::roundf(self.port * out.sample_rate) as u32;
        let input = self.input.block(n);
        let min = self.min.block(n);
        let max = self.max.block(n);
        for i in 0..n {
            if is_trigger(input[i]) {
                let target = self.rng.next_range(min[i], max[i]);
                self.glide.retarget(target, steps);
            }
            out.signal[i] = self.glide.tick();
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.glide.reset();
    }
}

impl NodeKind for TrigRandKind {
    fn name(&self) -> &'static str {
        "TrigRand"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TRIG_RAND_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(TrigRandUnit {
            input: Control::new(&voice[0], config.block_size),
            min: Control::new(&voice[1], config.block_size),
            max: Control::new(&voice[2], config.block_size),
            port: control::number(&voice[3]),
            glide: Glide::new(control::number(&voice[4])),
            rng: Lcg::for_voice(config.seed, index),
        }))
    }
}

node_type! {
    /// Picks a new random value in `[min, max)` on each trigger.
    TrigRand(TrigRandKind, TRIG_RAND_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "min" => min, set_min;
        [2] "max" => max, set_max;
        [3] "port" => port, set_port;
        [4] "init" => init, set_init;
        [5] "mul" => mul, set_mul;
        [6] "add" => add, set_add;
    }
}

/// Kind for [`TrigChoice`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigChoiceKind;

/// Parameter table of [`TrigChoiceKind`].
pub const TRIG_CHOICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Trigger stream"),
    ParamSpec::required("choice", "Values to pick from", ParamDomain::List)
        .with_flags(ParamFlags::WHOLE),
    PORT,
    INIT,
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct TrigChoiceUnit {
    input: Control,
    choice: Arc<[f32]>,
    port: f32,
    glide: Glide,
    rng: Lcg,
}

impl ChannelUnit for TrigChoiceUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(list) = control::list(value, "choice") {
                    self.choice = list;
                }
            }
            2 => self.port = control::number(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let steps = libm::roundf(self.port * out.sample_rate) as u32;
        let input = self.input.block(n);
        for i in 0..n {
            if is_trigger(input[i]) {
                let pick = self.choice[self.rng.next_index(self.choice.len())];
                self.glide.retarget(pick, steps);
            }
            out.signal[i] = self.glide.tick();
        }
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.glide.reset();
    }
}

impl NodeKind for TrigChoiceKind {
    fn name(&self) -> &'static str {
        "TrigChoice"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TRIG_CHOICE_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(TrigChoiceUnit {
            input: Control::new(&voice[0], config.block_size),
            choice: control::list(&voice[1], "choice")?,
            port: control::number(&voice[2]),
            glide: Glide::new(control::number(&voice[3])),
            rng: Lcg::for_voice(config.seed, index),
        }))
    }
}

node_type! {
    /// Picks a random element of `choice` on each trigger.
    TrigChoice(TrigChoiceKind, TRIG_CHOICE_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "choice" => choice, set_choice;
        [2] "port" => port, set_port;
        [3] "init" => init, set_init;
        [4] "mul" => mul, set_mul;
        [5] "add" => add, set_add;
    }
}

// ============================================================================
// TrigEnv
// ============================================================================

/// Kind for [`TrigEnv`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigEnvKind;

/// Parameter table of [`TrigEnvKind`].
pub const TRIG_ENV_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Trigger stream"),
    ParamSpec::required("table", "Envelope shape", ParamDomain::Table),
    ParamSpec::number("dur", "Envelope length in seconds", 0.001, 3600.0, 1.0),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct TrigEnvUnit {
    input: Control,
    table: Table,
    dur: Control,
    pos: f32,
    inc: f32,
    active: bool,
}

impl ChannelUnit for TrigEnvUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(table) = control::table(value, "table") {
                    self.table = table;
                }
            }
            2 => self.dur.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let input = self.input.block(n);
        let dur = self.dur.block(n);
        let (pos, inc, active) = (&mut self.pos, &mut self.inc, &mut self.active);
        self.table.with_samples(|samples| {
            let size = samples.len() as f32;
            for i in 0..n {
                if is_trigger(input[i]) {
                    *inc = size / libm::roundf(sr * dur[i]).max(1.0);
                    *pos = 0.0;
                    *active = true;
                }
                if !*active {
                    continue;
                }
                let ip = *pos as usize;
                let frac = *pos - ip as f32;
                let x0 = samples.get(ip).copied().unwrap_or(0.0);
                let x1 = samples.get(ip + 1).copied().unwrap_or(x0);
                out.signal[i] = x0 + (x1 - x0) * frac;
                *pos += *inc;
                if *pos >= size {
                    out.trig[i] = 1.0;
                    *active = false;
                }
            }
        });
    }

    fn reset(&mut self) {
        self.pos = 0.0;
        self.active = false;
    }
}

impl NodeKind for TrigEnvKind {
    fn name(&self) -> &'static str {
        "TrigEnv"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TRIG_ENV_PARAMS
    }

    fn aux_streams(&self) -> &'static [AuxKind] {
        &[AuxKind::Trig]
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(TrigEnvUnit {
            input: Control::new(&voice[0], config.block_size),
            table: control::table(&voice[1], "table")?,
            dur: Control::new(&voice[2], config.block_size),
            pos: 0.0,
            inc: 0.0,
            active: false,
        }))
    }
}

node_type! {
    /// Reads an envelope table once per trigger over `dur` seconds.
    ///
    /// The `trig` stream pulses when the envelope ends.
    TrigEnv(TrigEnvKind, TRIG_ENV_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "table" => table, set_table;
        [2] "dur" => dur, set_dur;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

// ============================================================================
// Counter
// ============================================================================

/// Kind for [`Counter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterKind;

/// Parameter table of [`CounterKind`].
pub const COUNTER_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Trigger stream"),
    ParamSpec::integer("min", "First value, included", -1_000_000, 1_000_000, 0),
    ParamSpec::integer("max", "Upper bound, excluded", -1_000_000, 1_000_000, 100),
    ParamSpec::integer("dir", "0 up, 1 down, 2 up and down", 0, 2, 0),
    ParamSpec::mul(),
    ParamSpec::add(),
];

/// Count state; the output holds `value` between triggers.
#[derive(Debug, Clone)]
struct Count {
    min: i64,
    max: i64,
    dir: u8,
    next: i64,
    direction: i64,
    value: f32,
}

impl Count {
    fn new(min: i64, max: i64, dir: u8) -> Self {
        let mut count = Self {
            min,
            max,
            dir,
            next: min,
            direction: 1,
            value: 0.0,
        };
        count.restart();
        count
    }

    fn restart(&mut self) {
        self.next = if self.dir == 1 { self.top() } else { self.min };
        self.direction = 1;
        self.value = 0.0;
    }

    fn top(&self) -> i64 {
        (self.max - 1).max(self.min)
    }

    fn step(&mut self) {
        self.value = self.next as f32;
        let top = self.top();
        if top <= self.min {
            self.next = self.min;
            return;
        }
        match self.dir {
            1 => {
                self.next -= 1;
                if self.next < self.min {
                    self.next = top;
                }
            }
            2 => {
                let next = self.next + self.direction;
                if next > top {
                    self.direction = -1;
                    self.next -= 1;
                } else if next < self.min {
                    self.direction = 1;
                    self.next += 1;
                } else {
                    self.next = next;
                }
            }
            _ => {
                self.next += 1;
                if self.next > top {
                    self.next = self.min;
                }
            }
        }
    }

    fn clamp_next(&mut self) {
        self.next = self.next.clamp(self.min, self.top());
    }
}

struct CounterUnit {
    input: Control,
    count: Count,
}

impl ChannelUnit for CounterUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        let v = control::number(value) as i64;
        match slot {
            0 => self.input.set(value),
            1 => {
                self.count.min = v;
                self.count.clamp_next();
            }
            2 => {
                self.count.max = v;
                self.count.clamp_next();
            }
            3 => self.count.dir = v.clamp(0, 2) as u8,
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let input = self.input.block(n);
        for i in 0..n {
            if is_trigger(input[i]) {
                self.count.step();
            }
            out.signal[i] = self.count.value;
        }
    }

    fn reset(&mut self) {
        self.count.restart();
    }
}

impl NodeKind for CounterKind {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn params(&self) -> &'static [ParamSpec] {
        COUNTER_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        let min = control::number(&voice[1]) as i64;
        let max = control::number(&voice[2]) as i64;
        let dir = control::number(&voice[3]).clamp(0.0, 2.0) as u8;
        Ok(Box::new(CounterUnit {
            input: Control::new(&voice[0], config.block_size),
            count: Count::new(min, max, dir),
        }))
    }
}

node_type! {
    /// Counts triggers between `min` (included) and `max` (excluded).
    Counter(CounterKind, COUNTER_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "min" => min, set_min;
        [2] "max" => max, set_max;
        [3] "dir" => dir, set_dir;
        [4] "mul" => mul, set_mul;
        [5] "add" => add, set_add;
    }
}

// ============================================================================
// Select
// ============================================================================

/// Kind for [`Select`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectKind;

/// Parameter table of [`SelectKind`]. A trigger stream has no level to
/// scale, so `mul` and `add` are ignored.
pub const SELECT_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Integer stream, usually a Counter"),
    ParamSpec::integer("value", "Value to match", -1_000_000, 1_000_000, 0),
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct SelectUnit {
    input: Control,
    value: i64,
    last: Option<i64>,
}

impl ChannelUnit for SelectUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => self.value = control::number(value) as i64,
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let input = self.input.block(n);
        for i in 0..n {
            let x = input[i] as i64;
            if x == self.value && self.last != Some(x) {
                out.signal[i] = 1.0;
            }
            self.last = Some(x);
        }
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

impl NodeKind for SelectKind {
    fn name(&self) -> &'static str {
        "Select"
    }

    fn params(&self) -> &'static [ParamSpec] {
        SELECT_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(SelectUnit {
            input: Control::new(&voice[0], config.block_size),
            value: control::number(&voice[1]) as i64,
            last: None,
        }))
    }
}

node_type! {
    /// Sends a trigger when its integer input changes to `value`.
    Select(SelectKind, SELECT_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "value" => value, set_value;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_core::{Engine, SetOutcome, SignalSource, StreamSource};

    const BLOCK: usize = 8;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            sample_rate: 8000.0,
            block_size: BLOCK,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    /// Trigger stream with pulses at fixed sample offsets of every block.
    struct Pulses(Vec<usize>);

    impl SignalSource for Pulses {
        fn voice_count(&self) -> usize {
            1
        }

        fn read(&self, _voice: usize, out: &mut [f32]) {
            out.fill(0.0);
            for &i in &self.0 {
                out[i] = 1.0;
            }
        }
    }

    fn pulses(at: &[usize]) -> StreamSource {
        StreamSource::new(Pulses(at.to_vec()))
    }

    fn block(source: &StreamSource, voice: usize) -> Vec<f32> {
        let mut out = vec![0.0; BLOCK];
        source.read(voice, &mut out);
        out
    }

    #[test]
    fn metro_fires_on_period() {
        let engine = engine();
        // 2 ms at 8 kHz = 16 samples.
        let metro: Metro = Metro::builder().arg("time", 0.002).build_into(&engine).unwrap();
        assert!(!metro.is_playing());
        metro.play();
        engine.process_block();
        let first = block(&metro.output(), 0);
        engine.process_block();
        let second = block(&metro.output(), 0);
        engine.process_block();
        let third = block(&metro.output(), 0);
        assert_eq!(first[0], 1.0);
        assert_eq!(first.iter().sum::<f32>(), 1.0);
        assert_eq!(second.iter().sum::<f32>(), 0.0);
        assert_eq!(third[0], 1.0);
    }

    #[test]
    fn trig_rand_stays_in_range_and_holds() {
        let engine = engine();
        let rand: TrigRand = TrigRand::builder()
            .arg("input", pulses(&[2]))
            .arg("min", 10.0)
            .arg("max", 20.0)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        let out = block(&rand.output(), 0);
        assert_eq!(out[0], 0.0, "init before first trigger");
        assert!((10.0..20.0).contains(&out[2]));
        assert!(out[2..].iter().all(|&v| v == out[2]));
    }

    #[test]
    fn trig_rand_port_glides() {
        let engine = engine();
        let rand: TrigRand = TrigRand::builder()
            .arg("input", pulses(&[0]))
            .arg("min", 10.0)
            .arg("max", 20.0)
            .arg("port", 0.001)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        let out = block(&rand.output(), 0);
        // Eight-sample glide from 0: strictly increasing, target reached at the end.
        assert!(out.windows(2).all(|w| w[1] > w[0]), "{out:?}");
        assert!(out[7] >= 10.0);
    }

    #[test]
    fn trig_choice_picks_from_list() {
        let engine = engine();
        let choice: TrigChoice = TrigChoice::builder()
            .arg("input", pulses(&[0, 3, 6]))
            .arg("choice", [2.0, 4.0, 8.0])
            .arg("init", 1.0)
            .build_into(&engine)
            .unwrap();
        for _ in 0..4 {
            engine.process_block();
            for v in block(&choice.output(), 0) {
                assert!([2.0, 4.0, 8.0].contains(&v), "{v}");
            }
        }
    }

    #[test]
    fn trig_choice_list_is_not_expanded() {
        let engine = engine();
        let mut choice: TrigChoice = TrigChoice::builder()
            .arg("input", pulses(&[0]))
            .arg("choice", [1.0, 2.0, 3.0, 4.0, 5.0])
            .build_into(&engine)
            .unwrap();
        assert_eq!(choice.voice_count(), 1);
        choice.set_choice([7.0]).unwrap();
        assert_eq!(choice.voice_count(), 1);
    }

    #[test]
    fn trig_env_reads_table_and_signals_end() {
        let engine = engine();
        let table = Table::from_fn(8, 8000.0, |i| i as f32).unwrap();
        // 8-sample table over 1 ms at 8 kHz: one table sample per output sample.
        let env: TrigEnv = TrigEnv::builder()
            .arg("input", pulses(&[0]))
            .arg("table", &table)
            .arg("dur", 0.001)
            .build_into(&engine)
            .unwrap();
        let end = env.stream("trig").unwrap().into_source();
        engine.process_block();
        let out = block(&env.output(), 0);
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let end = block(&end, 0);
        assert_eq!(end[7], 1.0);
        assert_eq!(end.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn counter_counts_up_excluding_max() {
        let engine = engine();
        let counter: Counter = Counter::builder()
            .arg("input", pulses(&[0, 1, 2, 3, 4, 5, 6, 7]))
            .arg("min", 0)
            .arg("max", 3)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(
            block(&counter.output(), 0),
            vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0]
        );
    }

    #[test]
    fn counter_directions() {
        let mut down = Count::new(0, 3, 1);
        let mut bounce = Count::new(0, 3, 2);
        let seq = |c: &mut Count| {
            (0..6)
                .map(|_| {
                    c.step();
                    c.value
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(seq(&mut down), vec![2.0, 1.0, 0.0, 2.0, 1.0, 0.0]);
        assert_eq!(seq(&mut bounce), vec![0.0, 1.0, 2.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn select_fires_on_match_edge() {
        let engine = engine();
        let counter: Counter = Counter::builder()
            .arg("input", pulses(&[0, 2, 4, 6]))
            .arg("max", 2)
            .build_into(&engine)
            .unwrap();
        let mut select: Select = Select::builder()
            .arg("input", counter.output())
            .arg("value", 1)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        // Counter: 0 0 1 1 0 0 1 1
        assert_eq!(
            block(&select.output(), 0),
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(select.set_mul(0.5).unwrap(), SetOutcome::Ignored);
    }
}
