//! Table readers: oscillators, one-shot/looping playback and pointers.

use coro_core::{
    AuxKind, BlockOut, ChannelUnit, EngineConfig, NodeKind, ParamDomain, ParamSpec,
    Table, VoiceValue,
};

use crate::control::{self, Control};
use crate::interp::Interp;

const TABLE: ParamSpec = ParamSpec::required("table", "Table to read", ParamDomain::Table);
const INTERP: ParamSpec =
    ParamSpec::integer("interp", "1 none, 2 linear, 3 cosine, 4 cubic", 1, 4, 2);

fn set_table(table: &mut Table, value: &VoiceValue) {
    if let Ok(t) = control::table(value, "table") {
        *table = t;
    }
}

// ============================================================================
// Osc
// ============================================================================

/// Kind for [`Osc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OscKind;

/// Parameter table of [`OscKind`].
pub const OSC_PARAMS: &[ParamSpec] = &[
    TABLE,
    ParamSpec::number("freq", "Cycles per second", -24000.0, 24000.0, 1000.0),
    ParamSpec::number("phase", "Phase offset in cycles", 0.0, 1.0, 0.0),
    INTERP,
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct OscUnit {
    table: Table,
    freq: Control,
    phase: Control,
    interp: Interp,
    acc: f32,
}

impl ChannelUnit for OscUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => set_table(&mut self.table, value),
            1 => self.freq.set(value),
            2 => self.phase.set(value),
            3 => self.interp = Interp::from_code(control::number(value)),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let freq = self.freq.block(n);
        let phase = self.phase.block(n);
        let (acc, interp) = (&mut self.acc, self.interp);
        self.table.with_samples(|samples| {
            let size = samples.len() as f32;
            for i in 0..n {
                let pos = (*acc + phase[i]).rem_euclid(1.0) * size;
                out.signal[i] = interp.read(samples, pos);
                *acc = (*acc + freq[i] / sr).rem_euclid(1.0);
            }
        });
    }

    fn reset(&mut self) {
        self.acc = 0.0;
    }
}

impl NodeKind for OscKind {
    fn name(&self) -> &'static str {
        "Osc"
    }

    fn params(&self) -> &'static [ParamSpec] {
        OSC_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(OscUnit {
            table: control::table(&voice[0], "table")?,
            freq: Control::new(&voice[1], config.block_size),
            phase: Control::new(&voice[2], config.block_size),
            interp: Interp::from_code(control::number(&voice[3])),
            acc: 0.0,
        }))
    }
}

node_type! {
    /// Wavetable oscillator.
    ///
    /// ```rust
    /// use coro_core::{Engine, EngineConfig, Table};
    /// use coro_nodes::Osc;
    ///
    /// let engine = Engine::new(EngineConfig::default()).unwrap();
    /// let sine = Table::sine(2048, 48000.0).unwrap();
    /// let osc: Osc = Osc::builder()
    ///     .arg("table", &sine)
    ///     .arg("freq", [220.0, 330.0, 440.0])
    ///     .build_into(&engine)
    ///     .unwrap();
    /// assert_eq!(osc.voice_count(), 3);
    /// ```
    Osc(OscKind, OSC_PARAMS) {
        [0] "table" => table, set_table;
        [1] "freq" => freq, set_freq;
        [2] "phase" => phase, set_phase;
        [3] "interp" => interp, set_interp;
        [4] "mul" => mul, set_mul;
        [5] "add" => add, set_add;
    }
}

// ============================================================================
// TableRead
// ============================================================================

/// Kind for [`TableRead`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReadKind;

/// Parameter table of [`TableReadKind`].
pub const TABLE_READ_PARAMS: &[ParamSpec] = &[
    TABLE,
    ParamSpec::number("freq", "Table passes per second", -24000.0, 24000.0, 1.0),
    ParamSpec::flag("loop", "Restart at the end instead of stopping", false),
    INTERP,
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct TableReadUnit {
    table: Table,
    freq: Control,
    looping: bool,
    interp: Interp,
    pos: f32,
    done: bool,
}

impl ChannelUnit for TableReadUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => {
                set_table(&mut self.table, value);
                self.pos = self.pos.min(self.table.size() as f32);
            }
            1 => self.freq.set(value),
            2 => self.looping = value.as_flag().unwrap_or(false),
            3 => self.interp = Interp::from_code(control::number(value)),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        if self.done {
            return;
        }
        let n = out.len();
        let sr = out.sample_rate;
        let freq = self.freq.block(n);
        let (pos, done, looping, interp) =
            (&mut self.pos, &mut self.done, self.looping, self.interp);
        self.table.with_samples(|samples| {
            let size = samples.len() as f32;
            for i in 0..n {
                out.signal[i] = interp.read(samples, *pos);
                *pos += freq[i] * size / sr;
                if *pos >= size || *pos < 0.0 {
                    out.trig[i] = 1.0;
                    if !looping {
                        *done = true;
                        return;
                    }
                    *pos = pos.rem_euclid(size);
                }
            }
        });
    }

    fn reset(&mut self) {
        self.pos = 0.0;
        self.done = false;
    }
}

impl NodeKind for TableReadKind {
    fn name(&self) -> &'static str {
        "TableRead"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TABLE_READ_PARAMS
    }

    fn aux_streams(&self) -> &'static [AuxKind] {
        &[AuxKind::Trig]
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
        Ok(Box::new(TableReadUnit {
            table: control::table(&voice[0], "table")?,
            freq: Control::new(&voice[1], config.block_size),
            looping: voice[2].as_flag().unwrap_or(false),
            interp: Interp::from_code(control::number(&voice[3])),
            pos: 0.0,
            done: false,
        }))
    }
}

node_type! {
    /// Plays a table at `freq` passes per second. Starts stopped.
    ///
    /// The `trig` stream pulses at the end of each pass.
    TableRead(TableReadKind, TABLE_READ_PARAMS) {
        [0] "table" => table, set_table;
        [1] "freq" => freq, set_freq;
        [2] "loop" => looping, set_loop;
        [3] "interp" => interp, set_interp;
        [4] "mul" => mul, set_mul;
        [5] "add" => add, set_add;
    }
}

// ============================================================================
// Pointer
// ============================================================================

/// Kind for [`Pointer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerKind;

/// Parameter table of [`PointerKind`].
pub const POINTER_PARAMS: &[ParamSpec] = &[
    TABLE,
    ParamSpec::input("index", "Normalized read position, 0 to 1"),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct PointerUnit {
    table: Table,
    index: Control,
}

impl ChannelUnit for PointerUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => set_table(&mut self.table, value),
            1 => self.index.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let index = self.index.block(n);
        self.table.with_samples(|samples| {
            let size = samples.len() as f32;
            for i in 0..n {
                out.signal[i] = Interp::Linear.read(samples, index[i] * size);
            }
        });
    }

    fn reset(&mut self) {}
}

impl NodeKind for PointerKind {
    fn name(&self) -> &'static str {
        "Pointer"
    }

    fn params(&self) -> &'static [ParamSpec] {
        POINTER_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(PointerUnit {
            table: control::table(&voice[0], "table")?,
            index: Control::new(&voice[1], config.block_size),
        }))
    }
}

node_type! {
    /// Reads a table at a position driven by another stream.
    Pointer(PointerKind, POINTER_PARAMS) {
        [0] "table" => table, set_table;
        [1] "index" => index, set_index;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

// ============================================================================
// OscLoop
// ============================================================================

/// Kind for [`OscLoop`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OscLoopKind;

/// Parameter table of [`OscLoopKind`].
pub const OSC_LOOP_PARAMS: &[ParamSpec] = &[
    TABLE,
    ParamSpec::number("freq", "Cycles per second", -24000.0, 24000.0, 1000.0),
    ParamSpec::number("feedback", "Output added to the read position", 0.0, 1.0, 0.0),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct OscLoopUnit {
    table: Table,
    freq: Control,
    feedback: Control,
    acc: f32,
    last: f32,
}

impl ChannelUnit for OscLoopUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => set_table(&mut self.table, value),
            1 => self.freq.set(value),
            2 => self.feedback.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let sr = out.sample_rate;
        let freq = self.freq.block(n);
        let feedback = self.feedback.block(n);
        let (acc, last) = (&mut self.acc, &mut self.last);
        self.table.with_samples(|samples| {
            let size = samples.len() as f32;
            for i in 0..n {
                let offset = *last * feedback[i].clamp(0.0, 1.0);
                let pos = (*acc + offset).rem_euclid(1.0) * size;
                let value = Interp::Linear.read(samples, pos);
                out.signal[i] = value;
                *last = value;
                *acc = (*acc + freq[i] / sr).rem_euclid(1.0);
            }
        });
    }

    fn reset(&mut self) {
        self.acc = 0.0;
        self.last = 0.0;
    }
}

impl NodeKind for OscLoopKind {
    fn name(&self) -> &'static str {
        "OscLoop"
    }

    fn params(&self) -> &'static [ParamSpec] {
        OSC_LOOP_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(OscLoopUnit {
            table: control::table(&voice[0], "table")?,
            freq: Control::new(&voice[1], config.block_size),
            feedback: Control::new(&voice[2], config.block_size),
            acc: 0.0,
            last: 0.0,
        }))
    }
}

node_type! {
    /// Wavetable oscillator whose previous output shifts the read position.
    OscLoop(OscLoopKind, OSC_LOOP_PARAMS) {
        [0] "table" => table, set_table;
        [1] "freq" => freq, set_freq;
        [2] "feedback" => feedback, set_feedback;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

// ============================================================================
// TableIndex / Lookup
// ============================================================================

/// Kind for [`TableIndex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableIndexKind;

/// Parameter table of [`TableIndexKind`].
pub const TABLE_INDEX_PARAMS: &[ParamSpec] = &[
    TABLE,
    ParamSpec::input("index", "Sample position, truncated"),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct TableIndexUnit {
    table: Table,
    index: Control,
}

impl ChannelUnit for TableIndexUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => set_table(&mut self.table, value),
            1 => self.index.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let index = self.index.block(n);
        self.table.with_samples(|samples| {
            let Some(last) = samples.len().checked_sub(1) else {
                return;
            };
            for i in 0..n {
                // Negative and NaN positions saturate to 0.
                let at = (index[i] as usize).min(last);
                out.signal[i] = samples[at];
            }
        });
    }

    fn reset(&mut self) {}
}

impl NodeKind for TableIndexKind {
    fn name(&self) -> &'static str {
        "TableIndex"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TABLE_INDEX_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(TableIndexUnit {
            table: control::table(&voice[0], "table")?,
            index: Control::new(&voice[1], config.block_size),
        }))
    }
}

node_type! {
    /// Reads the table sample at an integer position, without interpolation.
    TableIndex(TableIndexKind, TABLE_INDEX_PARAMS) {
        [0] "table" => table, set_table;
        [1] "index" => index, set_index;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

/// Kind for [`Lookup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupKind;

/// Parameter table of [`LookupKind`].
pub const LOOKUP_PARAMS: &[ParamSpec] = &[
    TABLE,
    ParamSpec::input("index", "Position from -1 to 1"),
    ParamSpec::mul(),
    ParamSpec::add(),
];

/// Linear read over `[-1, 1]` mapped onto the whole table, clamped at the ends.
fn lookup(samples: &[f32], index: f32) -> f32 {
    let Some(last) = samples.len().checked_sub(1) else {
        return 0.0;
    };
    if index.is_nan() {
        return samples[0];
    }
    let pos = (index.clamp(-1.0, 1.0) * 0.5 + 0.5) * last as f32;
    let i = (pos as usize).min(last);
    let frac = pos - i as f32;
    let a = samples[i];
    let b = samples[(i + 1).min(last)];
    a + (b - a) * frac
}

struct LookupUnit {
    table: Table,
    index: Control,
}

impl ChannelUnit for LookupUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => set_table(&mut self.table, value),
            1 => self.index.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let index = self.index.block(n);
        self.table.with_samples(|samples| {
            for i in 0..n {
                out.signal[i] = lookup(samples, index[i]);
            }
        });
    }

    fn reset(&mut self) {}
}

impl NodeKind for LookupKind {
    fn name(&self) -> &'static str {
        "Lookup"
    }

    fn params(&self) -> &'static [ParamSpec] {
        LOOKUP_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(LookupUnit {
            table: control::table(&voice[0], "table")?,
            index: Control::new(&voice[1], config.block_size),
        }))
    }
}

node_type! {
    /// Transfer function: maps an input in `[-1, 1]` through the table.
    Lookup(LookupKind, LOOKUP_PARAMS) {
        [0] "table" => table, set_table;
        [1] "index" => index, set_index;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_core::{Engine, StreamSource};

    use crate::Sig;

    const BLOCK: usize = 8;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            sample_rate: 8000.0,
            block_size: BLOCK,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn block(source: &StreamSource, voice: usize) -> Vec<f32> {
        let mut out = vec![0.0; BLOCK];
        source.read(voice, &mut out);
        out
    }

    fn ramp(size: usize) -> Table {
        Table::from_fn(size, 8000.0, |i| i as f32).unwrap()
    }

    #[test]
    fn osc_steps_through_table() {
        let engine = engine();
        // 8-sample table at 1 kHz: one table step per sample at 8 kHz.
        let osc: Osc = Osc::builder()
            .arg("table", ramp(8))
            .arg("freq", 1000.0)
            .arg("interp", 1)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(
            block(&osc.output(), 0),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]
        );
    }

    #[test]
    fn osc_reset_restarts_phase() {
        let engine = engine();
        // 16-sample table at 500 Hz: one step per sample, two blocks per cycle.
        let osc: Osc = Osc::builder()
            .arg("table", ramp(16))
            .arg("freq", 500.0)
            .arg("interp", 1)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        let first = block(&osc.output(), 0);
        osc.reset();
        engine.process_block();
        assert_eq!(block(&osc.output(), 0), first);
        assert!(osc.is_playing());
    }

    #[test]
    fn table_read_reset_keeps_it_stopped() {
        let engine = engine();
        let read: TableRead = TableRead::builder()
            .arg("table", ramp(16))
            .arg("freq", 500.0)
            .build_into(&engine)
            .unwrap();
        read.reset();
        engine.process_block();
        assert!(!read.is_playing());
        assert_eq!(block(&read.output(), 0), vec![0.0; BLOCK]);
    }

    #[test]
    fn osc_phase_offsets_voices() {
        let engine = engine();
        let osc: Osc = Osc::builder()
            .arg("table", ramp(8))
            .arg("freq", 0.0)
            .arg("phase", [0.0, 0.5])
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(block(&osc.output(), 0)[0], 0.0);
        assert_eq!(block(&osc.output(), 1)[0], 4.0);
    }

    #[test]
    fn table_read_one_shot_stops_and_triggers() {
        let engine = engine();
        // 4-sample table, 2000 passes per second: one sample per step.
        let read: TableRead = TableRead::builder()
            .arg("table", ramp(4))
            .arg("freq", 2000.0)
            .build_into(&engine)
            .unwrap();
        let end = read.stream("trig").unwrap().into_source();
        engine.process_block();
        assert_eq!(block(&read.output(), 0), vec![0.0; BLOCK], "starts stopped");

        read.play();
        engine.process_block();
        assert_eq!(
            block(&read.output(), 0),
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(block(&end, 0)[3], 1.0);
    }

    #[test]
    fn table_read_loops() {
        let engine = engine();
        let mut read: TableRead = TableRead::builder()
            .arg("table", ramp(4))
            .arg("freq", 2000.0)
            .build_into(&engine)
            .unwrap();
        read.set_loop(true).unwrap();
        read.play();
        engine.process_block();
        assert_eq!(
            block(&read.output(), 0),
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]
        );
        let trig = block(&read.stream("trig").unwrap().into_source(), 0);
        assert_eq!(trig.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn pointer_follows_index_stream() {
        let engine = engine();
        let index: Sig = Sig::builder().arg("value", 0.25).build_into(&engine).unwrap();
        let pointer: Pointer = Pointer::builder()
            .arg("table", ramp(8))
            .arg("index", index.output())
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(block(&pointer.output(), 0), vec![2.0; BLOCK]);
    }

    #[test]
    fn osc_loop_without_feedback_matches_osc() {
        let engine = engine();
        let osc: OscLoop = OscLoop::builder()
            .arg("table", ramp(8))
            .arg("freq", 1000.0)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(
            block(&osc.output(), 0),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]
        );
    }

    #[test]
    fn osc_loop_feedback_shifts_reads() {
        let engine = engine();
        let table = Table::from_fn(8, 8000.0, |i| i as f32 / 8.0).unwrap();
        let osc: OscLoop = OscLoop::builder()
            .arg("table", table)
            .arg("freq", 1000.0)
            .arg("feedback", 1.0)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        let out = block(&osc.output(), 0);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.125);
        // Phase 2 plus one sample of feedback from out[1].
        assert_eq!(out[2], 0.375);

        osc.reset();
        engine.process_block();
        assert_eq!(block(&osc.output(), 0), out);
    }

    #[test]
    fn table_index_truncates_and_clamps() {
        let engine = engine();
        let index: Sig = Sig::builder()
            .arg("value", [2.7, -3.0, 40.0])
            .build_into(&engine)
            .unwrap();
        let read: TableIndex = TableIndex::builder()
            .arg("table", ramp(8))
            .arg("index", index.output())
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(block(&read.output(), 0)[0], 2.0);
        assert_eq!(block(&read.output(), 1)[0], 0.0);
        assert_eq!(block(&read.output(), 2)[0], 7.0);
    }

    #[test]
    fn lookup_maps_signed_input_over_table() {
        let samples: Vec<f32> = (0..9).map(|i| i as f32).collect();
        assert_eq!(lookup(&samples, -1.0), 0.0);
        assert_eq!(lookup(&samples, 0.0), 4.0);
        assert_eq!(lookup(&samples, 1.0), 8.0);
        assert_eq!(lookup(&samples, 0.125), 4.5);
        assert_eq!(lookup(&samples, 3.0), 8.0);
        assert_eq!(lookup(&samples, f32::NAN), 0.0);
        assert_eq!(lookup(&[], 0.5), 0.0);

        let engine = engine();
        let node: Lookup = Lookup::builder()
            .arg("table", Table::from_samples(samples, 8000.0).unwrap())
            .arg("index", 0.5)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(block(&node.output(), 0), vec![6.0; BLOCK]);
    }

    #[test]
    fn wrong_table_argument_fails_construction() {
        let engine = engine();
        let err = Osc::builder()
            .arg("table", 1.0)
            .build(&engine)
            .unwrap_err();
        assert!(err.to_string().contains("table"), "{err}");
    }
}
