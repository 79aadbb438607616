//! Nodes that write into tables: recorders, morphing and scaling.
//!
//! None of these produce audio of their own, so the recorders and the
//! morpher accept `mul`/`add` but ignore them.

use coro_core::{
    AuxKind, BlockOut, ChannelUnit, EngineConfig, NodeKind, ParamDomain, ParamFlags,
    ParamSpec, Table, VoiceValue,
};

use crate::control::{self, Control, is_trigger};

/// Recording fade length. Fixed at construction.
pub(crate) const FADETIME: ParamSpec =
    ParamSpec::number("fadetime", "Fade in and out of a recording, in seconds", 0.0, 10.0, 0.0)
        .with_flags(ParamFlags::FIXED);

/// Gain of sample `pos` in a recording of `size` samples with `fade` samples
/// of fade at each end.
pub(crate) fn fade_gain(pos: usize, size: usize, fade: usize) -> f32 {
    if fade == 0 {
        return 1.0;
    }
    let fade = fade.min(size / 2).max(1) as f32;
    let fade_in = pos as f32 / fade;
    let fade_out = (size - 1 - pos.min(size - 1)) as f32 / fade;
    fade_in.min(fade_out).min(1.0)
}

/// Write head shared by the table recorders.
struct Recorder {
    table: Table,
    fade_secs: f32,
    pos: usize,
    active: bool,
}

impl Recorder {
    fn swap_table(&mut self, value: &VoiceValue) {
        if let Ok(table) = control::table(value, "table") {
            self.pos = self.pos.min(table.size());
            self.active &= self.pos < table.size();
            self.table = table;
        }
    }

    fn restart(&mut self, active: bool) {
        self.pos = 0;
        self.active = active;
    }

    /// Record `input`, restarting on every trigger of `restart` if given.
    fn run(&mut self, input: &[f32], restart: Option<&[f32]>, out: &mut BlockOut<'_>) {
        let fade = (self.fade_secs * out.sample_rate) as usize;
        let (pos, active) = (&mut self.pos, &mut self.active);
        self.table.with_samples_mut(|samples| {
            let size = samples.len();
            for (i, &x) in input.iter().enumerate() {
                if restart.is_some_and(|t| is_trigger(t[i])) {
                    *pos = 0;
                    *active = true;
                }
                if *active && *pos < size {
                    samples[*pos] = x * fade_gain(*pos, size, fade);
                    *pos += 1;
                    if *pos >= size {
                        out.trig[i] = 1.0;
                        *active = false;
                        #[cfg(feature = "tracing")]
                        tracing::trace!("table recording complete: {size} samples");
                    }
                }
                out.time[i] = *pos as f32;
            }
        });
    }
}

// ============================================================================
// TableRec
// ============================================================================

/// Kind for [`TableRec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRecKind;

/// Parameter table of [`TableRecKind`].
pub const TABLE_REC_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Signal to record"),
    ParamSpec::required("table", "Destination table", ParamDomain::Table),
    FADETIME,
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct TableRecUnit {
    input: Control,
    rec: Recorder,
}

impl ChannelUnit for TableRecUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => self.rec.swap_table(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let input = self.input.block(out.len());
        self.rec.run(input, None, out);
    }

    fn reset(&mut self) {
        self.rec.restart(true);
    }
}

impl NodeKind for TableRecKind {
    fn name(&self) -> &'static str {
        "TableRec"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TABLE_REC_PARAMS
    }

    fn aux_streams(&self) -> &'static [AuxKind] {
        &[AuxKind::Trig, AuxKind::Time]
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
        Ok(Box::new(TableRecUnit {
            input: Control::new(&voice[0], config.block_size),
            rec: Recorder {
                table: control::table(&voice[1], "table")?,
                fade_secs: control::number(&voice[2]),
                pos: 0,
                active: true,
            },
        }))
    }
}

node_type! {
    /// Records its input into a table until the table is full. Starts
    /// stopped; each `play` restarts the recording.
    ///
    /// `trig` pulses when the table is full; `time` is the write position
    /// in samples.
    TableRec(TableRecKind, TABLE_REC_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "table" => table, set_table;
        [2] "fadetime" => fadetime, set_fadetime;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

// ============================================================================
// TrigTableRec
// ============================================================================

/// Kind for [`TrigTableRec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigTableRecKind;

/// Parameter table of [`TrigTableRecKind`].
pub const TRIG_TABLE_REC_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Signal to record"),
    ParamSpec::input("trig", "Each trigger restarts the recording"),
    ParamSpec::required("table", "Destination table", ParamDomain::Table),
    FADETIME,
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct TrigTableRecUnit {
    input: Control,
    trig: Control,
    rec: Recorder,
}

impl ChannelUnit for TrigTableRecUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => self.trig.set(value),
            2 => self.rec.swap_table(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let input = self.input.block(n);
        let trig = self.trig.block(n);
        self.rec.run(input, Some(trig), out);
    }

    fn reset(&mut self) {
        self.rec.restart(false);
    }
}

impl NodeKind for TrigTableRecKind {
    fn name(&self) -> &'static str {
        "TrigTableRec"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TRIG_TABLE_REC_PARAMS
    }

    fn aux_streams(&self) -> &'static [AuxKind] {
        &[AuxKind::Trig, AuxKind::Time]
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(TrigTableRecUnit {
            input: Control::new(&voice[0], config.block_size),
            trig: Control::new(&voice[1], config.block_size),
            rec: Recorder {
                table: control::table(&voice[2], "table")?,
                fade_secs: control::number(&voice[3]),
                pos: 0,
                active: false,
            },
        }))
    }
}

node_type! {
    /// Records its input into a table on every trigger.
    TrigTableRec(TrigTableRecKind, TRIG_TABLE_REC_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "trig" => trig, set_trig;
        [2] "table" => table, set_table;
        [3] "fadetime" => fadetime, set_fadetime;
        [4] "mul" => mul, set_mul;
        [5] "add" => add, set_add;
    }
}

// ============================================================================
// TablePut
// ============================================================================

/// Kind for [`TablePut`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TablePutKind;

/// Parameter table of [`TablePutKind`].
pub const TABLE_PUT_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Control signal to record"),
    ParamSpec::required("table", "Destination table", ParamDomain::Table),
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct TablePutUnit {
    input: Control,
    table: Table,
    pos: usize,
    last: Option<f32>,
    active: bool,
}

impl ChannelUnit for TablePutUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(table) = control::table(value, "table") {
                    self.pos = self.pos.min(table.size());
                    self.active &= self.pos < table.size();
                    self.table = table;
                }
            }
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let input = self.input.block(out.len());
        let (pos, last, active) = (&mut self.pos, &mut self.last, &mut self.active);
        self.table.with_samples_mut(|samples| {
            let size = samples.len();
            for (i, &x) in input.iter().enumerate() {
                if !*active || *last == Some(x) {
                    continue;
                }
                *last = Some(x);
                samples[*pos] = x;
                *pos += 1;
                if *pos >= size {
                    out.trig[i] = 1.0;
                    *active = false;
                    #[cfg(feature = "tracing")]
                    tracing::trace!("table put complete: {size} values");
                }
            }
        });
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.last = None;
        self.active = self.table.size() > 0;
    }
}

impl NodeKind for TablePutKind {
    fn name(&self) -> &'static str {
        "TablePut"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TABLE_PUT_PARAMS
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
        let table = control::table(&voice[1], "table")?;
        Ok(Box::new(TablePutUnit {
            input: Control::new(&voice[0], config.block_size),
            active: table.size() > 0,
            table,
            pos: 0,
            last: None,
        }))
    }
}

node_type! {
    /// Writes each new value of its input into the next table slot, skipping
    /// repeats, until the table is full. Starts stopped; each `play`
    /// restarts at the first slot.
    ///
    /// `trig` pulses when the table is full.
    TablePut(TablePutKind, TABLE_PUT_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "table" => table, set_table;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

// ============================================================================
// TableMorph
// ============================================================================

/// Kind for [`TableMorph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableMorphKind;

/// Parameter table of [`TableMorphKind`].
pub const TABLE_MORPH_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Morph position, 0 to 1"),
    ParamSpec::required("table", "Destination table", ParamDomain::Table),
    ParamSpec::required("sources", "Tables to morph between", ParamDomain::TableList)
        .with_flags(ParamFlags::WHOLE),
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct TableMorphUnit {
    input: Control,
    table: Table,
    sources: Vec<Table>,
    scratch: Vec<f32>,
}

impl ChannelUnit for TableMorphUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(table) = control::table(value, "table") {
                    self.table = table;
                }
            }
            2 => {
                if let Ok(sources) = control::tables(value, "sources") {
                    self.sources = sources;
                }
            }
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let index = self.input.block(out.len())[0];
        let (a, b, frac) = control::morph_position(index, self.sources.len());
        // Blend into scratch first: a source may also be the target.
        let scratch = &mut self.scratch;
        self.sources[a].with_samples(|s| {
            scratch.clear();
            scratch.extend(s.iter().map(|x| x * (1.0 - frac)));
        });
        self.sources[b].with_samples(|s| {
            for (d, x) in scratch.iter_mut().zip(s) {
                *d += x * frac;
            }
        });
        self.table.with_samples_mut(|t| {
            let len = t.len().min(scratch.len());
            t[..len].copy_from_slice(&scratch[..len]);
        });
    }

    fn reset(&mut self) {}
}

impl NodeKind for TableMorphKind {
    fn name(&self) -> &'static str {
        "TableMorph"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TABLE_MORPH_PARAMS
    }

    fn check_voice(&self, voice: &[VoiceValue]) -> Result<(), String> {
        control::check_table_sizes(&voice[1], &voice[2])
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        let table = control::table(&voice[1], "table")?;
        Ok(Box::new(TableMorphUnit {
            input: Control::new(&voice[0], config.block_size),
            scratch: Vec::with_capacity(table.size()),
            table,
            sources: control::tables(&voice[2], "sources")?,
        }))
    }
}

node_type! {
    /// Writes a blend of adjacent source tables into `table`, once per
    /// block, at the morph position read from its input.
    TableMorph(TableMorphKind, TABLE_MORPH_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "table" => table, set_table;
        [2] "sources" => sources, set_sources;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

// ============================================================================
// TableScale
// ============================================================================

/// Kind for [`TableScale`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableScaleKind;

/// Parameter table of [`TableScaleKind`]. Here `mul` and `add` scale the
/// table contents, not an output signal.
pub const TABLE_SCALE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("table", "Source table", ParamDomain::Table),
    ParamSpec::required("outtable", "Destination table", ParamDomain::Table),
    ParamSpec::number("mul", "Scale applied to each sample", f32::NEG_INFINITY, f32::INFINITY, 1.0),
    ParamSpec::number("add", "Offset applied after scaling", f32::NEG_INFINITY, f32::INFINITY, 0.0),
];

struct TableScaleUnit {
    table: Table,
    outtable: Table,
    mul: Control,
    add: Control,
    scratch: Vec<f32>,
}

impl ChannelUnit for TableScaleUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => {
                if let Ok(t) = control::table(value, "table") {
                    self.table = t;
                }
            }
            1 => {
                if let Ok(t) = control::table(value, "outtable") {
                    self.outtable = t;
                }
            }
            2 => self.mul.set(value),
            3 => self.add.set(value),
            _ => {}
        }
    }

    fn process(&mut self, _out: &mut BlockOut<'_>) {
        let (mul, add) = (self.mul.first(), self.add.first());
        let scratch = &mut self.scratch;
        self.table.with_samples(|s| {
            scratch.clear();
            scratch.extend(s.iter().map(|x| x * mul + add));
        });
        self.outtable.with_samples_mut(|t| {
            let len = t.len().min(scratch.len());
            t[..len].copy_from_slice(&scratch[..len]);
        });
    }

    fn reset(&mut self) {}
}

impl NodeKind for TableScaleKind {
    fn name(&self) -> &'static str {
        "TableScale"
    }

    fn params(&self) -> &'static [ParamSpec] {
        TABLE_SCALE_PARAMS
    }

    fn check_voice(&self, voice: &[VoiceValue]) -> Result<(), String> {
        let (Some(table), Some(out)) = (voice[0].as_table(), voice[1].as_table()) else {
            return Ok(());
        };
        if table.size() == out.size() {
            Ok(())
        } else {
            Err(format!(
                "source table size {} does not match output size {}",
                table.size(),
                out.size()
            ))
        }
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        let table = control::table(&voice[0], "table")?;
        Ok(Box::new(TableScaleUnit {
            scratch: Vec::with_capacity(table.size()),
            table,
            outtable: control::table(&voice[1], "outtable")?,
            mul: Control::new(&voice[2], config.block_size),
            add: Control::new(&voice[3], config.block_size),
        }))
    }
}

node_type! {
    /// Writes `table * mul + add` into `outtable` once per block.
    TableScale(TableScaleKind, TABLE_SCALE_PARAMS) {
        [0] "table" => table, set_table;
        [1] "outtable" => outtable, set_outtable;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_core::{CoroError, Engine, SetOutcome, SignalSource, StreamSource};

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

    struct Steps(Vec<f32>);

    impl SignalSource for Steps {
        fn voice_count(&self) -> usize {
            1
        }

        fn read(&self, _voice: usize, out: &mut [f32]) {
            out.copy_from_slice(&self.0);
        }
    }

    fn constant(engine: &Engine, value: f32) -> Sig {
        Sig::builder().arg("value", value).build_into(engine).unwrap()
    }

    #[test]
    fn fade_gain_ramps_both_ends() {
        assert_eq!(fade_gain(0, 10, 0), 1.0);
        assert_eq!(fade_gain(0, 10, 2), 0.0);
        assert_eq!(fade_gain(1, 10, 2), 0.5);
        assert_eq!(fade_gain(5, 10, 2), 1.0);
        assert_eq!(fade_gain(9, 10, 2), 0.0);
    }

    #[test]
    fn table_rec_fills_then_stops() {
        let engine = engine();
        let table = Table::new(12, 8000.0).unwrap();
        let src = constant(&engine, 0.5);
        let rec: TableRec = TableRec::builder()
            .arg("input", src.output())
            .arg("table", &table)
            .build_into(&engine)
            .unwrap();
        let end = rec.stream("trig").unwrap().into_source();
        let time = rec.stream("time").unwrap().into_source();

        engine.process_block();
        assert_eq!(table.snapshot(), vec![0.0; 12], "starts stopped");

        rec.play();
        engine.process_block();
        let mut buf = [0.0; BLOCK];
        time.read(0, &mut buf);
        assert_eq!(buf[7], 8.0);

        engine.process_block();
        end.read(0, &mut buf);
        assert_eq!(buf[3], 1.0);
        assert_eq!(table.snapshot(), vec![0.5; 12]);
    }

    #[test]
    fn table_rec_ignores_amplitude_writes() {
        let engine = engine();
        let src = constant(&engine, 0.5);
        let mut rec: TableRec = TableRec::builder()
            .arg("input", src.output())
            .arg("table", Table::new(8, 8000.0).unwrap())
            .build_into(&engine)
            .unwrap();
        assert_eq!(rec.set_mul(2.0).unwrap(), SetOutcome::Ignored);
        assert_eq!(rec.set_add(1.0).unwrap(), SetOutcome::Ignored);
        assert!(matches!(
            rec.set_fadetime(0.1),
            Err(CoroError::FixedParam { .. })
        ));
    }

    #[test]
    fn trig_table_rec_waits_for_trigger() {
        let engine = engine();
        let table = Table::new(4, 8000.0).unwrap();
        let src = constant(&engine, 1.0);
        let _rec: TrigTableRec = TrigTableRec::builder()
            .arg("input", src.output())
            .arg("trig", StreamSource::new(Pulses(vec![6])))
            .arg("table", &table)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        // Two samples recorded after the trigger at 6.
        assert_eq!(table.snapshot(), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn table_put_skips_repeats_and_stops_when_full() {
        let engine = engine();
        let table = Table::new(3, 8000.0).unwrap();
        let steps = Steps(vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        let put: TablePut = TablePut::builder()
            .arg("input", StreamSource::new(steps))
            .arg("table", &table)
            .build_into(&engine)
            .unwrap();
        let full = put.stream("trig").unwrap().into_source();

        engine.process_block();
        assert_eq!(table.snapshot(), vec![0.0; 3], "starts stopped");

        put.play();
        engine.process_block();
        assert_eq!(table.snapshot(), vec![1.0, 2.0, 3.0]);
        let mut buf = [0.0; BLOCK];
        full.read(0, &mut buf);
        assert_eq!(buf, [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

        table.fill(0.0);
        engine.process_block();
        assert_eq!(table.snapshot(), vec![0.0; 3], "stays done until replayed");
    }

    #[test]
    fn table_morph_blends_sources() {
        let engine = engine();
        let a = Table::from_samples(vec![0.0; 4], 8000.0).unwrap();
        let b = Table::from_samples(vec![1.0; 4], 8000.0).unwrap();
        let c = Table::from_samples(vec![3.0; 4], 8000.0).unwrap();
        let target = Table::new(4, 8000.0).unwrap();
        let index = constant(&engine, 0.75);
        let _morph: TableMorph = TableMorph::builder()
            .arg("input", index.output())
            .arg("table", &target)
            .arg("sources", vec![a, b, c])
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(target.snapshot(), vec![2.0; 4]);
    }

    #[test]
    fn table_morph_target_may_be_a_source() {
        let engine = engine();
        let a = Table::from_samples(vec![2.0; 4], 8000.0).unwrap();
        let b = Table::from_samples(vec![4.0; 4], 8000.0).unwrap();
        let index = constant(&engine, 0.5);
        let _morph: TableMorph = TableMorph::builder()
            .arg("input", index.output())
            .arg("table", &a)
            .arg("sources", vec![a.clone(), b])
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(a.snapshot(), vec![3.0; 4]);
    }

    #[test]
    fn table_morph_size_mismatch_is_configuration_error() {
        let engine = engine();
        let index = constant(&engine, 0.0);
        let err = TableMorph::builder()
            .arg("input", index.output())
            .arg("table", Table::new(8, 8000.0).unwrap())
            .arg(
                "sources",
                vec![Table::new(8, 8000.0).unwrap(), Table::new(4, 8000.0).unwrap()],
            )
            .build(&engine)
            .unwrap_err();
        assert!(matches!(err, CoroError::Configuration(_)), "{err}");
    }

    #[test]
    fn table_scale_writes_scaled_copy() {
        let engine = engine();
        let src = Table::from_samples(vec![1.0, 2.0, 3.0], 8000.0).unwrap();
        let out = Table::new(3, 8000.0).unwrap();
        let mut scale: TableScale = TableScale::builder()
            .arg("table", &src)
            .arg("outtable", &out)
            .arg("mul", 2.0)
            .arg("add", 1.0)
            .build_into(&engine)
            .unwrap();
        engine.process_block();
        assert_eq!(out.snapshot(), vec![3.0, 5.0, 7.0]);

        assert_eq!(scale.set_mul(0.0).unwrap(), SetOutcome::Applied);
        engine.process_block();
        assert_eq!(out.snapshot(), vec![1.0; 3]);
    }
}
