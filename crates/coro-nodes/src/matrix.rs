//! Matrix recording, reading and morphing.

use coro_core::{
    AuxKind, BlockOut, ChannelUnit, EngineConfig, Matrix, NodeKind, ParamDomain, ParamFlags,
    ParamSpec, VoiceValue,
};

use crate::control::{self, Control};
use crate::table_write::{FADETIME, fade_gain};

// ============================================================================
// MatrixRec
// ============================================================================

/// Kind for [`MatrixRec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixRecKind;

/// Parameter table of [`MatrixRecKind`].
pub const MATRIX_REC_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Signal to record"),
    ParamSpec::required("matrix", "Destination matrix", ParamDomain::Matrix),
    FADETIME,
    ParamSpec::integer("delay", "Samples to wait after play before recording", 0, 1 << 24, 0)
        .with_flags(ParamFlags::FIXED),
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct MatrixRecUnit {
    input: Control,
    matrix: Matrix,
    fade_secs: f32,
    delay: usize,
    wait: usize,
    pos: usize,
    active: bool,
}

impl ChannelUnit for MatrixRecUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(matrix) = control::matrix(value, "matrix") {
                    self.pos = self.pos.min(matrix.size());
                    self.active &= self.pos < matrix.size();
                    self.matrix = matrix;
                }
            }
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let fade = (self.fade_secs * out.sample_rate) as usize;
        let input = self.input.block(out.len());
        let (wait, pos, active) = (&mut self.wait, &mut self.pos, &mut self.active);
        self.matrix.with_cells_mut(|cells| {
            let size = cells.len();
            for (i, &x) in input.iter().enumerate() {
                if !*active {
                    break;
                }
                if *wait > 0 {
                    *wait -= 1;
                    continue;
                }
                cells[*pos] = x * fade_gain(*pos, size, fade);
                *pos += 1;
                if *pos >= size {
                    out.trig[i] = 1.0;
                    *active = false;
                    #[cfg(feature = "tracing")]
                    tracing::trace!("matrix recording complete: {size} cells");
                }
            }
        });
    }

    fn reset(&mut self) {
        self.wait = self.delay;
        self.pos = 0;
        self.active = true;
    }
}

impl NodeKind for MatrixRecKind {
    fn name(&self) -> &'static str {
        "MatrixRec"
    }

    fn params(&self) -> &'static [ParamSpec] {
        MATRIX_REC_PARAMS
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
        let delay = control::number(&voice[3]) as usize;
        Ok(Box::new(MatrixRecUnit {
            input: Control::new(&voice[0], config.block_size),
            matrix: control::matrix(&voice[1], "matrix")?,
            fade_secs: control::number(&voice[2]),
            delay,
            wait: delay,
            pos: 0,
            active: true,
        }))
    }
}

node_type! {
    /// Records its input into a matrix, row by row. Starts stopped.
    ///
    /// `trig` pulses when the last cell is written.
    MatrixRec(MatrixRecKind, MATRIX_REC_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "matrix" => matrix, set_matrix;
        [2] "fadetime" => fadetime, set_fadetime;
        [3] "delay" => delay, set_delay;
        [4] "mul" => mul, set_mul;
        [5] "add" => add, set_add;
    }
}

// ============================================================================
// MatrixRecLoop
// ============================================================================

/// Kind for [`MatrixRecLoop`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixRecLoopKind;

/// Parameter table of [`MatrixRecLoopKind`].
pub const MATRIX_REC_LOOP_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Signal to record"),
    ParamSpec::required("matrix", "Destination matrix", ParamDomain::Matrix),
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct MatrixRecLoopUnit {
    input: Control,
    matrix: Matrix,
    pos: usize,
}

impl ChannelUnit for MatrixRecLoopUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(matrix) = control::matrix(value, "matrix") {
                    if self.pos >= matrix.size() {
                        self.pos = 0;
                    }
                    self.matrix = matrix;
                }
            }
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let input = self.input.block(out.len());
        let pos = &mut self.pos;
        self.matrix.with_cells_mut(|cells| {
            let size = cells.len();
            if size == 0 {
                return;
            }
            for (i, &x) in input.iter().enumerate() {
                cells[*pos] = x;
                *pos += 1;
                if *pos >= size {
                    *pos = 0;
                    out.trig[i] = 1.0;
                }
            }
        });
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

impl NodeKind for MatrixRecLoopKind {
    fn name(&self) -> &'static str {
        "MatrixRecLoop"
    }

    fn params(&self) -> &'static [ParamSpec] {
        MATRIX_REC_LOOP_PARAMS
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
        Ok(Box::new(MatrixRecLoopUnit {
            input: Control::new(&voice[0], config.block_size),
            matrix: control::matrix(&voice[1], "matrix")?,
            pos: 0,
        }))
    }
}

node_type! {
    /// Records its input into a matrix row by row, wrapping to the first
    /// cell after the last.
    ///
    /// `trig` pulses on every wrap.
    MatrixRecLoop(MatrixRecLoopKind, MATRIX_REC_LOOP_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "matrix" => matrix, set_matrix;
        [2] "mul" => mul, set_mul;
        [3] "add" => add, set_add;
    }
}

// ============================================================================
// MatrixPointer
// ============================================================================

/// Kind for [`MatrixPointer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixPointerKind;

/// Parameter table of [`MatrixPointerKind`].
pub const MATRIX_POINTER_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("matrix", "Matrix to read", ParamDomain::Matrix),
    ParamSpec::input("x", "Normalized column position, 0 to 1"),
    ParamSpec::input("y", "Normalized row position, 0 to 1"),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct MatrixPointerUnit {
    matrix: Matrix,
    x: Control,
    y: Control,
}

impl ChannelUnit for MatrixPointerUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => {
                if let Ok(matrix) = control::matrix(value, "matrix") {
                    self.matrix = matrix;
                }
            }
            1 => self.x.set(value),
            2 => self.y.set(value),
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        let x = self.x.block(n);
        let y = self.y.block(n);
        for i in 0..n {
            out.signal[i] = self.matrix.read_linear(x[i], y[i]);
        }
    }

    fn reset(&mut self) {}
}

impl NodeKind for MatrixPointerKind {
    fn name(&self) -> &'static str {
        "MatrixPointer"
    }

    fn params(&self) -> &'static [ParamSpec] {
        MATRIX_POINTER_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(MatrixPointerUnit {
            matrix: control::matrix(&voice[0], "matrix")?,
            x: Control::new(&voice[1], config.block_size),
            y: Control::new(&voice[2], config.block_size),
        }))
    }
}

node_type! {
    /// Bilinear matrix reader driven by two position streams.
    MatrixPointer(MatrixPointerKind, MATRIX_POINTER_PARAMS) {
        [0] "matrix" => matrix, set_matrix;
        [1] "x" => x, set_x;
        [2] "y" => y, set_y;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}

// ============================================================================
// MatrixMorph
// ============================================================================

/// Kind for [`MatrixMorph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixMorphKind;

/// Parameter table of [`MatrixMorphKind`].
pub const MATRIX_MORPH_PARAMS: &[ParamSpec] = &[
    ParamSpec::input("input", "Morph position, 0 to 1"),
    ParamSpec::required("matrix", "Destination matrix", ParamDomain::Matrix),
    ParamSpec::required("sources", "Matrices to morph between", ParamDomain::MatrixList)
        .with_flags(ParamFlags::WHOLE),
    ParamSpec::ignored("mul", 1.0),
    ParamSpec::ignored("add", 0.0),
];

struct MatrixMorphUnit {
    input: Control,
    matrix: Matrix,
    sources: Vec<Matrix>,
    scratch: Vec<f32>,
}

impl ChannelUnit for MatrixMorphUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        match slot {
            0 => self.input.set(value),
            1 => {
                if let Ok(matrix) = control::matrix(value, "matrix") {
                    self.matrix = matrix;
                }
            }
            2 => {
                if let Ok(sources) = control::matrices(value, "sources") {
                    self.sources = sources;
                }
            }
            _ => {}
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let index = self.input.block(out.len())[0];
        let (a, b, frac) = control::morph_position(index, self.sources.len());
        let scratch = &mut self.scratch;
        self.sources[a].with_cells(|c| {
            scratch.clear();
            scratch.extend(c.iter().map(|x| x * (1.0 - frac)));
        });
        self.sources[b].with_cells(|c| {
            for (d, x) in scratch.iter_mut().zip(c) {
                *d += x * frac;
            }
        });
        self.matrix.with_cells_mut(|m| {
            let len = m.len().min(scratch.len());
            m[..len].copy_from_slice(&scratch[..len]);
        });
    }

    fn reset(&mut self) {}
}

impl NodeKind for MatrixMorphKind {
    fn name(&self) -> &'static str {
        "MatrixMorph"
    }

    fn params(&self) -> &'static [ParamSpec] {
        MATRIX_MORPH_PARAMS
    }

    fn check_voice(&self, voice: &[VoiceValue]) -> Result<(), String> {
        control::check_matrix_dims(&voice[1], &voice[2])
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        let matrix = control::matrix(&voice[1], "matrix")?;
        Ok(Box::new(MatrixMorphUnit {
            input: Control::new(&voice[0], config.block_size),
            scratch: Vec::with_capacity(matrix.size()),
            matrix,
            sources: control::matrices(&voice[2], "sources")?,
        }))
    }
}

node_type! {
    /// Writes a blend of adjacent source matrices into `matrix` once per
    /// block.
    MatrixMorph(MatrixMorphKind, MATRIX_MORPH_PARAMS) {
        [0] "input" => input, set_input_value;
        [1] "matrix" => matrix, set_matrix;
        [2] "sources" => sources, set_sources;
        [3] "mul" => mul, set_mul;
        [4] "add" => add, set_add;
    }
}
