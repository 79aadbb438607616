//! Helpers shared by the channel units: per-block control buffers and
//! argument extraction.

use std::sync::Arc;

use coro_core::{Container, ControlInput, Matrix, Table, VoiceValue};

/// A numeric parameter or input, resolved once per block.
#[derive(Debug, Clone)]
pub(crate) struct Control {
    input: ControlInput,
    buf: Vec<f32>,
}

impl Control {
    pub(crate) fn new(value: &VoiceValue, block_size: usize) -> Self {
        Self {
            input: ControlInput::from_voice(value).unwrap_or_default(),
            buf: vec![0.0; block_size],
        }
    }

    pub(crate) fn set(&mut self, value: &VoiceValue) {
        if let Some(input) = ControlInput::from_voice(value) {
            self.input = input;
        }
    }

    /// Current block of `n` values.
    pub(crate) fn block(&mut self, n: usize) -> &[f32] {
        if self.buf.len() < n {
            self.buf.resize(n, 0.0);
        }
        let buf = &mut self.buf[..n];
        self.input.fill(buf);
        buf
    }

    /// Constant value, or the first sample of the current block for streams.
    pub(crate) fn first(&mut self) -> f32 {
        match self.input.constant() {
            Some(v) => v,
            None => self.block(1)[0],
        }
    }
}

/// Trigger streams carry 1.0 on the sample an event happens.
#[inline]
pub(crate) fn is_trigger(x: f32) -> bool {
    x == 1.0
}

pub(crate) fn number(value: &VoiceValue) -> f32 {
    value.as_number().unwrap_or(0.0)
}

pub(crate) fn table(value: &VoiceValue, name: &str) -> Result<Table, String> {
    value
        .as_table()
        .cloned()
        .ok_or_else(|| format!("{name}: expected a table, got {}", value.kind_name()))
}

pub(crate) fn matrix(value: &VoiceValue, name: &str) -> Result<Matrix, String> {
    value
        .as_matrix()
        .cloned()
        .ok_or_else(|| format!("{name}: expected a matrix, got {}", value.kind_name()))
}

pub(crate) fn list(value: &VoiceValue, name: &str) -> Result<Arc<[f32]>, String> {
    match value {
        VoiceValue::List(list) if !list.is_empty() => Ok(Arc::clone(list)),
        other => Err(format!("{name}: expected a non-empty list, got {}", other.kind_name())),
    }
}

pub(crate) fn tables(value: &VoiceValue, name: &str) -> Result<Vec<Table>, String> {
    value
        .as_containers()
        .and_then(|c| c.iter().map(|c| c.as_table().cloned()).collect::<Option<Vec<_>>>())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("{name}: expected a list of tables"))
}

pub(crate) fn matrices(value: &VoiceValue, name: &str) -> Result<Vec<Matrix>, String> {
    value
        .as_containers()
        .and_then(|c| {
            c.iter()
                .map(|c| c.as_matrix().cloned())
                .collect::<Option<Vec<_>>>()
        })
        .filter(|m| !m.is_empty())
        .ok_or_else(|| format!("{name}: expected a list of matrices"))
}

/// Sizes of every table in a voice that must agree.
pub(crate) fn check_table_sizes(target: &VoiceValue, sources: &VoiceValue) -> Result<(), String> {
    let (Some(target), Some(sources)) = (target.as_table(), sources.as_containers()) else {
        return Ok(());
    };
    for source in sources.iter().filter_map(Container::as_table) {
        if source.size() != target.size() {
            return Err(format!(
                "source table size {} does not match target size {}",
                source.size(),
                target.size()
            ));
        }
    }
    Ok(())
}

/// Dimensions of every matrix in a voice that must agree.
pub(crate) fn check_matrix_dims(target: &VoiceValue, sources: &VoiceValue) -> Result<(), String> {
    let (Some(target), Some(sources)) = (target.as_matrix(), sources.as_containers()) else {
        return Ok(());
    };
    for source in sources.iter().filter_map(Container::as_matrix) {
        if source.dimensions() != target.dimensions() {
            let (sw, sh) = source.dimensions();
            let (tw, th) = target.dimensions();
            return Err(format!(
                "source matrix {sw}x{sh} does not match target {tw}x{th}"
            ));
        }
    }
    Ok(())
}

/// Linear blend between adjacent sources at morph position `index` in `[0, 1]`.
///
/// Returns the pair of source indices and the blend factor.
pub(crate) fn morph_position(index: f32, sources: usize) -> (usize, usize, f32) {
    if sources < 2 {
        return (0, 0, 0.0);
    }
    let pos = index.clamp(0.0, 1.0) * (sources - 1) as f32;
    let a = (pos as usize).min(sources - 2);
    (a, a + 1, pos - a as f32)
}
