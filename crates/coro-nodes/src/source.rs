//! Plain signal sources.

use coro_core::{BlockOut, ChannelUnit, EngineConfig, NodeKind, ParamSpec, VoiceValue};

use crate::control::Control;

/// Kind for [`Sig`]: a constant, or a follower of another node's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigKind;

/// Parameter table of [`SigKind`].
pub const SIG_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("value", "Output value", f32::NEG_INFINITY, f32::INFINITY, 0.0),
    ParamSpec::mul(),
    ParamSpec::add(),
];

struct SigUnit {
    value: Control,
}

impl ChannelUnit for SigUnit {
    fn set_param(&mut self, slot: usize, value: &VoiceValue) {
        if slot == 0 {
            self.value.set(value);
        }
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        let n = out.len();
        out.signal.copy_from_slice(self.value.block(n));
    }

    fn reset(&mut self) {}
}

impl NodeKind for SigKind {
    fn name(&self) -> &'static str {
        "Sig"
    }

    fn params(&self) -> &'static [ParamSpec] {
        SIG_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(SigUnit {
            value: Control::new(&voice[0], config.block_size),
        }))
    }
}

node_type! {
    /// Converts numbers or streams into a node output.
    ///
    /// ```rust
    /// use coro_core::{Engine, EngineConfig};
    /// use coro_nodes::Sig;
    ///
    /// let engine = Engine::new(EngineConfig::default()).unwrap();
    /// let mut sig: Sig = Sig::builder().arg("value", [0.25, 0.5]).build_into(&engine).unwrap();
    /// assert_eq!(sig.voice_count(), 2);
    /// sig.set_value(1.0).unwrap();
    /// ```
    Sig(SigKind, SIG_PARAMS) {
        [0] "value" => value, set_value;
        [1] "mul" => mul, set_mul;
        [2] "add" => add, set_add;
    }
}
