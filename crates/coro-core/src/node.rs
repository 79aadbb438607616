//! Nodes: the user-facing handle over a channel array.
//!
//! A [`Node`] is built from a [`NodeKind`] (parameter table plus unit
//! factory) and a set of named arguments. Construction broadcasts the
//! arguments, fixes the voice count, builds the channel array and registers
//! it with the [`Engine`]. After that, every attribute write goes through the
//! node's attribute proxy:
//!
//! 1. the new value is stored as the parameter's current value,
//! 2. it is re-broadcast alone against the frozen voice count,
//! 3. each voice's value is checked and queued on its channel, in voice order.
//!
//! A rejected value stops the write at the failing voice. Voices already
//! queued keep the new value; there is no rollback.
//!
//! ```rust
//! use coro_core::{
//!     BlockOut, ChannelUnit, Engine, EngineConfig, NodeBuilder, NodeKind, ParamSpec, VoiceValue,
//! };
//!
//! struct Level(f32);
//!
//! impl ChannelUnit for Level {
//!     fn set_param(&mut self, _slot: usize, value: &VoiceValue) {
//!         self.0 = value.as_number().unwrap_or(0.0);
//!     }
//!     fn process(&mut self, out: &mut BlockOut<'_>) {
//!         out.signal.fill(self.0);
//!     }
//!     fn reset(&mut self) {}
//! }
//!
//! struct LevelKind;
//!
//! impl NodeKind for LevelKind {
//!     fn name(&self) -> &'static str {
//!         "Level"
//!     }
//!     fn params(&self) -> &'static [ParamSpec] {
//!         const PARAMS: &[ParamSpec] = &[ParamSpec::number("value", "Level", -1.0, 1.0, 0.0)];
//!         PARAMS
//!     }
//!     fn build_unit(
//!         &self,
//!         voice: &[VoiceValue],
//!         _index: usize,
//!         _config: &EngineConfig,
//!     ) -> Result<Box<dyn ChannelUnit>, String> {
//!         Ok(Box::new(Level(voice[0].as_number().unwrap_or(0.0))))
//!     }
//! }
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let mut node = NodeBuilder::new(LevelKind)
//!     .arg("value", [0.1, 0.2, 0.3])
//!     .build(&engine)
//!     .unwrap();
//! assert_eq!(node.voice_count(), 3);
//! node.set("value", [0.5]).unwrap();
//! assert_eq!(node.voice_count(), 3);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::aux_stream::{self, AuxKind, AuxStreamView, HasAuxiliaryStreams};
use crate::broadcast::{self, Broadcast};
use crate::channel::{ChannelArray, ChannelId, ChannelUnit};
use crate::engine::{Engine, EngineConfig};
use crate::error::{CoroError, Result};
use crate::fader::InputFader;
use crate::param_info::ParamSpec;
use crate::signal::{SignalSource, StreamSource, StreamTap};
use crate::value::{ExpandableValue, VoiceValue};

/// A kind of node: its parameter table and how to build one voice.
///
/// Implementations are usually unit structs. Slot indices passed to
/// [`ChannelUnit::set_param`] are positions in [`params`](Self::params).
pub trait NodeKind: Send + Sync {
    /// Display name, e.g. `"TableRec"`.
    fn name(&self) -> &'static str;

    /// Ordered parameter table.
    fn params(&self) -> &'static [ParamSpec];

    /// Auxiliary streams this kind publishes.
    fn aux_streams(&self) -> &'static [AuxKind] {
        &[]
    }

    /// Whether new nodes start playing immediately. Recorders do not.
    fn autoplay(&self) -> bool {
        true
    }

    /// Cross-parameter checks on one voice (e.g. matching container sizes).
    ///
    /// Runs at construction and on every attribute write; a rejection
    /// surfaces as [`CoroError::Configuration`].
    fn check_voice(&self, _voice: &[VoiceValue]) -> core::result::Result<(), String> {
        Ok(())
    }

    /// Build the unit for voice `index` from its resolved arguments.
    fn build_unit(
        &self,
        voice: &[VoiceValue],
        index: usize,
        config: &EngineConfig,
    ) -> core::result::Result<Box<dyn ChannelUnit>, String>;
}

/// What an attribute write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The value was broadcast to every channel.
    Applied,
    /// The parameter does not apply to this node kind; the value was stored
    /// but no channel was touched.
    Ignored,
}

/// Key for bracket-style sub-stream access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKey<'a> {
    /// A named auxiliary stream.
    Name(&'a str),
    /// One voice of the main output.
    Voice(usize),
}

impl<'a> From<&'a str> for StreamKey<'a> {
    fn from(name: &'a str) -> Self {
        StreamKey::Name(name)
    }
}

impl From<usize> for StreamKey<'_> {
    fn from(voice: usize) -> Self {
        StreamKey::Voice(voice)
    }
}

/// Result of bracket-style access.
#[derive(Debug, Clone)]
pub enum Substream {
    /// A fresh auxiliary stream view.
    Aux(AuxStreamView),
    /// One voice of the main output.
    Voice(StreamTap),
}

impl From<Substream> for StreamSource {
    fn from(sub: Substream) -> Self {
        match sub {
            Substream::Aux(view) => view.into_source(),
            Substream::Voice(tap) => StreamSource::new(SingleVoice(tap)),
        }
    }
}

struct SingleVoice(StreamTap);

impl SignalSource for SingleVoice {
    fn voice_count(&self) -> usize {
        1
    }

    fn read(&self, _voice: usize, out: &mut [f32]) {
        self.0.read(out);
    }
}

/// Collects named arguments for a node.
pub struct NodeBuilder<K> {
    kind: K,
    args: Vec<(String, ExpandableValue)>,
}

impl<K: NodeKind> NodeBuilder<K> {
    /// Start a builder with every argument at its default.
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            args: Vec::new(),
        }
    }

    /// Set argument `name`. Later calls for the same name win.
    pub fn arg(mut self, name: &str, value: impl Into<ExpandableValue>) -> Self {
        self.args.push((name.to_string(), value.into()));
        self
    }

    /// Set several arguments at once.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (S, ExpandableValue)>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|(name, value)| (name.into(), value)));
        self
    }

    /// Build the node and register its channel array with `engine`.
    ///
    /// Nothing is left registered if construction fails.
    pub fn build(self, engine: &Engine) -> Result<Node<K>> {
        Node::new(engine, self.kind, self.args)
    }

    /// Build the node and wrap it in a typed handle.
    pub fn build_into<W: From<Node<K>>>(self, engine: &Engine) -> Result<W> {
        self.build(engine).map(W::from)
    }
}

/// A multi-voice node.
pub struct Node<K> {
    kind: K,
    values: Vec<ExpandableValue>,
    resolved: Vec<Vec<VoiceValue>>,
    faders: Vec<Option<InputFader>>,
    array: Arc<ChannelArray>,
    default_fade_secs: f32,
}

fn param_index(params: &[ParamSpec], name: &str) -> Option<usize> {
    params.iter().position(|p| p.name == name)
}

impl<K: NodeKind> Node<K> {
    /// Build a node from named arguments; omitted ones take their defaults.
    pub fn new(engine: &Engine, kind: K, args: Vec<(String, ExpandableValue)>) -> Result<Self> {
        let params = kind.params();
        let name = kind.name();

        let mut supplied: Vec<Option<ExpandableValue>> = vec![None; params.len()];
        for (arg, value) in args {
            let slot = param_index(params, &arg).ok_or_else(|| CoroError::unknown_param(name, &arg))?;
            supplied[slot] = Some(value);
        }
        let values = params
            .iter()
            .zip(supplied)
            .map(|(spec, value)| {
                value
                    .or_else(|| spec.default_value())
                    .ok_or_else(|| CoroError::MissingArgument {
                        node: name.to_string(),
                        param: spec.name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut faders = Vec::with_capacity(params.len());
        let mut normalized = Vec::with_capacity(params.len());
        for (spec, value) in params.iter().zip(&values) {
            if spec.is_input() {
                let source = value.as_stream().ok_or_else(|| CoroError::Construction {
                    node: name.to_string(),
                    voice: 0,
                    reason: format!("{}: expected a stream", spec.name),
                })?;
                let fader = InputFader::new(engine, source.clone());
                let seq = broadcast::normalize(&ExpandableValue::Stream(fader.output()));
                normalized.push((spec.name.to_string(), seq));
                faders.push(Some(fader));
            } else if spec.is_whole() {
                let whole = broadcast::whole(value).ok_or_else(|| CoroError::Construction {
                    node: name.to_string(),
                    voice: 0,
                    reason: format!("{}: expected a list", spec.name),
                })?;
                normalized.push((spec.name.to_string(), vec![whole]));
                faders.push(None);
            } else {
                normalized.push((spec.name.to_string(), broadcast::normalize(value)));
                faders.push(None);
            }
        }

        let broadcast = Broadcast::from_normalized(normalized)?;
        let array = Arc::new(ChannelArray::build(&kind, &broadcast, engine.config())?);
        engine.register(&array);
        let resolved = (0..broadcast.voice_count())
            .map(|voice| broadcast.voice(voice))
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "node_new: {name} with {} voices ({})",
            array.voice_count(),
            array
                .channel_ids()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            kind,
            values,
            resolved,
            faders,
            array,
            default_fade_secs: engine.config().default_fade_secs,
        })
    }

    /// Start a builder for `kind`.
    pub fn builder(kind: K) -> NodeBuilder<K> {
        NodeBuilder::new(kind)
    }

    /// The node kind.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Kind name.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Parameter table.
    pub fn params(&self) -> &'static [ParamSpec] {
        self.kind.params()
    }

    /// Number of voices; fixed at construction.
    pub fn voice_count(&self) -> usize {
        self.array.voice_count()
    }

    /// Channel identities in voice order; stable for the node's lifetime.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.array.channel_ids()
    }

    /// The underlying channel array.
    pub fn channel_array(&self) -> &Arc<ChannelArray> {
        &self.array
    }

    /// Slot index of parameter `name`.
    pub fn param_index(&self, name: &str) -> Result<usize> {
        param_index(self.params(), name).ok_or_else(|| CoroError::unknown_param(self.name(), name))
    }

    /// Current value of parameter `name`, as last stored.
    pub fn get(&self, name: &str) -> Result<&ExpandableValue> {
        let slot = self.param_index(name)?;
        Ok(&self.values[slot])
    }

    /// Current values of every slot, in parameter order.
    pub fn values(&self) -> &[ExpandableValue] {
        &self.values
    }

    /// Current value of slot `slot`.
    pub fn get_at(&self, slot: usize) -> Option<&ExpandableValue> {
        self.values.get(slot)
    }

    /// Effective value of parameter `name` on `voice`.
    ///
    /// Input slots report the tap on the node's input fader.
    pub fn voice_value(&self, voice: usize, name: &str) -> Result<&VoiceValue> {
        let slot = self.param_index(name)?;
        let row = &self.resolved[voice % self.resolved.len()];
        Ok(&row[slot])
    }

    /// Write parameter `name`.
    pub fn set(&mut self, name: &str, value: impl Into<ExpandableValue>) -> Result<SetOutcome> {
        let slot = self.param_index(name)?;
        self.set_at(slot, value.into())
    }

    /// Write slot `slot`.
    ///
    /// Input slots are routed to [`set_input_at`](Self::set_input_at) with
    /// the default fade time.
    pub fn set_at(&mut self, slot: usize, value: ExpandableValue) -> Result<SetOutcome> {
        let params = self.params();
        let node = self.name();
        let spec = params
            .get(slot)
            .ok_or_else(|| CoroError::unknown_param(node, format!("#{slot}")))?;

        if spec.is_fixed() {
            return Err(CoroError::FixedParam {
                node: node.to_string(),
                param: spec.name.to_string(),
            });
        }
        if spec.is_ignored() {
            #[cfg(feature = "tracing")]
            tracing::trace!("node_set: {node}.{} ignored", spec.name);
            self.values[slot] = value;
            return Ok(SetOutcome::Ignored);
        }
        if spec.is_input() {
            let source = value.as_stream().cloned().ok_or_else(|| CoroError::Propagation {
                node: node.to_string(),
                param: spec.name.to_string(),
                voice: 0,
                reason: "expected a stream".to_string(),
            })?;
            self.set_input_at(slot, source, None)?;
            return Ok(SetOutcome::Applied);
        }

        let voice_count = self.voice_count();
        let per_voice = if spec.is_whole() {
            let whole = broadcast::whole(&value).ok_or_else(|| CoroError::Propagation {
                node: node.to_string(),
                param: spec.name.to_string(),
                voice: 0,
                reason: "expected a list".to_string(),
            })?;
            vec![whole; voice_count]
        } else {
            broadcast::rebroadcast(&value, voice_count)
                .map_err(|_| CoroError::EmptyArgument(spec.name.to_string()))?
        };

        self.values[slot] = value;
        let result = self.propagate(spec, slot, per_voice);

        #[cfg(feature = "tracing")]
        match &result {
            Ok(()) => tracing::trace!("node_set: {node}.{} over {voice_count} voices", spec.name),
            Err(e) => tracing::warn!("node_set: {node}.{} rejected: {e}", spec.name),
        }

        result.map(|()| SetOutcome::Applied)
    }

    fn propagate(&mut self, spec: &ParamSpec, slot: usize, per_voice: Vec<VoiceValue>) -> Result<()> {
        let node = self.kind.name();
        for (voice, value) in per_voice.into_iter().enumerate() {
            spec.validate(&value).map_err(|reason| CoroError::Propagation {
                node: node.to_string(),
                param: spec.name.to_string(),
                voice,
                reason,
            })?;
            let mut candidate = self.resolved[voice].clone();
            candidate[slot] = value.clone();
            self.kind
                .check_voice(&candidate)
                .map_err(CoroError::Configuration)?;
            self.array.channels()[voice].queue(slot, value);
            self.resolved[voice] = candidate;
        }
        Ok(())
    }

    /// Replace the first input, crossfading over `fade_secs` (default from
    /// the engine configuration).
    pub fn set_input(&mut self, source: impl Into<StreamSource>, fade_secs: Option<f32>) -> Result<()> {
        let slot = self
            .params()
            .iter()
            .position(ParamSpec::is_input)
            .ok_or_else(|| CoroError::unknown_param(self.name(), "input"))?;
        self.set_input_at(slot, source.into(), fade_secs)
    }

    /// Replace the input called `name`.
    pub fn set_input_named(
        &mut self,
        name: &str,
        source: impl Into<StreamSource>,
        fade_secs: Option<f32>,
    ) -> Result<()> {
        let slot = self.param_index(name)?;
        self.set_input_at(slot, source.into(), fade_secs)
    }

    /// Replace the input in slot `slot`.
    ///
    /// The channel array is untouched: units keep reading the same fader.
    pub fn set_input_at(&mut self, slot: usize, source: StreamSource, fade_secs: Option<f32>) -> Result<()> {
        let node = self.kind.name();
        let fade = fade_secs.unwrap_or(self.default_fade_secs);
        let fader = self
            .faders
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or_else(|| CoroError::unknown_param(node, format!("input #{slot}")))?;
        fader.set_input(source.clone(), fade);
        self.values[slot] = ExpandableValue::Stream(source);

        #[cfg(feature = "tracing")]
        tracing::debug!("node_input: {node} slot {slot} replaced, fade {fade}s");

        Ok(())
    }

    /// The fader behind input `name`, if that slot is an input.
    pub fn input_fader(&self, name: &str) -> Option<&InputFader> {
        let slot = param_index(self.params(), name)?;
        self.faders.get(slot).and_then(Option::as_ref)
    }

    /// The node's main output.
    pub fn output(&self) -> StreamSource {
        let array: Arc<dyn SignalSource> = self.array.clone();
        StreamSource::from_arc(array)
    }

    /// A new view over the auxiliary stream `name`.
    pub fn stream(&self, name: &str) -> Result<AuxStreamView> {
        let kind = aux_stream::lookup(self.name(), self.kind.aux_streams(), name)?;
        Ok(AuxStreamView::new(&self.array, kind))
    }

    /// Bracket-style access: a name yields an auxiliary stream view, a
    /// voice index yields that voice of the main output.
    pub fn index<'a>(&self, key: impl Into<StreamKey<'a>>) -> Result<Substream> {
        match key.into() {
            StreamKey::Name(name) => self.stream(name).map(Substream::Aux),
            StreamKey::Voice(voice) => Ok(Substream::Voice(self.output().tap(voice))),
        }
    }

    /// Start (or restart from the beginning) every channel.
    pub fn play(&self) {
        self.array.play();
    }

    /// Stop every channel; positions restart on the next [`play`](Self::play).
    pub fn stop(&self) {
        self.array.stop();
    }

    /// Return every channel to its initial position at the next block,
    /// without changing play state.
    pub fn reset(&self) {
        self.array.reset();
    }

    /// Returns `true` if any channel is playing.
    pub fn is_playing(&self) -> bool {
        self.array.is_playing()
    }
}

impl<K: NodeKind> fmt::Debug for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.name())
            .field("voices", &self.voice_count())
            .field("playing", &self.is_playing())
            .finish()
    }
}

/// Nodes with a fixed, inspectable voice layout.
pub trait Expandable {
    /// Number of voices.
    fn voice_count(&self) -> usize;
    /// Channel identities in voice order.
    fn channel_ids(&self) -> Vec<ChannelId>;
    /// Main output.
    fn output(&self) -> StreamSource;
}

/// Nodes whose parameters can be read and re-broadcast by name.
pub trait Broadcastable: Expandable {
    /// Parameter table.
    fn param_specs(&self) -> &'static [ParamSpec];
    /// Current value of `name`.
    fn get(&self, name: &str) -> Result<&ExpandableValue>;
    /// Write `name`.
    fn set(&mut self, name: &str, value: ExpandableValue) -> Result<SetOutcome>;
}

/// Object-safe view of any node, used by registries and patches.
pub trait AnyNode: Broadcastable + HasAuxiliaryStreams + Send {
    /// Kind name.
    fn kind_name(&self) -> &'static str;
    /// Replace input `name`.
    fn set_input_named(&mut self, name: &str, source: StreamSource, fade_secs: Option<f32>) -> Result<()>;
    /// Start every channel from the beginning.
    fn play(&self);
    /// Stop every channel.
    fn stop(&self);
    /// Rewind every channel, keeping play state.
    fn reset(&self);
    /// Returns `true` if any channel is playing.
    fn is_playing(&self) -> bool;
}

impl<K: NodeKind> Expandable for Node<K> {
    fn voice_count(&self) -> usize {
        Node::voice_count(self)
    }

    fn channel_ids(&self) -> Vec<ChannelId> {
        Node::channel_ids(self)
    }

    fn output(&self) -> StreamSource {
        Node::output(self)
    }
}

impl<K: NodeKind> Broadcastable for Node<K> {
    fn param_specs(&self) -> &'static [ParamSpec] {
        self.params()
    }

    fn get(&self, name: &str) -> Result<&ExpandableValue> {
        Node::get(self, name)
    }

    fn set(&mut self, name: &str, value: ExpandableValue) -> Result<SetOutcome> {
        Node::set(self, name, value)
    }
}

impl<K: NodeKind> HasAuxiliaryStreams for Node<K> {
    fn aux_streams(&self) -> &'static [AuxKind] {
        self.kind.aux_streams()
    }

    fn stream(&self, name: &str) -> Result<AuxStreamView> {
        Node::stream(self, name)
    }
}

impl<K: NodeKind> AnyNode for Node<K> {
    fn kind_name(&self) -> &'static str {
        self.name()
    }

    fn set_input_named(&mut self, name: &str, source: StreamSource, fade_secs: Option<f32>) -> Result<()> {
        Node::set_input_named(self, name, source, fade_secs)
    }

    fn play(&self) {
        Node::play(self);
    }

    fn stop(&self) {
        Node::stop(self);
    }

    fn reset(&self) {
        Node::reset(self);
    }

    fn is_playing(&self) -> bool {
        Node::is_playing(self)
    }
}
