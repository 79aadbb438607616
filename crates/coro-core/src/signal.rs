//! Multi-voice signal plumbing between nodes.
//!
//! Every producer in a patch (a node's channel array, an input fader, an
//! auxiliary stream view) implements [`SignalSource`]: a fixed number of
//! voices, each readable one block at a time. Consumers never hold the
//! producer's units directly; they hold a [`StreamTap`], which pins one voice
//! of a shared [`StreamSource`].
//!
//! Reads always return the most recently published block. Because the engine
//! processes producers in construction order, a consumer built after its
//! producer sees the current block; a consumer wired to a later producer sees
//! the previous one.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::value::VoiceValue;

/// Something that produces one block of samples per voice.
pub trait SignalSource: Send + Sync {
    /// Number of parallel voices this source produces.
    fn voice_count(&self) -> usize;

    /// Copy the latest block of `voice` into `out`.
    ///
    /// Implementations zero any part of `out` they cannot fill. `voice` is
    /// always below [`voice_count`](Self::voice_count) when called through a
    /// [`StreamTap`].
    fn read(&self, voice: usize, out: &mut [f32]);
}

/// Shared handle on a multi-voice producer.
///
/// Cloning is cheap and preserves identity: two clones compare equal.
#[derive(Clone)]
pub struct StreamSource(Arc<dyn SignalSource>);

impl StreamSource {
    /// Wrap a source in a new shared handle.
    pub fn new<S: SignalSource + 'static>(source: S) -> Self {
        Self(Arc::new(source))
    }

    /// Wrap an already shared source.
    pub fn from_arc(source: Arc<dyn SignalSource>) -> Self {
        Self(source)
    }

    /// Number of voices the producer currently has.
    pub fn voice_count(&self) -> usize {
        self.0.voice_count()
    }

    /// Tap voice `voice mod voice_count` of this source.
    pub fn tap(&self, voice: usize) -> StreamTap {
        let count = self.voice_count().max(1);
        StreamTap {
            source: self.clone(),
            voice: voice % count,
        }
    }

    /// One tap per producer voice, in voice order.
    pub fn taps(&self) -> Vec<StreamTap> {
        (0..self.voice_count()).map(|i| self.tap(i)).collect()
    }

    /// Read the latest block of one voice.
    pub fn read(&self, voice: usize, out: &mut [f32]) {
        self.0.read(voice, out);
    }

    /// Returns `true` if both handles point at the same producer.
    pub fn ptr_eq(&self, other: &StreamSource) -> bool {
        Arc::as_ptr(&self.0).cast::<()>() == Arc::as_ptr(&other.0).cast::<()>()
    }
}

impl PartialEq for StreamSource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource")
            .field("voices", &self.voice_count())
            .finish()
    }
}

/// One voice of a [`StreamSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTap {
    source: StreamSource,
    voice: usize,
}

impl StreamTap {
    /// The producer this tap reads from.
    pub fn source(&self) -> &StreamSource {
        &self.source
    }

    /// Producer voice index.
    pub fn voice(&self) -> usize {
        self.voice
    }

    /// Read the latest block of the tapped voice into `out`.
    #[inline]
    pub fn read(&self, out: &mut [f32]) {
        self.source.read(self.voice, out);
    }
}

/// Per-voice block buffers published by a producer after each block.
pub struct OutputBus {
    voices: Box<[RwLock<Vec<f32>>]>,
}

impl OutputBus {
    /// Create a silent bus with `voice_count` buffers of `block_size` samples.
    pub fn new(voice_count: usize, block_size: usize) -> Self {
        let voices = (0..voice_count)
            .map(|_| RwLock::new(vec![0.0; block_size]))
            .collect();
        Self { voices }
    }

    /// Number of voice buffers.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Replace the published block of `voice`.
    pub fn publish(&self, voice: usize, block: &[f32]) {
        if let Some(slot) = self.voices.get(voice) {
            let mut buf = slot.write();
            let n = buf.len().min(block.len());
            buf[..n].copy_from_slice(&block[..n]);
            buf[n..].fill(0.0);
        }
    }

    /// Zero the published block of `voice`.
    pub fn silence(&self, voice: usize) {
        if let Some(slot) = self.voices.get(voice) {
            slot.write().fill(0.0);
        }
    }

    /// Copy the published block of `voice` into `out`.
    pub fn read(&self, voice: usize, out: &mut [f32]) {
        match self.voices.get(voice) {
            Some(slot) => {
                let buf = slot.read();
                let n = buf.len().min(out.len());
                out[..n].copy_from_slice(&buf[..n]);
                out[n..].fill(0.0);
            }
            None => out.fill(0.0),
        }
    }
}

impl SignalSource for OutputBus {
    fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn read(&self, voice: usize, out: &mut [f32]) {
        OutputBus::read(self, voice, out);
    }
}

/// A per-voice control that is either a constant or an audio-rate stream.
///
/// Channel units keep one of these for every numeric parameter so that a
/// parameter can be driven by another node's output.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    /// Constant value.
    Value(f32),
    /// Sample-accurate control from another producer.
    Stream(StreamTap),
}

impl ControlInput {
    /// Build a control from a resolved voice value.
    ///
    /// Flags become `0.0`/`1.0`. Returns `None` for containers and lists.
    pub fn from_voice(value: &VoiceValue) -> Option<Self> {
        match value {
            VoiceValue::Number(v) => Some(Self::Value(*v)),
            VoiceValue::Flag(b) => Some(Self::Value(if *b { 1.0 } else { 0.0 })),
            VoiceValue::Stream(tap) => Some(Self::Stream(tap.clone())),
            _ => None,
        }
    }

    /// Fill `out` with one block of control values.
    pub fn fill(&self, out: &mut [f32]) {
        match self {
            Self::Value(v) => out.fill(*v),
            Self::Stream(tap) => tap.read(out),
        }
    }

    /// The constant value, if this control is not a stream.
    pub fn constant(&self) -> Option<f32> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Stream(_) => None,
        }
    }
}

impl Default for ControlInput {
    fn default() -> Self {
        Self::Value(0.0)
    }
}

impl From<f32> for ControlInput {
    fn from(value: f32) -> Self {
        Self::Value(value)
    }
}
