//! Auxiliary streams: trigger pulses and elapsed-time counters.
//!
//! Some node kinds publish secondary per-voice outputs next to their main
//! signal. [`AuxStreamView`] exposes one of them as a producer in its own
//! right, with the parent's voice count, so it can feed other nodes.
//!
//! Views are built fresh on every request and are owned by the caller. The
//! node keeps no list of the views it handed out. A view holds only a weak
//! reference to the parent's channel array: it never keeps a dropped node
//! alive and reads silence once the array is gone.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::channel::ChannelArray;
use crate::error::{CoroError, Result};
use crate::signal::{SignalSource, StreamSource};
use crate::value::ExpandableValue;

/// Names of the auxiliary streams a node kind may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxKind {
    /// `"trig"`: 1.0 on the sample a cycle or recording completes.
    Trig,
    /// `"time"`: elapsed samples since the last start.
    Time,
}

impl AuxKind {
    /// Stream name used for lookups.
    pub const fn name(self) -> &'static str {
        match self {
            AuxKind::Trig => "trig",
            AuxKind::Time => "time",
        }
    }

    /// Parse a stream name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "trig" => Some(AuxKind::Trig),
            "time" => Some(AuxKind::Time),
            _ => None,
        }
    }
}

impl fmt::Display for AuxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve `name` against the streams a kind publishes.
pub fn lookup(node: &str, available: &[AuxKind], name: &str) -> Result<AuxKind> {
    AuxKind::from_name(name)
        .filter(|kind| available.contains(kind))
        .ok_or_else(|| CoroError::key_lookup(node, name))
}

/// Read-only producer over one auxiliary output of every channel of a node.
#[derive(Clone)]
pub struct AuxStreamView {
    array: Weak<ChannelArray>,
    kind: AuxKind,
    voice_count: usize,
}

impl AuxStreamView {
    /// Build a view over `array`'s `kind` stream.
    pub fn new(array: &Arc<ChannelArray>, kind: AuxKind) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            "aux_view: {} '{kind}' over {} voices",
            array.kind_name(),
            array.voice_count()
        );
        Self {
            array: Arc::downgrade(array),
            kind,
            voice_count: array.voice_count(),
        }
    }

    /// Which stream this view reads.
    pub fn kind(&self) -> AuxKind {
        self.kind
    }

    /// Returns `true` while the parent channel array exists.
    pub fn is_alive(&self) -> bool {
        self.array.strong_count() > 0
    }

    /// Share this view as a producer for other nodes.
    pub fn into_source(self) -> StreamSource {
        StreamSource::new(self)
    }
}

impl SignalSource for AuxStreamView {
    fn voice_count(&self) -> usize {
        self.voice_count
    }

    fn read(&self, voice: usize, out: &mut [f32]) {
        match self.array.upgrade() {
            Some(array) => array.read_aux(self.kind, voice, out),
            None => out.fill(0.0),
        }
    }
}

impl From<AuxStreamView> for StreamSource {
    fn from(view: AuxStreamView) -> Self {
        view.into_source()
    }
}

impl From<AuxStreamView> for ExpandableValue {
    fn from(view: AuxStreamView) -> Self {
        ExpandableValue::Stream(view.into_source())
    }
}

impl fmt::Debug for AuxStreamView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuxStreamView")
            .field("kind", &self.kind)
            .field("voices", &self.voice_count)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Capability of node kinds that publish auxiliary streams.
pub trait HasAuxiliaryStreams {
    /// Streams this node publishes.
    fn aux_streams(&self) -> &'static [AuxKind];

    /// A new view over the stream called `name`.
    ///
    /// Unknown names, and names this kind does not publish, fail with
    /// [`CoroError::KeyLookup`].
    fn stream(&self, name: &str) -> Result<AuxStreamView>;
}
