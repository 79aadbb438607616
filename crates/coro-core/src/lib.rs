//! Coro Core - multi-voice control plane for block-based synthesis
//!
//! This crate provides the machinery every coro node is built on: turning
//! heterogeneous arguments into a fixed number of voices, owning one
//! processing unit per voice, and keeping those units in sync with later
//! attribute writes.
//!
//! # Core Abstractions
//!
//! ## Values and Expansion
//!
//! - [`ExpandableValue`] - Scalar, sequence, multi-voice stream or container list
//! - [`VoiceValue`] - What a single voice receives
//! - [`broadcast()`] / [`rebroadcast`] - Expansion with wrap-around cycling
//!
//! ## Nodes
//!
//! - [`NodeKind`] - Parameter table plus per-voice unit factory
//! - [`Node`] / [`NodeBuilder`] - Construction and the attribute proxy
//! - [`Expandable`], [`Broadcastable`], [`HasAuxiliaryStreams`], [`AnyNode`] -
//!   Capabilities a node kind opts into
//!
//! ## Channels and Streams
//!
//! - [`ChannelArray`] - Fixed-size farm of [`ChannelUnit`]s
//! - [`StreamSource`] / [`StreamTap`] - Multi-voice signal producers
//! - [`AuxStreamView`] - Read-only view over a node's `trig` or `time` output
//! - [`InputFader`] - Stable-identity crossfading input adapter
//!
//! ## Containers
//!
//! - [`Table`] - Shared one-dimensional sample buffer
//! - [`Matrix`] - Shared two-dimensional buffer
//!
//! ## Engine
//!
//! - [`Engine`] - Advances registered processors one block at a time
//! - [`EngineConfig`] - Sample rate, block size and crossfade defaults
//!
//! # Example
//!
//! ```rust
//! use coro_core::{ExpandableValue, broadcast};
//!
//! let args = [
//!     ExpandableValue::from([100.0, 200.0, 300.0]),
//!     ExpandableValue::from([0.5, 1.0]),
//! ];
//! let b = broadcast(&args).unwrap();
//! assert_eq!(b.voice_count(), 3);
//! assert_eq!(b.value(1, 2).as_number(), Some(0.5));
//! ```
//!
//! # Threading
//!
//! Attribute writes happen on the control side and are queued per channel;
//! the engine applies them at the next block boundary. Readers of any stream
//! see the most recently published block.

pub mod aux_stream;
pub mod broadcast;
pub mod channel;
pub mod container;
pub mod engine;
pub mod error;
pub mod fader;
pub mod node;
pub mod param;
pub mod param_info;
pub mod signal;
pub mod value;

// Re-export main types at crate root
pub use aux_stream::{AuxKind, AuxStreamView, HasAuxiliaryStreams};
pub use broadcast::{Broadcast, broadcast, rebroadcast};
pub use channel::{BlockOut, Channel, ChannelArray, ChannelId, ChannelUnit};
pub use container::{Container, Matrix, Table, read_wrapped};
pub use engine::{
    BlockProcessor, Engine, EngineConfig, MAX_BLOCK_SIZE, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE,
};
pub use error::{CoroError, Result};
pub use fader::{FadeCurve, InputFader};
pub use node::{
    AnyNode, Broadcastable, Expandable, Node, NodeBuilder, NodeKind, SetOutcome, StreamKey,
    Substream,
};
pub use param::Ramp;
pub use param_info::{ParamDefault, ParamDomain, ParamFlags, ParamSpec};
pub use signal::{ControlInput, OutputBus, SignalSource, StreamSource, StreamTap};
pub use value::{ExpandableValue, Scalar, VoiceValue};
