//! Channel farm: the fixed-size array of per-voice units behind a node.
//!
//! A [`ChannelArray`] is built once from a [`Broadcast`] and never resized.
//! The control side mutates elements, never the container: attribute writes
//! are queued into each [`Channel`]'s parameter cells and sampled by the
//! engine at the next block boundary, so a unit never sees a parameter change
//! mid-block.
//!
//! # Block cycle
//!
//! For each channel, in voice order:
//!
//! 1. Apply queued parameter writes (mul/add are kept by the channel itself).
//! 2. Apply a pending reset (set by [`ChannelArray::play`] or
//!    [`ChannelArray::reset`]).
//! 3. If playing, run the unit, then `out = out * mul + add`.
//! 4. Publish signal and auxiliary buffers for readers.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::aux_stream::AuxKind;
use crate::broadcast::Broadcast;
use crate::engine::{BlockProcessor, EngineConfig};
use crate::error::{CoroError, Result};
use crate::node::NodeKind;
use crate::param_info::{ParamFlags, ParamSpec};
use crate::signal::{ControlInput, OutputBus, SignalSource};
use crate::value::VoiceValue;

/// Opaque single-voice processing unit.
///
/// Units are built by a [`NodeKind`] from one voice's resolved arguments and
/// receive later writes through [`set_param`](Self::set_param) with the slot
/// index of the kind's parameter table. Values have already been checked
/// against the slot's [`ParamSpec`] when they arrive.
pub trait ChannelUnit: Send {
    /// Apply a new value to parameter `slot`.
    fn set_param(&mut self, slot: usize, value: &VoiceValue);

    /// Produce one block into `out`. Buffers arrive zeroed.
    fn process(&mut self, out: &mut BlockOut<'_>);

    /// Return to the initial read/record position.
    fn reset(&mut self);
}

/// Output buffers for one block of one unit.
pub struct BlockOut<'a> {
    /// Main signal.
    pub signal: &'a mut [f32],
    /// Trigger pulses (1.0 on the sample an event happens).
    pub trig: &'a mut [f32],
    /// Elapsed-time counter.
    pub time: &'a mut [f32],
    /// Sample rate in Hz.
    pub sample_rate: f32,
}

impl BlockOut<'_> {
    /// Block length in samples.
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    /// Returns `true` for a zero-length block.
    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }
}

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identity of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    fn next() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

struct UnitSlot {
    unit: Box<dyn ChannelUnit>,
    mul: Option<ControlInput>,
    add: Option<ControlInput>,
    signal: Vec<f32>,
    trig: Vec<f32>,
    time: Vec<f32>,
    scratch: Vec<f32>,
}

impl UnitSlot {
    fn apply(&mut self, spec: &ParamSpec, slot: usize, value: &VoiceValue) {
        if spec.is_ignored() {
            return;
        }
        if spec.flags.contains(ParamFlags::POST_MUL) {
            self.mul = ControlInput::from_voice(value);
        } else if spec.flags.contains(ParamFlags::POST_ADD) {
            self.add = ControlInput::from_voice(value);
        } else {
            self.unit.set_param(slot, value);
        }
    }

    fn run(&mut self, sample_rate: f32) {
        self.signal.fill(0.0);
        self.trig.fill(0.0);
        self.time.fill(0.0);
        {
            let mut out = BlockOut {
                signal: &mut self.signal,
                trig: &mut self.trig,
                time: &mut self.time,
                sample_rate,
            };
            self.unit.process(&mut out);
        }
        match &self.mul {
            Some(ControlInput::Value(m)) if *m != 1.0 => {
                self.signal.iter_mut().for_each(|s| *s *= m);
            }
            Some(control @ ControlInput::Stream(_)) => {
                control.fill(&mut self.scratch);
                for (s, m) in self.signal.iter_mut().zip(&self.scratch) {
                    *s *= m;
                }
            }
            _ => {}
        }
        match &self.add {
            Some(ControlInput::Value(a)) if *a != 0.0 => {
                self.signal.iter_mut().for_each(|s| *s += a);
            }
            Some(control @ ControlInput::Stream(_)) => {
                control.fill(&mut self.scratch);
                for (s, a) in self.signal.iter_mut().zip(&self.scratch) {
                    *s += a;
                }
            }
            _ => {}
        }
    }
}

/// One voice of a node: a unit plus its parameter cells and play state.
pub struct Channel {
    id: ChannelId,
    pending: Mutex<Vec<Option<VoiceValue>>>,
    dirty: AtomicBool,
    playing: AtomicBool,
    reset_pending: AtomicBool,
    slot: Mutex<UnitSlot>,
}

impl Channel {
    /// Stable identity of this channel.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Queue a value for parameter `slot`, applied at the next block boundary.
    ///
    /// A later write to the same slot before the boundary replaces the earlier one.
    pub fn queue(&self, slot: usize, value: VoiceValue) {
        let mut pending = self.pending.lock();
        if let Some(cell) = pending.get_mut(slot) {
            *cell = Some(value);
            self.dirty.store(true, Ordering::Release);
        }
    }

    /// Returns `true` while the channel is producing output.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("playing", &self.is_playing())
            .finish()
    }
}

/// Fixed-size array of channels sharing one node kind.
pub struct ChannelArray {
    kind: &'static str,
    params: &'static [ParamSpec],
    aux: &'static [AuxKind],
    channels: Box<[Channel]>,
    signal: OutputBus,
    trig: OutputBus,
    time: OutputBus,
    sample_rate: f32,
}

impl ChannelArray {
    /// Build one unit per voice of `broadcast`.
    ///
    /// Every unit is built before any is exposed; the first failure aborts
    /// the whole array. `broadcast` must carry one argument per slot of the
    /// kind's parameter table.
    pub fn build(
        kind: &dyn NodeKind,
        broadcast: &Broadcast,
        config: &EngineConfig,
    ) -> Result<Self> {
        let params = kind.params();
        let name = kind.name();
        if broadcast.arg_count() != params.len() {
            return Err(CoroError::Construction {
                node: name.to_string(),
                voice: 0,
                reason: format!(
                    "expected {} arguments, got {}",
                    params.len(),
                    broadcast.arg_count()
                ),
            });
        }

        let voice_count = broadcast.voice_count();
        let mut channels = Vec::with_capacity(voice_count);
        for voice in 0..voice_count {
            let values = broadcast.voice(voice);
            for (spec, value) in params.iter().zip(&values) {
                spec.validate(value).map_err(|reason| CoroError::Construction {
                    node: name.to_string(),
                    voice,
                    reason: format!("{}: {reason}", spec.name),
                })?;
            }
            kind.check_voice(&values).map_err(CoroError::Configuration)?;
            let unit = kind
                .build_unit(&values, voice, config)
                .map_err(|reason| CoroError::Construction {
                    node: name.to_string(),
                    voice,
                    reason,
                })?;

            let mut slot = UnitSlot {
                unit,
                mul: None,
                add: None,
                signal: vec![0.0; config.block_size],
                trig: vec![0.0; config.block_size],
                time: vec![0.0; config.block_size],
                scratch: vec![0.0; config.block_size],
            };
            for (i, (spec, value)) in params.iter().zip(&values).enumerate() {
                if spec.flags.contains(ParamFlags::POST_MUL)
                    || spec.flags.contains(ParamFlags::POST_ADD)
                {
                    slot.apply(spec, i, value);
                }
            }

            channels.push(Channel {
                id: ChannelId::next(),
                pending: Mutex::new(vec![None; params.len()]),
                dirty: AtomicBool::new(false),
                playing: AtomicBool::new(kind.autoplay()),
                reset_pending: AtomicBool::new(false),
                slot: Mutex::new(slot),
            });
        }

        let aux = kind.aux_streams();
        let aux_voices = |k: AuxKind| if aux.contains(&k) { voice_count } else { 0 };
        Ok(Self {
            kind: name,
            params,
            aux,
            signal: OutputBus::new(voice_count, config.block_size),
            trig: OutputBus::new(aux_voices(AuxKind::Trig), config.block_size),
            time: OutputBus::new(aux_voices(AuxKind::Time), config.block_size),
            channels: channels.into_boxed_slice(),
            sample_rate: config.sample_rate,
        })
    }

    /// Kind name of the owning node.
    pub fn kind_name(&self) -> &'static str {
        self.kind
    }

    /// Number of channels; fixed for the array's lifetime.
    pub fn voice_count(&self) -> usize {
        self.channels.len()
    }

    /// The channels, in voice order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Channel identities, in voice order.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(Channel::id).collect()
    }

    /// Auxiliary streams the array publishes.
    pub fn aux_streams(&self) -> &'static [AuxKind] {
        self.aux
    }

    /// Start every channel from its initial position.
    pub fn play(&self) {
        for ch in self.channels.iter() {
            ch.reset_pending.store(true, Ordering::Release);
            ch.playing.store(true, Ordering::Release);
        }
    }

    /// Rewind every channel at the next block boundary. Play state is kept.
    pub fn reset(&self) {
        for ch in self.channels.iter() {
            ch.reset_pending.store(true, Ordering::Release);
        }
    }

    /// Stop every channel. Units and positions are kept until the next play.
    pub fn stop(&self) {
        for ch in self.channels.iter() {
            ch.playing.store(false, Ordering::Release);
        }
    }

    /// Returns `true` if any channel is playing.
    pub fn is_playing(&self) -> bool {
        self.channels.iter().any(Channel::is_playing)
    }

    /// Read the latest block of an auxiliary stream.
    pub fn read_aux(&self, kind: AuxKind, voice: usize, out: &mut [f32]) {
        match kind {
            AuxKind::Trig => self.trig.read(voice, out),
            AuxKind::Time => self.time.read(voice, out),
        }
    }
}

impl BlockProcessor for ChannelArray {
    fn process_block(&self) {
        for (voice, ch) in self.channels.iter().enumerate() {
            let mut slot = ch.slot.lock();
            if ch.dirty.swap(false, Ordering::AcqRel) {
                let mut pending = ch.pending.lock();
                for (i, cell) in pending.iter_mut().enumerate() {
                    if let Some(value) = cell.take() {
                        slot.apply(&self.params[i], i, &value);
                    }
                }
            }
            if ch.reset_pending.swap(false, Ordering::AcqRel) {
                slot.unit.reset();
            }
            if !ch.is_playing() {
                drop(slot);
                self.signal.silence(voice);
                self.trig.silence(voice);
                self.time.silence(voice);
                continue;
            }
            slot.run(self.sample_rate);
            self.signal.publish(voice, &slot.signal);
            self.trig.publish(voice, &slot.trig);
            self.time.publish(voice, &slot.time);
        }
    }
}

impl SignalSource for ChannelArray {
    fn voice_count(&self) -> usize {
        self.channels.len()
    }

    fn read(&self, voice: usize, out: &mut [f32]) {
        self.signal.read(voice, out);
    }
}

impl fmt::Debug for ChannelArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelArray")
            .field("kind", &self.kind)
            .field("voices", &self.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::broadcast;
    use crate::value::ExpandableValue;

    /// Emits its `value` parameter on every sample and counts resets.
    struct Level {
        value: f32,
        resets: u32,
    }

    impl ChannelUnit for Level {
        fn set_param(&mut self, slot: usize, value: &VoiceValue) {
            if slot == 0 {
                self.value = value.as_number().unwrap_or(0.0);
            }
        }

        fn process(&mut self, out: &mut BlockOut<'_>) {
            out.signal.fill(self.value);
            out.trig[0] = self.resets as f32;
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    struct LevelKind;

    const LEVEL_PARAMS: &[ParamSpec] = &[
        ParamSpec::number("value", "Level", -10.0, 10.0, 0.0),
        ParamSpec::mul(),
        ParamSpec::add(),
    ];

    impl NodeKind for LevelKind {
        fn name(&self) -> &'static str {
            "Level"
        }

        fn params(&self) -> &'static [ParamSpec] {
            LEVEL_PARAMS
        }

        fn aux_streams(&self) -> &'static [AuxKind] {
            &[AuxKind::Trig]
        }

        fn build_unit(
            &self,
            voice: &[VoiceValue],
            _index: usize,
            _config: &EngineConfig,
        ) -> core::result::Result<Box<dyn ChannelUnit>, String> {
            let value = voice[0].as_number().ok_or("value must be a number")?;
            if value < 0.0 {
                return Err("negative level".to_string());
            }
            Ok(Box::new(Level { value, resets: 0 }))
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            block_size: 4,
            ..EngineConfig::default()
        }
    }

    fn level_array(values: &[f32], mul: f32, add: f32) -> Result<ChannelArray> {
        let b = broadcast(&[
            ExpandableValue::from(values.to_vec()),
            ExpandableValue::from(mul),
            ExpandableValue::from(add),
        ])?;
        ChannelArray::build(&LevelKind, &b, &config())
    }

    fn read(array: &ChannelArray, voice: usize) -> [f32; 4] {
        let mut out = [0.0; 4];
        array.read(voice, &mut out);
        out
    }

    #[test]
    fn builds_one_channel_per_voice() {
        let array = level_array(&[1.0, 2.0, 3.0], 1.0, 0.0).unwrap();
        assert_eq!(array.voice_count(), 3);
        let ids = array.channel_ids();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn one_failing_unit_aborts_build() {
        let err = level_array(&[1.0, -1.0, 2.0], 1.0, 0.0).unwrap_err();
        assert!(
            matches!(err, CoroError::Construction { voice: 1, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn out_of_domain_argument_aborts_build() {
        let err = level_array(&[1.0, 50.0], 1.0, 0.0).unwrap_err();
        assert!(matches!(err, CoroError::Construction { voice: 1, .. }));
    }

    #[test]
    fn queued_writes_apply_at_block_boundary() {
        let array = level_array(&[1.0, 2.0], 1.0, 0.0).unwrap();
        array.process_block();
        assert_eq!(read(&array, 1), [2.0; 4]);

        array.channels()[1].queue(0, VoiceValue::Number(5.0));
        assert_eq!(read(&array, 1), [2.0; 4]);
        array.process_block();
        assert_eq!(read(&array, 1), [5.0; 4]);
        assert_eq!(read(&array, 0), [1.0; 4]);
    }

    #[test]
    fn mul_and_add_post_process() {
        let array = level_array(&[2.0], 0.5, 0.25).unwrap();
        array.process_block();
        assert_eq!(read(&array, 0), [1.25; 4]);

        array.channels()[0].queue(1, VoiceValue::Number(2.0));
        array.process_block();
        assert_eq!(read(&array, 0), [4.25; 4]);
    }

    #[test]
    fn stop_silences_and_play_resets() {
        let array = level_array(&[1.0], 1.0, 0.0).unwrap();
        array.process_block();
        array.stop();
        assert!(!array.is_playing());
        array.process_block();
        assert_eq!(read(&array, 0), [0.0; 4]);

        array.play();
        array.process_block();
        assert_eq!(read(&array, 0), [1.0; 4]);
        let mut trig = [0.0; 4];
        array.read_aux(AuxKind::Trig, 0, &mut trig);
        assert_eq!(trig[0], 1.0, "play must reset the unit once");
    }

    #[test]
    fn reset_keeps_play_state() {
        let array = level_array(&[1.0], 1.0, 0.0).unwrap();
        array.stop();
        array.reset();
        array.process_block();
        assert!(!array.is_playing());

        array.play();
        array.process_block();
        let mut trig = [0.0; 4];
        array.read_aux(AuxKind::Trig, 0, &mut trig);
        assert_eq!(trig[0], 2.0, "reset while stopped still rewinds");

        array.reset();
        array.process_block();
        assert!(array.is_playing());
        array.read_aux(AuxKind::Trig, 0, &mut trig);
        assert_eq!(trig[0], 3.0);
    }

    #[test]
    fn identities_survive_writes() {
        let array = level_array(&[1.0, 2.0], 1.0, 0.0).unwrap();
        let before = array.channel_ids();
        for ch in array.channels() {
            ch.queue(0, VoiceValue::Number(3.0));
        }
        array.process_block();
        assert_eq!(array.channel_ids(), before);
    }
}
