//! Input crossfade adapter.
//!
//! Channel units never read a node's live input directly. They read an
//! [`InputFader`], whose identity is fixed for the node's lifetime. Replacing
//! the input retargets the fader's voices and crossfades from the old source
//! to the new one over the requested time, so the channel array is never
//! rebuilt. A fade time of zero switches immediately.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{BlockProcessor, Engine, EngineConfig};
use crate::param::Ramp;
use crate::signal::{OutputBus, SignalSource, StreamSource, StreamTap};

/// Gain law used during a crossfade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeCurve {
    /// Gains `1 - t` and `t`.
    #[default]
    Linear,
    /// Gains `cos(t·π/2)` and `sin(t·π/2)`: constant power for uncorrelated sources.
    EqualPower,
}

impl FadeCurve {
    /// `(old, new)` gains at fade position `t` in `[0, 1]`.
    #[inline]
    pub fn gains(self, t: f32) -> (f32, f32) {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => (1.0 - t, t),
            FadeCurve::EqualPower => {
                let angle = t * core::f32::consts::FRAC_PI_2;
                (libm::cosf(angle), libm::sinf(angle))
            }
        }
    }

    /// Name used in configuration files.
    pub const fn name(self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::EqualPower => "equal_power",
        }
    }

    /// Parse a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(FadeCurve::Linear),
            "equal_power" | "equalpower" => Some(FadeCurve::EqualPower),
            _ => None,
        }
    }
}

struct FaderVoice {
    current: StreamTap,
    previous: Option<StreamTap>,
    fade: Ramp,
    current_buf: Vec<f32>,
    previous_buf: Vec<f32>,
    out: Vec<f32>,
}

struct FaderBank {
    voices: Box<[Mutex<FaderVoice>]>,
    bus: OutputBus,
    curve: FadeCurve,
}

impl BlockProcessor for FaderBank {
    fn process_block(&self) {
        for (i, voice) in self.voices.iter().enumerate() {
            let mut v = voice.lock();
            let FaderVoice {
                current,
                previous,
                fade,
                current_buf,
                previous_buf,
                out,
            } = &mut *v;
            current.read(current_buf);
            let fading = match previous.as_ref() {
                Some(prev) => {
                    prev.read(previous_buf);
                    for n in 0..out.len() {
                        let (g_old, g_new) = self.curve.gains(fade.advance());
                        out[n] = previous_buf[n] * g_old + current_buf[n] * g_new;
                    }
                    true
                }
                None => {
                    out.copy_from_slice(current_buf);
                    false
                }
            };
            if fading && fade.is_settled() {
                *previous = None;
            }
            self.bus.publish(i, out);
        }
    }
}

impl SignalSource for FaderBank {
    fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn read(&self, voice: usize, out: &mut [f32]) {
        self.bus.read(voice, out);
    }
}

/// Stable-identity adapter between a node and its live input.
pub struct InputFader {
    bank: Arc<FaderBank>,
    input: StreamSource,
    sample_rate: f32,
}

impl InputFader {
    /// Wrap `source` and register the fader with `engine`.
    ///
    /// The fader has one voice per voice of `source` at this moment; that
    /// count never changes.
    pub fn new(engine: &Engine, source: StreamSource) -> Self {
        let config = *engine.config();
        let fader = Self::unregistered(&config, source);
        engine.register(&fader.bank);
        fader
    }

    fn unregistered(config: &EngineConfig, source: StreamSource) -> Self {
        let voices = source
            .taps()
            .into_iter()
            .map(|tap| {
                Mutex::new(FaderVoice {
                    current: tap,
                    previous: None,
                    fade: Ramp::with_config(1.0, config.sample_rate, 0.0),
                    current_buf: vec![0.0; config.block_size],
                    previous_buf: vec![0.0; config.block_size],
                    out: vec![0.0; config.block_size],
                })
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let bank = Arc::new(FaderBank {
            bus: OutputBus::new(voices.len(), config.block_size),
            voices,
            curve: config.fade_curve,
        });
        Self {
            bank,
            input: source,
            sample_rate: config.sample_rate,
        }
    }

    /// The source currently faded in.
    pub fn input(&self) -> &StreamSource {
        &self.input
    }

    /// Number of fader voices.
    pub fn voice_count(&self) -> usize {
        self.bank.voices.len()
    }

    /// What channel units read. Every call returns the same producer.
    pub fn output(&self) -> StreamSource {
        let bank: Arc<dyn SignalSource> = self.bank.clone();
        StreamSource::from_arc(bank)
    }

    /// Replace the input, crossfading over `fade_secs` (0 switches at once).
    ///
    /// Fader voice `i` follows voice `i mod n` of the new source. A fade
    /// still running from an earlier replacement is cut short.
    pub fn set_input(&mut self, source: StreamSource, fade_secs: f32) {
        let fade_secs = if fade_secs.is_finite() {
            fade_secs.max(0.0)
        } else {
            0.0
        };
        for (i, voice) in self.bank.voices.iter().enumerate() {
            let mut v = voice.lock();
            let old = std::mem::replace(&mut v.current, source.tap(i));
            v.fade.set_sample_rate(self.sample_rate);
            v.fade.set_duration_secs(fade_secs);
            if fade_secs == 0.0 {
                v.previous = None;
                v.fade.set_immediate(1.0);
            } else {
                v.previous = Some(old);
                v.fade.set_immediate(0.0);
                v.fade.set_target(1.0);
            }
        }
        self.input = source;
    }

    /// Returns `true` while any voice is still crossfading.
    pub fn is_fading(&self) -> bool {
        self.bank.voices.iter().any(|v| v.lock().previous.is_some())
    }
}

impl fmt::Debug for InputFader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFader")
            .field("voices", &self.voice_count())
            .field("fading", &self.is_fading())
            .finish()
    }
}
