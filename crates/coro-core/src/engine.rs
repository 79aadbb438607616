//! Block engine and its configuration.
//!
//! [`Engine`] keeps a registration list of every block processor (channel
//! arrays and input faders) in construction order and advances them one
//! fixed-size block at a time. It holds weak references only: dropping a node
//! removes it from processing at the next block.
//!
//! ```rust
//! use coro_core::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! engine.process_block();
//! assert_eq!(engine.blocks_processed(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{CoroError, Result};
use crate::fader::FadeCurve;

/// Lowest accepted sample rate in Hz.
pub const MIN_SAMPLE_RATE: f32 = 8000.0;
/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: f32 = 384_000.0;
/// Largest accepted block size in samples.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Settings threaded through node construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Samples per processing block.
    pub block_size: usize,
    /// Crossfade length used when an input is replaced without an explicit fade.
    pub default_fade_secs: f32,
    /// Gain curve for input crossfades.
    pub fade_curve: FadeCurve,
    /// Base seed for random node kinds; each voice derives its own from it.
    pub seed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 256,
            default_fade_secs: 0.05,
            fade_curve: FadeCurve::Linear,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Default settings at a given sample rate.
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(CoroError::configuration(format!(
                "sample rate {} outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE} Hz",
                self.sample_rate
            )));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(CoroError::configuration(format!(
                "block size {} outside 1..={MAX_BLOCK_SIZE}",
                self.block_size
            )));
        }
        if !self.default_fade_secs.is_finite() || self.default_fade_secs < 0.0 {
            return Err(CoroError::configuration(format!(
                "default fade time must be a non-negative number of seconds, got {}",
                self.default_fade_secs
            )));
        }
        Ok(())
    }

    /// Duration of one block in seconds.
    pub fn block_secs(&self) -> f32 {
        self.block_size as f32 / self.sample_rate
    }
}

/// Anything the engine advances once per block.
pub trait BlockProcessor: Send + Sync {
    /// Process one block and publish its output.
    fn process_block(&self);
}

/// Drives registered processors block by block.
pub struct Engine {
    config: EngineConfig,
    processors: Mutex<Vec<Weak<dyn BlockProcessor>>>,
    blocks: AtomicU64,
}

impl Engine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            processors: Mutex::new(Vec::new()),
            blocks: AtomicU64::new(0),
        })
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Append a processor to the end of the processing order.
    pub fn register<P: BlockProcessor + 'static>(&self, processor: &Arc<P>) {
        let weak: Weak<P> = Arc::downgrade(processor);
        self.processors.lock().push(weak);
    }

    /// Number of processors still alive.
    pub fn live_processors(&self) -> usize {
        self.processors
            .lock()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Advance every live processor by one block, in registration order.
    pub fn process_block(&self) {
        let mut processors = self.processors.lock();
        processors.retain(|weak| match weak.upgrade() {
            Some(processor) => {
                processor.process_block();
                true
            }
            None => false,
        });
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// Blocks processed since creation.
    pub fn blocks_processed(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }
}
