//! Engine settings as stored in patch files.

use coro_core::{EngineConfig, FadeCurve};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The `[engine]` table of a patch file.
///
/// Every field is optional in TOML; missing fields take the engine defaults.
///
/// ```toml
/// [engine]
/// sample_rate = 48000
/// block_size = 128
/// default_fade_ms = 20.0
/// fade_curve = "equal_power"
/// seed = 7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per processing block.
    pub block_size: usize,
    /// Input crossfade length in milliseconds.
    pub default_fade_ms: f32,
    /// `"linear"` or `"equal_power"`.
    pub fade_curve: String,
    /// Seed for random node kinds.
    pub seed: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            sample_rate: libm::roundf(config.sample_rate) as u32,
            block_size: config.block_size,
            default_fade_ms: config.default_fade_secs * 1000.0,
            fade_curve: config.fade_curve.name().to_string(),
            seed: config.seed,
        }
    }
}

impl EngineSettings {
    /// Convert to a validated [`EngineConfig`].
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let fade_curve = FadeCurve::from_name(&self.fade_curve.to_ascii_lowercase()).ok_or_else(
            || ConfigError::InvalidSetting {
                setting: "fade_curve".to_string(),
                reason: format!("unknown curve '{}'", self.fade_curve),
            },
        )?;
        let config = EngineConfig {
            sample_rate: self.sample_rate as f32,
            block_size: self.block_size,
            default_fade_secs: self.default_fade_ms / 1000.0,
            fade_curve,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}
