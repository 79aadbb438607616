//! Offline patch rendering command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use coro_config::{Patch, PatchConfig};
use coro_registry::NodeRegistry;
use hound::{SampleFormat, WavSpec, WavWriter};

#[derive(Args)]
pub struct RenderArgs {
    /// Patch file (TOML)
    #[arg(value_name = "PATCH")]
    patch: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Duration to render, in seconds
    #[arg(short, long, default_value = "2.0")]
    seconds: f32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.seconds.is_finite() && args.seconds > 0.0,
        "--seconds must be a positive number, got {}",
        args.seconds
    );

    let config = PatchConfig::load(&args.patch)
        .with_context(|| format!("loading {}", args.patch.display()))?;
    let patch = Patch::build(&config, &NodeRegistry::new())?;
    let sample_rate = patch.config().sample_rate;

    println!(
        "Rendering '{}' ({:.2}s at {} Hz)...",
        patch.name(),
        args.seconds,
        sample_rate
    );

    let mut samples = patch.render(patch.blocks_for(args.seconds));
    samples.truncate((args.seconds * sample_rate).round() as usize);
    tracing::info!(samples = samples.len(), "render complete");

    write_wav(&args.output, &samples, sample_rate as u32)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    println!("Wrote {} samples to {}", samples.len(), args.output.display());
    println!("  peak: {peak:.4}");
    if peak > 1.0 {
        tracing::warn!(peak, "output exceeds full scale");
    }

    Ok(())
}

/// Write mono 32-bit float samples.
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}
