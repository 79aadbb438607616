//! Criterion benchmarks for argument broadcasting and block processing.
//!
//! Run with: cargo bench -p coro-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use coro_core::{
    BlockOut, ChannelUnit, Engine, EngineConfig, ExpandableValue, NodeBuilder, NodeKind,
    ParamSpec, VoiceValue, broadcast, rebroadcast,
};

const VOICE_COUNTS: &[usize] = &[1, 8, 64, 256];
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

/// Trivial unit that writes a constant, isolating farm overhead from DSP cost.
struct Dc(f32);

impl ChannelUnit for Dc {
    fn set_param(&mut self, _slot: usize, value: &VoiceValue) {
        self.0 = value.as_number().unwrap_or(0.0);
    }

    fn process(&mut self, out: &mut BlockOut<'_>) {
        out.signal.fill(self.0);
    }

    fn reset(&mut self) {}
}

struct DcKind;

const DC_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("value", "Level", -1.0, 1.0, 0.0),
    ParamSpec::mul(),
    ParamSpec::add(),
];

impl NodeKind for DcKind {
    fn name(&self) -> &'static str {
        "Dc"
    }

    fn params(&self) -> &'static [ParamSpec] {
        DC_PARAMS
    }

    fn build_unit(
        &self,
        voice: &[VoiceValue],
        _index: usize,
        _config: &EngineConfig,
    ) -> Result<Box<dyn ChannelUnit>, String> {
        Ok(Box::new(Dc(voice[0].as_number().unwrap_or(0.0))))
    }
}

fn values(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 / n as f32).collect()
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for &voices in VOICE_COUNTS {
        let args = [
            ExpandableValue::from(values(voices)),
            ExpandableValue::from(0.5),
            ExpandableValue::from(vec![0.1, 0.2, 0.3]),
        ];
        group.bench_with_input(BenchmarkId::new("construct", voices), &voices, |b, _| {
            b.iter(|| black_box(broadcast(black_box(&args))));
        });

        let write = ExpandableValue::from(vec![0.25, 0.75]);
        group.bench_with_input(BenchmarkId::new("rebroadcast", voices), &voices, |b, &n| {
            b.iter(|| black_box(rebroadcast(black_box(&write), n)));
        });
    }

    group.finish();
}

fn bench_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_block");

    for &block_size in BLOCK_SIZES {
        for &voices in &[8usize, 64] {
            let engine = Engine::new(EngineConfig {
                block_size,
                ..EngineConfig::default()
            })
            .unwrap();
            let mut node = NodeBuilder::new(DcKind)
                .arg("value", values(voices))
                .arg("mul", 0.5)
                .build(&engine)
                .unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), block_size),
                &block_size,
                |b, _| {
                    b.iter(|| engine.process_block());
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices_with_write"), block_size),
                &block_size,
                |b, _| {
                    b.iter(|| {
                        node.set("value", 0.25).unwrap();
                        engine.process_block();
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_broadcast, bench_process_block);
criterion_main!(benches);
