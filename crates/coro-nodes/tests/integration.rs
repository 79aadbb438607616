//! Integration tests for coro-nodes.
//!
//! Wires several node kinds together the way a patch would: triggers
//! driving envelopes and counters, auxiliary streams feeding other nodes,
//! multi-table recording and live input replacement.

use coro_core::{
    AnyNode, CoroError, Engine, EngineConfig, ExpandableValue, SetOutcome, StreamSource, Table,
};
use coro_nodes::{
    Counter, Metro, Osc, Sig, TableRead, TableRec, TrigChoice, TrigEnv, TrigRand, Urn,
};

const SAMPLE_RATE: f32 = 8000.0;
const BLOCK: usize = 8;

fn engine() -> Engine {
    Engine::new(EngineConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK,
        ..EngineConfig::default()
    })
    .unwrap()
}

fn read(source: &StreamSource, voice: usize) -> Vec<f32> {
    let mut out = vec![0.0; BLOCK];
    source.read(voice, &mut out);
    out
}

/// A trigger at the start of every block.
fn every_block(engine: &Engine, voices: usize) -> Metro {
    let metro: Metro = Metro::builder()
        .arg("time", vec![BLOCK as f32 / SAMPLE_RATE; voices])
        .build_into(engine)
        .unwrap();
    metro.play();
    metro
}

// ============================================================================
// Trigger chains
// ============================================================================

#[test]
fn metro_voices_drive_envelope_voices() {
    let engine = engine();
    let metro: Metro = Metro::builder()
        .arg("time", [0.001, 0.002])
        .build_into(&engine)
        .unwrap();
    let env: TrigEnv = TrigEnv::builder()
        .arg("input", metro.output())
        .arg("table", Table::from_samples(vec![1.0; 8], SAMPLE_RATE).unwrap())
        .arg("dur", 0.001)
        .build_into(&engine)
        .unwrap();
    assert_eq!(env.voice_count(), 2);
    metro.play();

    engine.process_block();
    assert_eq!(read(&env.output(), 0), vec![1.0; BLOCK]);
    assert_eq!(read(&env.output(), 1), vec![1.0; BLOCK]);

    engine.process_block();
    assert_eq!(read(&env.output(), 0), vec![1.0; BLOCK]);
    assert_eq!(read(&env.output(), 1), vec![0.0; BLOCK]);

    engine.process_block();
    assert_eq!(read(&env.output(), 1), vec![1.0; BLOCK]);
}

#[test]
fn table_read_end_of_pass_counts() {
    let engine = engine();
    let reader: TableRead = TableRead::builder()
        .arg("table", Table::new(4, SAMPLE_RATE).unwrap())
        .arg("freq", 2000.0)
        .arg("loop", true)
        .build_into(&engine)
        .unwrap();
    let counter: Counter = Counter::builder()
        .arg("input", reader.stream("trig").unwrap())
        .arg("max", 10)
        .build_into(&engine)
        .unwrap();
    reader.play();

    engine.process_block();
    assert_eq!(
        read(&counter.output(), 0),
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
    );
    engine.process_block();
    assert_eq!(
        read(&counter.output(), 0),
        vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0]
    );
}

#[test]
fn urn_cycle_trigger_feeds_trig_choice() {
    let engine = engine();
    let urn: Urn = Urn::builder()
        .arg("max", 2)
        .arg("freq", SAMPLE_RATE)
        .build_into(&engine)
        .unwrap();
    let pick: TrigChoice = TrigChoice::builder()
        .arg("input", urn.stream("trig").unwrap())
        .arg("choice", [5.0])
        .build_into(&engine)
        .unwrap();
    engine.process_block();
    assert_eq!(
        read(&pick.output(), 0),
        vec![0.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]
    );
}

#[test]
fn counter_limits_rebroadcast_per_voice() {
    let engine = engine();
    let metro = every_block(&engine, 2);
    let mut counter: Counter = Counter::builder()
        .arg("input", metro.output())
        .build_into(&engine)
        .unwrap();
    counter.set_max([2.0, 3.0]).unwrap();

    let mut firsts = [Vec::new(), Vec::new()];
    for _ in 0..4 {
        engine.process_block();
        for (voice, firsts) in firsts.iter_mut().enumerate() {
            firsts.push(read(&counter.output(), voice)[0]);
        }
    }
    assert_eq!(firsts[0], vec![0.0, 1.0, 0.0, 1.0]);
    assert_eq!(firsts[1], vec![0.0, 1.0, 2.0, 0.0]);
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn multi_table_recording_one_table_per_voice() {
    let engine = engine();
    let tables = Table::multi(2, BLOCK, SAMPLE_RATE).unwrap();
    let src: Sig = Sig::builder().arg("value", [1.0, 2.0]).build_into(&engine).unwrap();
    let rec: TableRec = TableRec::builder()
        .arg("input", src.output())
        .arg("table", tables.clone())
        .build_into(&engine)
        .unwrap();
    assert_eq!(rec.voice_count(), 2);
    let done = rec.stream("trig").unwrap().into_source();

    rec.play();
    engine.process_block();
    assert_eq!(tables[0].snapshot(), vec![1.0; BLOCK]);
    assert_eq!(tables[1].snapshot(), vec![2.0; BLOCK]);
    assert_eq!(read(&done, 1)[BLOCK - 1], 1.0);
}

#[test]
fn oscillator_reads_recorded_table() {
    let engine = engine();
    let table = Table::new(BLOCK, SAMPLE_RATE).unwrap();
    let src: Sig = Sig::builder().arg("value", 0.5).build_into(&engine).unwrap();
    let rec: TableRec = TableRec::builder()
        .arg("input", src.output())
        .arg("table", &table)
        .build_into(&engine)
        .unwrap();
    let osc: Osc = Osc::builder()
        .arg("table", &table)
        .arg("freq", 100.0)
        .build_into(&engine)
        .unwrap();
    rec.play();
    engine.process_block();
    engine.process_block();
    assert_eq!(read(&osc.output(), 0), vec![0.5; BLOCK]);
}

// ============================================================================
// Input replacement
// ============================================================================

#[test]
fn replacing_trigger_input_keeps_channels() {
    let engine = engine();
    let ticking = every_block(&engine, 1);
    let silent: Metro = Metro::builder().build_into(&engine).unwrap();
    let mut rand: TrigRand = TrigRand::builder()
        .arg("input", ticking.output())
        .arg("min", 1.0)
        .arg("max", 2.0)
        .build_into(&engine)
        .unwrap();
    let ids = rand.channel_ids();

    engine.process_block();
    let held = read(&rand.output(), 0)[0];
    assert!((1.0..2.0).contains(&held));

    rand.set_input(silent.output(), Some(0.0)).unwrap();
    engine.process_block();
    engine.process_block();
    assert_eq!(read(&rand.output(), 0), vec![held; BLOCK]);
    assert_eq!(rand.channel_ids(), ids);
}

// ============================================================================
// Uniform node handling
// ============================================================================

#[test]
fn nodes_box_as_any_node() {
    let engine = engine();
    let table = Table::sine(64, SAMPLE_RATE).unwrap();
    let src: Sig = Sig::builder().arg("value", 0.0).build_into(&engine).unwrap();
    let mut nodes: Vec<Box<dyn AnyNode>> = vec![
        Box::new(Osc::builder().arg("table", &table).build(&engine).unwrap()),
        Box::new(
            TableRec::builder()
                .arg("input", src.output())
                .arg("table", &table)
                .build(&engine)
                .unwrap(),
        ),
    ];

    let outcomes: Vec<SetOutcome> = nodes
        .iter_mut()
        .map(|n| n.set("mul", ExpandableValue::from(0.5)).unwrap())
        .collect();
    assert_eq!(outcomes, vec![SetOutcome::Applied, SetOutcome::Ignored]);
    assert_eq!(nodes[0].kind_name(), "Osc");
    assert!(!nodes[1].is_playing());
}

#[test]
fn unknown_aux_stream_is_key_lookup() {
    let engine = engine();
    let osc: Osc = Osc::builder()
        .arg("table", Table::sine(64, SAMPLE_RATE).unwrap())
        .build_into(&engine)
        .unwrap();
    assert!(matches!(
        osc.stream("trig"),
        Err(CoroError::KeyLookup { .. })
    ));
}
