//! Integration tests for coro-config.
//!
//! Patch files written to disk, read back, built and rendered.

use coro_config::{
    ConfigError, EngineSettings, MatrixConfig, NodeConfig, ParamValue, Patch, PatchConfig,
    TableConfig, ValidationError,
};
use coro_core::ExpandableValue;
use coro_registry::NodeRegistry;
use tempfile::TempDir;

const COUNTING: &str = r#"
name = "Counting"

[engine]
sample_rate = 8000
block_size = 8

[[tables]]
id = "silence"
size = 4

[[nodes]]
id = "reader"
kind = "tableread"
play = true
[nodes.params]
table = { table = "silence" }
freq = 2000
loop = true

[[nodes]]
id = "count"
kind = "counter"
output = true
[nodes.params]
input = { node = "reader", stream = "trig" }
max = 10
"#;

fn small_engine() -> EngineSettings {
    EngineSettings {
        sample_rate: 8000,
        block_size: 8,
        ..EngineSettings::default()
    }
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_patch_save_load_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grid.toml");

    let original = PatchConfig::new("Grid")
        .with_engine(small_engine())
        .with_matrix(MatrixConfig::new("grid", 4, 2))
        .with_node(NodeConfig::new("src", "sig").with_param("value", 0.5))
        .with_node(
            NodeConfig::new("rec", "matrixrec")
                .playing()
                .with_param("input", ParamValue::node("src"))
                .with_param("matrix", ParamValue::matrix("grid")),
        );
    original.save(&path).unwrap();

    let loaded = PatchConfig::load(&path).unwrap();
    assert_eq!(loaded, original);

    let patch = Patch::build(&loaded, &NodeRegistry::new()).unwrap();
    patch.render(1);
    assert_eq!(patch.matrix("grid").unwrap().snapshot(), vec![0.5; 8]);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = PatchConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_load_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "name = ").unwrap();
    assert!(matches!(
        PatchConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

// ============================================================================
// Building and rendering
// ============================================================================

#[test]
fn test_aux_stream_reference_renders() {
    let config: PatchConfig = COUNTING.parse().unwrap();
    let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
    assert_eq!(patch.name(), "Counting");

    let audio = patch.render(2);
    assert_eq!(
        audio,
        vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, //
            1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0,
        ]
    );
}

#[test]
fn test_multichannel_table_list() {
    let config = PatchConfig::new("Morph")
        .with_engine(small_engine())
        .with_table(TableConfig::new("low", 4).with_samples(vec![0.0; 4]))
        .with_table(TableConfig::new("high", 4).with_samples(vec![1.0; 4]))
        .with_table(TableConfig::new("out", 4))
        .with_node(NodeConfig::new("pos", "sig").with_param("value", 0.5))
        .with_node(
            NodeConfig::new("morph", "tablemorph")
                .with_param("input", ParamValue::node("pos"))
                .with_param("table", ParamValue::table("out"))
                .with_param("sources", ParamValue::tables(["low", "high"])),
        );
    let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
    assert_eq!(patch.node("morph").unwrap().voice_count(), 1);
    patch.render(1);
    assert_eq!(patch.table("out").unwrap().snapshot(), vec![0.5; 4]);
}

#[test]
fn test_live_change_after_build() {
    let config = PatchConfig::new("Live")
        .with_engine(small_engine())
        .with_node(
            NodeConfig::new("dc", "sig")
                .with_param("value", [1.0, 2.0])
                .as_output(),
        );
    let mut patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
    assert_eq!(patch.render(1), vec![3.0; 8]);

    patch
        .node_mut("dc")
        .unwrap()
        .set("value", ExpandableValue::from(0.5_f32))
        .unwrap();
    assert_eq!(patch.render(1), vec![1.0; 8]);
}

#[test]
fn test_size_mismatch_rejected_by_kind() {
    let config = PatchConfig::new("Scale")
        .with_engine(small_engine())
        .with_table(TableConfig::new("a", 4))
        .with_table(TableConfig::new("b", 8))
        .with_node(
            NodeConfig::new("scale", "tablescale")
                .with_param("table", ParamValue::table("a"))
                .with_param("outtable", ParamValue::table("b")),
        );
    let err = Patch::build(&config, &NodeRegistry::new()).unwrap_err();
    assert!(matches!(err, ConfigError::Registry(_)), "{err}");
}

#[test]
fn test_validation_runs_before_build() {
    let config = PatchConfig::new("Forward")
        .with_node(NodeConfig::new("count", "counter").with_param("input", ParamValue::node("clock")))
        .with_node(NodeConfig::new("clock", "metro"));
    let err = Patch::build(&config, &NodeRegistry::new()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::UnresolvedReference { .. })
    ));
}
