//! Integration tests for coro-cli.
//!
//! Runs the `coro` binary against patch files written to a temporary
//! directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `coro` binary built by cargo.
fn coro_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_coro"))
}

const DRONE: &str = r#"
name = "Drone"

[engine]
sample_rate = 8000
block_size = 64

[[nodes]]
id = "dc"
kind = "sig"
output = true
[nodes.params]
value = [0.25, 0.125]
"#;

const BROKEN: &str = r#"
name = "Broken"

[[nodes]]
id = "count"
kind = "counter"
[nodes.params]
input = { node = "clock" }
speed = 2

[[nodes]]
id = "clock"
kind = "metro"
"#;

fn write_patch(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn run(args: &[&Path]) -> std::process::Output {
    coro_bin().args(args).output().expect("failed to run coro")
}

// ---------------------------------------------------------------------------
// `coro nodes`
// ---------------------------------------------------------------------------

#[test]
fn cli_nodes_lists_all_kinds() {
    let output = coro_bin().arg("nodes").output().expect("failed to run coro nodes");
    assert!(output.status.success(), "coro nodes failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Nodes"));
    for kind in [
        "sig", "metro", "trigrand", "trigchoice", "trigenv", "counter", "select", "osc",
        "oscloop", "tableread", "pointer", "tableindex", "lookup", "tablerec", "trigtablerec",
        "tableput", "tablemorph", "tablescale", "matrixrec", "matrixrecloop", "matrixpointer",
        "matrixmorph", "randi", "randh", "randint", "choice", "urn",
    ] {
        assert!(stdout.contains(kind), "listing should contain '{kind}'");
    }
}

#[test]
fn cli_nodes_detail_shows_parameters() {
    let output = coro_bin()
        .args(["nodes", "tablerec"])
        .output()
        .expect("failed to run coro nodes tablerec");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TableRec"));
    assert!(stdout.contains("Parameters"));
    assert!(stdout.contains("fadetime"));
    assert!(stdout.contains("Streams: trig, time"));
}

#[test]
fn cli_nodes_unknown_kind_fails() {
    let output = coro_bin()
        .args(["nodes", "reverb"])
        .output()
        .expect("failed to run coro nodes reverb");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown node kind"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// `coro check`
// ---------------------------------------------------------------------------

#[test]
fn cli_check_accepts_valid_patch() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "drone.toml", DRONE);

    let output = run(&[Path::new("check"), &patch]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("is valid (1 nodes"), "stdout: {stdout}");
}

#[test]
fn cli_check_reports_every_problem() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "broken.toml", BROKEN);

    let output = run(&[Path::new("check"), &patch]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown parameter 'speed'"), "stderr: {stderr}");
    assert!(stderr.contains("refers to 'clock'"), "stderr: {stderr}");
    assert!(stderr.contains("2 problems found"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// `coro render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_writes_float_wav() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "drone.toml", DRONE);
    let wav = dir.path().join("drone.wav");

    let output = coro_bin()
        .arg("render")
        .arg(&patch)
        .arg(&wav)
        .args(["--seconds", "0.1"])
        .output()
        .expect("failed to run coro render");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let mut reader = hound::WavReader::open(&wav).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(spec.bits_per_sample, 32);
    let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 800);
    assert!(samples.iter().all(|&s| s == 0.375));
}

#[test]
fn cli_render_rejects_bad_duration() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "drone.toml", DRONE);

    let output = coro_bin()
        .arg("render")
        .arg(&patch)
        .arg(dir.path().join("out.wav"))
        .args(["--seconds", "0"])
        .output()
        .expect("failed to run coro render");
    assert!(!output.status.success());
}
