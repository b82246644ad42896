//! CLI Tests
//!
//! Runs the `voicecheck-cli` binary and checks the output channel contract:
//! one JSON line on stdout and exit code 0 or 1.

use std::path::Path;
use std::process::{Command, Output};

use hound::{SampleFormat, WavSpec, WavWriter};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::tempdir;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_voicecheck-cli"));
    for var in [
        "VOICECHECK_VARIANT",
        "VOICECHECK_MODEL_DIR",
        "VOICECHECK_CONFIG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// The last stdout line, parsed
fn last_json(output: &Output) -> Value {
    let lines = stdout_lines(output);
    let last = lines.last().expect("no stdout output");
    serde_json::from_str(last).unwrap()
}

fn write_wav(path: &Path, duration_secs: f32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..(22050.0 * duration_secs) as usize {
        let s = (2.0 * std::f32::consts::PI * 300.0 * i as f32 / 22050.0).sin() * 0.4;
        writer.write_sample((s * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Config with one variant backed by a constant dense model
fn write_fixture_config(dir: &Path, bias: f32, segments: bool) -> std::path::PathBuf {
    let model = json!({
        "input_shape": [1, 20],
        "weights": [vec![0.0f32; 20]],
        "bias": [bias],
        "activation": "sigmoid",
    });
    std::fs::write(dir.join("fixture.json"), model.to_string()).unwrap();

    let mut variant = json!({
        "id": "fixture",
        "model_path": "fixture.json",
        "input_shape": [1, 20],
        "recipe": {"layout": "flat", "descriptors": [{"kind": "mfcc", "count": 20}]},
        "scheme": {"kind": "binary"},
    });
    if segments {
        variant["segments"] = json!({"window_secs": 1.0});
    }
    let config = json!({ "variant": "fixture", "variants": [variant] });
    let path = dir.join("config.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

// === Invocation Errors ===

#[test]
fn test_missing_argument() {
    let output = cli().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_lines(&output), vec![r#"{"error":"No file path provided"}"#]);
}

#[test]
fn test_nonexistent_file() {
    let output = cli().arg("/nonexistent/dir/clip.wav").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        last_json(&output),
        json!({"error": "File not found: /nonexistent/dir/clip.wav"})
    );
}

#[test]
fn test_unknown_flag_is_error_payload() {
    let output = cli().arg("--no-such-flag").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let value = last_json(&output);
    assert!(value["error"].as_str().unwrap().contains("--no-such-flag"));
}

#[test]
fn test_help_exits_zero() {
    let output = cli().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_missing_model_reports_path() {
    let dir = tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    write_wav(&clip, 0.5);

    let output = cli()
        .arg(&clip)
        .arg("--model-dir")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let message = last_json(&output)["error"].as_str().unwrap().to_string();
    assert!(message.contains("deepfake_voice.onnx"), "{}", message);
}

// === Successful Runs ===

#[test]
fn test_classifies_wav() {
    let dir = tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    write_wav(&clip, 1.0);
    let config = write_fixture_config(dir.path(), 2.0, false);

    let output = cli()
        .arg(&clip)
        .arg("--config")
        .arg(&config)
        .arg("--model-dir")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(last_json(&output), json!({"label": "Fake", "confidence": 88.08}));
}

#[test]
fn test_segments_in_output() {
    let dir = tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    write_wav(&clip, 2.0);
    let config = write_fixture_config(dir.path(), -2.0, true);

    let output = cli()
        .arg(&clip)
        .env("VOICECHECK_CONFIG", &config)
        .env("VOICECHECK_MODEL_DIR", dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        last_json(&output),
        json!({
            "label": "Real",
            "confidence": 11.92,
            "segments": [
                {"start": 0, "end": 22050, "label": "Real"},
                {"start": 22050, "end": 44100, "label": "Real"}
            ]
        })
    );
}

#[test]
fn test_verbose_logs_stay_off_stdout() {
    let dir = tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    write_wav(&clip, 0.5);
    let config = write_fixture_config(dir.path(), 0.0, false);

    let output = cli()
        .arg("-v")
        .arg(&clip)
        .arg("--config")
        .arg(&config)
        .arg("--model-dir")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_lines(&output).len(), 1);
    // sigmoid(0) is exactly the threshold
    assert_eq!(last_json(&output), json!({"label": "Real", "confidence": 50.0}));
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_list_variants() {
    let output = cli().arg("--list-variants").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let ids: Vec<String> = last_json(&output)
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        vec!["deepfake-voice", "tempered-voice", "deepfake-voice-multiclass"]
    );
}
