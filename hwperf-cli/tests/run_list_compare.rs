#![forbid(unsafe_code)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const CONFIG: &str = "reports_dir = \"reports\"\nhls_report_dir = \"\"\nvivado_report_dir = \"\"\n";

fn hwperf(cwd: &Path) -> Command {
	let mut cmd = Command::cargo_bin("hwperf").unwrap();
	cmd.current_dir(cwd)
		.env_remove("HWPERF_CONFIG")
		.env_remove("HWPERF_REPORTS_DIR")
		.env_remove("HWPERF_REMOTE_HOST")
		.env_remove("HWPERF_REMOTE_TIMEOUT");
	cmd
}

fn setup(frames_ms: &[f64]) -> tempfile::TempDir {
	let dir = tempdir().unwrap();
	std::fs::write(dir.path().join("hwperf.toml"), CONFIG).unwrap();
	let log: String = frames_ms
		.iter()
		.enumerate()
		.map(|(i, ms)| format!("Frame {i} inference time: {ms:.2} ms\n"))
		.collect();
	std::fs::write(dir.path().join("kv260.log"), log).unwrap();
	dir
}

fn bundle_dirs(root: &Path) -> Vec<String> {
	let mut names: Vec<String> = std::fs::read_dir(root)
		.unwrap()
		.filter_map(|e| e.ok())
		.filter(|e| e.path().is_dir())
		.map(|e| e.file_name().to_string_lossy().into_owned())
		.collect();
	names.sort();
	names
}

#[test]
fn run_with_device_log_writes_bundle() {
	let dir = setup(&[42.5, 57.5]);
	hwperf(dir.path())
		.args(["run", "--label", "run #1 (int16)", "--note", "first", "--kv260-log", "kv260.log"])
		.assert()
		.success()
		.stdout(predicate::str::contains("KV260: 2 frames, median 50.00 ms, ~20.00 FPS"));

	let names = bundle_dirs(&dir.path().join("reports"));
	assert_eq!(names.len(), 1);
	assert!(names[0].ends_with("_run__1__int16_"), "{names:?}");

	let bundle = dir.path().join("reports").join(&names[0]);
	for f in ["meta.json", "metrics.json", "summary.md", "kv260/stdout.log", "kv260/parsed_kv260.json"] {
		assert!(bundle.join(f).is_file(), "missing {f}");
	}
	let meta: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(bundle.join("meta.json")).unwrap()).unwrap();
	assert_eq!(meta["label"], "run #1 (int16)");
	assert_eq!(meta["note"], "first");
	let summary = std::fs::read_to_string(bundle.join("summary.md")).unwrap();
	assert!(summary.contains("| FPS (median) | 20.00 |"));
}

#[test]
fn missing_device_log_is_a_soft_miss() {
	let dir = setup(&[]);
	hwperf(dir.path()).args(["run", "--label", "x", "--kv260-log", "nope.log"]).assert().success();
	let names = bundle_dirs(&dir.path().join("reports"));
	let metrics = std::fs::read_to_string(dir.path().join("reports").join(&names[0]).join("metrics.json")).unwrap();
	let metrics: serde_json::Value = serde_json::from_str(&metrics).unwrap();
	assert_eq!(metrics["kv260"]["parsed"], false);
	assert!(metrics["kv260"]["error"].as_str().unwrap().contains("file not found"));
}

#[test]
fn unset_password_env_aborts_before_bundle() {
	let dir = setup(&[]);
	hwperf(dir.path())
		.env_remove("HWPERF_TEST_NO_SUCH_PW")
		.args(["run", "--label", "x", "--kv260-ssh", "--kv260-password-env", "HWPERF_TEST_NO_SUCH_PW"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("HWPERF_TEST_NO_SUCH_PW"));
	assert!(!dir.path().join("reports").exists());
}

#[test]
fn device_log_conflicts_with_ssh() {
	let dir = setup(&[]);
	hwperf(dir.path()).args(["run", "--kv260-log", "kv260.log", "--kv260-ssh"]).assert().failure();
}

#[test]
fn list_and_compare() {
	let dir = setup(&[50.0]);
	hwperf(dir.path()).args(["run", "--label", "base", "--kv260-log", "kv260.log"]).assert().success();
	std::fs::write(dir.path().join("kv260.log"), "inference time: 40.00 ms\n").unwrap();
	hwperf(dir.path()).args(["run", "--label", "cand", "--kv260-log", "kv260.log"]).assert().success();

	hwperf(dir.path())
		.args(["list", "--format", "markdown"])
		.assert()
		.success()
		.stdout(predicate::str::contains("| base |"))
		.stdout(predicate::str::contains("| 20.00 | N/A |"))
		.stdout(predicate::str::contains("| cand |"));

	let list = hwperf(dir.path()).args(["list", "--format", "json"]).output().unwrap();
	let rows: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
	assert_eq!(rows.as_array().unwrap().len(), 2);

	let names = bundle_dirs(&dir.path().join("reports"));
	let (base, cand) = if names[0].ends_with("_base") { (&names[0], &names[1]) } else { (&names[1], &names[0]) };
	hwperf(dir.path())
		.args(["compare", base, cand, "--format", "markdown"])
		.assert()
		.success()
		.stdout(predicate::str::contains("# Comparison: base vs cand"))
		.stdout(predicate::str::contains("| FPS (median) | 20.00 | 25.00 | +5.00 (+25.0%) |"));
}

#[test]
fn compare_without_overlap() {
	let dir = setup(&[]);
	hwperf(dir.path()).args(["run", "--label", "a"]).assert().success();
	hwperf(dir.path()).args(["run", "--label", "b"]).assert().success();
	let names = bundle_dirs(&dir.path().join("reports"));
	hwperf(dir.path())
		.args(["compare", &names[0], &names[1]])
		.assert()
		.success()
		.stdout(predicate::str::contains("No comparable metrics found."));
}

#[test]
fn list_missing_reports_dir_fails() {
	let dir = setup(&[]);
	hwperf(dir.path())
		.args(["list", "--reports-dir", "does-not-exist"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("reports directory not found"));
}
