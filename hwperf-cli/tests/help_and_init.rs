#![forbid(unsafe_code)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn help_lists_subcommands() -> Result<(), Box<dyn std::error::Error>> {
	let mut cmd = Command::cargo_bin("hwperf")?;
	cmd.arg("--help");
	cmd.assert()
		.success()
		.stdout(predicate::str::contains("hwperf"))
		.stdout(predicate::str::contains("compare"));
	Ok(())
}

#[test]
fn init_writes_config_and_reports_dir() {
	let dir = tempdir().unwrap();
	Command::cargo_bin("hwperf")
		.unwrap()
		.current_dir(dir.path())
		.env_remove("HWPERF_CONFIG")
		.env_remove("HWPERF_REPORTS_DIR")
		.arg("init")
		.assert()
		.success()
		.stdout(predicate::str::contains("Created config: hwperf.toml"));

	let contents = std::fs::read_to_string(dir.path().join("hwperf.toml")).unwrap();
	assert!(contents.contains("[remote]"));
	assert!(dir.path().join("reports/.gitkeep").is_file());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("custom.toml");
	std::fs::write(&path, "reports_dir = \"mine\"\n").unwrap();

	let mut cmd = Command::cargo_bin("hwperf").unwrap();
	cmd.current_dir(dir.path()).env_remove("HWPERF_REPORTS_DIR").arg("--config").arg(&path).arg("init");
	cmd.assert().failure().stderr(predicate::str::contains("refusing to overwrite"));
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "reports_dir = \"mine\"\n");

	let mut cmd = Command::cargo_bin("hwperf").unwrap();
	cmd.current_dir(dir.path()).env_remove("HWPERF_REPORTS_DIR").arg("--config").arg(&path).args(["init", "--force"]);
	cmd.assert().success();
	assert!(std::fs::read_to_string(&path).unwrap().contains("[extract]"));
}

#[test]
fn malformed_config_is_rejected() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("hwperf.toml");
	std::fs::write(&path, "reports_dir = [1, 2]\n").unwrap();

	let mut cmd = Command::cargo_bin("hwperf").unwrap();
	cmd.current_dir(dir.path()).arg("--config").arg(&path).arg("list");
	cmd.assert().failure().stderr(predicate::str::contains("loading config"));
}
