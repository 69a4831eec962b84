//! Captured board output flowing into the device-log extractor, using local shells in
//! place of ssh.
#![cfg(unix)]

use hwperf_core::{RemoteCredential, Secret};
use hwperf_integration_tests::{init_tracing, TestResult};
use hwperf_parse::parse_device_log;
use hwperf_remote::{run_interactive, run_plain, CancelFlag};
use std::path::Path;
use std::time::Duration;

fn sh(script: &str) -> Vec<String> { vec!["/bin/sh".into(), "-c".into(), script.into()] }

const BOARD_SCRIPT: &str = "printf 'ubuntu@kria password: '; read pw; \
	echo \"login as $pw\"; \
	echo 'Frame 0 inference time: 42.50 ms'; echo 'Frame 1 inference time: 57.50 ms'";

#[test]
fn password_session_output_parses_and_is_redacted() -> TestResult {
	init_tracing();
	let cred = RemoteCredential::new(Secret::new("kria-pw-123"), 3);
	let out = run_interactive(&sh(BOARD_SCRIPT), &cred, Duration::from_secs(20), &CancelFlag::new());
	assert_eq!(out.exit_code, 0, "{out:?}");
	assert!(!out.output.contains("kria-pw-123"));
	assert!(out.output.contains("login as <redacted>"));

	let rec = parse_device_log(&out.output, Path::new("kv260/stdout.log"));
	assert!(rec.parsed);
	let stats = rec.payload.stats.unwrap();
	assert_eq!(stats.count, 2);
	assert_eq!(stats.fps_from_median, 20.0);
	Ok(())
}

#[tokio::test]
async fn key_based_session_output_parses() -> TestResult {
	init_tracing();
	let script = "echo 'Inference time: 40.00 ms'; echo 'warning: fan' >&2; exit 0";
	let out = run_plain(&sh(script), Duration::from_secs(20), &CancelFlag::new()).await;
	assert!(out.success());
	assert_eq!(out.error.as_deref(), Some("warning: fan\n"));
	let rec = parse_device_log(&out.output, Path::new("kv260/stdout.log"));
	assert_eq!(rec.payload.inference_times_ms, vec![40.0]);
	Ok(())
}

#[test]
fn prompts_beyond_the_limit_go_unanswered() -> TestResult {
	init_tracing();
	let cred = RemoteCredential::new(Secret::new("pw"), 1);
	let script = "printf 'Password: '; read a; printf 'Password: '; read b; echo done";
	let out = run_interactive(&sh(script), &cred, Duration::from_secs(2), &CancelFlag::new());
	assert!(out.timed_out(), "{out:?}");
	assert!(!out.output.contains("done"));
	Ok(())
}
