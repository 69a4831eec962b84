//! Entry points used by the CLI.

use crate::output::{exit_code, RemoteOutput, EXIT_INTERNAL, EXIT_INTERRUPTED, INTERRUPTED, TIMED_OUT};
#[cfg(unix)]
use crate::prompt::drive;
use crate::ssh::ssh_argv;
use crate::CancelFlag;
#[cfg(unix)]
use hwperf_core::secret::EMPTY_PASSWORD;
use hwperf_core::{RemoteConfig, RemoteCredential};
use std::process::Stdio;
use std::time::Duration;
use tracing::{info, warn};

/// Run `argv` on a pseudo-terminal, answering password prompts with `credential`.
///
/// Blocking; call from `spawn_blocking` inside async code.
#[cfg(unix)]
pub fn run_interactive(argv: &[String], credential: &RemoteCredential, timeout: Duration, cancel: &CancelFlag) -> RemoteOutput {
	if credential.secret.is_empty() {
		return RemoteOutput::internal(EMPTY_PASSWORD);
	}
	match crate::pty::PtyProcess::spawn(argv) {
		Ok(mut pty) => drive(&mut pty, credential, timeout, cancel),
		Err(e) => {
			warn!(error = %e, "PTY allocation failed");
			RemoteOutput::internal(format!(
				"failed to allocate PTY for password auth ({e}); use key-based SSH instead"
			))
		}
	}
}

#[cfg(not(unix))]
pub fn run_interactive(_argv: &[String], _credential: &RemoteCredential, _timeout: Duration, _cancel: &CancelFlag) -> RemoteOutput {
	RemoteOutput::internal("password sessions need a Unix pseudo-terminal; use key-based SSH instead")
}

/// Run `argv` without a terminal, capturing stdout and stderr separately.
pub async fn run_plain(argv: &[String], timeout: Duration, cancel: &CancelFlag) -> RemoteOutput {
	let Some((program, args)) = argv.split_first() else { return RemoteOutput::internal("empty command") };
	let child = tokio::process::Command::new(program)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn();
	let child = match child {
		Ok(c) => c,
		Err(e) => return RemoteOutput::internal(format!("failed to start {program}: {e}")),
	};
	tokio::select! {
		res = child.wait_with_output() => match res {
			Ok(out) => {
				let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
				RemoteOutput {
					output: String::from_utf8_lossy(&out.stdout).into_owned(),
					error: (!stderr.trim().is_empty()).then_some(stderr),
					exit_code: exit_code(out.status),
				}
			}
			Err(e) => RemoteOutput::internal(format!("failed to wait for {program}: {e}")),
		},
		_ = tokio::time::sleep(timeout) => {
			warn!(?timeout, "remote command timed out");
			RemoteOutput { output: String::new(), error: Some(TIMED_OUT.into()), exit_code: EXIT_INTERNAL }
		}
		_ = cancel.cancelled() => {
			RemoteOutput { output: String::new(), error: Some(INTERRUPTED.into()), exit_code: EXIT_INTERRUPTED }
		}
	}
}

/// Run `command` on the configured board. A credential selects the PTY path.
pub async fn run_remote(
	remote: &RemoteConfig,
	command: &str,
	credential: Option<RemoteCredential>,
	cancel: &CancelFlag,
) -> RemoteOutput {
	let argv = ssh_argv(remote, command, credential.is_some());
	let timeout = remote.timeout;
	info!(host = %remote.host, interactive = credential.is_some(), "running remote command");
	match credential {
		None => run_plain(&argv, timeout, cancel).await,
		Some(cred) => {
			let cancel = cancel.clone();
			let joined = tokio::task::spawn_blocking(move || run_interactive(&argv, &cred, timeout, &cancel)).await;
			joined.unwrap_or_else(|e| RemoteOutput::internal(format!("remote session task failed: {e}")))
		}
	}
}
