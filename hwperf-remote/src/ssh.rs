//! `ssh` argument vectors for board sessions.

use hwperf_core::RemoteConfig;

const DEFAULT_SSH_PORT: u16 = 22;

/// Build the full argv, program first.
///
/// Host keys are not checked: boards are re-imaged often and their keys change.
/// `BatchMode` is only disabled when a credential will be answered interactively.
pub fn ssh_argv(remote: &RemoteConfig, command: &str, with_credential: bool) -> Vec<String> {
	let mut argv = vec!["ssh".to_string()];
	if remote.port != DEFAULT_SSH_PORT {
		argv.extend(["-p".to_string(), remote.port.to_string()]);
	}
	let identity = remote.identity_file.trim();
	if !identity.is_empty() {
		argv.extend(["-i".to_string(), expand_home(identity)]);
	}
	if remote.force_tty {
		argv.push("-tt".into());
	}
	for opt in ["StrictHostKeyChecking=no", "UserKnownHostsFile=/dev/null", "ConnectTimeout=10"] {
		argv.extend(["-o".to_string(), opt.to_string()]);
	}
	argv.extend(["-o".to_string(), format!("BatchMode={}", if with_credential { "no" } else { "yes" })]);
	argv.push(remote.host.clone());
	argv.push(command.to_string());
	argv
}

/// `~` and `~/...` relative to `$HOME`; anything else unchanged.
pub fn expand_home(path: &str) -> String {
	let home = match std::env::var("HOME") {
		Ok(h) if !h.is_empty() => h,
		_ => return path.to_string(),
	};
	if path == "~" {
		home
	} else if let Some(rest) = path.strip_prefix("~/") {
		format!("{}/{rest}", home.trim_end_matches('/'))
	} else {
		path.to_string()
	}
}
