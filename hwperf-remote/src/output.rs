use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Exit code reported for failures on our side: no PTY, spawn failure, timeout.
pub const EXIT_INTERNAL: i32 = -1;
/// Exit code reported when the user interrupts the session.
pub const EXIT_INTERRUPTED: i32 = 130;

pub const TIMED_OUT: &str = "remote command timed out";
pub const INTERRUPTED: &str = "interrupted by user";

/// Result of one remote invocation. Transport problems land in `error`, never in an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutput {
	/// Captured stdout (merged with stderr for PTY sessions).
	pub output: String,
	/// Remote stderr or a local diagnostic.
	pub error: Option<String>,
	pub exit_code: i32,
}

impl RemoteOutput {
	pub fn internal(diagnostic: impl Into<String>) -> Self {
		Self { output: String::new(), error: Some(diagnostic.into()), exit_code: EXIT_INTERNAL }
	}

	pub fn success(&self) -> bool { self.exit_code == 0 }
	pub fn timed_out(&self) -> bool { self.error.as_deref() == Some(TIMED_OUT) }
	pub fn interrupted(&self) -> bool { self.exit_code == EXIT_INTERRUPTED && self.error.as_deref() == Some(INTERRUPTED) }
}

/// Shared interrupt flag, set from the Ctrl-C handler and polled by the runners.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self { Self::default() }
	pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst) }
	pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::SeqCst) }

	/// Resolves once the flag is set.
	pub async fn cancelled(&self) {
		while !self.is_cancelled() {
			tokio::time::sleep(Duration::from_millis(100)).await;
		}
	}
}

#[cfg(unix)]
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
	use std::os::unix::process::ExitStatusExt;
	status.code().or_else(|| status.signal().map(|s| 128 + s)).unwrap_or(EXIT_INTERNAL)
}

#[cfg(not(unix))]
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 { status.code().unwrap_or(EXIT_INTERNAL) }
