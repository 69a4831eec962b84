//! Prompt-answering loop over an abstract terminal.
//!
//! States: starting, polling, then one of exited (drained), timed out or interrupted.
//! The loop owns no OS resources; [`PromptTerminal`] implementations release theirs on drop.

use crate::output::{RemoteOutput, EXIT_INTERNAL, EXIT_INTERRUPTED, INTERRUPTED, TIMED_OUT};
use crate::CancelFlag;
use hwperf_core::RemoteCredential;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Poll slice between timeout and interrupt checks.
pub const POLL_SLICE: Duration = Duration::from_millis(200);
/// Bytes of recent output searched for a prompt.
pub const TAIL_LEN: usize = 2048;
/// Wait after SIGTERM before SIGKILL.
pub const KILL_GRACE: Duration = Duration::from_secs(2);

/// `ubuntu@kria's password:`, `[sudo] password for ubuntu:`, `Enter passphrase for key ...:`
static PROMPT: Lazy<Regex> = Lazy::new(prompt_regex);

#[allow(clippy::expect_used)]
fn prompt_regex() -> Regex { Regex::new(r"(?i)(?:password|passphrase)(?-u:[^:\n])*:").expect("prompt pattern compiles") }

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
	Data(Vec<u8>),
	/// Nothing arrived within the slice.
	Idle,
	/// The output side is closed.
	Closed,
}

/// A child process attached to a terminal.
pub trait PromptTerminal {
	fn poll_output(&mut self, slice: Duration) -> io::Result<Chunk>;
	fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
	/// Exit code once the child has exited.
	fn try_exit(&mut self) -> io::Result<Option<i32>>;
	/// Output still buffered after exit, read without blocking.
	fn drain(&mut self) -> Vec<u8>;
	/// Stop the child: polite signal, `grace`, then force.
	fn terminate(&mut self, grace: Duration);
}

pub fn is_prompt(tail: &[u8]) -> bool { PROMPT.is_match(tail) }

/// Drive `term` until the child exits, the deadline passes or `cancel` is set.
///
/// Each detected prompt is answered with the secret while fewer than `max_prompts`
/// answers have been sent. The returned output never contains the secret.
pub fn drive<T: PromptTerminal>(
	term: &mut T,
	credential: &RemoteCredential,
	timeout: Duration,
	cancel: &CancelFlag,
) -> RemoteOutput {
	let start = Instant::now();
	let mut out: Vec<u8> = Vec::new();
	let mut tail: Vec<u8> = Vec::new();
	let mut answered: u32 = 0;

	let finish = |out: &[u8], error: Option<String>, exit_code: i32| RemoteOutput {
		output: credential.secret.redact(&String::from_utf8_lossy(out)),
		error,
		exit_code,
	};

	loop {
		if cancel.is_cancelled() {
			warn!("remote session interrupted");
			term.terminate(KILL_GRACE);
			return finish(&out, Some(INTERRUPTED.into()), EXIT_INTERRUPTED);
		}
		if start.elapsed() > timeout {
			warn!(?timeout, "remote session timed out");
			term.terminate(KILL_GRACE);
			return finish(&out, Some(TIMED_OUT.into()), EXIT_INTERNAL);
		}

		match term.poll_output(POLL_SLICE) {
			Ok(Chunk::Data(data)) => {
				out.extend_from_slice(&data);
				tail.extend_from_slice(&data);
				if tail.len() > TAIL_LEN {
					tail.drain(..tail.len() - TAIL_LEN);
				}
				if answered < credential.max_prompts && is_prompt(&tail) {
					let mut reply = credential.secret.expose().as_bytes().to_vec();
					reply.push(b'\n');
					if let Err(e) = term.send(&reply) {
						term.terminate(KILL_GRACE);
						return finish(&out, Some(format!("failed to answer prompt: {e}")), EXIT_INTERNAL);
					}
					answered += 1;
					tail.clear();
					debug!(answered, max = credential.max_prompts, "answered prompt");
				}
			}
			Ok(Chunk::Idle) => {}
			// Closed returns at once; wait out the slice while the child is reaped.
			Ok(Chunk::Closed) => std::thread::sleep(POLL_SLICE),
			Err(e) => {
				term.terminate(KILL_GRACE);
				return finish(&out, Some(format!("terminal read failed: {e}")), EXIT_INTERNAL);
			}
		}

		match term.try_exit() {
			Ok(Some(code)) => {
				out.extend(term.drain());
				debug!(code, answered, bytes = out.len(), "remote session exited");
				return finish(&out, None, code);
			}
			Ok(None) => {}
			Err(e) => {
				term.terminate(KILL_GRACE);
				return finish(&out, Some(format!("failed to wait for child: {e}")), EXIT_INTERNAL);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hwperf_core::Secret;
	use std::collections::VecDeque;

	/// Replays output chunks; exits once the script is exhausted unless told to hang.
	#[derive(Default)]
	struct ScriptedTerminal {
		chunks: VecDeque<Chunk>,
		sent: Vec<Vec<u8>>,
		exit_code: i32,
		hang: bool,
		trailing: Vec<u8>,
		terminated: bool,
	}

	impl ScriptedTerminal {
		fn new<I: IntoIterator<Item = &'static str>>(lines: I) -> Self {
			Self { chunks: lines.into_iter().map(|l| Chunk::Data(l.as_bytes().to_vec())).collect(), ..Self::default() }
		}
	}

	impl PromptTerminal for ScriptedTerminal {
		fn poll_output(&mut self, _slice: Duration) -> io::Result<Chunk> {
			Ok(self.chunks.pop_front().unwrap_or(if self.hang { Chunk::Idle } else { Chunk::Closed }))
		}
		fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
			self.sent.push(bytes.to_vec());
			Ok(())
		}
		fn try_exit(&mut self) -> io::Result<Option<i32>> {
			Ok((self.chunks.is_empty() && !self.hang).then_some(self.exit_code))
		}
		fn drain(&mut self) -> Vec<u8> { std::mem::take(&mut self.trailing) }
		fn terminate(&mut self, _grace: Duration) { self.terminated = true; }
	}

	/// Output side closed but the child never reports an exit status.
	#[derive(Default)]
	struct UnreapedTerminal {
		polls: u32,
	}

	impl PromptTerminal for UnreapedTerminal {
		fn poll_output(&mut self, _slice: Duration) -> io::Result<Chunk> {
			self.polls += 1;
			Ok(Chunk::Closed)
		}
		fn send(&mut self, _bytes: &[u8]) -> io::Result<()> { Ok(()) }
		fn try_exit(&mut self) -> io::Result<Option<i32>> { Ok(None) }
		fn drain(&mut self) -> Vec<u8> { Vec::new() }
		fn terminate(&mut self, _grace: Duration) {}
	}

	fn cred(max: u32) -> RemoteCredential { RemoteCredential::new(Secret::new("s3cret"), max) }

	#[test]
	fn prompt_patterns() {
		assert!(is_prompt(b"ubuntu@kria's password: "));
		assert!(is_prompt(b"[sudo] password for ubuntu:"));
		assert!(is_prompt(b"Enter passphrase for key '/home/u/.ssh/id_ed25519':"));
		assert!(is_prompt(b"PASSWORD:"));
		assert!(!is_prompt(b"password\nchanged: ok"));
		assert!(!is_prompt(b"Welcome to Ubuntu"));
	}

	#[test]
	fn answers_each_prompt_and_redacts_echo() {
		let mut term = ScriptedTerminal::new(["ubuntu@kria's password: ", "s3cret\r\n", "[sudo] password for ubuntu: ", "Inference time: 10.0 ms\n"]);
		term.trailing = b"done\n".to_vec();
		let out = drive(&mut term, &cred(10), Duration::from_secs(5), &CancelFlag::new());
		assert_eq!(out.exit_code, 0);
		assert_eq!(out.error, None);
		assert_eq!(term.sent, vec![b"s3cret\n".to_vec(), b"s3cret\n".to_vec()]);
		assert!(!out.output.contains("s3cret"));
		assert!(out.output.contains("<redacted>"));
		assert!(out.output.ends_with("done\n"));
	}

	#[test]
	fn stops_answering_at_max_prompts() {
		let prompts = vec!["Password: "; 5];
		let mut term = ScriptedTerminal::new(prompts);
		term.exit_code = 255;
		let out = drive(&mut term, &cred(3), Duration::from_secs(5), &CancelFlag::new());
		assert_eq!(term.sent.len(), 3);
		assert_eq!(out.exit_code, 255);
	}

	#[test]
	fn prompt_split_across_chunks() {
		let mut term = ScriptedTerminal::new(["ubuntu@kria's pass", "word: "]);
		drive(&mut term, &cred(10), Duration::from_secs(5), &CancelFlag::new());
		assert_eq!(term.sent.len(), 1);
	}

	#[test]
	fn timeout_terminates_and_keeps_output() {
		let mut term = ScriptedTerminal::new(["partial output s3cret\n"]);
		term.hang = true;
		let out = drive(&mut term, &cred(10), Duration::ZERO, &CancelFlag::new());
		assert!(term.terminated);
		assert_eq!(out.exit_code, EXIT_INTERNAL);
		assert_eq!(out.error.as_deref(), Some(TIMED_OUT));
		assert!(out.timed_out());
	}

	#[test]
	fn interrupt_reports_130() {
		let mut term = ScriptedTerminal::new([]);
		term.hang = true;
		let cancel = CancelFlag::new();
		cancel.cancel();
		let out = drive(&mut term, &cred(10), Duration::from_secs(60), &cancel);
		assert!(term.terminated);
		assert_eq!(out.exit_code, EXIT_INTERRUPTED);
		assert!(out.interrupted());
	}

	#[test]
	fn closed_output_waits_between_polls() {
		let mut term = UnreapedTerminal::default();
		let out = drive(&mut term, &cred(10), Duration::from_millis(500), &CancelFlag::new());
		assert!(out.timed_out());
		assert!(term.polls <= 5, "polled {} times", term.polls);
	}
}
