//! Unix pseudo-terminal backend.
//!
//! The child gets the PTY slave as stdio and as its controlling terminal, so `ssh` and
//! `sudo` prompt on it instead of on our real `/dev/tty`.

#![allow(unsafe_code)]

use crate::output::exit_code;
use crate::prompt::{Chunk, PromptTerminal};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::pty::openpty;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{setsid, Pid};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 4096;

pub struct PtyProcess {
	child: Child,
	master: File,
	reaped: bool,
}

impl PtyProcess {
	/// Spawn `argv` on a fresh PTY pair. The parent keeps only the master side.
	pub fn spawn(argv: &[String]) -> io::Result<Self> {
		let (program, args) = argv.split_first().ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
		let pty = openpty(None, None).map_err(io::Error::from)?;
		let mut cmd = Command::new(program);
		cmd.args(args)
			.stdin(Stdio::from(pty.slave.try_clone()?))
			.stdout(Stdio::from(pty.slave.try_clone()?))
			.stderr(Stdio::from(pty.slave));
		// SAFETY: only async-signal-safe calls (setsid, ioctl) run between fork and exec.
		unsafe {
			cmd.pre_exec(|| {
				setsid().map_err(io::Error::from)?;
				// Best effort: failure leaves the child without a controlling terminal.
				libc::ioctl(0, libc::TIOCSCTTY as _, 0);
				Ok(())
			});
		}
		let child = cmd.spawn()?;
		// Drops the parent's slave descriptors so EOF/EIO is seen once the child exits.
		drop(cmd);
		Ok(Self { child, master: File::from(pty.master), reaped: false })
	}

	fn ready(&self, slice: Duration) -> io::Result<Option<PollFlags>> {
		let ms = i32::try_from(slice.as_millis()).unwrap_or(i32::MAX);
		let mut fds = [PollFd::new(&self.master, PollFlags::POLLIN)];
		match poll(&mut fds, ms) {
			Ok(0) | Err(Errno::EINTR) => Ok(None),
			Ok(_) => Ok(fds[0].revents()),
			Err(e) => Err(io::Error::from(e)),
		}
	}

	fn pid(&self) -> Option<Pid> { i32::try_from(self.child.id()).ok().map(Pid::from_raw) }
}

impl PromptTerminal for PtyProcess {
	fn poll_output(&mut self, slice: Duration) -> io::Result<Chunk> {
		let Some(flags) = self.ready(slice)? else { return Ok(Chunk::Idle) };
		if !flags.intersects(PollFlags::POLLIN) {
			return Ok(if flags.intersects(PollFlags::POLLHUP | PollFlags::POLLERR) { Chunk::Closed } else { Chunk::Idle });
		}
		let mut buf = [0u8; READ_CHUNK];
		match self.master.read(&mut buf) {
			Ok(0) => Ok(Chunk::Closed),
			Ok(n) => Ok(Chunk::Data(buf[..n].to_vec())),
			// Linux reports EIO on the master once every slave descriptor is closed.
			Err(e) if e.raw_os_error() == Some(libc::EIO) => Ok(Chunk::Closed),
			Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Chunk::Idle),
			Err(e) => Err(e),
		}
	}

	fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
		self.master.write_all(bytes)?;
		self.master.flush()
	}

	fn try_exit(&mut self) -> io::Result<Option<i32>> {
		let status = self.child.try_wait()?;
		if status.is_some() { self.reaped = true; }
		Ok(status.map(exit_code))
	}

	fn drain(&mut self) -> Vec<u8> {
		let mut out = Vec::new();
		while let Ok(Chunk::Data(d)) = self.poll_output(Duration::ZERO) {
			out.extend_from_slice(&d);
		}
		out
	}

	fn terminate(&mut self, grace: Duration) {
		if self.reaped { return; }
		if let Some(pid) = self.pid() {
			let _ = kill(pid, Signal::SIGTERM);
		}
		let deadline = Instant::now() + grace;
		while Instant::now() < deadline {
			if let Ok(Some(_)) = self.child.try_wait() {
				self.reaped = true;
				return;
			}
			std::thread::sleep(Duration::from_millis(50));
		}
		let _ = self.child.kill();
		let _ = self.child.wait();
		self.reaped = true;
	}
}

impl Drop for PtyProcess {
	fn drop(&mut self) {
		if !self.reaped {
			let _ = self.child.kill();
			let _ = self.child.wait();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::prompt::drive;
	use crate::CancelFlag;
	use hwperf_core::{RemoteCredential, Secret};

	fn sh(script: &str) -> Vec<String> { vec!["/bin/sh".into(), "-c".into(), script.into()] }

	#[test]
	fn answers_a_real_prompt() {
		let argv = sh("printf 'Password: '; read pw; echo \"got:$pw\"; exit 3");
		let Ok(mut pty) = PtyProcess::spawn(&argv) else { return };
		let cred = RemoteCredential::new(Secret::new("letmein"), 10);
		let out = drive(&mut pty, &cred, Duration::from_secs(10), &CancelFlag::new());
		assert_eq!(out.exit_code, 3);
		assert!(out.output.contains("got:<redacted>"));
		assert!(!out.output.contains("letmein"));
	}

	#[test]
	fn timeout_kills_child() {
		let Ok(mut pty) = PtyProcess::spawn(&sh("sleep 30")) else { return };
		let cred = RemoteCredential::new(Secret::new("x"), 1);
		let started = Instant::now();
		let out = drive(&mut pty, &cred, Duration::from_millis(300), &CancelFlag::new());
		assert!(out.timed_out());
		assert!(started.elapsed() < Duration::from_secs(10));
	}

	#[test]
	fn empty_argv_is_rejected() {
		assert!(PtyProcess::spawn(&[]).is_err());
	}
}
