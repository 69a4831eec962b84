//! Interface for build/deploy pipeline stages.
//!
//! A stage turns a TOML config table into shell commands; [`run_stage`] prints each one and
//! runs it through `bash -lc` unless this is a dry run.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// One command with the shell environment it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCommand {
	pub program: String,
	pub args: Vec<String>,
	pub cwd: Option<PathBuf>,
	/// Ordered `KEY=value` prefix.
	pub env: Vec<(String, String)>,
	/// Scripts sourced before the command runs (vendor settings files).
	pub source_scripts: Vec<String>,
}

impl StageCommand {
	pub fn new(program: impl Into<String>) -> Self { Self { program: program.into(), ..Self::default() } }

	pub fn arg(mut self, a: impl Into<String>) -> Self { self.args.push(a.into()); self }

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self { self.cwd = Some(dir.into()); self }

	pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.push((key.into(), value.into()));
		self
	}

	pub fn source(mut self, script: impl Into<String>) -> Self { self.source_scripts.push(script.into()); self }

	/// Program and arguments, each shell-quoted.
	pub fn command_line(&self) -> String {
		std::iter::once(self.program.as_str())
			.chain(self.args.iter().map(String::as_str))
			.map(shell_quote)
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Script passed to `bash -lc`. No `set -u`: vendor settings scripts are not nounset clean.
	pub fn script(&self) -> Result<String> {
		let mut lines = vec!["set -e".to_string(), "set -o pipefail".to_string()];
		for s in self.source_scripts.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
			lines.push(format!("source {}", shell_quote(s)));
		}
		if let Some(dir) = &self.cwd {
			lines.push(format!("cd {}", shell_quote(&dir.to_string_lossy())));
		}
		let mut prefix = Vec::with_capacity(self.env.len());
		for (k, v) in &self.env {
			if !crate::config::is_env_key(k) {
				return Err(Error::config(format!("invalid environment variable name: {k}")));
			}
			prefix.push(format!("{k}={}", shell_quote(v)));
		}
		let line = format!("{} {}", prefix.join(" "), self.command_line());
		lines.push(line.trim().to_string());
		Ok(lines.join("\n"))
	}

	/// What gets echoed as `$ ...`: the bare command when no shell setup is needed.
	pub fn printable(&self) -> Result<String> {
		if self.source_scripts.is_empty() && self.env.is_empty() && self.cwd.is_none() {
			Ok(self.command_line())
		} else {
			Ok(format!("bash -lc {}", shell_quote(&self.script()?)))
		}
	}
}

/// POSIX single-quote escaping; safe words are left bare.
pub fn shell_quote(s: &str) -> String {
	if s.is_empty() {
		return "''".into();
	}
	let safe = s.chars().all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
	if safe { s.to_string() } else { format!("'{}'", s.replace('\'', r#"'"'"'"#)) }
}

pub trait Stage {
	fn name(&self) -> &str;
	fn plan(&self, cfg: &toml::Table) -> Result<Vec<StageCommand>>;
}

/// Echo each planned command to `out`; execute only when `dry_run` is false.
pub fn run_stage(stage: &dyn Stage, cfg: &toml::Table, dry_run: bool, out: &mut dyn Write) -> Result<()> {
	let plan = stage.plan(cfg)?;
	tracing::info!(stage = stage.name(), commands = plan.len(), dry_run, "running stage");
	for cmd in &plan {
		writeln!(out, "$ {}", cmd.printable()?)?;
		out.flush()?;
		if dry_run { continue; }
		let status = Command::new("bash").arg("-lc").arg(cmd.script()?).status()?;
		if !status.success() {
			return Err(Error::stage(stage.name(), format!("`{}` exited with {status}", cmd.command_line())));
		}
	}
	Ok(())
}

/// Sub-table at `key`; absent means empty, any other type is a configuration error.
pub fn table_at<'a>(cfg: &'a toml::Table, key: &str) -> Result<std::borrow::Cow<'a, toml::Table>> {
	match cfg.get(key) {
		None => Ok(std::borrow::Cow::Owned(toml::Table::new())),
		Some(toml::Value::Table(t)) => Ok(std::borrow::Cow::Borrowed(t)),
		Some(_) => Err(Error::config(format!("config '{key}' must be a table"))),
	}
}

/// Array at `key`; absent means empty.
pub fn list_at<'a>(cfg: &'a toml::Table, key: &str) -> Result<&'a [toml::Value]> {
	match cfg.get(key) {
		None => Ok(&[]),
		Some(toml::Value::Array(a)) => Ok(a.as_slice()),
		Some(_) => Err(Error::config(format!("config '{key}' must be a list"))),
	}
}

/// Lenient boolean: bools, numbers, and the usual yes/no spellings. Anything else is `default`.
pub fn bool_at(cfg: &toml::Table, key: &str, default: bool) -> bool {
	match cfg.get(key) {
		Some(toml::Value::Boolean(b)) => *b,
		Some(toml::Value::Integer(i)) => *i != 0,
		Some(toml::Value::Float(f)) => *f != 0.0,
		Some(toml::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
			"1" | "true" | "yes" | "y" | "on" => true,
			"0" | "false" | "no" | "n" | "off" => false,
			_ => default,
		},
		_ => default,
	}
}
