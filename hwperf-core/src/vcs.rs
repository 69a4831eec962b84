use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

/// Source-control identity stamped into every bundle.
///
/// Each field is independently optional: outside a repository, or without a `git`
/// binary, the bundle is still written with nulls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitIdentity {
	pub commit: Option<String>,
	pub branch: Option<String>,
	pub dirty: Option<bool>,
}

/// Length of the abbreviated commit hash.
pub const COMMIT_LEN: usize = 12;

impl GitIdentity {
	pub fn discover(dir: &Path) -> Self {
		let commit = git(dir, &["rev-parse", "HEAD"]).map(|s| s.chars().take(COMMIT_LEN).collect());
		let branch = git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]);
		let dirty = git_raw(dir, &["status", "--porcelain"]).map(|s| !s.trim().is_empty());
		tracing::debug!(?commit, ?branch, ?dirty, "git identity");
		Self { commit, branch, dirty }
	}

	/// `abcdef123456*` when dirty, `-` when unknown.
	pub fn short(&self) -> String {
		match &self.commit {
			Some(c) if self.dirty == Some(true) => format!("{c}*"),
			Some(c) => c.clone(),
			None => "-".into(),
		}
	}
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
	git_raw(dir, args).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn git_raw(dir: &Path, args: &[&str]) -> Option<String> {
	let out = Command::new("git").args(args).current_dir(dir).output().ok()?;
	out.status.success().then(|| String::from_utf8_lossy(&out.stdout).into_owned())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_form_marks_dirty() {
		let id = GitIdentity { commit: Some("0123456789ab".into()), branch: Some("main".into()), dirty: Some(true) };
		assert_eq!(id.short(), "0123456789ab*");
		assert_eq!(GitIdentity::default().short(), "-");
	}

	#[test]
	fn outside_a_repository_is_all_none_or_consistent() {
		let dir = tempfile::tempdir().unwrap();
		let id = GitIdentity::discover(dir.path());
		if let Some(c) = &id.commit { assert!(c.len() <= COMMIT_LEN); }
	}
}
