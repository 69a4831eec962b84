// Test harness for hwperf end-to-end tests
//
// Copies the checked-in vendor reports into a temporary directory and hands out the
// per-tool source directories plus a reports root for bundles.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;

pub type TestResult<T = ()> = Result<T>;

/// `tests/fixtures` in the source tree.
pub fn fixture_dir() -> PathBuf { PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures") }

/// Debug logs when `RUST_LOG` is set; repeated calls are harmless.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// Scratch copy of the fixtures. Removed on drop.
pub struct FixtureWorkspace {
	root: TempDir,
}

impl FixtureWorkspace {
	pub fn new() -> TestResult<Self> {
		init_tracing();
		let root = tempfile::tempdir().context("creating scratch dir")?;
		copy_tree(&fixture_dir(), &root.path().join("inputs"))?;
		debug!(root = %root.path().display(), "fixture workspace ready");
		Ok(Self { root })
	}

	pub fn path(&self) -> &Path { self.root.path() }
	pub fn hls_dir(&self) -> PathBuf { self.root.path().join("inputs/hls") }
	pub fn vivado_dir(&self) -> PathBuf { self.root.path().join("inputs/vivado") }
	pub fn device_log(&self) -> PathBuf { self.root.path().join("inputs/kv260/run.log") }
	pub fn reports_dir(&self) -> PathBuf { self.root.path().join("reports") }

	/// Overwrite (or create) an input file relative to `inputs/`.
	pub fn write_input(&self, rel: &str, contents: &str) -> TestResult<PathBuf> {
		let path = self.root.path().join("inputs").join(rel);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
		Ok(path)
	}
}

fn copy_tree(src: &Path, dst: &Path) -> TestResult {
	fs::create_dir_all(dst)?;
	for entry in fs::read_dir(src).with_context(|| format!("reading {}", src.display()))? {
		let entry = entry?;
		let to = dst.join(entry.file_name());
		if entry.file_type()?.is_dir() {
			copy_tree(&entry.path(), &to)?;
		} else {
			fs::copy(entry.path(), &to)?;
		}
	}
	Ok(())
}
