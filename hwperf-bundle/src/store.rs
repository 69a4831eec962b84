//! On-disk bundle layout.
//!
//! ```text
//! reports/2025-01-31_14-02-11_int16-baseline/
//!   meta.json  metrics.json  summary.md
//!   hls/  vivado/  kv260/
//! ```
//!
//! Bundles are written once. Name collisions get a `-2`, `-3`, ... suffix and an existing
//! directory is never reused.

use crate::summary::render_summary;
use chrono::{DateTime, Local};
use hwperf_core::{BundleMetrics, Error, GitIdentity, MetricRecord, Result, ToolKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const META_FILE: &str = "meta.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const SUMMARY_FILE: &str = "summary.md";
pub const SCHEMA_VERSION: u32 = 1;

const NAME_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MAX_SUFFIX: u32 = 1000;

#[allow(clippy::expect_used)]
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-]").expect("label pattern compiles"));

/// Every character that is not a word character or `-` becomes `_`.
pub fn sanitize_label(label: &str) -> String { NON_WORD.replace_all(label, "_").into_owned() }

/// `{%Y-%m-%d_%H-%M-%S}_{sanitized label}`
pub fn bundle_name(label: &str, at: &DateTime<Local>) -> String {
	format!("{}_{}", at.format(NAME_TIME_FORMAT), sanitize_label(label))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleMeta {
	pub schema_version: u32,
	pub tool_version: String,
	pub timestamp: DateTime<Local>,
	pub label: String,
	#[serde(default)]
	pub note: String,
	#[serde(default)]
	pub git: GitIdentity,
	/// Where each input came from, keyed by CLI option name.
	#[serde(default)]
	pub input_paths: BTreeMap<String, String>,
}

impl BundleMeta {
	pub fn new(label: impl Into<String>, note: impl Into<String>, timestamp: DateTime<Local>, git: GitIdentity) -> Self {
		Self {
			schema_version: SCHEMA_VERSION,
			tool_version: env!("CARGO_PKG_VERSION").to_string(),
			timestamp,
			label: label.into(),
			note: note.into(),
			git,
			input_paths: BTreeMap::new(),
		}
	}

	pub fn with_input(mut self, key: &str, value: impl Into<String>) -> Self {
		self.input_paths.insert(key.to_string(), value.into());
		self
	}
}

/// A persisted bundle, read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
	pub name: String,
	pub path: PathBuf,
	pub meta: BundleMeta,
	pub metrics: BundleMetrics,
}

impl Bundle {
	/// `meta.json` is required; a missing `metrics.json` reads as empty metrics.
	pub fn load(path: &Path) -> Result<Self> {
		let meta_path = path.join(META_FILE);
		if !meta_path.is_file() {
			return Err(Error::bundle(format!("not a report bundle (no {META_FILE}): {}", path.display())));
		}
		let meta: BundleMeta = serde_json::from_slice(&fs::read(&meta_path)?)?;
		let metrics_path = path.join(METRICS_FILE);
		let metrics = if metrics_path.is_file() {
			serde_json::from_slice(&fs::read(&metrics_path)?)?
		} else {
			BundleMetrics::default()
		};
		let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
		Ok(Self { name, path: path.to_path_buf(), meta, metrics })
	}
}

/// Root directory holding every bundle.
#[derive(Debug, Clone)]
pub struct BundleStore {
	root: PathBuf,
}

impl BundleStore {
	pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

	pub fn root(&self) -> &Path { &self.root }

	/// Create the bundle directory and its artifact folders.
	pub fn create(&self, label: &str, at: DateTime<Local>) -> Result<BundleWriter> {
		fs::create_dir_all(&self.root)?;
		let base = bundle_name(label, &at);
		for n in 1..=MAX_SUFFIX {
			let name = if n == 1 { base.clone() } else { format!("{base}-{n}") };
			let path = self.root.join(&name);
			match fs::create_dir(&path) {
				Ok(()) => {
					for tool in [ToolKind::Hls, ToolKind::Vivado, ToolKind::Kv260Log] {
						fs::create_dir(path.join(tool.name()))?;
					}
					info!(bundle = %path.display(), "bundle created");
					return Ok(BundleWriter { name, path });
				}
				Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
					debug!(name, "bundle name taken");
				}
				Err(e) => return Err(e.into()),
			}
		}
		Err(Error::bundle(format!("could not allocate a bundle name for {base}")))
	}

	/// Bundles with a readable meta file, newest first by name.
	pub fn list(&self) -> Result<Vec<Bundle>> {
		if !self.root.is_dir() {
			return Err(Error::bundle(format!("reports directory not found: {}", self.root.display())));
		}
		let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)?
			.filter_map(|e| e.ok().map(|e| e.path()))
			.filter(|p| p.is_dir() && p.join(META_FILE).is_file())
			.collect();
		dirs.sort();
		dirs.reverse();
		Ok(dirs
			.iter()
			.filter_map(|d| match Bundle::load(d) {
				Ok(b) => Some(b),
				Err(e) => {
					warn!(bundle = %d.display(), error = %e, "skipping unreadable bundle");
					None
				}
			})
			.collect())
	}

	/// A path as given when it exists, else a bundle name under the root.
	pub fn resolve(&self, name_or_path: &str) -> PathBuf {
		let p = PathBuf::from(name_or_path);
		if p.is_dir() { p } else { self.root.join(name_or_path) }
	}

	pub fn load(&self, name_or_path: &str) -> Result<Bundle> { Bundle::load(&self.resolve(name_or_path)) }
}

/// Handle to a bundle being written.
#[derive(Debug)]
pub struct BundleWriter {
	name: String,
	path: PathBuf,
}

impl BundleWriter {
	pub fn name(&self) -> &str { &self.name }
	pub fn path(&self) -> &Path { &self.path }

	pub fn artifact_dir(&self, tool: ToolKind) -> PathBuf { self.path.join(tool.name()) }

	/// Copy a raw input into the tool folder under its own file name.
	pub fn copy_artifact(&self, tool: ToolKind, src: &Path) -> Result<PathBuf> {
		let file_name = src.file_name().ok_or_else(|| Error::bundle(format!("not a file: {}", src.display())))?;
		let dest = self.artifact_dir(tool).join(file_name);
		fs::copy(src, &dest)?;
		Ok(dest)
	}

	/// Copy a raw input under a fixed name, e.g. `kv260/stdout.log`.
	pub fn copy_artifact_as(&self, tool: ToolKind, src: &Path, name: &str) -> Result<PathBuf> {
		let dest = self.artifact_dir(tool).join(name);
		fs::copy(src, &dest)?;
		Ok(dest)
	}

	pub fn write_artifact(&self, tool: ToolKind, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
		let dest = self.artifact_dir(tool).join(name);
		fs::write(&dest, contents)?;
		Ok(dest)
	}

	/// `parsed_{tool}.json` with the full tagged record.
	pub fn write_parsed(&self, record: &MetricRecord) -> Result<PathBuf> {
		let tool = record.tool();
		self.write_artifact(tool, &format!("parsed_{}.json", tool.name()), serde_json::to_vec_pretty(record)?)
	}

	/// Write meta, metrics and the summary, in that order.
	pub fn finish(self, meta: BundleMeta, metrics: BundleMetrics) -> Result<Bundle> {
		fs::write(self.path.join(META_FILE), serde_json::to_vec_pretty(&meta)?)?;
		fs::write(self.path.join(METRICS_FILE), serde_json::to_vec_pretty(&metrics)?)?;
		fs::write(self.path.join(SUMMARY_FILE), render_summary(&meta, &metrics))?;
		info!(bundle = %self.path.display(), "bundle written");
		Ok(Bundle { name: self.name, path: self.path, meta, metrics })
	}
}
