use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

/// Default config file name, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hwperf.toml";
/// Default report root.
pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// Whole-tool configuration. Built once at startup and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
	pub reports_dir: PathBuf,
	pub hls_report_dir: PathBuf,
	pub vivado_report_dir: PathBuf,
	pub extract: ExtractProfile,
	pub remote: RemoteConfig,
}

impl Default for ReportConfig {
	fn default() -> Self {
		Self {
			reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
			hls_report_dir: PathBuf::from("yolo2_int16/solution1/syn/report"),
			vivado_report_dir: PathBuf::new(),
			extract: ExtractProfile::default(),
			remote: RemoteConfig::default(),
		}
	}
}

/// Design-specific names the extractors key on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractProfile {
	/// Preferred top-level HLS report file name.
	pub hls_top_report: String,
	/// Clock picked from the Vivado clock summary when present.
	pub preferred_clock: String,
	/// Hierarchy cell whose standalone power is reported.
	pub accelerator_ip: String,
}

impl Default for ExtractProfile {
	fn default() -> Self {
		Self {
			hls_top_report: "YOLO2_FPGA_csynth.xml".into(),
			preferred_clock: "clk_pl_0".into(),
			accelerator_ip: "YOLO2_FPGA_0".into(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
	/// `user@host` as passed to ssh.
	pub host: String,
	pub port: u16,
	pub identity_file: String,
	/// Remote command; `{label}` expands to the run label.
	pub command_template: String,
	pub force_tty: bool,
	/// Environment variable holding the login secret (empty = key-based auth).
	pub password_env: String,
	#[serde(with = "humantime_serde")]
	pub timeout: Duration,
	pub max_prompts: u32,
}

impl Default for RemoteConfig {
	fn default() -> Self {
		Self {
			host: "ubuntu@kria".into(),
			port: 22,
			identity_file: String::new(),
			command_template: "./linux_app/start_yolo.sh -v 1 -i /home/ubuntu/test_images/dog.jpg --max-frames 10".into(),
			force_tty: true,
			password_env: String::new(),
			timeout: Duration::from_secs(300),
			max_prompts: 10,
		}
	}
}

impl RemoteConfig {
	pub fn render_command(&self, label: &str) -> String { self.command_template.replace("{label}", label) }

	pub fn password_env(&self) -> Option<&str> {
		let v = self.password_env.trim();
		(!v.is_empty()).then_some(v)
	}
}

impl ReportConfig {
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let data = fs::read_to_string(path.as_ref())?;
		let cfg: Self = toml::from_str(&data)?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// Missing file means defaults; an unreadable or malformed one is an error.
	pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
		if path.as_ref().exists() {
			Self::load_from_file(path)
		} else {
			tracing::debug!(path = %path.as_ref().display(), "config file absent, using defaults");
			Ok(Self::default())
		}
	}

	/// Apply `HWPERF_*` overrides and re-validate.
	pub fn apply_env(mut self) -> Result<Self> {
		if let Ok(v) = std::env::var("HWPERF_REPORTS_DIR") { if !v.trim().is_empty() { self.reports_dir = PathBuf::from(v.trim()); } }
		if let Ok(v) = std::env::var("HWPERF_REMOTE_HOST") { if !v.trim().is_empty() { self.remote.host = v.trim().to_string(); } }
		if let Ok(v) = std::env::var("HWPERF_REMOTE_TIMEOUT") {
			let t = humantime::parse_duration(v.trim())
				.map_err(|e| Error::config(format!("invalid HWPERF_REMOTE_TIMEOUT {v:?}: {e}")))?;
			self.remote.timeout = t;
		}
		self.validate()?;
		Ok(self)
	}

	pub fn validate(&self) -> Result<()> {
		if self.reports_dir.as_os_str().is_empty() {
			return Err(Error::config("reports_dir must not be empty"));
		}
		let r = &self.remote;
		if r.host.trim().is_empty() { return Err(Error::config("remote.host must not be empty")); }
		if r.port == 0 { return Err(Error::config("remote.port must be non-zero")); }
		if r.timeout.is_zero() { return Err(Error::config("remote.timeout must be positive")); }
		if r.max_prompts == 0 { return Err(Error::config("remote.max_prompts must be at least 1")); }
		if let Some(name) = r.password_env() {
			if !is_env_key(name) {
				return Err(Error::config(format!("remote.password_env is not a valid variable name: {name}")));
			}
		}
		Ok(())
	}

	pub fn hls_dir(&self) -> Option<&Path> { non_empty(&self.hls_report_dir) }
	pub fn vivado_dir(&self) -> Option<&Path> { non_empty(&self.vivado_report_dir) }

	/// Write the commented template. Refuses to clobber unless `force`.
	pub fn write_template(path: impl AsRef<Path>, force: bool) -> Result<()> {
		let path = path.as_ref();
		if path.exists() && !force {
			return Err(Error::config(format!("refusing to overwrite existing file: {} (use --force)", path.display())));
		}
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; }
		}
		fs::write(path, TEMPLATE_HWPERF_TOML)?;
		Ok(())
	}
}

fn non_empty(p: &Path) -> Option<&Path> { (!p.as_os_str().is_empty()).then_some(p) }

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_env_key(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
		_ => false,
	}
}

pub const TEMPLATE_HWPERF_TOML: &str = r#"# hwperf configuration (template)

# Where report bundles are written
reports_dir = "reports"

# Default report locations (override with --hls-report-dir / --vivado-report-dir)
hls_report_dir = "yolo2_int16/solution1/syn/report"
vivado_report_dir = ""

# Names the extractors look for in vendor reports
[extract]
hls_top_report = "YOLO2_FPGA_csynth.xml"
preferred_clock = "clk_pl_0"
accelerator_ip = "YOLO2_FPGA_0"

# Board session used by `run --kv260-ssh`
[remote]
host = "ubuntu@kria"
port = 22
identity_file = ""
# {label} expands to the run label
command_template = "./linux_app/start_yolo.sh -v 1 -i /home/ubuntu/test_images/dog.jpg --max-frames 10"
# Needed for commands that use sudo and prompt for a password
force_tty = true
# Name of an environment variable holding the SSH password (empty = key-based auth)
password_env = ""
timeout = "5m"
max_prompts = 10
"#;
