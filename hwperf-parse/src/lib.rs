//! Extractors for vendor performance artifacts.
//!
//! Every public entry point returns a [`hwperf_core::Record`]: a missing file, an unknown
//! layout or a malformed document is a soft miss with a reason, never an `Err`.

pub mod devlog;
pub mod hls;
pub mod strategy;
pub mod vivado;

pub use devlog::{extract_device_log, parse_device_log};
pub use hls::{aggregate_hls_dir, extract_hls_report, parse_hls_xml};
pub use vivado::{aggregate_vivado_dir, extract_power, extract_timing, extract_utilization};

use std::path::{Path, PathBuf};

/// Read a report as text, replacing invalid UTF-8.
pub(crate) fn read_report(path: &Path) -> Result<String, String> {
	match std::fs::read(path) {
		Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(format!("file not found: {}", path.display())),
		Err(e) => Err(format!("read error: {e}")),
	}
}

/// Files in `dir` matching `pattern`, sorted by path.
pub(crate) fn sorted_glob(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, String> {
	let base = glob::Pattern::escape(&dir.to_string_lossy());
	let full = Path::new(&base).join(pattern);
	let paths = glob::glob(&full.to_string_lossy()).map_err(|e| format!("bad glob pattern {pattern}: {e}"))?;
	let mut out: Vec<PathBuf> = paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect();
	out.sort();
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn glob_escapes_directory_metacharacters() {
		let root = tempfile::tempdir().unwrap();
		let dir = root.path().join("run[1]");
		std::fs::create_dir(&dir).unwrap();
		std::fs::write(dir.join("b_timing.rpt"), "").unwrap();
		std::fs::write(dir.join("a_timing.rpt"), "").unwrap();
		let found = sorted_glob(&dir, "*timing*.rpt").unwrap();
		assert_eq!(found, vec![dir.join("a_timing.rpt"), dir.join("b_timing.rpt")]);
	}

	#[test]
	fn lossy_read() {
		let root = tempfile::tempdir().unwrap();
		let p = root.path().join("x.rpt");
		std::fs::write(&p, b"WNS \xff ok").unwrap();
		assert_eq!(read_report(&p).unwrap(), "WNS \u{fffd} ok");
		assert!(read_report(&root.path().join("nope")).unwrap_err().starts_with("file not found"));
	}
}
