//! Vivado post-implementation reports: per-file extractors and the directory aggregator.

pub mod power;
pub mod timing;
pub mod utilization;

pub use power::parse_power;
pub use timing::parse_timing;
pub use utilization::parse_utilization;

use crate::{read_report, sorted_glob};
use hwperf_core::{mhz_from_ns, ExtractProfile, Record, VivadoPower, VivadoRun, VivadoSummary, VivadoTiming, VivadoUtilization};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TIMING_GLOBS: [&str; 4] = ["*timing_summary*_routed.rpt", "*timing_summary*.rpt", "*timing*_routed.rpt", "*timing*.rpt"];
pub const UTILIZATION_GLOBS: [&str; 3] = ["*utilization*_routed.rpt", "*utilization*_placed.rpt", "*utilization*.rpt"];
pub const UTILIZATION_EXCLUDE: [&str; 1] = ["clock_utilization"];
pub const POWER_GLOBS: [&str; 2] = ["*power*_routed.rpt", "*power*.rpt"];

pub fn extract_timing(path: &Path, profile: &ExtractProfile) -> Record<VivadoTiming> {
	extract(path, profile, parse_timing, VivadoTiming::has_any, "no timing figures found")
}

pub fn extract_utilization(path: &Path, profile: &ExtractProfile) -> Record<VivadoUtilization> {
	extract(path, profile, parse_utilization, VivadoUtilization::has_any, "no utilization rows found")
}

pub fn extract_power(path: &Path, profile: &ExtractProfile) -> Record<VivadoPower> {
	extract(path, profile, parse_power, VivadoPower::has_any, "no power figures found")
}

fn extract<P: Default>(
	path: &Path,
	profile: &ExtractProfile,
	parse: fn(&str, &ExtractProfile) -> P,
	has_any: fn(&P) -> bool,
	empty_reason: &str,
) -> Record<P> {
	let text = match read_report(path) {
		Ok(t) => t,
		Err(reason) => return Record::missing(path, reason),
	};
	let payload = parse(&text, profile);
	if has_any(&payload) {
		Record::new(path, true, payload)
	} else {
		warn!(file = %path.display(), reason = empty_reason, "report recovered nothing");
		Record::new(path, false, payload).with_error(empty_reason)
	}
}

/// First match of the ordered glob list; within one pattern, the first by name.
pub fn pick_first(dir: &Path, globs: &[&str], exclude: &[&str]) -> Option<PathBuf> {
	globs.iter().find_map(|pattern| {
		let files = sorted_glob(dir, pattern).ok()?;
		files.into_iter().find(|p| {
			let name = p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
			!exclude.iter().any(|x| name.contains(x))
		})
	})
}

/// Aggregate one implementation report directory.
///
/// Each category is optional; the record is `parsed` when any of them parsed.
pub fn aggregate_vivado_dir(dir: &Path, profile: &ExtractProfile) -> Record<VivadoRun> {
	if !dir.is_dir() {
		warn!(dir = %dir.display(), "Vivado report directory not found");
		return Record::missing(dir, "directory not found");
	}
	let timing = pick_first(dir, &TIMING_GLOBS, &[]).map(|p| extract_timing(&p, profile));
	let utilization = pick_first(dir, &UTILIZATION_GLOBS, &UTILIZATION_EXCLUDE).map(|p| extract_utilization(&p, profile));
	let power = pick_first(dir, &POWER_GLOBS, &[]).map(|p| extract_power(&p, profile));
	debug!(
		timing = ?timing.as_ref().map(|r| &r.source_path),
		utilization = ?utilization.as_ref().map(|r| &r.source_path),
		power = ?power.as_ref().map(|r| &r.source_path),
		"Vivado reports chosen"
	);

	let summary = summarize(timing.as_ref(), utilization.as_ref(), power.as_ref());
	let parsed = summary.timing.is_some() || summary.utilization.is_some() || summary.power.is_some();
	let rec = Record::new(dir, parsed, VivadoRun { timing, utilization, power, summary });
	if parsed { rec } else { rec.with_error("no parsable Vivado reports found") }
}

fn summarize(
	timing: Option<&Record<VivadoTiming>>,
	utilization: Option<&Record<VivadoUtilization>>,
	power: Option<&Record<VivadoPower>>,
) -> VivadoSummary {
	let timing = timing.and_then(Record::parsed_payload).cloned();
	let fmax_est_mhz = timing.as_ref().and_then(fmax_est_mhz);
	VivadoSummary {
		timing,
		utilization: utilization.and_then(Record::parsed_payload).cloned(),
		power: power.and_then(Record::parsed_payload).cloned(),
		fmax_est_mhz,
	}
}

/// `1000 / (period - WNS)`, when the achievable period is positive.
pub fn fmax_est_mhz(t: &VivadoTiming) -> Option<f64> {
	let period = t.target_clock_ns? - t.wns_ns?;
	mhz_from_ns(period)
}
