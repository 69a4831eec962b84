//! Inference timings mined from free-form device output.

use crate::read_report;
use crate::strategy::{compiled, number};
use hwperf_core::{DeviceLog, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Matches `Inference time: 1234.56 ms` and `Frame 1 (infer 1) inference time: 1234.56 ms`.
static INFERENCE_TIME: Lazy<Regex> = Lazy::new(|| compiled(r"(?i)inference time:\s*([\d.]+)\s*ms"));

/// Every timing line in order, with statistics when at least one was found.
pub fn parse_device_log(text: &str, source: &Path) -> Record<DeviceLog> {
	if text.is_empty() {
		return Record::missing(source, "empty log content");
	}
	let times: Vec<f64> = INFERENCE_TIME.captures_iter(text).filter_map(|c| number(&c[1])).collect();
	if times.is_empty() {
		tracing::warn!(source = %source.display(), "no inference timing lines found");
		return Record::missing(source, "no inference timing lines found");
	}
	tracing::debug!(samples = times.len(), "device log parsed");
	Record::new(source, true, DeviceLog::from_samples(times))
}

pub fn extract_device_log(path: &Path) -> Record<DeviceLog> {
	match read_report(path) {
		Ok(text) => parse_device_log(&text, path),
		Err(reason) => Record::missing(path, reason),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn mixed_case_lines_in_order() {
		let text = "boot ok\nFrame 3 inference time: 42.50 ms\nnoise\nINFERENCE TIME: 57.50 ms\n";
		let rec = parse_device_log(text, Path::new("stdout.log"));
		assert!(rec.parsed);
		assert_eq!(rec.payload.inference_times_ms, vec![42.5, 57.5]);
		let s = rec.payload.stats.unwrap();
		assert_eq!(s.mean_ms, 50.0);
		assert_eq!(s.median_ms, 50.0);
		assert_eq!(s.fps_from_median, 20.0);
	}

	#[test]
	fn empty_and_unmatched_logs() {
		let rec = parse_device_log("", Path::new("x"));
		assert_eq!(rec.error.as_deref(), Some("empty log content"));
		assert!(rec.payload.stats.is_none());
		let rec = parse_device_log("latency 12 ms\n", Path::new("x"));
		assert!(!rec.parsed);
		assert_eq!(rec.error.as_deref(), Some("no inference timing lines found"));
	}

	#[test]
	fn unreadable_file() {
		let rec = extract_device_log(Path::new("/nonexistent/kv260.log"));
		assert!(!rec.parsed);
		assert!(rec.error.unwrap().contains("not found"));
	}

	proptest! {
		#[test]
		fn every_emitted_line_is_recovered(values in proptest::collection::vec(1u32..100_000, 1..40)) {
			let text: String = values.iter().enumerate()
				.map(|(i, v)| format!("[{i}] Inference time: {}.{:02} ms\n", v / 100, v % 100))
				.collect();
			let rec = parse_device_log(&text, Path::new("p"));
			prop_assert_eq!(rec.payload.inference_times_ms.len(), values.len());
			prop_assert_eq!(rec.payload.stats.unwrap().count, values.len());
		}
	}
}
