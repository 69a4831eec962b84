//! Metric-by-metric comparison of two bundles.

use crate::store::Bundle;
use crate::summary::fmt_num;
use hwperf_core::BundleMetrics;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRow {
	pub metric: &'static str,
	pub baseline: f64,
	pub candidate: f64,
	pub delta: f64,
	/// `None` when the baseline is zero.
	pub percent: Option<f64>,
	#[serde(skip)]
	pub precision: usize,
}

impl DeltaRow {
	fn new(metric: &'static str, baseline: f64, candidate: f64, precision: usize) -> Self {
		let delta = candidate - baseline;
		let percent = (baseline != 0.0).then(|| delta / baseline * 100.0);
		Self { metric, baseline, candidate, delta, percent, precision }
	}

	pub fn baseline_text(&self) -> String { fmt_num(Some(self.baseline), self.precision) }
	pub fn candidate_text(&self) -> String { fmt_num(Some(self.candidate), self.precision) }

	/// `+1.50 (+3.0%)`, percent omitted when undefined.
	pub fn delta_text(&self) -> String {
		let p = self.precision;
		match self.percent {
			Some(pct) => format!("{:+.p$} ({pct:+.1}%)", self.delta),
			None => format!("{:+.p$}", self.delta),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
	pub baseline_label: String,
	pub candidate_label: String,
	pub rows: Vec<DeltaRow>,
}

impl Comparison {
	pub fn row(&self, metric: &str) -> Option<&DeltaRow> { self.rows.iter().find(|r| r.metric == metric) }
}

type Getter = fn(&BundleMetrics) -> Option<f64>;

const METRICS: &[(&str, Getter, usize)] = &[
	("FPS (median)", |m| m.kv260_stats().map(|s| s.fps_from_median), 2),
	("ms/infer (median)", |m| m.kv260_stats().map(|s| s.median_ms), 2),
	("HLS DSP", |m| hls_resource(m, "DSP"), 0),
	("HLS LUT", |m| hls_resource(m, "LUT"), 0),
	("HLS FF", |m| hls_resource(m, "FF"), 0),
	("HLS BRAM_18K", |m| hls_resource(m, "BRAM_18K"), 0),
	("HLS Est. Clock (ns)", |m| m.hls_summary().and_then(|h| h.estimated_clock_ns), 3),
	("Vivado WNS (ns)", |m| m.vivado_summary().and_then(|v| v.wns_ns()), 3),
	("Vivado Power (W)", |m| m.vivado_summary().and_then(|v| v.total_power_w()), 3),
];

fn hls_resource(m: &BundleMetrics, name: &str) -> Option<f64> {
	m.hls_summary()?.utilization.get(name).map(|v| v as f64)
}

/// Rows appear only for metrics present in both bundles, in a fixed order.
pub fn compare(baseline: &Bundle, candidate: &Bundle) -> Comparison {
	let rows = METRICS
		.iter()
		.filter_map(|&(metric, get, precision)| {
			let a = get(&baseline.metrics)?;
			let b = get(&candidate.metrics)?;
			Some(DeltaRow::new(metric, a, b, precision))
		})
		.collect();
	Comparison { baseline_label: baseline.meta.label.clone(), candidate_label: candidate.meta.label.clone(), rows }
}

/// Markdown rendering.
impl fmt::Display for Comparison {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "# Comparison: {} vs {}", self.baseline_label, self.candidate_label)?;
		writeln!(f)?;
		if self.rows.is_empty() {
			return writeln!(f, "No comparable metrics found.");
		}
		writeln!(f, "| Metric | {} | {} | Delta |", self.baseline_label, self.candidate_label)?;
		writeln!(f, "|--------|------|------|-------|")?;
		for r in &self.rows {
			writeln!(f, "| {} | {} | {} | {} |", r.metric, r.baseline_text(), r.candidate_text(), r.delta_text())?;
		}
		Ok(())
	}
}
