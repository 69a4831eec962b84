//! `report_power` extraction.

use crate::strategy::{capture_f64, compiled, fill, fill_in_order, pipe_cells, FillMissing, Strategy};
use hwperf_core::{ExtractProfile, VivadoPower};
use once_cell::sync::Lazy;
use regex::Regex;

static TOTAL_ROW: Lazy<Regex> = Lazy::new(|| compiled(r"^\|\s*Total On-Chip Power\s*\(W\)\s*\|\s*([^|]+?)\s*\|"));
static DYNAMIC_ROW: Lazy<Regex> = Lazy::new(|| compiled(r"^\|\s*Dynamic\s*\(W\)\s*\|\s*([^|]+?)\s*\|"));
static STATIC_ROW: Lazy<Regex> = Lazy::new(|| compiled(r"^\|\s*Device Static\s*\(W\)\s*\|\s*([^|]+?)\s*\|"));
static TOTAL_LABEL: Lazy<Regex> = Lazy::new(|| compiled(r"Total On-Chip Power[^:]*:\s*([\d.]+)"));
static DYNAMIC_LABEL: Lazy<Regex> = Lazy::new(|| compiled(r"Dynamic[^:]*:\s*([\d.]+)"));
static STATIC_LABEL: Lazy<Regex> = Lazy::new(|| compiled(r"Device Static[^:]*:\s*([\d.]+)"));

/// On-chip power totals.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PowerTotals {
	pub total_w: Option<f64>,
	pub dynamic_w: Option<f64>,
	pub static_w: Option<f64>,
}

impl FillMissing for PowerTotals {
	fn fill_missing(&mut self, o: Self) {
		fill(&mut self.total_w, o.total_w);
		fill(&mut self.dynamic_w, o.dynamic_w);
		fill(&mut self.static_w, o.static_w);
	}
	fn is_complete(&self) -> bool { self.total_w.is_some() && self.dynamic_w.is_some() && self.static_w.is_some() }
}

pub const TOTAL_STRATEGIES: [Strategy<PowerTotals, ExtractProfile>; 2] = [
	Strategy::new("summary-table", summary_table),
	Strategy::new("label-colon", label_colon),
];

pub fn parse_power(text: &str, profile: &ExtractProfile) -> VivadoPower {
	let t = fill_in_order(&TOTAL_STRATEGIES, text, profile);
	VivadoPower {
		total_w: t.total_w,
		dynamic_w: t.dynamic_w,
		static_w: t.static_w,
		ip_name: Some(profile.accelerator_ip.clone()),
		ip_w: hierarchy_ip_power(text, profile),
	}
}

/// Vendor cells such as `< 0.001` or `3.456*`.
pub fn power_cell(value: &str) -> Option<f64> {
	let v = value.trim().trim_start_matches('<').trim_end_matches('*').trim();
	if v.is_empty() { None } else { v.parse().ok() }
}

/// Vivado 2024.x summary rows; the last matching row of each kind wins.
pub fn summary_table(text: &str, _: &ExtractProfile) -> Option<PowerTotals> {
	let mut t = PowerTotals::default();
	for line in text.lines() {
		for (re, slot) in [(&*TOTAL_ROW, &mut t.total_w), (&*DYNAMIC_ROW, &mut t.dynamic_w), (&*STATIC_ROW, &mut t.static_w)] {
			if let Some(c) = re.captures(line) {
				*slot = power_cell(&c[1]);
			}
		}
	}
	(t != PowerTotals::default()).then_some(t)
}

/// Older layout: `Total On-Chip Power (W)  : 3.456`.
pub fn label_colon(text: &str, _: &ExtractProfile) -> Option<PowerTotals> {
	let t = PowerTotals {
		total_w: capture_f64(&TOTAL_LABEL, text),
		dynamic_w: capture_f64(&DYNAMIC_LABEL, text),
		static_w: capture_f64(&STATIC_LABEL, text),
	};
	(t != PowerTotals::default()).then_some(t)
}

/// First two-cell hierarchy row whose name contains the accelerator instance.
pub fn hierarchy_ip_power(text: &str, profile: &ExtractProfile) -> Option<f64> {
	text.lines()
		.filter_map(pipe_cells)
		.find(|c| c.len() == 2 && !c[0].is_empty() && c[0].contains(profile.accelerator_ip.as_str()))
		.and_then(|c| power_cell(c[1]))
}
