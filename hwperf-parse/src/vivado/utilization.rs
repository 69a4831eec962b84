//! `report_utilization` extraction.

use crate::strategy::{compiled, first_hit, number, pipe_cells, Strategy};
use hwperf_core::{ExtractProfile, ResourceUsage, VivadoResource, VivadoUtilization};
use once_cell::sync::Lazy;
use regex::Regex;

/// Site-type rows of the summary tables.
pub const ROW_NAMES: [(&str, VivadoResource); 5] = [
	("CLB LUTs", VivadoResource::Lut),
	("CLB Registers", VivadoResource::Ff),
	("Block RAM Tile", VivadoResource::Bram),
	("DSPs", VivadoResource::Dsp),
	("URAM", VivadoResource::Uram),
];

static LOOSE_ROWS: Lazy<Vec<(VivadoResource, Regex)>> = Lazy::new(|| {
	vec![
		(VivadoResource::Lut, compiled(r"\|\s*CLB LUTs[^|]*\|\s*(\d+)\s*\|[^|]*\|[^|]*\|\s*(\d+)\s*\|")),
		(VivadoResource::Ff, compiled(r"\|\s*CLB Registers[^|]*\|\s*(\d+)\s*\|[^|]*\|[^|]*\|\s*(\d+)\s*\|")),
		(VivadoResource::Bram, compiled(r"\|\s*Block RAM Tile[^|]*\|\s*([\d.]+)\s*\|[^|]*\|[^|]*\|\s*([\d.]+)\s*\|")),
		(VivadoResource::Dsp, compiled(r"\|\s*DSPs[^|]*\|\s*(\d+)\s*\|[^|]*\|[^|]*\|\s*(\d+)\s*\|")),
		(VivadoResource::Uram, compiled(r"\|\s*URAM[^|]*\|\s*([\d.]+)\s*\|[^|]*\|[^|]*\|\s*([\d.]+)\s*\|")),
	]
});
static INTEGER: Lazy<Regex> = Lazy::new(|| compiled(r"\d+"));

pub const UTILIZATION_STRATEGIES: [Strategy<VivadoUtilization, ExtractProfile>; 3] = [
	Strategy::new("site-type-table", site_type_table),
	Strategy::new("loose-row-regex", loose_row_regex),
	Strategy::new("lut-percent-line", lut_percent_line),
];

/// Empty result when no strategy recovers a used count.
pub fn parse_utilization(text: &str, profile: &ExtractProfile) -> VivadoUtilization {
	first_hit(&UTILIZATION_STRATEGIES, text, profile).unwrap_or_default()
}

/// `| Site Type | Used | Fixed | Prohibited | Available | Util% |`
pub fn site_type_table(text: &str, _: &ExtractProfile) -> Option<VivadoUtilization> {
	let mut util = VivadoUtilization::default();
	for cells in text.lines().filter_map(pipe_cells).filter(|c| c.len() >= 5) {
		let Some(&(_, res)) = ROW_NAMES.iter().find(|(name, _)| *name == cells[0]) else { continue };
		let usage = ResourceUsage {
			used: number(cells[1]),
			available: number(cells[4]),
			percent: cells.get(5).and_then(|c| number(c)),
		};
		if usage != ResourceUsage::default() {
			*util.slot_mut(res) = Some(usage);
		}
	}
	util.has_any().then_some(util)
}

/// Whole-document match per resource; tolerates decorated names such as `CLB LUTs*`.
pub fn loose_row_regex(text: &str, _: &ExtractProfile) -> Option<VivadoUtilization> {
	let mut util = VivadoUtilization::default();
	for (res, re) in LOOSE_ROWS.iter() {
		if let Some(c) = re.captures(text) {
			*util.slot_mut(*res) = Some(ResourceUsage { used: number(&c[1]), available: number(&c[2]), percent: None });
		}
	}
	util.has_any().then_some(util)
}

/// Last resort: a line mentioning `LUT` and `%`; its first two integers are used/available.
pub fn lut_percent_line(text: &str, _: &ExtractProfile) -> Option<VivadoUtilization> {
	let mut util = VivadoUtilization::default();
	for line in text.lines().filter(|l| l.contains("LUT") && l.contains('%')) {
		let nums: Vec<f64> = INTEGER.find_iter(line).filter_map(|m| number(m.as_str())).take(2).collect();
		if let [used, available] = nums[..] {
			util.lut = Some(ResourceUsage { used: Some(used), available: Some(available), percent: None });
		}
	}
	util.has_any().then_some(util)
}
