//! `report_timing_summary` extraction.

use crate::strategy::{capture_f64, compiled, fill, fill_in_order, first_hit, number, FillMissing, Strategy};
use hwperf_core::{mhz_from_ns, ExtractProfile, VivadoTiming};
use once_cell::sync::Lazy;
use regex::Regex;

/// Lines searched after `Design Timing Summary` for the column header.
const HEADER_WINDOW: usize = 80;
/// Lines searched after the header for the first data row.
const ROW_WINDOW: usize = 12;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| compiled(r"^-?\d"));
static CLOCK_SUMMARY: Lazy<Regex> = Lazy::new(|| compiled(r"\bClock Summary\b"));
static CLOCK_ROW: Lazy<Regex> = Lazy::new(|| compiled(r"^\s*(\S+)\s+\{[^}]*\}\s+([\d.]+)\s+([\d.]+)\s*$"));
static REQUIREMENT: Lazy<Regex> = Lazy::new(|| compiled(r"Requirement:\s*([\d.]+)ns"));
static WNS_KV: Lazy<Regex> = Lazy::new(|| compiled(r"WNS\(ns\)\s*:\s*([-\d.]+)"));
static TNS_KV: Lazy<Regex> = Lazy::new(|| compiled(r"TNS\(ns\)\s*:\s*([-\d.]+)"));
static WHS_KV: Lazy<Regex> = Lazy::new(|| compiled(r"WHS\(ns\)\s*:\s*([-\d.]+)"));
static THS_KV: Lazy<Regex> = Lazy::new(|| compiled(r"THS\(ns\)\s*:\s*([-\d.]+)"));

/// Setup and hold slacks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Slacks {
	pub wns_ns: Option<f64>,
	pub tns_ns: Option<f64>,
	pub whs_ns: Option<f64>,
	pub ths_ns: Option<f64>,
}

impl FillMissing for Slacks {
	fn fill_missing(&mut self, o: Self) {
		fill(&mut self.wns_ns, o.wns_ns);
		fill(&mut self.tns_ns, o.tns_ns);
		fill(&mut self.whs_ns, o.whs_ns);
		fill(&mut self.ths_ns, o.ths_ns);
	}
	fn is_complete(&self) -> bool {
		self.wns_ns.is_some() && self.tns_ns.is_some() && self.whs_ns.is_some() && self.ths_ns.is_some()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockPick {
	pub name: Option<String>,
	pub period_ns: Option<f64>,
	pub freq_mhz: Option<f64>,
}

pub const SLACK_STRATEGIES: [Strategy<Slacks, ExtractProfile>; 2] = [
	Strategy::new("design-timing-table", design_timing_table),
	Strategy::new("slack-key-value", slack_key_value),
];

pub const CLOCK_STRATEGIES: [Strategy<ClockPick, ExtractProfile>; 2] = [
	Strategy::new("clock-summary-table", clock_summary_table),
	Strategy::new("requirement-line", requirement_line),
];

pub fn parse_timing(text: &str, profile: &ExtractProfile) -> VivadoTiming {
	let s = fill_in_order(&SLACK_STRATEGIES, text, profile);
	let clock = first_hit(&CLOCK_STRATEGIES, text, profile);
	let (clock_name, target_clock_ns, target_clock_mhz) = match clock {
		Some(c) => (c.name, c.period_ns, c.freq_mhz),
		None => (None, None, None),
	};
	VivadoTiming { wns_ns: s.wns_ns, tns_ns: s.tns_ns, whs_ns: s.whs_ns, ths_ns: s.ths_ns, clock_name, target_clock_ns, target_clock_mhz }
}

/// Vivado 2024.x table: header row of slack columns, then the first numeric data row.
/// Token order is WNS, TNS, TNS failing, TNS total, WHS, THS.
pub fn design_timing_table(text: &str, _: &ExtractProfile) -> Option<Slacks> {
	let lines: Vec<&str> = text.lines().collect();
	for (i, _) in lines.iter().enumerate().filter(|(_, l)| l.contains("Design Timing Summary")) {
		let header = (i..(i + HEADER_WINDOW).min(lines.len())).find(|&j| {
			let l = lines[j];
			l.contains("WNS(ns)") && l.contains("TNS(ns)") && l.contains("WHS(ns)") && l.contains("THS(ns)")
		});
		let Some(header) = header else { continue };
		let row = ((header + 1)..(header + ROW_WINDOW).min(lines.len()))
			.map(|k| lines[k].split_whitespace().collect::<Vec<_>>())
			.find(|tokens| tokens.first().is_some_and(|t| LEADING_NUMBER.is_match(t)))?;
		if row.len() < 6 { return None; }
		let s = Slacks { wns_ns: number(row[0]), tns_ns: number(row[1]), whs_ns: number(row[4]), ths_ns: number(row[5]) };
		return (s != Slacks::default()).then_some(s);
	}
	None
}

/// Older layout: `WNS(ns): -0.123` per slack, each recovered independently.
pub fn slack_key_value(text: &str, _: &ExtractProfile) -> Option<Slacks> {
	let s = Slacks {
		wns_ns: capture_f64(&WNS_KV, text),
		tns_ns: capture_f64(&TNS_KV, text),
		whs_ns: capture_f64(&WHS_KV, text),
		ths_ns: capture_f64(&THS_KV, text),
	};
	(s != Slacks::default()).then_some(s)
}

/// Rows `name {waveform} period freq` after a `Clock Summary` line; preferred clock else first row.
pub fn clock_summary_table(text: &str, profile: &ExtractProfile) -> Option<ClockPick> {
	let mut inside = false;
	let mut rows: Vec<ClockPick> = Vec::new();
	for line in text.lines() {
		if CLOCK_SUMMARY.is_match(line) {
			inside = true;
			continue;
		}
		if !inside { continue; }
		if line.trim().is_empty() {
			if !rows.is_empty() { break; }
			continue;
		}
		if let Some(c) = CLOCK_ROW.captures(line) {
			let period_ns = number(&c[2]);
			let freq_mhz = number(&c[3]).or_else(|| period_ns.and_then(mhz_from_ns));
			rows.push(ClockPick { name: Some(c[1].to_string()), period_ns, freq_mhz });
		}
	}
	let idx = rows.iter().position(|r| r.name.as_deref() == Some(profile.preferred_clock.as_str())).unwrap_or(0);
	(idx < rows.len()).then(|| rows.swap_remove(idx))
}

/// Older layout: `Requirement: 10.000ns`.
pub fn requirement_line(text: &str, _: &ExtractProfile) -> Option<ClockPick> {
	let period_ns = REQUIREMENT.captures(text).and_then(|c| number(&c[1]))?;
	Some(ClockPick { name: None, period_ns: Some(period_ns), freq_mhz: mhz_from_ns(period_ns) })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vivado::fixtures::TIMING_ROUTED as ROUTED;

	#[test]
	fn table_layout() {
		let t = parse_timing(ROUTED, &ExtractProfile::default());
		assert_eq!(t.wns_ns, Some(0.412));
		assert_eq!(t.tns_ns, Some(0.0));
		assert_eq!(t.whs_ns, Some(0.010));
		assert_eq!(t.ths_ns, Some(0.0));
		assert_eq!(t.clock_name.as_deref(), Some("clk_pl_0"));
		assert_eq!(t.target_clock_ns, Some(4.0));
		assert_eq!(t.target_clock_mhz, Some(250.0));
	}

	#[test]
	fn first_clock_when_preferred_absent() {
		let profile = ExtractProfile { preferred_clock: "clk_missing".into(), ..ExtractProfile::default() };
		let c = clock_summary_table(ROUTED, &profile).unwrap();
		assert_eq!(c.name.as_deref(), Some("clk2"));
		assert_eq!(c.period_ns, Some(8.0));
	}

	#[test]
	fn key_value_fallback_fills_each_slack() {
		let text = "WNS(ns): -0.250\nTHS(ns): 0.000\nRequirement: 10.000ns\n";
		let t = parse_timing(text, &ExtractProfile::default());
		assert_eq!(t.wns_ns, Some(-0.25));
		assert_eq!(t.tns_ns, None);
		assert_eq!(t.ths_ns, Some(0.0));
		assert_eq!(t.clock_name, None);
		assert_eq!(t.target_clock_ns, Some(10.0));
		assert_eq!(t.target_clock_mhz, Some(100.0));
		assert!(t.has_any());
	}

	#[test]
	fn short_data_row_is_ignored() {
		let text = "Design Timing Summary\nWNS(ns) TNS(ns) WHS(ns) THS(ns)\n0.1 0.2 0.3\n";
		assert_eq!(design_timing_table(text, &ExtractProfile::default()), None);
	}

	#[test]
	fn unrelated_text_recovers_nothing() {
		assert!(!parse_timing("nothing to see\n", &ExtractProfile::default()).has_any());
	}
}
