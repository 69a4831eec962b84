//! Vitis HLS `*_csynth.xml` extraction and per-directory aggregation.

use crate::read_report;
use hwperf_core::{AxiPortWidth, ExtractProfile, HlsReport, HlsResources, HlsRun, HlsSummary, Record};
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix every synthesis report file carries.
pub const CSYNTH_SUFFIX: &str = "_csynth.xml";
/// Sub-reports for pipelined loops; never chosen as the top level when something else parses.
pub const PIPELINE_MARKER: &str = "Pipeline";

/// Extract one synthesis report. Never fails; problems end up in `Record::error`.
pub fn extract_hls_report(path: &Path) -> Record<HlsReport> {
	let text = match read_report(path) {
		Ok(t) => t,
		Err(reason) => return Record::missing(path, reason),
	};
	match parse_hls_xml(&text) {
		Ok(report) if report.has_any() => Record::new(path, true, report),
		Ok(report) => Record::new(path, false, report).with_error("no known report sections found"),
		Err(reason) => Record::missing(path, reason),
	}
}

/// Parse report text. Each section is optional; only a malformed document is an error.
pub fn parse_hls_xml(text: &str) -> Result<HlsReport, String> {
	let opts = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
	let doc = Document::parse_with_options(text, opts).map_err(|e| format!("XML parse error: {e}"))?;
	let root = doc.root_element();
	let mut report = HlsReport::default();

	if let Some(ua) = child(root, "UserAssignments") {
		report.part = child_text(ua, "Part").map(str::to_string);
		report.top_model = child_text(ua, "TopModelName").map(str::to_string);
		report.product_family = child_text(ua, "ProductFamily").map(str::to_string);
		report.timing.target_clock_ns = child_f64(ua, "TargetClockPeriod");
		report.timing.clock_uncertainty_ns = child_f64(ua, "ClockUncertainty");
	}

	if let Some(t) = child(root, "PerformanceEstimates").and_then(|p| child(p, "SummaryOfTimingAnalysis")) {
		report.timing.estimated_clock_ns = child_f64(t, "EstimatedClockPeriod");
	}

	if let Some(area) = child(root, "AreaEstimates") {
		if let Some(r) = child(area, "Resources") { report.utilization = resources(r); }
		if let Some(r) = child(area, "AvailableResources") { report.available = resources(r); }
	}

	if let Some(iface) = child(root, "InterfaceSummary") {
		report.axi_ports = axi_ports(iface);
	}
	Ok(report)
}

fn resources(node: Node<'_, '_>) -> HlsResources {
	let mut out = HlsResources::default();
	for name in HlsResources::NAMES {
		if let Some(v) = child_text(node, name).and_then(|s| s.parse::<u64>().ok()) {
			out.set(name, v);
		}
	}
	out
}

/// Data-port widths of memory-mapped interfaces, merged per logical port.
fn axi_ports(iface: Node<'_, '_>) -> BTreeMap<String, AxiPortWidth> {
	let mut ports: BTreeMap<String, AxiPortWidth> = BTreeMap::new();
	for port in iface.children().filter(|n| n.has_tag_name("RtlPorts")) {
		if child_text(port, "IOProtocol") != Some("m_axi") { continue; }
		let name = child_text(port, "name").unwrap_or_default();
		let is_read = name.contains("RDATA");
		if !is_read && !name.contains("WDATA") { continue; }
		let object = child_text(port, "Object").unwrap_or_default().to_string();
		let bits = child_text(port, "Bits").and_then(|b| b.parse::<u32>().ok());
		let entry = ports.entry(object).or_default();
		if is_read { entry.read_width = bits; } else { entry.write_width = bits; }
	}
	ports
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
	node.children().find(|n| n.has_tag_name(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
	child(node, name)?.text().map(str::trim).filter(|s| !s.is_empty())
}

fn child_f64(node: Node<'_, '_>, name: &str) -> Option<f64> { child_text(node, name).and_then(crate::strategy::number) }

/// Aggregate a report directory into one HLS record.
///
/// The top level is the configured well-known report when present, else the first report
/// by name that is not a pipeline sub-report and extracts cleanly, else the first report.
/// Every other report becomes a named module.
pub fn aggregate_hls_dir(dir: &Path, profile: &ExtractProfile) -> Record<HlsRun> {
	if !dir.is_dir() {
		warn!(dir = %dir.display(), "HLS report directory not found");
		return Record::missing(dir, "directory not found");
	}
	let all = match crate::sorted_glob(dir, &format!("*{CSYNTH_SUFFIX}")) {
		Ok(files) => files,
		Err(reason) => return Record::missing(dir, reason),
	};
	if all.is_empty() {
		return Record::missing(dir, format!("no *{CSYNTH_SUFFIX} reports found"));
	}

	let preferred = dir.join(&profile.hls_top_report);
	let candidates: Vec<PathBuf> = if all.contains(&preferred) { vec![preferred] } else { all.clone() };

	let mut top: Option<Record<HlsReport>> = None;
	for path in candidates.iter().filter(|p| !file_name(p).contains(PIPELINE_MARKER)) {
		let rec = extract_hls_report(path);
		if rec.parsed {
			top = Some(rec);
			break;
		}
	}
	if top.is_none() {
		top = candidates.first().map(|p| extract_hls_report(p));
	}
	let top_path = top.as_ref().map(|r| r.source_path.clone());
	debug!(top = ?top_path, reports = all.len(), "HLS top-level report chosen");

	let modules = all
		.iter()
		.filter(|p| Some(*p) != top_path.as_ref())
		.map(|p| (module_name(p), extract_hls_report(p)))
		.collect();

	let summary = top.as_ref().and_then(|r| r.parsed_payload()).map(HlsSummary::from_report);
	let parsed = summary.is_some();
	let error = if parsed { None } else { top.as_ref().and_then(|r| r.error.clone()) };
	let mut rec = Record::new(dir, parsed, HlsRun { top_level: top, modules, summary });
	rec.error = error.or_else(|| (!parsed).then(|| "top-level report did not parse".to_string()));
	rec
}

fn file_name(p: &Path) -> String { p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default() }

fn module_name(p: &Path) -> String {
	let name = file_name(p);
	name.strip_suffix(CSYNTH_SUFFIX).map(str::to_string).unwrap_or(name)
}
