//! Typed metric records shared by the extractors, the bundle store and the comparator.
//!
//! Every extracted artifact travels in a [`Record`]: where it came from, whether anything
//! was recovered, why not, and a tool-specific payload with one `Option` per field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Common envelope. `parsed` is true iff at least one payload field was recovered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<P> {
	pub source_path: PathBuf,
	pub parsed: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	pub payload: P,
}

impl<P> Record<P> {
	pub fn new(source_path: impl Into<PathBuf>, parsed: bool, payload: P) -> Self {
		Self { source_path: source_path.into(), parsed, error: None, payload }
	}

	pub fn with_error(mut self, reason: impl Into<String>) -> Self {
		self.error = Some(reason.into());
		self
	}

	/// Payload, but only when something was actually recovered.
	pub fn parsed_payload(&self) -> Option<&P> { self.parsed.then_some(&self.payload) }
}

impl<P: Default> Record<P> {
	/// Soft miss: nothing recovered, reason recorded.
	pub fn missing(source_path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
		Self::new(source_path, false, P::default()).with_error(reason)
	}
}

// ---------------------------------------------------------------------------
// HLS
// ---------------------------------------------------------------------------

/// Resource counts as reported by HLS synthesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HlsResources {
	#[serde(rename = "BRAM_18K", default, skip_serializing_if = "Option::is_none")]
	pub bram_18k: Option<u64>,
	#[serde(rename = "DSP", default, skip_serializing_if = "Option::is_none")]
	pub dsp: Option<u64>,
	#[serde(rename = "FF", default, skip_serializing_if = "Option::is_none")]
	pub ff: Option<u64>,
	#[serde(rename = "LUT", default, skip_serializing_if = "Option::is_none")]
	pub lut: Option<u64>,
	#[serde(rename = "URAM", default, skip_serializing_if = "Option::is_none")]
	pub uram: Option<u64>,
}

impl HlsResources {
	/// Display order used by summaries.
	pub const NAMES: [&'static str; 5] = ["LUT", "FF", "DSP", "BRAM_18K", "URAM"];

	pub fn get(&self, name: &str) -> Option<u64> {
		match name {
			"BRAM_18K" => self.bram_18k,
			"DSP" => self.dsp,
			"FF" => self.ff,
			"LUT" => self.lut,
			"URAM" => self.uram,
			_ => None,
		}
	}

	pub fn set(&mut self, name: &str, value: u64) -> bool {
		let slot = match name {
			"BRAM_18K" => &mut self.bram_18k,
			"DSP" => &mut self.dsp,
			"FF" => &mut self.ff,
			"LUT" => &mut self.lut,
			"URAM" => &mut self.uram,
			_ => return false,
		};
		*slot = Some(value);
		true
	}

	pub fn is_empty(&self) -> bool { Self::NAMES.iter().all(|n| self.get(n).is_none()) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HlsTiming {
	pub target_clock_ns: Option<f64>,
	pub estimated_clock_ns: Option<f64>,
	pub clock_uncertainty_ns: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AxiPortWidth {
	pub read_width: Option<u32>,
	pub write_width: Option<u32>,
}

/// One `*_csynth.xml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HlsReport {
	pub part: Option<String>,
	pub top_model: Option<String>,
	pub product_family: Option<String>,
	pub timing: HlsTiming,
	pub utilization: HlsResources,
	pub available: HlsResources,
	pub axi_ports: BTreeMap<String, AxiPortWidth>,
}

impl HlsReport {
	pub fn has_any(&self) -> bool {
		self.part.is_some()
			|| self.top_model.is_some()
			|| self.product_family.is_some()
			|| self.timing.target_clock_ns.is_some()
			|| self.timing.estimated_clock_ns.is_some()
			|| self.timing.clock_uncertainty_ns.is_some()
			|| !self.utilization.is_empty()
			|| !self.available.is_empty()
			|| !self.axi_ports.is_empty()
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HlsSummary {
	pub target_clock_ns: Option<f64>,
	pub estimated_clock_ns: Option<f64>,
	pub target_clock_mhz: Option<f64>,
	pub estimated_clock_mhz: Option<f64>,
	pub part: Option<String>,
	pub utilization: HlsResources,
	pub available: HlsResources,
	pub axi_ports: BTreeMap<String, AxiPortWidth>,
}

impl HlsSummary {
	pub fn from_report(top: &HlsReport) -> Self {
		Self {
			target_clock_ns: top.timing.target_clock_ns,
			estimated_clock_ns: top.timing.estimated_clock_ns,
			target_clock_mhz: top.timing.target_clock_ns.and_then(mhz_from_ns),
			estimated_clock_mhz: top.timing.estimated_clock_ns.and_then(mhz_from_ns),
			part: top.part.clone(),
			utilization: top.utilization.clone(),
			available: top.available.clone(),
			axi_ports: top.axi_ports.clone(),
		}
	}
}

/// Directory-level HLS result: the chosen top-level report plus every submodule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HlsRun {
	pub top_level: Option<Record<HlsReport>>,
	pub modules: BTreeMap<String, Record<HlsReport>>,
	pub summary: Option<HlsSummary>,
}

// ---------------------------------------------------------------------------
// Vivado
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VivadoTiming {
	pub wns_ns: Option<f64>,
	pub tns_ns: Option<f64>,
	pub whs_ns: Option<f64>,
	pub ths_ns: Option<f64>,
	pub clock_name: Option<String>,
	pub target_clock_ns: Option<f64>,
	pub target_clock_mhz: Option<f64>,
}

impl VivadoTiming {
	pub fn has_any(&self) -> bool {
		[self.wns_ns, self.tns_ns, self.whs_ns, self.ths_ns, self.target_clock_ns, self.target_clock_mhz]
			.iter()
			.any(Option::is_some)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VivadoResource { Lut, Ff, Bram, Dsp, Uram }

impl VivadoResource {
	pub const ALL: [VivadoResource; 5] = [Self::Lut, Self::Ff, Self::Dsp, Self::Bram, Self::Uram];

	pub fn name(self) -> &'static str {
		match self {
			Self::Lut => "LUT",
			Self::Ff => "FF",
			Self::Bram => "BRAM",
			Self::Dsp => "DSP",
			Self::Uram => "URAM",
		}
	}
}

impl fmt::Display for VivadoResource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceUsage {
	pub used: Option<f64>,
	pub available: Option<f64>,
	pub percent: Option<f64>,
}

impl ResourceUsage {
	/// Reported percent, else derived from used/available.
	pub fn utilization_pct(&self) -> Option<f64> {
		self.percent.or(match (self.used, self.available) {
			(Some(u), Some(a)) if a > 0.0 => Some(u / a * 100.0),
			_ => None,
		})
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VivadoUtilization {
	#[serde(rename = "LUT", default, skip_serializing_if = "Option::is_none")]
	pub lut: Option<ResourceUsage>,
	#[serde(rename = "FF", default, skip_serializing_if = "Option::is_none")]
	pub ff: Option<ResourceUsage>,
	#[serde(rename = "BRAM", default, skip_serializing_if = "Option::is_none")]
	pub bram: Option<ResourceUsage>,
	#[serde(rename = "DSP", default, skip_serializing_if = "Option::is_none")]
	pub dsp: Option<ResourceUsage>,
	#[serde(rename = "URAM", default, skip_serializing_if = "Option::is_none")]
	pub uram: Option<ResourceUsage>,
}

impl VivadoUtilization {
	pub fn get(&self, r: VivadoResource) -> Option<&ResourceUsage> {
		match r {
			VivadoResource::Lut => self.lut.as_ref(),
			VivadoResource::Ff => self.ff.as_ref(),
			VivadoResource::Bram => self.bram.as_ref(),
			VivadoResource::Dsp => self.dsp.as_ref(),
			VivadoResource::Uram => self.uram.as_ref(),
		}
	}

	pub fn slot_mut(&mut self, r: VivadoResource) -> &mut Option<ResourceUsage> {
		match r {
			VivadoResource::Lut => &mut self.lut,
			VivadoResource::Ff => &mut self.ff,
			VivadoResource::Bram => &mut self.bram,
			VivadoResource::Dsp => &mut self.dsp,
			VivadoResource::Uram => &mut self.uram,
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (VivadoResource, &ResourceUsage)> + '_ {
		VivadoResource::ALL.into_iter().filter_map(move |r| self.get(r).map(|u| (r, u)))
	}

	pub fn has_any(&self) -> bool { self.iter().any(|(_, u)| u.used.is_some()) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VivadoPower {
	pub total_w: Option<f64>,
	pub dynamic_w: Option<f64>,
	pub static_w: Option<f64>,
	pub ip_name: Option<String>,
	pub ip_w: Option<f64>,
}

impl VivadoPower {
	pub fn has_any(&self) -> bool {
		[self.total_w, self.dynamic_w, self.static_w, self.ip_w].iter().any(Option::is_some)
	}
}

/// Merged post-implementation view across the three report kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VivadoSummary {
	pub timing: Option<VivadoTiming>,
	pub utilization: Option<VivadoUtilization>,
	pub power: Option<VivadoPower>,
	pub fmax_est_mhz: Option<f64>,
}

impl VivadoSummary {
	pub fn wns_ns(&self) -> Option<f64> { self.timing.as_ref().and_then(|t| t.wns_ns) }
	pub fn tns_ns(&self) -> Option<f64> { self.timing.as_ref().and_then(|t| t.tns_ns) }
	pub fn total_power_w(&self) -> Option<f64> { self.power.as_ref().and_then(|p| p.total_w) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VivadoRun {
	pub timing: Option<Record<VivadoTiming>>,
	pub utilization: Option<Record<VivadoUtilization>>,
	pub power: Option<Record<VivadoPower>>,
	pub summary: VivadoSummary,
}

// ---------------------------------------------------------------------------
// Device log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceStats {
	pub count: usize,
	pub mean_ms: f64,
	pub min_ms: f64,
	pub max_ms: f64,
	pub median_ms: f64,
	pub p90_ms: f64,
	pub fps_from_mean: f64,
	pub fps_from_median: f64,
}

impl InferenceStats {
	/// `None` for an empty sequence.
	///
	/// p90 is nearest-rank on the sorted samples (`sorted[floor(n * 0.9)]`) and falls back
	/// to the maximum below ten samples, matching earlier reports.
	pub fn from_samples(samples: &[f64]) -> Option<Self> {
		if samples.is_empty() { return None; }
		let mut sorted = samples.to_vec();
		sorted.sort_by(f64::total_cmp);
		let n = sorted.len();
		let mean_ms = sorted.iter().sum::<f64>() / n as f64;
		let median_ms = if n % 2 == 1 { sorted[n / 2] } else { (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0 };
		let p90_ms = if n >= 10 { sorted[(n as f64 * 0.9) as usize] } else { sorted[n - 1] };
		Some(Self {
			count: n,
			mean_ms,
			min_ms: sorted[0],
			max_ms: sorted[n - 1],
			median_ms,
			p90_ms,
			fps_from_mean: fps_from_ms(mean_ms),
			fps_from_median: fps_from_ms(median_ms),
		})
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceLog {
	pub inference_times_ms: Vec<f64>,
	pub stats: Option<InferenceStats>,
}

impl DeviceLog {
	pub fn from_samples(inference_times_ms: Vec<f64>) -> Self {
		let stats = InferenceStats::from_samples(&inference_times_ms);
		Self { inference_times_ms, stats }
	}
}

// ---------------------------------------------------------------------------
// Tagged union
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind { Hls, Vivado, Kv260Log }

impl ToolKind {
	pub fn name(self) -> &'static str {
		match self {
			Self::Hls => "hls",
			Self::Vivado => "vivado",
			Self::Kv260Log => "kv260",
		}
	}
}

impl fmt::Display for ToolKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum MetricRecord {
	Hls(Record<HlsRun>),
	Vivado(Record<VivadoRun>),
	Kv260Log(Record<DeviceLog>),
}

impl MetricRecord {
	pub fn tool(&self) -> ToolKind {
		match self {
			Self::Hls(_) => ToolKind::Hls,
			Self::Vivado(_) => ToolKind::Vivado,
			Self::Kv260Log(_) => ToolKind::Kv260Log,
		}
	}

	pub fn parsed(&self) -> bool {
		match self {
			Self::Hls(r) => r.parsed,
			Self::Vivado(r) => r.parsed,
			Self::Kv260Log(r) => r.parsed,
		}
	}

	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Hls(r) => r.error.as_deref(),
			Self::Vivado(r) => r.error.as_deref(),
			Self::Kv260Log(r) => r.error.as_deref(),
		}
	}

	pub fn source_path(&self) -> &Path {
		match self {
			Self::Hls(r) => &r.source_path,
			Self::Vivado(r) => &r.source_path,
			Self::Kv260Log(r) => &r.source_path,
		}
	}
}

/// One optional record per tool, as persisted in `metrics.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BundleMetrics {
	#[serde(default)]
	pub hls: Option<Record<HlsRun>>,
	#[serde(default)]
	pub vivado: Option<Record<VivadoRun>>,
	#[serde(default)]
	pub kv260: Option<Record<DeviceLog>>,
}

impl BundleMetrics {
	pub fn set(&mut self, record: MetricRecord) {
		match record {
			MetricRecord::Hls(r) => self.hls = Some(r),
			MetricRecord::Vivado(r) => self.vivado = Some(r),
			MetricRecord::Kv260Log(r) => self.kv260 = Some(r),
		}
	}

	pub fn records(&self) -> Vec<MetricRecord> {
		let mut out = Vec::with_capacity(3);
		if let Some(r) = &self.hls { out.push(MetricRecord::Hls(r.clone())); }
		if let Some(r) = &self.vivado { out.push(MetricRecord::Vivado(r.clone())); }
		if let Some(r) = &self.kv260 { out.push(MetricRecord::Kv260Log(r.clone())); }
		out
	}

	pub fn kv260_stats(&self) -> Option<&InferenceStats> {
		self.kv260.as_ref()?.parsed_payload()?.stats.as_ref()
	}

	pub fn hls_summary(&self) -> Option<&HlsSummary> {
		self.hls.as_ref()?.parsed_payload()?.summary.as_ref()
	}

	pub fn vivado_summary(&self) -> Option<&VivadoSummary> {
		self.vivado.as_ref()?.parsed_payload().map(|r| &r.summary)
	}
}

pub fn mhz_from_ns(ns: f64) -> Option<f64> { (ns > 0.0).then(|| 1000.0 / ns) }

fn fps_from_ms(ms: f64) -> f64 { if ms > 0.0 { 1000.0 / ms } else { 0.0 } }
