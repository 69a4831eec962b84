//! `summary.md` rendering.

use crate::store::BundleMeta;
use hwperf_core::{BundleMetrics, HlsResources, VivadoResource};
use std::fmt::Write;

/// `N/A` for missing values.
pub fn fmt_num(value: Option<f64>, precision: usize) -> String {
	value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.precision$}"))
}

fn pct(used: Option<f64>, available: Option<f64>) -> Option<f64> {
	match (used, available) {
		(Some(u), Some(a)) if a > 0.0 => Some(u / a * 100.0),
		_ => None,
	}
}

/// Markdown summary. Sections appear only for tools whose record parsed.
pub fn render_summary(meta: &BundleMeta, metrics: &BundleMetrics) -> String {
	let mut s = String::new();
	// Writing into a String cannot fail.
	let _ = write_summary(&mut s, meta, metrics);
	s
}

fn write_summary(s: &mut String, meta: &BundleMeta, metrics: &BundleMetrics) -> std::fmt::Result {
	writeln!(s, "# Report: {}", meta.label)?;
	writeln!(s)?;
	writeln!(s, "**Date:** {}", meta.timestamp.format("%Y-%m-%dT%H:%M:%S"))?;
	if let Some(commit) = &meta.git.commit {
		let dirty = if meta.git.dirty == Some(true) { " (dirty)" } else { "" };
		writeln!(s, "**Git:** {commit}{dirty} on {}", meta.git.branch.as_deref().unwrap_or("unknown"))?;
	}
	if !meta.note.is_empty() {
		writeln!(s, "**Note:** {}", meta.note)?;
	}
	writeln!(s)?;

	if let Some(st) = metrics.kv260_stats() {
		writeln!(s, "## KV260 Performance\n")?;
		writeln!(s, "| Metric | Value |\n|--------|-------|")?;
		writeln!(s, "| Frames | {} |", st.count)?;
		writeln!(s, "| Mean | {:.2} ms |", st.mean_ms)?;
		writeln!(s, "| Median | {:.2} ms |", st.median_ms)?;
		writeln!(s, "| P90 | {:.2} ms |", st.p90_ms)?;
		writeln!(s, "| FPS (median) | {:.2} |", st.fps_from_median)?;
		writeln!(s)?;
	}

	if let Some(h) = metrics.hls_summary() {
		writeln!(s, "## HLS Synthesis\n")?;
		writeln!(s, "| Metric | Value |\n|--------|-------|")?;
		writeln!(s, "| Target Clock | {} ns ({} MHz) |", fmt_num(h.target_clock_ns, 2), fmt_num(h.target_clock_mhz, 2))?;
		writeln!(s, "| Est. Clock | {} ns ({} MHz) |", fmt_num(h.estimated_clock_ns, 2), fmt_num(h.estimated_clock_mhz, 2))?;
		writeln!(s, "| Part | {} |", h.part.as_deref().unwrap_or("N/A"))?;
		writeln!(s)?;

		if !h.utilization.is_empty() {
			writeln!(s, "### Utilization\n")?;
			writeln!(s, "| Resource | Used | Available | % |\n|----------|------|-----------|---|")?;
			for name in HlsResources::NAMES {
				let used = h.utilization.get(name);
				let avail = h.available.get(name);
				let p = pct(used.map(|v| v as f64), avail.map(|v| v as f64));
				writeln!(
					s,
					"| {name} | {} | {} | {} |",
					used.map_or("N/A".into(), |v| v.to_string()),
					avail.map_or("N/A".into(), |v| v.to_string()),
					p.map_or("N/A".into(), |v| format!("{v:.1}%")),
				)?;
			}
			writeln!(s)?;
		}

		if !h.axi_ports.is_empty() {
			writeln!(s, "### AXI Port Widths\n")?;
			writeln!(s, "| Port | Read Width | Write Width |\n|------|------------|-------------|")?;
			let bits = |w: Option<u32>| w.map_or("N/A".to_string(), |b| format!("{b} bits"));
			for (port, w) in &h.axi_ports {
				writeln!(s, "| {port} | {} | {} |", bits(w.read_width), bits(w.write_width))?;
			}
			writeln!(s)?;
		}
	}

	if let Some(v) = metrics.vivado_summary() {
		writeln!(s, "## Vivado Implementation\n")?;
		writeln!(s, "| Metric | Value |\n|--------|-------|")?;
		if let Some(t) = &v.timing {
			if let Some(clk) = &t.clock_name {
				writeln!(s, "| Clock | {clk} |")?;
			}
			if t.target_clock_ns.is_some() || t.target_clock_mhz.is_some() {
				writeln!(s, "| Target Clock | {} ns ({} MHz) |", fmt_num(t.target_clock_ns, 3), fmt_num(t.target_clock_mhz, 3))?;
			}
			for (label, value) in [("WNS", t.wns_ns), ("TNS", t.tns_ns), ("WHS", t.whs_ns), ("THS", t.ths_ns)] {
				if value.is_some() {
					writeln!(s, "| {label} | {} ns |", fmt_num(value, 3))?;
				}
			}
		}
		if v.fmax_est_mhz.is_some() {
			writeln!(s, "| Fmax (est) | {} MHz |", fmt_num(v.fmax_est_mhz, 2))?;
		}
		if let Some(p) = &v.power {
			for (label, value) in [("Total Power", p.total_w), ("Dynamic Power", p.dynamic_w), ("Static Power", p.static_w)] {
				if value.is_some() {
					writeln!(s, "| {label} | {} W |", fmt_num(value, 2))?;
				}
			}
			if p.ip_w.is_some() {
				writeln!(s, "| {} Power | {} W |", p.ip_name.as_deref().unwrap_or("IP"), fmt_num(p.ip_w, 2))?;
			}
		}
		writeln!(s)?;

		if let Some(u) = &v.utilization {
			writeln!(s, "### Post-Implementation Utilization\n")?;
			writeln!(s, "| Resource | Used | Available | % |\n|----------|------|-----------|---|")?;
			for res in VivadoResource::ALL {
				let Some(r) = u.get(res) else { continue };
				if r.used.is_none() && r.available.is_none() { continue; }
				let p = pct(r.used, r.available).map_or("N/A".into(), |v| format!("{v:.2}%"));
				writeln!(s, "| {res} | {} | {} | {p} |", fmt_num(r.used, 0), fmt_num(r.available, 0))?;
			}
			writeln!(s)?;
		}
	}
	Ok(())
}
