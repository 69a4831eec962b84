//! Output formatting for `list` and `compare`.

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use hwperf_bundle::{Bundle, Comparison};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable table
	#[default]
	Table,
	/// Markdown, as written to bundles
	Markdown,
	/// JSON for scripts
	Json,
}

const LABEL_WIDTH: usize = 18;

/// One line of `hwperf list`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListRow {
	pub bundle: String,
	pub label: String,
	pub git: String,
	pub fps_median: Option<f64>,
	pub wns_ns: Option<f64>,
}

impl ListRow {
	pub fn from_bundle(b: &Bundle) -> Self {
		Self {
			bundle: b.name.clone(),
			label: b.meta.label.clone(),
			git: b.meta.git.short(),
			fps_median: b.metrics.kv260_stats().map(|s| s.fps_from_median),
			wns_ns: b.metrics.vivado_summary().and_then(|v| v.wns_ns()),
		}
	}
}

fn na(value: Option<f64>, precision: usize) -> String { hwperf_bundle::summary::fmt_num(value, precision) }

fn table(headers: &[&str]) -> Table {
	let mut t = Table::new();
	t.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(headers.to_vec());
	t
}

pub fn render_list(rows: &[ListRow], format: OutputFormat) -> Result<String> {
	if format == OutputFormat::Json {
		return Ok(serde_json::to_string_pretty(rows)?);
	}
	if rows.is_empty() {
		return Ok("No report bundles found.".to_string());
	}
	let cells = |r: &ListRow| {
		let label: String = r.label.chars().take(LABEL_WIDTH).collect();
		[r.bundle.clone(), label, r.git.clone(), na(r.fps_median, 2), na(r.wns_ns, 3)]
	};
	let headers = ["Bundle", "Label", "Git", "FPS", "WNS (ns)"];
	Ok(match format {
		OutputFormat::Markdown => {
			let mut s = format!("| {} |\n|{}\n", headers.join(" | "), "---|".repeat(headers.len()));
			for r in rows {
				s.push_str(&format!("| {} |\n", cells(r).join(" | ")));
			}
			s.trim_end().to_string()
		}
		_ => {
			let mut t = table(&headers);
			for r in rows {
				t.add_row(cells(r).to_vec());
			}
			t.to_string()
		}
	})
}

pub fn render_comparison(cmp: &Comparison, format: OutputFormat) -> Result<String> {
	Ok(match format {
		OutputFormat::Json => serde_json::to_string_pretty(cmp)?,
		OutputFormat::Markdown => cmp.to_string().trim_end().to_string(),
		OutputFormat::Table if cmp.rows.is_empty() => "No comparable metrics found.".to_string(),
		OutputFormat::Table => {
			let mut t = table(&["Metric", cmp.baseline_label.as_str(), cmp.candidate_label.as_str(), "Delta"]);
			for r in &cmp.rows {
				t.add_row(vec![
					Cell::new(r.metric),
					Cell::new(r.baseline_text()).set_alignment(CellAlignment::Right),
					Cell::new(r.candidate_text()).set_alignment(CellAlignment::Right),
					Cell::new(r.delta_text()).set_alignment(CellAlignment::Right),
				]);
			}
			t.to_string()
		}
	})
}
