//! Fixture reports through extraction, bundle storage, reload and comparison.

use chrono::{Local, TimeZone};
use hwperf_bundle::{compare, BundleMeta, BundleStore};
use hwperf_core::{BundleMetrics, ExtractProfile, GitIdentity, MetricRecord, ToolKind};
use hwperf_integration_tests::{FixtureWorkspace, TestResult};
use hwperf_parse::{aggregate_hls_dir, aggregate_vivado_dir, extract_device_log};

fn collect(ws: &FixtureWorkspace) -> BundleMetrics {
	let profile = ExtractProfile::default();
	let mut metrics = BundleMetrics::default();
	metrics.set(MetricRecord::Hls(aggregate_hls_dir(&ws.hls_dir(), &profile)));
	metrics.set(MetricRecord::Vivado(aggregate_vivado_dir(&ws.vivado_dir(), &profile)));
	metrics.set(MetricRecord::Kv260Log(extract_device_log(&ws.device_log())));
	metrics
}

#[test]
fn fixture_reports_extract() -> TestResult {
	let ws = FixtureWorkspace::new()?;
	let metrics = collect(&ws);

	let hls = metrics.hls.as_ref().unwrap();
	assert!(hls.parsed);
	let top = hls.payload.top_level.as_ref().unwrap();
	assert!(top.source_path.ends_with("YOLO2_FPGA_csynth.xml"));
	let modules: Vec<_> = hls.payload.modules.keys().cloned().collect();
	assert_eq!(modules, ["conv_layer", "conv_layer_Pipeline_VITIS_LOOP_84_1"]);
	let summary = metrics.hls_summary().unwrap();
	assert_eq!(summary.utilization.dsp, Some(310));
	assert_eq!(summary.estimated_clock_ns, Some(3.65));

	let vivado = metrics.vivado_summary().unwrap();
	assert_eq!(vivado.wns_ns(), Some(0.412));
	assert_eq!(vivado.timing.as_ref().unwrap().clock_name.as_deref(), Some("clk_pl_0"));
	assert_eq!(vivado.power.as_ref().unwrap().ip_w, Some(1.877));
	let run = &metrics.vivado.as_ref().unwrap().payload;
	assert!(run.utilization.as_ref().unwrap().source_path.ends_with("design_1_wrapper_utilization_placed.rpt"));

	let stats = metrics.kv260_stats().unwrap();
	assert_eq!(stats.count, 12);
	assert!((stats.median_ms - 49.3).abs() < 1e-9);
	assert_eq!(stats.p90_ms, 55.0);
	assert_eq!(stats.max_ms, 61.2);
	Ok(())
}

#[test]
fn bundle_round_trip_and_self_compare() -> TestResult {
	let ws = FixtureWorkspace::new()?;
	let metrics = collect(&ws);
	let store = BundleStore::new(ws.reports_dir());
	let at = Local.with_ymd_and_hms(2025, 1, 31, 14, 2, 11).single().unwrap();

	let writer = store.create("int16 baseline", at)?;
	assert_eq!(writer.name(), "2025-01-31_14-02-11_int16_baseline");
	let top = metrics.hls.as_ref().unwrap().payload.top_level.as_ref().unwrap().source_path.clone();
	writer.copy_artifact(ToolKind::Hls, &top)?;
	for record in metrics.records() {
		writer.write_parsed(&record)?;
	}
	let meta = BundleMeta::new("int16 baseline", "fixtures", at, GitIdentity::default())
		.with_input("hls_report_dir", ws.hls_dir().display().to_string());
	let written = writer.finish(meta, metrics)?;

	for f in ["hls/YOLO2_FPGA_csynth.xml", "hls/parsed_hls.json", "vivado/parsed_vivado.json", "kv260/parsed_kv260.json"] {
		assert!(written.path.join(f).is_file(), "missing {f}");
	}
	let loaded = store.load(&written.name)?;
	assert_eq!(loaded, written);

	let cmp = compare(&loaded, &written);
	assert_eq!(cmp.rows.len(), 9);
	assert!(cmp.rows.iter().all(|r| r.delta == 0.0));
	assert!(cmp.rows.iter().filter(|r| r.baseline != 0.0).all(|r| r.percent == Some(0.0)));

	let summary = std::fs::read_to_string(written.path.join("summary.md"))?;
	assert!(summary.contains("## HLS Synthesis"));
	assert!(summary.contains("## Vivado Implementation"));
	assert!(summary.contains("| P90 | 55.00 ms |"));
	Ok(())
}

#[test]
fn second_bundle_same_second_gets_suffix() -> TestResult {
	let ws = FixtureWorkspace::new()?;
	let store = BundleStore::new(ws.reports_dir());
	let at = Local.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).single().unwrap();
	let a = store.create("x", at)?;
	let b = store.create("x", at)?;
	assert_eq!(b.name(), format!("{}-2", a.name()));
	Ok(())
}

#[test]
fn degraded_inputs_stay_partial() -> TestResult {
	let ws = FixtureWorkspace::new()?;
	ws.write_input("vivado/design_1_wrapper_timing_summary_routed.rpt", "nothing useful\n")?;
	ws.write_input("kv260/run.log", "[INFO] board booted\n")?;
	let metrics = collect(&ws);

	let vivado = metrics.vivado.as_ref().unwrap();
	assert!(vivado.parsed);
	assert!(vivado.payload.summary.timing.is_none());
	assert!(vivado.payload.summary.power.is_some());

	let log = metrics.kv260.as_ref().unwrap();
	assert!(!log.parsed);
	assert_eq!(log.error.as_deref(), Some("no inference timing lines found"));

	let store = BundleStore::new(ws.reports_dir());
	let bundle = store.create("degraded", Local::now())?.finish(
		BundleMeta::new("degraded", "", Local::now(), GitIdentity::default()),
		metrics,
	)?;
	let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(bundle.path.join("metrics.json"))?)?;
	assert_eq!(json["kv260"]["parsed"], false);
	assert!(!std::fs::read_to_string(bundle.path.join("summary.md"))?.contains("## KV260 Performance"));
	Ok(())
}
