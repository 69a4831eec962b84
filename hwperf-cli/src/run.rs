//! `hwperf run`: collect every configured source into one bundle.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use console::style;
use hwperf_bundle::summary::fmt_num;
use hwperf_bundle::{Bundle, BundleMeta, BundleStore, BundleWriter};
use hwperf_core::config::is_env_key;
use hwperf_core::{BundleMetrics, GitIdentity, MetricRecord, RemoteCredential, ReportConfig, Secret, ToolKind};
use hwperf_parse::{aggregate_hls_dir, aggregate_vivado_dir, extract_device_log, parse_device_log};
use hwperf_remote::{run_remote, CancelFlag};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const STDOUT_LOG: &str = "stdout.log";
const STDERR_LOG: &str = "stderr.log";
const RUN_CMD: &str = "run_cmd.txt";

#[derive(Debug, Args)]
pub struct RunArgs {
	/// Bundle label, part of the directory name
	#[arg(long, default_value = "run")]
	pub label: String,
	/// Free-form note stored in meta.json
	#[arg(long, default_value = "")]
	pub note: String,
	#[arg(long)]
	pub reports_dir: Option<PathBuf>,
	/// Directory holding `*_csynth.xml` reports
	#[arg(long)]
	pub hls_report_dir: Option<PathBuf>,
	/// Directory holding Vivado timing/utilization/power reports
	#[arg(long)]
	pub vivado_report_dir: Option<PathBuf>,
	/// Device log captured on the board
	#[arg(long, conflicts_with = "kv260_ssh")]
	pub kv260_log: Option<PathBuf>,
	/// Run the benchmark on the board over SSH
	#[arg(long)]
	pub kv260_ssh: bool,
	/// Remote command (default: remote.command_template)
	#[arg(long, requires = "kv260_ssh")]
	pub kv260_cmd: Option<String>,
	/// Prompt for the SSH password and answer the remote prompt
	#[arg(long, requires = "kv260_ssh", conflicts_with = "kv260_password_env")]
	pub kv260_password_prompt: bool,
	/// Environment variable holding the SSH password
	#[arg(long, requires = "kv260_ssh", value_name = "VAR")]
	pub kv260_password_env: Option<String>,
}

/// Password source: interactive prompt, then `--kv260-password-env`, then `remote.password_env`.
fn resolve_credential(cfg: &ReportConfig, args: &RunArgs) -> Result<Option<RemoteCredential>> {
	let max_prompts = cfg.remote.max_prompts;
	if args.kv260_password_prompt {
		let secret = rpassword::prompt_password(format!("KV260 SSH password for {}: ", cfg.remote.host))
			.context("reading SSH password")?;
		return Ok(Some(RemoteCredential::non_empty(Secret::new(secret), max_prompts)?));
	}
	match args.kv260_password_env.as_deref().or_else(|| cfg.remote.password_env()) {
		Some(var) if !is_env_key(var) => bail!("not a valid environment variable name: {var}"),
		Some(var) => Ok(Some(RemoteCredential::from_env(var, max_prompts)?)),
		None => Ok(None),
	}
}

fn copy_if_file(writer: &BundleWriter, tool: ToolKind, src: &Path) -> Result<()> {
	if src.is_file() {
		writer.copy_artifact(tool, src)?;
	}
	Ok(())
}

fn record(writer: &BundleWriter, metrics: &mut BundleMetrics, record: MetricRecord) -> Result<()> {
	if let Some(reason) = record.error() {
		warn!(tool = %record.tool(), %reason, "source not parsed");
	}
	writer.write_parsed(&record)?;
	metrics.set(record);
	Ok(())
}

pub async fn execute(cfg: &ReportConfig, args: RunArgs, cancel: CancelFlag) -> Result<()> {
	// Everything that can fail on configuration happens before the bundle exists.
	let credential = if args.kv260_ssh { resolve_credential(cfg, &args)? } else { None };
	if args.kv260_ssh {
		let flag = cancel.clone();
		ctrlc::set_handler(move || flag.cancel()).context("installing Ctrl-C handler")?;
	}

	let reports_dir = args.reports_dir.clone().unwrap_or_else(|| cfg.reports_dir.clone());
	let hls_dir = args.hls_report_dir.clone().or_else(|| cfg.hls_dir().map(Path::to_path_buf));
	let vivado_dir = args.vivado_report_dir.clone().or_else(|| cfg.vivado_dir().map(Path::to_path_buf));

	let now = Local::now();
	let store = BundleStore::new(&reports_dir);
	let writer = store.create(&args.label, now).with_context(|| format!("creating bundle under {}", reports_dir.display()))?;
	println!("Creating report bundle: {}", writer.path().display());

	let mut meta = BundleMeta::new(&args.label, &args.note, now, GitIdentity::discover(Path::new(".")));
	let mut metrics = BundleMetrics::default();

	if let Some(dir) = &hls_dir {
		println!("Parsing HLS reports from: {}", dir.display());
		meta = meta.with_input("hls_report_dir", dir.display().to_string());
		let run = aggregate_hls_dir(dir, &cfg.extract);
		if let Some(top) = &run.payload.top_level {
			copy_if_file(&writer, ToolKind::Hls, &top.source_path)?;
		}
		record(&writer, &mut metrics, MetricRecord::Hls(run))?;
	}

	if let Some(dir) = &vivado_dir {
		println!("Parsing Vivado reports from: {}", dir.display());
		meta = meta.with_input("vivado_report_dir", dir.display().to_string());
		let run = aggregate_vivado_dir(dir, &cfg.extract);
		let p = &run.payload;
		let used = [
			p.timing.as_ref().map(|r| &r.source_path),
			p.utilization.as_ref().map(|r| &r.source_path),
			p.power.as_ref().map(|r| &r.source_path),
		];
		for src in used.into_iter().flatten() {
			copy_if_file(&writer, ToolKind::Vivado, src)?;
		}
		record(&writer, &mut metrics, MetricRecord::Vivado(run))?;
	}

	if let Some(log) = &args.kv260_log {
		println!("Parsing KV260 log from: {}", log.display());
		meta = meta.with_input("kv260_log", log.display().to_string());
		if log.is_file() {
			writer.copy_artifact_as(ToolKind::Kv260Log, log, STDOUT_LOG)?;
		}
		record(&writer, &mut metrics, MetricRecord::Kv260Log(extract_device_log(log)))?;
	} else if args.kv260_ssh {
		let command = args.kv260_cmd.clone().unwrap_or_else(|| cfg.remote.render_command(&args.label));
		meta = meta.with_input("kv260_ssh", cfg.remote.host.clone()).with_input("kv260_cmd", command.clone());
		let preview: String = command.chars().take(60).collect();
		println!("Running KV260 command via SSH: {preview}...");

		let out = run_remote(&cfg.remote, &command, credential, &cancel).await;
		writer.write_artifact(ToolKind::Kv260Log, RUN_CMD, &command)?;
		let stdout_path = writer.write_artifact(ToolKind::Kv260Log, STDOUT_LOG, &out.output)?;
		let stderr = out.error.as_deref().unwrap_or_default();
		if !stderr.is_empty() {
			writer.write_artifact(ToolKind::Kv260Log, STDERR_LOG, stderr)?;
		}
		if !out.success() {
			eprintln!("{} SSH command returned {}", style("Warning:").yellow().bold(), out.exit_code);
			if stderr.contains("Permission denied") {
				eprintln!("Hint: if your KV260 requires password auth, rerun with --kv260-password-prompt.");
			}
		}
		record(&writer, &mut metrics, MetricRecord::Kv260Log(parse_device_log(&out.output, &stdout_path)))?;
	}

	let bundle = writer.finish(meta, metrics)?;
	info!(bundle = %bundle.name, "bundle complete");
	println!("\nReport bundle created: {}", bundle.path.display());
	println!("  - meta.json\n  - metrics.json\n  - summary.md");
	print_quick_summary(&bundle);
	Ok(())
}

fn or_na<T: ToString>(value: Option<T>) -> String { value.map_or_else(|| "N/A".to_string(), |v| v.to_string()) }

pub fn quick_summary(bundle: &Bundle) -> Vec<String> {
	let m = &bundle.metrics;
	let mut lines = Vec::new();
	if let Some(s) = m.kv260_stats() {
		lines.push(format!("KV260: {} frames, median {:.2} ms, ~{:.2} FPS", s.count, s.median_ms, s.fps_from_median));
	}
	if let Some(h) = m.hls_summary() {
		lines.push(format!(
			"HLS: {} ns est. clock, DSP={}, LUT={}",
			or_na(h.estimated_clock_ns),
			or_na(h.utilization.dsp),
			or_na(h.utilization.lut)
		));
	}
	if let Some(v) = m.vivado_summary() {
		let mut parts = vec![format!("WNS={} ns", fmt_num(v.wns_ns(), 3))];
		if v.fmax_est_mhz.is_some() {
			parts.push(format!("Fmax(est)={} MHz", fmt_num(v.fmax_est_mhz, 2)));
		}
		if v.total_power_w().is_some() {
			parts.push(format!("P={} W", fmt_num(v.total_power_w(), 3)));
		}
		lines.push(format!("Vivado: {}", parts.join(", ")));
	}
	lines
}

fn print_quick_summary(bundle: &Bundle) {
	println!("\n{}", style("--- Quick Summary ---").bold());
	for line in quick_summary(bundle) {
		println!("{line}");
	}
}
