#![forbid(unsafe_code)]

//! hwperf: collect HLS, Vivado and on-board timing results into report bundles.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hwperf_bundle::{compare, BundleStore};
use hwperf_core::config::DEFAULT_CONFIG_FILE;
use hwperf_core::ReportConfig;
use hwperf_remote::CancelFlag;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod output;
mod run;

use output::{render_comparison, render_list, ListRow, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "hwperf", version, about = "Collect, bundle and compare FPGA performance reports")]
struct Cli {
	/// Configuration file (TOML)
	#[arg(long, global = true, env = "HWPERF_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
	config: PathBuf,

	/// Debug logging on stderr (RUST_LOG takes precedence)
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Write a default config file and create the reports directory
	Init {
		#[arg(long)]
		force: bool,
	},
	/// Create a report bundle from the configured sources
	Run(run::RunArgs),
	/// List report bundles, newest first
	List {
		#[arg(long)]
		reports_dir: Option<PathBuf>,
		#[arg(long, value_enum, default_value_t = OutputFormat::Table)]
		format: OutputFormat,
	},
	/// Compare two bundles (names under the reports directory or paths)
	Compare {
		baseline: String,
		candidate: String,
		#[arg(long)]
		reports_dir: Option<PathBuf>,
		#[arg(long, value_enum, default_value_t = OutputFormat::Table)]
		format: OutputFormat,
	},
}

fn init_tracing(verbose: bool) {
	let default = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}

fn load_config(path: &Path) -> Result<ReportConfig> {
	ReportConfig::load_or_default(path)
		.and_then(ReportConfig::apply_env)
		.with_context(|| format!("loading config {}", path.display()))
}

fn cmd_init(config: &Path, force: bool) -> Result<()> {
	ReportConfig::write_template(config, force)?;
	let cfg = load_config(config)?;
	fs::create_dir_all(&cfg.reports_dir)
		.with_context(|| format!("creating reports directory {}", cfg.reports_dir.display()))?;
	let gitkeep = cfg.reports_dir.join(".gitkeep");
	if !gitkeep.exists() {
		fs::write(&gitkeep, "")?;
	}
	println!("Created config: {}", config.display());
	println!("Created reports directory: {}", cfg.reports_dir.display());
	println!();
	println!("Edit the config file to customize paths and KV260 SSH settings.");
	println!("Then run: hwperf run --label <label>");
	Ok(())
}

fn cmd_list(cfg: &ReportConfig, reports_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
	let store = BundleStore::new(reports_dir.unwrap_or_else(|| cfg.reports_dir.clone()));
	let rows: Vec<ListRow> = store.list()?.iter().map(ListRow::from_bundle).collect();
	println!("{}", render_list(&rows, format)?);
	Ok(())
}

fn cmd_compare(cfg: &ReportConfig, a: &str, b: &str, reports_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
	let store = BundleStore::new(reports_dir.unwrap_or_else(|| cfg.reports_dir.clone()));
	let baseline = store.load(a).with_context(|| format!("loading bundle {a}"))?;
	let candidate = store.load(b).with_context(|| format!("loading bundle {b}"))?;
	println!("{}", render_comparison(&compare(&baseline, &candidate), format)?);
	Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match cli.command {
		Commands::Init { force } => cmd_init(&cli.config, force),
		Commands::Run(args) => {
			let cfg = load_config(&cli.config)?;
			run::execute(&cfg, args, CancelFlag::new()).await
		}
		Commands::List { reports_dir, format } => cmd_list(&load_config(&cli.config)?, reports_dir, format),
		Commands::Compare { baseline, candidate, reports_dir, format } => {
			cmd_compare(&load_config(&cli.config)?, &baseline, &candidate, reports_dir, format)
		}
	}
}
