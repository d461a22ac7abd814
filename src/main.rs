use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cappatch_cli::catalog::{Catalog, builtin_catalog};
use cappatch_cli::engine::Patcher;
use cappatch_cli::rules::RuleSet;

#[derive(Parser)]
#[command(name = "cappatch")]
#[command(
	author,
	version,
	about = "CLI tool for retargeting hard-coded capability constants in source trees"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Log every rule that matched (RUST_LOG takes precedence)
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Patch the target files under a source tree
	Apply {
		/// Root of the source tree
		src: PathBuf,

		/// Profile to apply. Unknown names fall back to the minimal
		/// profile with a warning instead of failing [default: high]
		#[arg(short, long)]
		profile: Option<String>,

		/// GPU identity preset to report [default: rx6700xt]
		#[arg(short, long)]
		gpu: Option<String>,

		/// Show which files would change without writing them
		#[arg(short = 'n', long)]
		dry_run: bool,
	},
	/// List GPU presets, profiles, categories and rules
	List {
		/// GPU identity preset used to render the device-identity rules
		#[arg(short, long)]
		gpu: Option<String>,
	},
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match run(cli.command) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: bool) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.without_time()
		.try_init();
}

fn run(command: Commands) -> Result<ExitCode> {
	let catalog = builtin_catalog().context("Failed to load the built-in rule catalog")?;

	match command {
		Commands::Apply {
			src,
			profile,
			gpu,
			dry_run,
		} => {
			let rule_set = load_rule_set(&catalog, gpu.as_deref())?;
			handle_apply(&rule_set, &src, profile.as_deref(), dry_run)
		}
		Commands::List { gpu } => {
			let rule_set = load_rule_set(&catalog, gpu.as_deref())?;
			handle_list(&catalog, &rule_set);
			Ok(ExitCode::SUCCESS)
		}
	}
}

fn load_rule_set(catalog: &Catalog, gpu: Option<&str>) -> Result<RuleSet> {
	let gpu = catalog.gpu(gpu).context("Failed to select GPU preset")?;
	catalog
		.rule_set(gpu)
		.with_context(|| format!("Failed to build rules for GPU preset {}", gpu.name))
}

fn handle_apply(
	rule_set: &RuleSet,
	src: &Path,
	profile: Option<&str>,
	dry_run: bool,
) -> Result<ExitCode> {
	let profile = profile.unwrap_or(rule_set.default_profile());
	let patcher = Patcher::for_profile(rule_set, profile)
		.with_context(|| format!("Failed to resolve profile {profile}"))?
		.dry_run(dry_run);

	let report = patcher
		.run(src)
		.with_context(|| format!("Failed to patch {}", src.display()))?;

	let verb = if dry_run { "would change" } else { "changed" };
	println!(
		"{} file(s) {verb} ({} visited) under {}",
		report.changed_count(),
		report.visited,
		report.search_root.display()
	);

	if report.is_clean() {
		return Ok(ExitCode::SUCCESS);
	}

	for (path, e) in &report.failed {
		eprintln!("error: {}: {e:?}", path.display());
	}
	eprintln!("{} file(s) could not be patched", report.failed.len());
	Ok(ExitCode::FAILURE)
}

fn handle_list(catalog: &Catalog, rule_set: &RuleSet) {
	println!("GPU presets:");
	for gpu in &catalog.gpus {
		let marker = if gpu.name == catalog.default_gpu {
			" (default)"
		} else {
			""
		};
		println!(
			"  {}{marker}: {}:{} {} ({} MiB)",
			gpu.name, gpu.vendor_id, gpu.device_id, gpu.description, gpu.memory_mb
		);
	}

	println!();
	println!("Profiles:");
	for profile in rule_set.profiles() {
		let marker = if profile.name == rule_set.default_profile() {
			" (default)"
		} else if profile.name == rule_set.fallback_profile() {
			" (fallback)"
		} else {
			""
		};
		println!("  {}{marker}: {}", profile.name, profile.categories.join(", "));
	}

	println!();
	println!("Categories:");
	for category in rule_set.categories() {
		println!("  {}: {}", category.name, category.description);
		for rule in &category.rules {
			println!("    {}: {} -> {}", rule.id, rule.pattern, rule.replacement);
		}
	}
}
