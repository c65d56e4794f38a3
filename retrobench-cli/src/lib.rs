//! RetroBench CLI Library
//!
//! Command-line front end of the harness: argument parsing, configuration,
//! declaration loading, the serial runner and report rendering.
//!
//! # Example
//!
//! ```ignore
//! fn main() {
//!     std::process::exit(retrobench_cli::exit_code(retrobench_cli::run()));
//! }
//! ```

mod config;
pub mod declaration;
pub mod environment;
mod executor;
pub mod interrupt;
mod planner;
mod settings;

pub use config::*;
pub use declaration::DeclarationError;
pub use executor::{Runner, build_report_meta, format_human_output};
pub use planner::{ExecutionPlan, build_plan};
pub use settings::Settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use retrobench_core::{
    ContentCatalog, DirectoryCatalog, EngineSession, Integrations, LibretroFactory,
    StaticRegistry, plan_representative_specs,
};
use retrobench_report::{ExitStatus, OutputFormat, finalize, generate_json_report};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RetroBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "retrobench")]
#[command(
    author,
    version,
    about = "RetroBench - single-threaded throughput benchmark for emulation cores"
)]
pub struct Cli {
    /// Optional subcommand (Run, List, Discover); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Timed seconds per entry [default: 5.0]
    #[arg(long, allow_negative_numbers = true)]
    pub seconds: Option<f64>,

    /// Steps run before timing starts [default: 30]
    #[arg(long)]
    pub warmup_steps: Option<u64>,

    /// Declaration file [default: benchmark.json next to the binary]
    #[arg(long)]
    pub benchmark_json: Option<PathBuf>,

    /// Integration tiers searched for content: default|stable|contrib|experimental|custom|all [default: all]
    #[arg(long)]
    pub integrations: Option<Integrations>,

    /// Capture a frame after every step (includes capture overhead)
    #[arg(long)]
    pub screen: bool,

    /// Export STABLE_RETRO_HW_RENDER=1 before loading cores
    #[arg(long)]
    pub hw_render: bool,

    /// Export STABLE_RETRO_PARALLEL_N64_GFXPLUGIN before loading cores
    #[arg(long)]
    pub n64_gfxplugin: Option<String>,

    /// Content root with stable/, experimental/ and contrib/
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding <core>_libretro shared libraries
    #[arg(long)]
    pub core_dir: Option<PathBuf>,

    /// Only run entries whose core_lib/system/game matches this regex
    #[arg(long)]
    pub filter: Option<String>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the declared benchmarks (default)
    Run,
    /// List the entries that would run
    List,
    /// Print a declaration with one representative workload per core library
    Discover,
}

/// Run the RetroBench CLI with the process arguments.
///
/// # Returns
/// The exit status of a completed run, or an error for fatal configuration
/// problems (exit code 1).
pub fn run() -> anyhow::Result<ExitStatus> {
    run_from(std::env::args_os())
}

/// Run the RetroBench CLI with explicit arguments (the first is the program name).
///
/// `--help` and `--version` print and exit 0. Any other argument error is
/// returned, so it maps to exit code 1 like every other fatal error.
pub fn run_from<I, T>(args: I) -> anyhow::Result<ExitStatus>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => return Err(anyhow::Error::new(e).context("invalid command-line arguments")),
    };
    run_with_cli(cli)
}

/// Process exit code for the outcome of [`run`]: the run's status code, or 1
/// after printing a fatal error to stderr.
pub fn exit_code(result: anyhow::Result<ExitStatus>) -> i32 {
    match result {
        Ok(status) => status.code(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    }
}

/// Run the RetroBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<ExitStatus> {
    init_logging(cli.verbose);

    // Discover retrobench.toml configuration (CLI flags override)
    let config = RetroBenchConfig::discover().unwrap_or_default();
    let settings = Settings::resolve(&cli, &config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_benchmarks(&settings),
        Commands::List => list_entries(&settings),
        Commands::Discover => discover(&settings),
    }
}

/// Logs go to stderr; stdout carries only the report.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "retrobench=debug"
    } else {
        "retrobench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Ignore a second initialization (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_plan(settings: &Settings) -> anyhow::Result<ExecutionPlan> {
    let specs = declaration::load(&settings.benchmark_json)?;
    let plan = build_plan(specs, settings.filter.as_ref());
    if plan.filtered_out > 0 {
        tracing::info!(
            kept = plan.specs.len(),
            filtered_out = plan.filtered_out,
            "applied entry filter"
        );
    }
    Ok(plan)
}

fn run_benchmarks(settings: &Settings) -> anyhow::Result<ExitStatus> {
    // Before anything can load a core.
    let hinted = environment::apply_single_thread_hints();
    if !hinted.is_empty() {
        tracing::debug!(?hinted, "applied single-thread hints");
    }
    environment::export_engine_toggles(settings.hw_render, settings.n64_gfxplugin.as_deref());

    let plan = load_plan(settings)?;
    let cancel = interrupt::install();

    let registry = StaticRegistry::builtin();
    let catalog = DirectoryCatalog::new(&settings.data_dir, &registry)
        .with_custom_dirs(settings.custom_dirs.iter().cloned());
    let factory = LibretroFactory::new(&settings.core_dir);
    let session = EngineSession::new(&factory, settings.session_config());

    tracing::info!(
        entries = plan.specs.len(),
        seconds = settings.seconds,
        integrations = %settings.integrations,
        "starting benchmark run"
    );

    let runner = Runner::new(&registry, &catalog, session, settings.integrations)
        .with_progress(settings.progress);
    let outcome = runner.run(&plan.specs, cancel);

    let meta = build_report_meta(&settings.benchmark_json, settings.run_settings());
    let (report, status) = finalize(outcome, meta);

    match settings.format {
        OutputFormat::Human => print!("{}", format_human_output(&report)),
        OutputFormat::Json => println!(
            "{}",
            generate_json_report(&report).context("failed to serialize report")?
        ),
    }

    Ok(status)
}

fn list_entries(settings: &Settings) -> anyhow::Result<ExitStatus> {
    let plan = load_plan(settings)?;

    println!("RetroBench Plan ({}):", settings.benchmark_json.display());
    for spec in &plan.specs {
        println!("├── {} | {} | {}", spec.core_lib, spec.system, spec.game);
    }
    if plan.filtered_out > 0 {
        println!(
            "{} entries planned ({} filtered out).",
            plan.specs.len(),
            plan.filtered_out
        );
    } else {
        println!("{} entries planned.", plan.specs.len());
    }

    Ok(ExitStatus::Success)
}

fn discover(settings: &Settings) -> anyhow::Result<ExitStatus> {
    let registry = StaticRegistry::builtin();
    let catalog = DirectoryCatalog::new(&settings.data_dir, &registry)
        .with_custom_dirs(settings.custom_dirs.iter().cloned());

    let candidates = catalog
        .installed(settings.integrations)
        .with_context(|| format!("failed to scan {}", settings.data_dir.display()))?;
    let specs = plan_representative_specs(&registry, &candidates);

    if specs.is_empty() {
        tracing::warn!(
            data_dir = %settings.data_dir.display(),
            integrations = %settings.integrations,
            "no installed content found"
        );
        return Ok(ExitStatus::NothingRan);
    }

    tracing::info!(
        candidates = candidates.len(),
        entries = specs.len(),
        "discovered representative workloads"
    );
    println!(
        "{}",
        declaration::to_json(&specs).context("failed to render declaration")?
    );
    Ok(ExitStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_flags() {
        let cli = Cli::parse_from([
            "retrobench",
            "--seconds",
            "1.5",
            "--warmup-steps",
            "0",
            "--screen",
            "--integrations",
            "contrib",
            "list",
        ]);
        assert_eq!(cli.command, Some(Commands::List));
        assert_eq!(cli.seconds, Some(1.5));
        assert_eq!(cli.warmup_steps, Some(0));
        assert!(cli.screen);
        assert_eq!(cli.integrations, Some(Integrations::Contrib));
    }

    #[test]
    fn rejects_unknown_integrations() {
        let err = Cli::try_parse_from(["retrobench", "--integrations", "nightly"]).unwrap_err();
        assert!(err.to_string().contains("nightly"));
    }

    #[test]
    fn invalid_flags_exit_with_one() {
        for args in [
            &["retrobench", "--integrations", "nightly"][..],
            &["retrobench", "--warmup-steps", "-1"][..],
            &["retrobench", "--format", "xml"][..],
            &["retrobench", "--seconds", "0"][..],
        ] {
            let result = run_from(args.iter().copied());
            assert!(result.is_err(), "{args:?}");
            assert_eq!(exit_code(result), 1, "{args:?}");
        }
    }

    #[test]
    fn exit_code_follows_run_status() {
        assert_eq!(exit_code(Ok(ExitStatus::Success)), 0);
        assert_eq!(exit_code(Ok(ExitStatus::NothingRan)), 2);
    }

    #[test]
    fn defaults_to_run() {
        let cli = Cli::parse_from(["retrobench"]);
        assert_eq!(cli.command, None);
        assert!(!cli.hw_render);
        assert!(cli.format.is_none());
    }
}
