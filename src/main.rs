use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use app_ads_builder::config::{Config, Environment};
use app_ads_builder::constants;
use app_ads_builder::logging;
use app_ads_builder::pipeline::{BuildOptions, BuildOutcome, Pipeline};

#[derive(Parser)]
#[command(name = "app_ads_builder")]
#[command(about = "Builds a deduplicated app-ads.txt from per-network seller lists")]
#[command(version)]
struct Cli {
    /// Build configuration (TOML)
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Environment tag; `prod` makes duplicates and invalid lines fatal
    #[arg(long, global = true, env = constants::ENV_VAR, default_value = constants::DEFAULT_ENV)]
    env: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the manifest and build log, then apply the build gate
    Build {
        /// Write the manifest here instead of the environment-derived path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip writing the build log and the trace file
        #[arg(long)]
        no_log: bool,
        /// Print the build summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Run validation, dedup and the change report without writing any file;
    /// tracing goes to stderr only
    Check {
        /// Compare against this manifest instead of the environment-derived path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the build summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Only a logged build leaves files in the log directory
    fn writes_logs(&self) -> bool {
        matches!(self, Commands::Build { no_log: false, .. })
    }
}

fn print_summary(outcome: &BuildOutcome) {
    let result = &outcome.result;
    println!("\n📊 Build results (env: {}):", outcome.environment);
    if outcome.written {
        println!("   Output: {}", outcome.output_path.display());
    } else {
        println!("   Output: {} (dry run, not written)", outcome.output_path.display());
    }
    println!("   Entries: {}", result.total_entries());
    for change in &result.changes.networks {
        println!(
            "   {}: +{} / -{} / Δ{:+} (total {})",
            change.network, change.added, change.removed, change.net, change.total
        );
    }
    for retired in &result.changes.retired {
        println!("   {}: retired, -{} entries", retired.network, retired.entries);
    }
    println!("   Duplicates: {}", result.duplicates.len());
    println!("   Invalid lines: {}", result.invalid_lines.len());
    println!("   Invalid cert ids removed: {}", result.dropped_certs.len());
    if !result.missing_sources.is_empty() {
        println!("   Missing sources: {}", result.missing_sources.join(", "));
    }
    if let Some(log_path) = &outcome.log_path {
        println!("   Build log: {}", log_path.display());
    }
    println!("   Gate: {}", outcome.gate.decision.as_str());
}

fn report(outcome: &BuildOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print_summary(outcome);
    }
    Ok(())
}

fn run(config: Config, env: &str, command: Commands) -> anyhow::Result<()> {
    let environment = Environment::parse(env);
    info!(env = %environment, networks = config.networks.len(), "Starting build");

    let (outcome, json) = match command {
        Commands::Build { output, no_log, json } => {
            let pipeline = Pipeline::new(
                config,
                BuildOptions {
                    environment,
                    output_override: output,
                    write_log: !no_log,
                },
            );
            (pipeline.run()?, json)
        }
        Commands::Check { output, json } => {
            let pipeline = Pipeline::new(
                config,
                BuildOptions {
                    environment,
                    output_override: output,
                    write_log: false,
                },
            );
            (pipeline.check()?, json)
        }
    };

    report(&outcome, json)?;
    outcome.gate.into_result()?;
    Ok(())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Held until main returns so the failure below still reaches the trace file
    let _guard = logging::init_logging(
        cli.command
            .writes_logs()
            .then_some(config.log_dir.as_path()),
    );

    match run(config, &cli.env, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Build failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Commands {
        let mut argv = vec!["app_ads_builder"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_only_logged_builds_write_trace_files() {
        assert!(command(&["build"]).writes_logs());
        assert!(!command(&["build", "--no-log"]).writes_logs());
        assert!(!command(&["check"]).writes_logs());
        assert!(!command(&["check", "--json"]).writes_logs());
    }
}
