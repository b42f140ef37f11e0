//! arch-fence CLI tool.
//!
//! Usage:
//! ```bash
//! arch-fence check [OPTIONS] [PATH]
//! arch-fence rules
//! arch-fence init
//! arch-fence clean
//! ```
//!
//! Exit codes: 0 when no violations were found, 1 when some were, 2 when
//! the tool itself failed (bad configuration, unreadable root, timeout).

use anyhow::Result;
use arch_fence_core::AnalyzerError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Import-boundary enforcement for layered codebases
#[derive(Parser)]
#[command(name = "arch-fence")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ARCH_FENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check imports against the configured rules
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Number of worker threads (default: CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Analyze every file, ignoring and not updating the cache
        #[arg(long)]
        no_cache: bool,

        /// Abort after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// List the configured rules
    Rules {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Delete the incremental cache
    Clean {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

/// Options for the check command.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Worker thread override.
    pub jobs: Option<usize>,
    /// Disable incremental mode.
    pub no_cache: bool,
    /// Timeout override.
    pub timeout: Option<u64>,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report(err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Check {
            path,
            format,
            jobs,
            no_cache,
            timeout,
            exclude,
        } => {
            let source = config_resolver::resolve(&path, explicit);
            let options = CheckOptions {
                format,
                jobs,
                no_cache,
                timeout,
                exclude,
            };
            commands::check::run(&path, &options, &source)
        }
        Commands::Rules { path } => {
            let source = config_resolver::resolve(&path, explicit);
            commands::rules::run(&path, &source)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(std::path::Path::new("."), force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clean { path } => {
            let source = config_resolver::resolve(&path, explicit);
            commands::clean::run(&path, &source)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Prints a failure, with diagnostic codes for engine errors.
fn report(err: anyhow::Error) {
    match err.downcast::<AnalyzerError>() {
        Ok(e) => eprintln!("{:?}", miette::Report::new(e)),
        Err(err) => eprintln!("Error: {err:#}"),
    }
}
