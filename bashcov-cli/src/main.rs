//! Bashcov Command Line Interface
//!
//! # Commands
//!
//! - `bashcov ps4` - Print the PS4 value traced shells must use
//! - `bashcov aggregate` - Turn a captured xtrace file into per-line counts
//! - `bashcov classify` - Check whether a single line is a trace record

mod aggregate;

use std::path::PathBuf;

use aggregate::OutputFormat;
use bashcov_core::LineClassifier;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// bashcov - line coverage for bash scripts
#[derive(Parser)]
#[command(name = "bashcov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the PS4 format string
    Ps4,

    /// Aggregate a captured xtrace file
    ///
    /// Examples:
    ///   bashcov aggregate xtrace.log
    ///   bashcov aggregate xtrace.log --root ./project --format json
    Aggregate {
        /// File holding the trace output
        trace: PathBuf,

        /// Directory relative trace paths are resolved against
        #[arg(long, env = "BASHCOV_ROOT")]
        root: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Report whether a line is a trace record
    Classify {
        /// Line to classify
        line: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ps4 => {
            println!("{}", bashcov_core::ps4());
            Ok(())
        }
        Commands::Aggregate {
            trace,
            root,
            format,
        } => aggregate::run(&trace, root, format),
        Commands::Classify { line } => {
            match LineClassifier::shared().classify(line.as_bytes()) {
                Some(record) => println!(
                    "record depth={} file={} line={}",
                    record.depth,
                    record.filename.display(),
                    record.lineno
                ),
                None => println!("noise"),
            }
            Ok(())
        }
    }
}
