//! Binary entry point for the estrim CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Rename bindings to short names (ESTree JSON in, ESTree JSON out)
//! estrim mangle program.json --reserved exports --seed 7
//!
//! # Fold constants and drop unreachable statements, reading stdin
//! acorn --ecma2024 app.js | estrim optimize
//!
//! # Both, compact output to a file
//! estrim minify program.json --compact --output program.min.json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use estrim::cli::{read_tree, run_mangle, run_minify, run_optimize, write_tree};
use estrim::config::EstrimConfig;
use estrim::output::{emit_response, ErrorResponse};
use estrim_core::{ErrorCode, TreeError};

// ============================================================================
// CLI Structure
// ============================================================================

/// Mangle and optimize ESTree programs.
///
/// Input and output are ESTree JSON documents. Errors are reported as a JSON
/// envelope on stdout with a non-zero exit code.
#[derive(Parser, Debug)]
#[command(name = "estrim", version, about = "Mangle and optimize ESTree programs")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout.
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Emit single-line JSON.
    #[arg(long, global = true)]
    compact: bool,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Arguments shared by the mangling subcommands.
#[derive(clap::Args, Debug)]
struct MangleArgs {
    /// Binding name to leave untouched (repeatable).
    #[arg(long = "reserved", value_name = "NAME")]
    reserved: Vec<String>,

    /// Seed for the generated-name alphabet.
    #[arg(long)]
    seed: Option<u64>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Rename declared bindings to short generated names.
    Mangle {
        /// ESTree JSON file (default: stdin).
        input: Option<PathBuf>,
        #[command(flatten)]
        args: MangleArgs,
    },
    /// Fold constant expressions and prune unreachable statements.
    Optimize {
        /// ESTree JSON file (default: stdin).
        input: Option<PathBuf>,
    },
    /// Optimize, then mangle.
    Minify {
        /// ESTree JSON file (default: stdin).
        input: Option<PathBuf>,
        #[command(flatten)]
        args: MangleArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.global.log_level, cli.global.log_format);

    // Execute command and handle errors
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = ErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like results
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` overrides `--log-level`.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), TreeError> {
    let config = EstrimConfig::load_or_default(cli.global.config.as_deref())?;
    let compact = cli.global.compact || config.output.compact;
    let output = cli.global.output.as_deref();

    match cli.command {
        Command::Mangle { input, args } => {
            let config = config.with_mangle_overrides(&args.reserved, args.seed);
            let mut tree = read_tree(input.as_deref())?;
            run_mangle(&mut tree, &config)?;
            write_tree(&tree, output, compact)
        }
        Command::Optimize { input } => {
            let mut tree = read_tree(input.as_deref())?;
            run_optimize(&mut tree)?;
            write_tree(&tree, output, compact)
        }
        Command::Minify { input, args } => {
            let config = config.with_mangle_overrides(&args.reserved, args.seed);
            let mut tree = read_tree(input.as_deref())?;
            run_minify(&mut tree, &config)?;
            write_tree(&tree, output, compact)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
