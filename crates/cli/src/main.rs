// faed - resolve duplicate FAED signalisations in a register export

mod exit_codes;
mod run;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "faed")]
#[command(about = "Resolve duplicate signalisations in a FAED/GASPARD register export")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve duplicates and export the reports
    #[command(after_help = "\
Examples:
  faed run extraction.csv
  faed run extraction.csv --export-dir /srv/faed/exports --no-backup
  faed run extraction.csv --config policy.toml --json > result.json
  faed run extraction.csv --no-export --strict-exit")]
    Run(RunArgs),

    /// Check an input table without resolving or writing anything
    #[command(after_help = "\
Examples:
  faed validate extraction.csv
  faed validate extraction.csv --delimiter ';' --json")]
    Validate {
        /// Register export (CSV with header row)
        input: PathBuf,

        /// Engine config (TOML); only date formats and UNA rule matter here
        #[arg(long)]
        config: Option<PathBuf>,

        /// Field delimiter (sniffed when omitted)
        #[arg(long)]
        delimiter: Option<char>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Register export (CSV with header row)
    pub input: PathBuf,

    /// Engine config (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base directory for reports (default from settings)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Directory for the input backup (default from settings)
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Do not copy the input file before processing
    #[arg(long)]
    pub no_backup: bool,

    /// Do not write report files
    #[arg(long)]
    pub no_export: bool,

    /// Field delimiter (sniffed when omitted)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Exit with code 6 when any signalisation is to be deleted
    #[arg(long)]
    pub strict_exit: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  faed-dedup ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Logging goes to stderr; `RUST_LOG` overrides the flag-derived level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    builder.format_timestamp(None);
    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Validate { input, config, delimiter, json } => {
            validate::cmd_validate(input, config, delimiter, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<faed_io::IoError> for CliError {
    fn from(err: faed_io::IoError) -> Self {
        let code = exit_codes::io_exit_code(&err);
        let error = Self::new(code, err.to_string());
        match err {
            faed_io::IoError::Table {
                source: faed_dedup::DedupError::MissingColumn { .. },
                ..
            } => error.with_hint(format!(
                "required columns: {}",
                faed_dedup::loader::REQUIRED_COLUMNS.join(", ")
            )),
            _ => error,
        }
    }
}

impl From<faed_dedup::DedupError> for CliError {
    fn from(err: faed_dedup::DedupError) -> Self {
        Self::new(exit_codes::dedup_exit_code(&err), err.to_string())
    }
}

/// Delimiter flag as a byte; only ASCII delimiters are meaningful to the CSV reader.
pub fn delimiter_byte(delimiter: Option<char>) -> Result<Option<u8>, CliError> {
    match delimiter {
        None => Ok(None),
        Some(c) if c.is_ascii() => Ok(Some(c as u8)),
        Some(c) => Err(CliError::args(format!("delimiter must be an ASCII character, got '{c}'"))),
    }
}

/// Load `--config`, or the built-in policy.
pub fn load_config(path: Option<&PathBuf>) -> Result<faed_dedup::DedupConfig, CliError> {
    match path {
        None => Ok(faed_dedup::DedupConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                let message = format!("cannot read config {}: {e}", path.display());
                CliError::new(exit_codes::EXIT_IO, message)
            })?;
            Ok(faed_dedup::DedupConfig::from_toml(&text)?)
        }
    }
}
