// labelrecon - reconcile crowdsourced transcriptions of specimen labels

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use labelrecon::ReconError;

#[derive(Parser, Debug)]
#[command(name = "labelrecon")]
#[command(about = "Reconcile volunteer transcriptions into one record per subject")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  labelrecon export.csv -c 'country:select,locality:text' -r reconciled.csv
  labelrecon export.csv --config labels.toml -u raw.csv -r out.csv -s summary.html -e
  labelrecon export.json --format json -r out.csv -z outputs.zip
  labelrecon export.csv --config labels.toml --json > summary.json")]
pub struct Cli {
    /// Classification export to reconcile
    pub input: PathBuf,

    /// Input format (default: from the file extension, else csv)
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Write the unreconciled rows as CSV
    #[arg(long, short = 'u', value_name = "PATH")]
    pub unreconciled: Option<PathBuf>,

    /// Write the reconciled rows as CSV
    #[arg(long, short = 'r', value_name = "PATH")]
    pub reconciled: Option<PathBuf>,

    /// Write the HTML summary report
    #[arg(long, short = 's', value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Add an explanation column after each reconciled column
    #[arg(long, short = 'e')]
    pub explanations: bool,

    /// Pack the outputs into a zip archive and remove the originals
    #[arg(long, short = 'z', value_name = "PATH", conflicts_with = "zip_keep")]
    pub zip: Option<PathBuf>,

    /// Pack the outputs into a zip archive and keep the originals
    #[arg(long, value_name = "PATH")]
    pub zip_keep: Option<PathBuf>,

    /// Partial-ratio score (0-100) a fuzzy text match must reach [default: 90]
    #[arg(long, allow_hyphen_values = true)]
    pub fuzzy_ratio_threshold: Option<i32>,

    /// Token-set-ratio score (0-100) a fuzzy text match must reach [default: 50]
    #[arg(long, allow_hyphen_values = true)]
    pub fuzzy_set_threshold: Option<i32>,

    /// Join highlights this many characters apart or closer [default: 6]
    #[arg(long)]
    pub join_distance: Option<u32>,

    /// Column that groups classifications into subjects [default: subject_id]
    #[arg(long)]
    pub group_by: Option<String>,

    /// Subjects per page in the summary detail section
    #[arg(long, default_value_t = labelrecon_io::report::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Leave the per-subject detail out of the summary
    #[arg(long)]
    pub no_summary_detail: bool,

    /// Column types as name:type pairs. Repeatable; comma-separated accepted.
    /// Types: noop, same, select, text, box, point, length, polygon, highlight, mark_index
    #[arg(long, short = 'c', value_name = "PAIRS")]
    pub column_types: Vec<String>,

    /// Score adjustments for fuzzy text matches as user:weight pairs. Repeatable.
    #[arg(long, value_name = "PAIRS")]
    pub user_weights: Vec<String>,

    /// Keep only rows of this workflow (matched against the workflow_id column)
    #[arg(long)]
    pub workflow_id: Option<u64>,

    /// Workflow name shown in messages and the summary
    #[arg(long)]
    pub workflow_name: Option<String>,

    /// Keep at most this many classifications per subject [default: 50]
    #[arg(long)]
    pub max_transcriptions: Option<usize>,

    /// TOML run configuration; flags override its values
    #[arg(long, value_name = "TOML", env = "LABELRECON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Log progress to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LABELRECON_COMMIT"), ")",
        "\nengine:  labelrecon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("LABELRECON_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    match run::cmd_run(cli) {
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

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("name the grouping column with --group-by".to_string())
            }
            ReconError::EmptyInput { .. } => {
                Some("check --workflow-id against the workflow_id column".to_string())
            }
            ReconError::UnknownFieldType { .. } => Some(
                "types are noop, same, select, text, box, point, length, polygon, highlight, mark_index"
                    .to_string(),
            ),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
