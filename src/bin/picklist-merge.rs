use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use picklist_merge::{
    AccountOutcome, AccountRegistry, ExportFormat, MergeConfig, MergeError, MergeReport,
    MergeSummary, MergeWarning, OutcomeStatus, PageSelection, UploadedFile, export,
    merge_picklists,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "picklist-merge",
    version,
    about = "Merge per-account picklists into one consolidated picklist"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge uploaded picklists and write the consolidated export.
    Merge(MergeArgs),
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Account upload as NAME=PATH. Repeatable.
    #[arg(short, long = "account", value_name = "NAME=PATH")]
    accounts: Vec<String>,

    /// JSON config with header synonyms, accounts and reader switches.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path. Defaults to the merge name in the current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export format (csv or xlsx). Inferred from --output when omitted.
    #[arg(short, long)]
    format: Option<String>,

    /// Merge name used for the file name and workbook sheet.
    #[arg(short, long)]
    name: Option<String>,

    /// Zero-based sheet index for spreadsheet uploads.
    #[arg(long)]
    sheet_index: Option<usize>,

    /// PDF page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Minimum cells required per candidate PDF table row.
    #[arg(long)]
    min_cols: Option<usize>,

    /// Match header synonyms ignoring ASCII case.
    #[arg(long)]
    case_insensitive: bool,

    /// Write per-account outcomes, summary and warnings as JSON.
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    outcomes: &'a [AccountOutcome],
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<MergeSummary>,
    warnings: &'a [MergeWarning],
}

enum RunResult {
    Merged(MergeReport),
    NoRows(Vec<AccountOutcome>),
}

fn parse_account(value: &str) -> Result<(String, PathBuf)> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid --account '{value}', expected format: NAME=PATH"))?;
    let name = name.trim();
    let path = path.trim();
    if name.is_empty() || path.is_empty() {
        anyhow::bail!("invalid --account '{value}', both name and path must be non-empty");
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn default_merge_name() -> String {
    format!(
        "merged_picklist_{}",
        chrono::Local::now().date_naive().format("%Y-%m-%d")
    )
}

fn export_format(args: &MergeArgs) -> Result<ExportFormat> {
    if let Some(format) = args.format.as_deref() {
        return ExportFormat::from_str(format)
            .map_err(|error| anyhow!(error))
            .context("failed to parse --format");
    }

    let inferred = args
        .output
        .as_deref()
        .and_then(Path::extension)
        .and_then(|extension| extension.to_str())
        .and_then(|extension| ExportFormat::from_str(extension).ok());
    Ok(inferred.unwrap_or(ExportFormat::Csv))
}

fn load_config(args: &MergeArgs) -> Result<MergeConfig> {
    let mut config = match &args.config {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => MergeConfig::default(),
    };

    if let Some(sheet_index) = args.sheet_index {
        config.sheet_index = sheet_index;
    }
    if let Some(min_cols) = args.min_cols {
        config.min_cols = min_cols;
    }
    if args.case_insensitive {
        config.case_insensitive_headers = true;
    }
    Ok(config)
}

fn read_uploads(
    accounts: &[(String, PathBuf)],
    mut registry: AccountRegistry,
) -> Result<(AccountRegistry, Vec<(String, UploadedFile)>)> {
    let mut files = Vec::with_capacity(accounts.len());
    for (name, path) in accounts {
        if !registry.contains(name) {
            registry = registry.with_account(name)?;
        }

        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read upload '{}'", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        files.push((name.clone(), UploadedFile::new(file_name, bytes)));
    }
    Ok((registry, files))
}

fn log_outcomes(outcomes: &[AccountOutcome]) {
    for outcome in outcomes {
        match outcome.status {
            OutcomeStatus::Success => eprintln!(
                "{}: merged {} row(s) from {} table(s)",
                outcome.account, outcome.rows_used, outcome.tables_used
            ),
            OutcomeStatus::Skipped | OutcomeStatus::Failed => eprintln!(
                "{}: {} ({})",
                outcome.account,
                if outcome.status == OutcomeStatus::Skipped {
                    "skipped"
                } else {
                    "failed"
                },
                outcome.reason.as_deref().unwrap_or("no reason given")
            ),
        }
    }
}

fn log_warnings(warnings: &[MergeWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    if verbose {
        for warning in warnings {
            eprintln!(
                "  - {:?} account={:?} page={:?} table_id={:?} confidence={:?}: {}",
                warning.code,
                warning.account,
                warning.page,
                warning.table_id,
                warning.confidence,
                warning.message
            );
        }
    }
}

fn write_json_report(path: &Path, report: &JsonReport<'_>) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report '{}'", path.display()))
}

fn run_merge(args: &MergeArgs) -> Result<RunResult> {
    let accounts = args
        .accounts
        .iter()
        .map(|value| parse_account(value))
        .collect::<Result<Vec<_>>>()?;
    let format = export_format(args)?;
    let config = load_config(args)?;

    let mut options = config.options();
    options.pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let registry = config.registry().context("invalid account list in config")?;
    let (registry, files) = read_uploads(&accounts, registry)?;
    if registry.is_empty() {
        anyhow::bail!("no accounts given; pass --account NAME=PATH or list accounts in --config");
    }
    let uploads = registry.uploads(files)?;

    let report = match merge_picklists(&uploads, &options) {
        Ok(report) => report,
        Err(MergeError::EmptyInput { outcomes }) => return Ok(RunResult::NoRows(outcomes)),
        Err(error) => return Err(error).context("failed to merge picklists"),
    };

    let merge_name = args.name.clone().unwrap_or_else(default_merge_name);
    let buffer = export(&report.rows, format, &merge_name)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&buffer.file_name));
    std::fs::write(&output, &buffer.bytes)
        .with_context(|| format!("failed to write output '{}'", output.display()))?;

    let summary = report.summary();
    eprintln!(
        "wrote {} product(s), {} unit(s) from {} account(s) to '{}'",
        summary.product_count,
        summary.total_quantity,
        summary.account_count,
        output.display()
    );
    Ok(RunResult::Merged(report))
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("picklist_merge=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => {
            let (outcomes, report, code) = match run_merge(&args) {
                Ok(RunResult::Merged(report)) => {
                    (report.outcomes.clone(), Some(report), ExitCode::SUCCESS)
                }
                Ok(RunResult::NoRows(outcomes)) => {
                    eprintln!("error: no account produced any usable rows");
                    (outcomes, None, ExitCode::from(2))
                }
                Err(error) => {
                    eprintln!("error: {error:#}");
                    return ExitCode::from(1);
                }
            };

            log_outcomes(&outcomes);
            let warnings = report
                .as_ref()
                .map_or(&[][..], |report| report.warnings.as_slice());
            log_warnings(warnings, args.verbose);

            if let Some(path) = &args.report_json {
                let json = JsonReport {
                    outcomes: &outcomes,
                    summary: report.as_ref().map(MergeReport::summary),
                    warnings,
                };
                if let Err(error) = write_json_report(path, &json) {
                    eprintln!("error: {error:#}");
                    return ExitCode::from(1);
                }
            }

            code
        }
    }
}
