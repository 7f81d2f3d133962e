//! Purpose: `setsim-results` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout (pretty on a TTY, compact otherwise).
//! Invariants: Non-interactive errors and notices are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`.
use std::error::Error as StdError;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use setsim_results::core::error::{Error, ErrorKind, to_exit_code};
use setsim_results::notice::{Notice, notice_json};
use setsim_results::results::load::ErrorPolicy;
use setsim_results::results::stats::{Aggregate, Measure};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os().collect::<Vec<OsString>>()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `setsim-results --help`."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command)
        .map_err(add_malformed_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
}

#[derive(Parser)]
#[command(
    name = "setsim-results",
    version,
    about = "Decode set-similarity benchmark logs and summarize them by query size",
    long_about = None,
    after_help = r#"EXAMPLES
  $ setsim-results decode actions 'l5o2s10o3'
  $ setsim-results summarize results/canada_us_uk/100/merge_probe_cost_model_greedy/1k_10.csv:JOSIE-D
  $ setsim-results actions a.csv:ProbeSet-D b.csv:JOSIE-D --errors skip

Set RUST_LOG=info to see per-file query counts on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Decode one encoded column value and print it as JSON")]
    Decode {
        #[command(subcommand)]
        target: DecodeTarget,
    },
    #[command(about = "Estimate the read cost of an encoded action log (nanoseconds)")]
    Cost {
        #[arg(help = "Encoded actions, e.g. l120s4000o12")]
        encoded: String,
    },
    #[command(about = "Aggregate one measure over query-size intervals for each result file")]
    Summarize {
        #[arg(required = true, help = "Result file(s) as <path>[:<label>]")]
        inputs: Vec<String>,
        #[arg(long, value_enum, default_value = "duration", help = "Per-query measure")]
        measure: MeasureCli,
        #[arg(long = "agg", value_enum, default_value = "mean", help = "Aggregate per interval")]
        aggregate: AggregateCli,
        #[command(flatten)]
        intervals: IntervalArgs,
    },
    #[command(about = "Decode the actions column of result files and report read totals")]
    Actions {
        #[arg(required = true, help = "Result file(s) as <path>[:<label>]")]
        inputs: Vec<String>,
        #[arg(long, value_enum, default_value = "stop", help = "Malformed row policy")]
        errors: ErrorPolicyCli,
        #[arg(long = "quiet-skips", help = "Suppress skip notices on stderr")]
        quiet_skips: bool,
    },
    #[command(about = "Per-interval mean duration improvement of a variant over a baseline")]
    Improvement {
        #[arg(help = "Baseline result file as <path>[:<label>]")]
        baseline: String,
        #[arg(help = "Variant result file as <path>[:<label>]")]
        variant: String,
        #[command(flatten)]
        intervals: IntervalArgs,
    },
    #[command(about = "Overlap precision of a result file's top-k hits against ground truth")]
    Precision {
        #[arg(help = "Result file as <path>[:<label>]")]
        results: String,
        #[arg(help = "Ground-truth result file (exact algorithm)")]
        ground_truth: String,
        #[arg(long, value_enum, default_value = "stop", help = "Malformed row policy")]
        errors: ErrorPolicyCli,
    },
    #[command(about = "Print the result file path for an algorithm run")]
    Locate {
        #[arg(long, default_value = "results", help = "Root result directory")]
        result_dir: PathBuf,
        #[arg(long, default_value = "canada_us_uk", help = "Benchmark name")]
        benchmark: String,
        #[arg(long, default_value_t = 100, help = "Index scale (percent)")]
        scale: u32,
        #[arg(long, help = "Algorithm label or directory name, e.g. JOSIE-D")]
        algorithm: String,
        #[arg(long, default_value = "1k", help = "Query scale, e.g. 1k, 10k")]
        query_scale: String,
        #[arg(long, default_value_t = 10, help = "Top-k")]
        k: u32,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

#[derive(Subcommand)]
enum DecodeTarget {
    #[command(about = "Decode an actions value (l<freq>[o<overlap>] / s<size>o<overlap>)")]
    Actions { encoded: String },
    #[command(name = "benefit-cost", about = "Decode a benefit_cost value")]
    BenefitCost { encoded: String },
    #[command(about = "Decode a results value (s<set_id>o<overlap>)")]
    Hits { encoded: String },
}

#[derive(clap::Args, Clone, Copy)]
struct IntervalArgs {
    #[arg(long, default_value_t = 1000, help = "Largest query size covered by the intervals")]
    max_query_size: u64,
    #[arg(long = "intervals", default_value_t = 10, help = "Number of query-size intervals")]
    count: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum ErrorPolicyCli {
    Stop,
    Skip,
}

impl From<ErrorPolicyCli> for ErrorPolicy {
    fn from(value: ErrorPolicyCli) -> Self {
        match value {
            ErrorPolicyCli::Stop => ErrorPolicy::Stop,
            ErrorPolicyCli::Skip => ErrorPolicy::Skip,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum AggregateCli {
    Mean,
    Std,
}

impl From<AggregateCli> for Aggregate {
    fn from(value: AggregateCli) -> Self {
        match value {
            AggregateCli::Mean => Aggregate::Mean,
            AggregateCli::Std => Aggregate::Std,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum MeasureCli {
    Duration,
    SetRead,
    ListRead,
    MaxCounter,
    MaxSetSizeRead,
    MaxListSizeRead,
    MaxIgnores,
    MemoryFootprint,
    Precision,
}

impl From<MeasureCli> for Measure {
    fn from(value: MeasureCli) -> Self {
        match value {
            MeasureCli::Duration => Measure::Duration,
            MeasureCli::SetRead => Measure::NumSetRead,
            MeasureCli::ListRead => Measure::NumListRead,
            MeasureCli::MaxCounter => Measure::MaxCounterSize,
            MeasureCli::MaxSetSizeRead => Measure::MaxSetSizeRead,
            MeasureCli::MaxListSizeRead => Measure::MaxListSizeRead,
            MeasureCli::MaxIgnores => Measure::MaxIgnoreSize,
            MeasureCli::MemoryFootprint => Measure::MemoryFootprint,
            MeasureCli::Precision => Measure::LshPrecision,
        }
    }
}

fn add_malformed_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Malformed || err.hint().is_some() {
        return err;
    }
    err.with_hint("Input does not follow the benchmark's compact encoding; check the offset.")
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint("Check the path, or use `setsim-results locate`."),
        ErrorKind::Io => err.with_hint("I/O error. Check the path and file permissions."),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice) {
    if io::stderr().is_terminal() {
        eprintln!("notice: {} (input: {})", notice.message, notice.input);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Malformed => "malformed input".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(row) = err.row() {
        inner.insert("query_id".to_string(), json!(row));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(row) = err.row() {
        lines.push(format!("query_id: {row}"));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("offset: {offset}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
