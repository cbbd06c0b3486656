//! Confidence Tracker CLI
//!
//! Usage:
//!   confidence-tracker --text "<model response>"      # Parse one response
//!   confidence-tracker --ingest responses/             # Folder ingest
//!   confidence-tracker --analyze data.json             # Analysis report
//!   confidence-tracker --serve                         # HTTP API server
//!   confidence-tracker --text "..." --json             # JSON output

use std::fs;
use std::path::{Path, PathBuf};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use confidence_tracker::config::AppConfig;
use confidence_tracker::core::{
    load_dataset, open_dataset, run_server, run_timestamp, save_dataset, save_report,
    transcription_path, Analyzer, EntryExtractor, Ingestor,
};
use confidence_tracker::error::StorageError;
use confidence_tracker::types::{AnalysisReport, ConsolidatedDataset, DateMap, SourceOutcome};
use confidence_tracker::VERSION;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "confidence-tracker",
    version = VERSION,
    about = "Confidence Tracker - Turn diary transcriptions into a dated confidence dataset",
    long_about = "Parses AI transcriptions of handwritten confidence journals into a\n\
                  date-keyed dataset and analyzes it over time.\n\n\
                  Modes:\n  \
                  --text      Parse one model response and print its dates\n  \
                  --ingest    Parse every response file in a folder, in batches\n  \
                  --analyze   Analyze a saved dataset and write the report\n  \
                  --serve     HTTP API server mode"
)]
struct Args {
    /// Model response to parse (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Folder of saved model responses to ingest
    #[arg(short, long, value_name = "DIR")]
    ingest: Option<PathBuf>,

    /// Dataset file to analyze
    #[arg(short, long, value_name = "FILE")]
    analyze: Option<PathBuf>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Existing dataset to continue from; must exist for --ingest. The
    /// server creates it if needed and rewrites it after every ingest
    #[arg(long, value_name = "FILE")]
    dataset: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,

    /// Directory for datasets and reports (overrides the config file)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = match load_config(&args) {
        Ok(config) => run(&args, &config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: &Args, config: &AppConfig) -> CliResult {
    if args.serve {
        run_serve(args, config).await
    } else if let Some(dir) = &args.ingest {
        run_ingest(dir, args, config)
    } else if let Some(path) = &args.analyze {
        run_analyze(path, args, config)
    } else if let Some(text) = &args.text {
        run_single(text, args)
    } else {
        Args::command().print_help()?;
        println!();
        Ok(())
    }
}

/// Logs go to stderr; RUST_LOG overrides the default level
fn init_tracing(verbose: bool) {
    let default = if verbose { "confidence_tracker=debug" } else { "confidence_tracker=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    debug!(?config, "configuration loaded");
    Ok(config)
}

/// Dataset named by `--dataset`, or an empty one
///
/// Ingest refuses a missing file; the server creates it on first ingest.
fn seed_dataset(args: &Args, config: &AppConfig, must_exist: bool) -> Result<ConsolidatedDataset, StorageError> {
    match &args.dataset {
        Some(path) => open_dataset(path, config.dominant_basis, must_exist),
        None => Ok(ConsolidatedDataset::new(config.dominant_basis)),
    }
}

// =============================================================================
// SINGLE
// =============================================================================

/// Parse one response and print its date mapping
fn run_single(text: &str, args: &Args) -> CliResult {
    let parsed = EntryExtractor::new().extract(text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&parsed.dates)?);
        return Ok(());
    }

    let grammar = parsed.grammar.unwrap_or("none");
    println!(
        "{} {} entries on {} dates (grammar: {}, dropped: {})",
        "Parsed".bold(),
        parsed.entry_count(),
        parsed.dates.len(),
        grammar,
        parsed.dropped
    );
    print_dates(&parsed.dates);
    Ok(())
}

fn print_dates(dates: &DateMap) {
    for (date, bucket) in dates {
        let avg = bucket
            .daily_confidence_average()
            .map(|a| format!("{:.1}", a))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  avg {}  dominant {}",
            date.cyan().bold(),
            avg.yellow(),
            bucket.dominant_confidence_area().unwrap_or("-")
        );
        for entry in bucket.entries() {
            let power = entry
                .power_level
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} {:>2}  {}",
                format!("[{}/{}]", entry.category, entry.confidence_type.as_str()).dimmed(),
                power,
                entry.text
            );
        }
    }
}

// =============================================================================
// INGEST
// =============================================================================

/// Parse every response file in a folder, saving after each batch
fn run_ingest(dir: &Path, args: &Args, config: &AppConfig) -> CliResult {
    let files = blob_files(dir, config)?;
    if files.is_empty() {
        println!("No response files found in {}", dir.display());
        return Ok(());
    }

    let stamp = run_timestamp(&chrono::Local::now());
    let mut ingestor = Ingestor::with_dataset(EntryExtractor::new(), seed_dataset(args, config, true)?);
    let mut outcomes: Vec<SourceOutcome> = Vec::new();

    for (index, batch) in files.chunks(config.batch_size).enumerate() {
        for path in batch {
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let response = fs::read_to_string(path).map_err(|e| e.to_string());
            let outcome = ingestor.ingest(&source, response);
            if !args.json {
                print_outcome(&outcome);
            }
            outcomes.push(outcome);
        }

        let batch_path = transcription_path(&config.output_dir, &stamp, Some(index + 1));
        save_dataset(ingestor.dataset(), &batch_path)?;
    }

    let final_path = transcription_path(&config.output_dir, &stamp, None);
    save_dataset(ingestor.dataset(), &final_path)?;

    let summary = ingestor.summary();
    if args.json {
        #[derive(serde::Serialize)]
        struct IngestOutput<'a> {
            summary: &'a confidence_tracker::types::IngestSummary,
            dataset: String,
            sources: &'a [SourceOutcome],
        }
        let out = IngestOutput {
            summary,
            dataset: final_path.display().to_string(),
            sources: &outcomes,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "{} {}/{} sources ok, {} failed, {} empty; {} entries, {} new dates",
            "Done:".green().bold(),
            summary.successful,
            summary.processed,
            summary.failed,
            summary.empty,
            summary.entries_added,
            summary.dates_created
        );
        println!("Dataset saved to {}", final_path.display());
    }
    Ok(())
}

/// Response files in sorted order, filtered by extension
fn blob_files(dir: &Path, config: &AppConfig) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && config.accepts_file(path))
        .collect();
    files.sort();
    Ok(files)
}

fn print_outcome(outcome: &SourceOutcome) {
    if outcome.success {
        let mark = if outcome.parsed_data.is_empty() { "∅".yellow() } else { "✓".green() };
        println!(
            "{} {}  {} entries, {} dates{}",
            mark,
            outcome.source,
            outcome.entry_count(),
            outcome.parsed_data.len(),
            if outcome.dropped_entries > 0 {
                format!(", {} dropped", outcome.dropped_entries)
            } else {
                String::new()
            }
        );
    } else {
        warn!(source = %outcome.source, "source failed");
        println!(
            "{} {}  {}",
            "✗".red(),
            outcome.source,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

// =============================================================================
// ANALYZE
// =============================================================================

/// Analyze a saved dataset and write the report
fn run_analyze(path: &Path, args: &Args, config: &AppConfig) -> CliResult {
    let dataset = load_dataset(path, config.dominant_basis)?;
    let report = Analyzer::new(&dataset)?.report();
    let report_path = config.report_path();
    save_report(&report, &report_path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        println!();
        println!("Report saved to {}", report_path.display());
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let overall = &report.summary_statistics.overall;
    println!("{}", "Confidence Analysis".bold());
    println!("  Entries:       {}", overall.total_entries);
    println!("  Date range:    {}", overall.date_range);
    println!(
        "  Avg power:     {}",
        format!("{:.2}", overall.avg_power_level).yellow()
    );
    println!(
        "  Days tracked:  {} ({:.1}% complete)",
        report.metadata.total_days_tracked, report.metadata.data_completeness
    );

    let streaks = &report.temporal_patterns.streaks;
    println!(
        "  High streak:   {} days (longest {})",
        streaks.total_high_streak_days,
        streaks.longest_high_streak.len()
    );
    println!("  Low days:      {}", streaks.low_confidence_days);

    if let Some(top) = report.improvement_areas.first() {
        println!(
            "  Top priority:  {} (score {:.2})",
            top.category.red(),
            top.priority_score
        );
    }

    println!();
    println!("{}", "Top recommendations".bold());
    for (i, rec) in report.recommendations.iter().take(3).enumerate() {
        println!("  {}. {}", i + 1, rec);
    }
}

// =============================================================================
// SERVE
// =============================================================================

/// Run HTTP API server
async fn run_serve(args: &Args, config: &AppConfig) -> CliResult {
    println!();
    println!("{}", format!("Confidence Tracker API Server v{}", VERSION).bold());
    println!();

    let ingestor = Ingestor::with_dataset(EntryExtractor::new(), seed_dataset(args, config, false)?);
    run_server(&args.addr, ingestor, args.dataset.clone()).await
}
