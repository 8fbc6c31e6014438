//! sieve-dedup CLI - Exact and near-duplicate removal for text corpora.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sieve_dedup::io::{read_jsonl, write_audit, write_documents};
use sieve_dedup::{
    AuditTrail, CleanedDocument, DedupConfig, Deduplicator, FingerprintAlgorithm, FuzzySharding,
    StageReport,
};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// JSON output for a run.
#[derive(Serialize)]
struct JsonOutput {
    input: String,
    output: Option<String>,
    removed: Option<String>,
    stage: StageArg,
    input_documents: usize,
    output_documents: usize,
    audit_entries: usize,
    elapsed_secs: f64,
    throughput_docs_s: f64,
    config: DedupConfig,
    reports: Vec<StageReport>,
}

/// Which stages to run.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum StageArg {
    /// Whole-document exact dedup only
    Exact,
    /// Paragraph-level near-duplicate dedup only
    Fuzzy,
    /// Exact, then fuzzy
    All,
}

/// Exact fingerprint algorithm.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum FingerprintArg {
    Xxh3,
    Blake3,
}

impl From<FingerprintArg> for FingerprintAlgorithm {
    fn from(arg: FingerprintArg) -> Self {
        match arg {
            FingerprintArg::Xxh3 => Self::Xxh3,
            FingerprintArg::Blake3 => Self::Blake3,
        }
    }
}

/// Paragraph routing for the fuzzy stage.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ShardingArg {
    /// Route by paragraph position (duplicates in different shards are missed)
    RoundRobin,
    /// Everything in one shard
    Single,
    /// Route by the first LSH band
    FirstBand,
}

impl From<ShardingArg> for FuzzySharding {
    fn from(arg: ShardingArg) -> Self {
        match arg {
            ShardingArg::RoundRobin => Self::RoundRobin,
            ShardingArg::Single => Self::Single,
            ShardingArg::FirstBand => Self::FirstBand,
        }
    }
}

/// Exact and near-duplicate removal for text training corpora.
///
/// Removes byte-identical documents, then near-duplicate paragraphs detected
/// with MinHash and LSH. Reads and writes JSONL.
#[derive(Parser, Debug)]
#[command(name = "sieve-dedup")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input JSONL file.
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output JSONL file for cleaned documents.
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Write removed records (the audit trail) to this JSONL file.
    #[arg(long, value_name = "AUDIT")]
    removed: Option<PathBuf>,

    /// Field containing the text to deduplicate.
    #[arg(short = 'f', long, default_value = "text")]
    field: String,

    /// Stages to run.
    #[arg(long, value_enum, default_value = "all")]
    stage: StageArg,

    /// Number of shards for both stages.
    #[arg(short, long, default_value = "8")]
    shards: usize,

    /// Jaccard similarity threshold (0.0-1.0] used to lay out LSH bands.
    #[arg(short, long, default_value = "0.8")]
    threshold: f64,

    /// Number of MinHash permutations.
    #[arg(short = 'p', long, default_value = "128")]
    permutations: usize,

    /// Word n-gram size for shingling.
    #[arg(short = 'n', long, default_value = "1")]
    ngram: usize,

    /// Seed for the MinHash permutations.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Exact fingerprint algorithm.
    #[arg(long, value_enum, default_value = "xxh3")]
    fingerprint: FingerprintArg,

    /// Paragraph routing for the fuzzy stage.
    #[arg(long, value_enum, default_value = "round-robin")]
    fuzzy_sharding: ShardingArg,

    /// Drop LSH candidates whose estimated similarity is below the threshold.
    #[arg(long)]
    verify: bool,

    /// Print statistics only, don't write output.
    #[arg(long)]
    stats_only: bool,

    /// Output results as JSON.
    #[arg(long)]
    json: bool,

    /// Show a progress spinner.
    #[arg(long)]
    progress: bool,

    /// Verbose output (debug logging).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Create a spinner for indeterminate progress.
fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

impl Cli {
    fn config(&self) -> DedupConfig {
        DedupConfig::default()
            .with_shard_count(self.shards)
            .with_threshold(self.threshold)
            .with_permutations(self.permutations)
            .with_ngram_size(self.ngram)
            .with_seed(self.seed)
            .with_fingerprint(self.fingerprint.into())
            .with_fuzzy_sharding(self.fuzzy_sharding.into())
            .with_verify_candidates(self.verify)
    }
}

/// Documents, audit trail and stage reports of one run.
type RunResult = (Vec<CleanedDocument>, AuditTrail, Vec<StageReport>);

fn run_stages(
    dedup: &Deduplicator,
    stage: StageArg,
    docs: Vec<sieve_dedup::Document>,
) -> sieve_dedup::Result<RunResult> {
    Ok(match stage {
        StageArg::Exact => {
            let outcome = dedup.exact_dedup(docs);
            let documents = outcome.documents.into_iter().map(Into::into).collect();
            (documents, outcome.audit, vec![outcome.report])
        }
        StageArg::Fuzzy => {
            let outcome = dedup.fuzzy_dedup(docs)?;
            (outcome.documents, outcome.audit, vec![outcome.report])
        }
        StageArg::All => {
            let output = dedup.run(docs)?;
            (output.documents, output.audit, output.reports)
        }
    })
}

fn print_report(report: &StageReport) {
    eprintln!("  [{}]", report.stage);
    eprintln!("    Input:             {}", report.input);
    eprintln!("    Surviving:         {}", report.surviving);
    eprintln!("    Removed:           {}", report.removed);
    eprintln!("    Removal ratio:     {:.2}%", report.removal_ratio() * 100.0);
    eprintln!("    Duplicate clusters: {}", report.duplicate_clusters);
    if !report.cascaded_documents.is_empty() {
        eprintln!(
            "    Documents emptied: {}",
            report.cascaded_documents.len()
        );
    }
    if !report.empty_documents.is_empty() {
        eprintln!("    Empty documents:   {}", report.empty_documents.len());
    }
    for shard in &report.shards {
        eprintln!(
            "      shard {:>3}: {} -> {}",
            shard.shard, shard.before, shard.after
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // Handle completions subcommand
    if let Some(Commands::Completions { shell }) = args.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "sieve-dedup", &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose);

    // Require input file for dedup operations
    let input = args.input.clone().ok_or("Input file is required")?;

    if !args.stats_only && args.output.is_none() {
        eprintln!("Error: output file required (use -o/--output or --stats-only)");
        std::process::exit(1);
    }

    let config = args.config();
    let dedup = Deduplicator::new(config.clone()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    if args.verbose && !args.json {
        let (bands, rows) = dedup.fuzzy_resolver().band_layout();
        eprintln!("Configuration:");
        eprintln!("  Input: {}", input.display());
        if let Some(ref output) = args.output {
            eprintln!("  Output: {}", output.display());
        }
        eprintln!("  Stage: {:?}", args.stage);
        eprintln!("  Text field: {}", args.field);
        eprintln!("  Shards: {}", config.shard_count);
        eprintln!("  Threshold: {}", config.threshold);
        eprintln!("  Permutations: {} ({bands} bands x {rows} rows)", config.num_permutations);
        eprintln!("  N-gram size: {}", config.ngram_size);
        eprintln!("  Fuzzy sharding: {:?}", config.fuzzy_sharding);
        eprintln!("  Verify candidates: {}", config.verify_candidates);
        eprintln!();
    }

    let start = Instant::now();

    let pb = if args.progress && !args.json {
        Some(create_spinner("Reading input file..."))
    } else {
        None
    };

    let docs = read_jsonl(&input, &args.field)?;
    let input_documents = docs.len();

    if docs.is_empty() && !args.json {
        eprintln!("Warning: No documents found in input file");
    }

    if let Some(ref pb) = pb {
        pb.set_message(format!("Deduplicating {input_documents} documents..."));
    }

    let dedup_start = Instant::now();
    let (documents, audit, reports) = run_stages(&dedup, args.stage, docs)?;
    let dedup_time = dedup_start.elapsed().as_secs_f64();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if !args.stats_only {
        if let Some(ref output_path) = args.output {
            let written = write_documents(output_path, &documents)?;
            if args.verbose && !args.json {
                eprintln!("Wrote {written} documents to {}", output_path.display());
            }
        }
        if let Some(ref removed_path) = args.removed {
            let written = write_audit(removed_path, &audit)?;
            if args.verbose && !args.json {
                eprintln!("Wrote {written} removed records to {}", removed_path.display());
            }
        }
    }

    let throughput = if dedup_time > 0.0 {
        input_documents as f64 / dedup_time
    } else {
        0.0
    };

    if args.json {
        let output = JsonOutput {
            input: input.display().to_string(),
            output: args
                .output
                .as_ref()
                .filter(|_| !args.stats_only)
                .map(|p| p.display().to_string()),
            removed: args
                .removed
                .as_ref()
                .filter(|_| !args.stats_only)
                .map(|p| p.display().to_string()),
            stage: args.stage,
            input_documents,
            output_documents: documents.len(),
            audit_entries: audit.len(),
            elapsed_secs: dedup_time,
            throughput_docs_s: throughput,
            config,
            reports,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!();
        eprintln!("Deduplication Results:");
        eprintln!("  Input documents:   {input_documents}");
        eprintln!("  Output documents:  {}", documents.len());
        eprintln!("  Removed records:   {}", audit.len());
        for report in &reports {
            print_report(report);
        }
        eprintln!();
        eprintln!("Performance:");
        eprintln!("  Processing time:   {dedup_time:.3}s");
        eprintln!("  Throughput:        {throughput:.0} docs/sec");
        eprintln!();
        eprintln!("Total time: {:.3}s", start.elapsed().as_secs_f64());

        if args.stats_only {
            eprintln!();
            eprintln!("(Output not written: --stats-only mode)");
        }
    }

    Ok(())
}
