use clap::Parser;
use cuecheck::audio::SymphoniaProbe;
use cuecheck::audit::LogSink;
use cuecheck::config::{Config, ConfigOverrides};
use cuecheck::pairing::discover_and_pair;
use cuecheck::pipeline::{self, PairOutcome, Pipeline};
use cuecheck::report::{self, BatchRow};
use cuecheck::tracklist::{JsonTracklistSource, StubTracklistSource, TracklistSource};
use cuecheck::{BatchSummary, Status};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cuecheck")]
#[command(author, version, about = "Check release WAVs against their tracklist, side by side")]
struct Args {
    /// Directory of tracklist documents (<id>.json)
    #[arg(long)]
    doc_dir: PathBuf,

    /// Directory of audio archives (<id>.zip, <id>.wav or <id>/)
    #[arg(long)]
    audio_dir: PathBuf,

    /// Root directory for run output (default: _debug_outputs)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Largest side delta in seconds still reported as WARN (default: 3)
    #[arg(long)]
    warn_sec: Option<u32>,

    /// Side delta in seconds above which a side FAILs (default: 6)
    #[arg(long)]
    fail_sec: Option<u32>,

    /// Shortest digit run accepted as a pair id (default: 4)
    #[arg(long)]
    id_min_digits: Option<usize>,

    /// Longest digit run accepted as a pair id (default: 8)
    #[arg(long)]
    id_max_digits: Option<usize>,

    /// TOML config file; command-line flags win over it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append every event of the run to this JSON-lines file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Use the built-in stub tracklist instead of reading documents
    #[arg(long)]
    use_stub: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,

    /// Log pipeline events to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    for (flag, dir) in [("--doc-dir", &args.doc_dir), ("--audio-dir", &args.audio_dir)] {
        if !dir.is_dir() {
            eprintln!("{} is not a directory: {}", flag, dir.display());
            std::process::exit(2);
        }
    }

    let overrides = ConfigOverrides {
        tolerance_warn: args.warn_sec,
        tolerance_fail: args.fail_sec,
        id_min_digits: args.id_min_digits,
        id_max_digits: args.id_max_digits,
        out_root: args.out_dir.clone(),
        log_file: args.log_file.clone(),
        use_stub: args.use_stub,
        jobs: args.jobs,
    };
    let config = match Config::load(args.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    let tolerance = config.tolerance();
    if tolerance.is_inverted() {
        log::warn!(
            "warn threshold ({}s) is not below fail threshold ({}s); deltas up to the warn threshold never FAIL",
            tolerance.warn_sec,
            tolerance.fail_sec
        );
    }

    if let Some(jobs) = config.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let ids = match config.id_pattern() {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };
    let pairing = discover_and_pair(&args.doc_dir, &args.audio_dir, &ids, &mut LogSink::default());

    if pairing.pairs.is_empty() {
        eprintln!("No tracklist documents with a catalogue id found in {}", args.doc_dir.display());
        std::process::exit(2);
    }

    let source: &dyn TracklistSource = if config.use_stub {
        &StubTracklistSource
    } else {
        &JsonTracklistSource
    };
    let pipeline = Pipeline::new(&config, source, &SymphoniaProbe, pipeline::make_run_tag());

    if !args.quiet {
        eprintln!("\x1b[1mcuecheck - Tracklist vs. WAV reconciliation\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!(
            "Found {} pair(s), {} unmatched document(s), {} unmatched archive(s)",
            pairing.pairs.len(),
            pairing.unmatched_documents.len(),
            pairing.unmatched_archives.len()
        );
        eprintln!(
            "Tolerance: warn <= {}s, fail > {}s | source: {}\n",
            tolerance.warn_sec,
            tolerance.fail_sec,
            source.name()
        );
    }

    let pb = if !args.quiet && pairing.pairs.len() > 1 {
        let pb = ProgressBar::new(pairing.pairs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcomes: Vec<PairOutcome> = pairing
        .pairs
        .par_iter()
        .map(|pair| {
            let outcome = pipeline.run_pair(pair);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(outcome.pair_id.clone());
            }
            outcome
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    for outcome in &outcomes {
        outcome.audit.forward_to(&mut LogSink::for_pair(outcome.pair_id.as_str()));
    }

    if !args.quiet {
        for outcome in &outcomes {
            match &outcome.result {
                Ok(result) => {
                    for it in &result.per_side {
                        let color = match it.status {
                            Status::Ok => "\x1b[32m",   // Green
                            Status::Warn => "\x1b[33m", // Yellow
                            Status::Fail => "\x1b[31m", // Red
                        };
                        println!(
                            "{}{:<7}{} {:<12} side {}  ref {:>5}s  audio {:>5}s  delta {:>+5}s  {}",
                            color,
                            format!("[{}]", it.status),
                            "\x1b[0m",
                            result.pair_id,
                            it.side,
                            it.reference_total_sec,
                            it.audio_total_sec,
                            it.delta_sec,
                            it.reason.map(|r| r.to_string()).unwrap_or_default()
                        );
                    }
                }
                Err(e) => {
                    println!("\x1b[90m{:<7}\x1b[0m {:<12} {}", "[ERROR]", outcome.pair_id, e);
                }
            }

            if args.verbose && outcome.audit.anomaly_count() > 0 {
                eprintln!("    {} anomaly event(s), see events.jsonl", outcome.audit.anomaly_count());
            }
        }
    }

    let results: Vec<_> = outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect();
    let rows: Vec<BatchRow> = results.iter().map(|r| BatchRow::from_result(r)).collect();
    let summary = BatchSummary::from_results(results.iter().copied());
    let failed_pairs = outcomes.iter().filter(|o| o.failed()).count();

    let batch_dir = pipeline.batch_dir();
    match report::write_batch_files(&batch_dir, &rows, &summary) {
        Ok(table) => {
            if !args.quiet {
                eprintln!("\n{}", "─".repeat(70));
                println!("{}", table);
            }
        }
        Err(e) => {
            eprintln!("Failed to write batch summary: {}", e);
            std::process::exit(1);
        }
    }

    if let Some(ref log_file) = config.log_file {
        if let Err(e) = pipeline::append_events(log_file, &pipeline.run_tag, &outcomes) {
            eprintln!("Failed to append to log file {}: {}", log_file.display(), e);
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ OK:\x1b[0m   {}", summary.ok);
        eprintln!("  \x1b[33m? WARN:\x1b[0m {}", summary.warn);
        eprintln!("  \x1b[31m✗ FAIL:\x1b[0m {}", summary.fail);
        if failed_pairs > 0 {
            eprintln!("  \x1b[90mPairs not processed:\x1b[0m {}", failed_pairs);
        }
        eprintln!("\n\x1b[90mOutput: {}\x1b[0m", pipeline.run_dir.display());
    }

    if summary.fail > 0 {
        std::process::exit(1);
    }
}
