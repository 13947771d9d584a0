use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sigsift::{batch, hashing, logging, Analyzer, Config, Report};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sigsift")]
#[command(author, version, about = "Detect files whose bytes disagree with their names")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// File or directory to analyze (optional in GUI mode)
    path: Option<PathBuf>,

    /// Launch GUI file picker (auto-enabled when no path is given)
    #[arg(long)]
    gui: bool,

    /// JSON config file (header_len, entropy_threshold, max_embedded, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output report file (.json, .csv, .html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Auto-generate a timestamped report in --report-dir
    #[arg(long)]
    save: bool,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "sigsift-reports")]
    report_dir: PathBuf,

    /// Open the written report afterwards
    #[arg(long)]
    open: bool,

    /// Print a one-line-per-file table instead of JSON
    #[arg(short, long)]
    summary: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Bytes inspected for the header signature
    #[arg(long)]
    header_len: Option<usize>,

    /// Entropy above which content counts as encrypted or packed
    #[arg(long)]
    entropy_threshold: Option<f64>,

    /// Keep at most this many embedded detections per file
    #[arg(long)]
    max_embedded: Option<usize>,

    /// Stream files of at least this many bytes instead of loading them
    #[arg(long)]
    stream_threshold: Option<u64>,

    /// Chunk size used when streaming
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Only errors on stderr
    #[arg(short, long)]
    quiet: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start interactive web UI for analysis
    Serve {
        /// File or directory to analyze
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3002")]
        port: u16,
    },

    /// Compare two files by digest and list differing bytes
    Compare { file1: PathBuf, file2: PathBuf },
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    logging::init_tracing(level, args.log_json);

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> sigsift::Result<i32> {
    let config = build_config(&args)?;

    // Handle subcommands first
    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { path, port } => {
                sigsift::serve::start(port, path, config)?;
                return Ok(0);
            }
            Command::Compare { file1, file2 } => {
                let comparison = hashing::compare_files(&file1, &file2)?;
                print_json(&comparison);
                return Ok(0);
            }
        }
    }

    // Determine if we should use GUI mode
    // With GUI feature: launch GUI if --gui flag OR no path provided
    #[cfg(feature = "gui")]
    let use_gui = args.gui || args.path.is_none();

    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    let path = match args.path.clone() {
        Some(p) if !use_gui => p,
        _ => match pick_path(use_gui) {
            Some(p) => p,
            None => return Ok(1),
        },
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = batch::collect_files(&path);
    if files.is_empty() {
        eprintln!("No files found under {}", path.display());
        return Ok(0);
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    let analyzer = Analyzer::with_config(config);
    let results = batch::analyze_all(&analyzer, &files, |done| {
        if let Some(ref pb) = pb {
            pb.inc(1);
            pb.set_message(
                done.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut reports: Vec<Report> = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                eprintln!("\x1b[90m[ERROR]\x1b[0m {}: {}", file.display(), e);
            }
        }
    }

    // Print results
    if args.summary {
        print_table(&reports, failures, args.quiet);
    } else if !path.is_dir() {
        // A single file prints one object, like the per-file JSON consumers expect
        if let Some(report) = reports.first() {
            print_json(report);
        }
    } else {
        print_json(&reports);
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if args.save {
        std::fs::create_dir_all(&args.report_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        Some(args.report_dir.join(format!("sigsift_report_{}.json", timestamp)))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        sigsift::report::generate(output_path, &reports)?;
        if !args.quiet {
            eprintln!("\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
        if args.open || use_gui {
            if let Err(e) = open::that(output_path) {
                eprintln!("Failed to open report: {}", e);
            }
        }
    }

    // Exit status only reflects whether every file could be opened
    Ok(if failures > 0 { 1 } else { 0 })
}

fn build_config(args: &Args) -> sigsift::Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(len) = args.header_len {
        config.header_len = len;
    }
    if let Some(threshold) = args.entropy_threshold {
        config.entropy_threshold = threshold;
    }
    if args.max_embedded.is_some() {
        config.max_embedded = args.max_embedded;
    }
    if let Some(bytes) = args.stream_threshold {
        config.stream_threshold = bytes;
    }
    if let Some(bytes) = args.chunk_size {
        config.chunk_size = bytes.max(1);
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing report: {}", e),
    }
}

fn print_table(reports: &[Report], failures: usize, quiet: bool) {
    if !quiet {
        for r in reports {
            let (color, verdict) = if r.suspicious {
                ("\x1b[31m", "SUSPICIOUS")
            } else {
                ("\x1b[32m", "CLEAN")
            };
            let reset = "\x1b[0m";

            let detected = if r.detected_signature.is_empty() {
                "-".to_string()
            } else {
                r.detected_signature.join(",")
            };
            let embedded = r.embedded_signatures.iter().filter(|d| d.offset > 0).count();

            println!(
                "{}{:<12}{} {:>5.2}  {:<8} {:<10} +{:<4} {}",
                color,
                format!("[{}]", verdict),
                reset,
                r.entropy,
                &r.extension,
                truncate(&detected, 10),
                embedded,
                &r.file
            );
        }
    }

    let suspicious = reports.iter().filter(|r| r.suspicious).count();
    eprintln!("\n{}", "─".repeat(70));
    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  \x1b[32m✓ Clean:\x1b[0m      {}", reports.len() - suspicious);
    eprintln!("  \x1b[31m✗ Suspicious:\x1b[0m {}", suspicious);
    if failures > 0 {
        eprintln!("  \x1b[90mErrors:\x1b[0m       {}", failures);
    }
}

#[cfg(feature = "gui")]
fn pick_path(use_gui: bool) -> Option<PathBuf> {
    if !use_gui {
        return None;
    }

    // First try folder picker
    if let Some(folder) = rfd::FileDialog::new()
        .set_title("Select folder to analyze (or Cancel for single file)")
        .pick_folder()
    {
        return Some(folder);
    }

    // If cancelled, offer file picker
    let file = rfd::FileDialog::new()
        .set_title("Select file to analyze")
        .pick_file();
    if file.is_none() {
        eprintln!("No file or folder selected.");
    }
    file
}

#[cfg(not(feature = "gui"))]
fn pick_path(_use_gui: bool) -> Option<PathBuf> {
    eprintln!("Usage: sigsift <PATH>");
    eprintln!("Run 'sigsift --help' for more options.");
    eprintln!("Note: GUI mode not available in this build.");
    None
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
