//! Cluster a dataset file with multi-restart k-means and write the SSE report.
//!
//! The input file starts with a `<vectors> <features>` line followed by one
//! vector per line. The report is printed and also written to
//! `<file stem>Performance.txt` unless `--output` says otherwise.
//!
//! Usage: `kmeans-runs <FILE> <K> <MAX_ITERS> <THRESHOLD> <RUNS> [--seed N] [--output PATH]`

use clap::Parser;
use lloyd_kmeans_rs::{render_report, Dataset, KMeans, KMeansConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "kmeans-runs")]
#[command(about = "Multi-restart k-means clustering with SSE reporting")]
struct Args {
    /// Dataset file (`N F` header, then N lines of F values)
    file: PathBuf,

    /// Number of clusters (at least 2)
    k: usize,

    /// Maximum iterations per run (at least 1)
    max_iters: usize,

    /// Convergence threshold on the relative SSE improvement (non-negative)
    #[arg(allow_negative_numbers = true)]
    threshold: f64,

    /// Number of runs (at least 1)
    runs: usize,

    /// Base random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Report file (default: `<file stem>Performance.txt`)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log every iteration
    #[arg(long, short)]
    verbose: bool,
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "kmeans".to_string());
    PathBuf::from(format!("{}Performance.txt", stem))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = KMeansConfig::new(args.k)
        .with_max_iters(args.max_iters)
        .with_tol(args.threshold)
        .with_n_runs(args.runs)
        .with_seed(args.seed);
    config.validate()?;

    let dataset = Dataset::load(&args.file)?;

    let mut kmeans = KMeans::with_config(config);
    let report = kmeans.fit(&dataset)?;

    let label = args.file.display().to_string();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_report(report, &label, args.k, &mut out)?;
    out.flush()?;

    let output_path = args.output.unwrap_or_else(|| default_output(&args.file));
    let mut writer = BufWriter::new(File::create(&output_path)?);
    render_report(report, &label, args.k, &mut writer)?;
    writer.flush()?;

    eprintln!("Saved report to {}", output_path.display());

    Ok(())
}
