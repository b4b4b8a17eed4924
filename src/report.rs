use ndarray::{Array1, Array2};
use std::io::{self, Write};

/// Outcome of a single run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// 1-based run index
    pub run: usize,

    /// Final sum of squared assignment errors
    pub sse: f64,

    /// Number of iterations executed
    pub n_iterations: usize,

    /// SSE after each iteration, in order
    pub sse_trace: Vec<f64>,

    /// Number of empty clusters reseeded over the whole run
    pub reseeds: usize,

    /// Final centroids (k, n_features)
    pub centroids: Array2<f64>,

    /// Final assignment of each vector to a centroid (n_samples,)
    pub labels: Array1<usize>,
}

/// Summary of all runs of a fit
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansReport {
    /// Every run, ordered by run index
    pub runs: Vec<RunResult>,

    /// 1-based index of the run with the lowest SSE (earliest on ties)
    pub best_run: usize,

    pub best_sse: f64,

    pub mean_sse: f64,

    pub mean_iterations: f64,
}

impl KMeansReport {
    /// The winning run, or `None` if `best_run` names no run in `runs`
    pub fn best(&self) -> Option<&RunResult> {
        self.runs.iter().find(|r| r.run == self.best_run)
    }
}

/// Collects run results and keeps track of the best one.
///
/// Ties on SSE are resolved by run index rather than by the order in which
/// results are recorded.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    runs: Vec<RunResult>,
    best: Option<(usize, f64)>,
    total_sse: f64,
    total_iterations: usize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: RunResult) {
        let is_better = match self.best {
            None => true,
            Some((best_run, best_sse)) => {
                result.sse < best_sse || (result.sse == best_sse && result.run < best_run)
            }
        };
        if is_better {
            self.best = Some((result.run, result.sse));
        }

        self.total_sse += result.sse;
        self.total_iterations += result.n_iterations;
        self.runs.push(result);
    }

    /// Number of runs recorded so far
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Build the report. Returns `None` when no run was recorded.
    pub fn finish(mut self) -> Option<KMeansReport> {
        let (best_run, best_sse) = self.best?;
        let n_runs = self.runs.len() as f64;
        self.runs.sort_by_key(|r| r.run);

        Some(KMeansReport {
            runs: self.runs,
            best_run,
            best_sse,
            mean_sse: self.total_sse / n_runs,
            mean_iterations: self.total_iterations as f64 / n_runs,
        })
    }
}

/// Render a report as the per-run SSE listing followed by a summary.
///
/// Iterations are numbered from 0. SSE values carry 4 decimals, the
/// averages are printed in full.
///
/// ```text
/// Run 1
/// -----
/// Iteration 0: SSE = 1.0000
///
/// After 1 runs for data.txt with K = 2
/// AvgSSE = 1.0. AvgIterations: 1.0
/// Best Run: 1: SSE = 1.0000
/// ```
pub fn render_report<W: Write>(
    report: &KMeansReport,
    dataset_label: &str,
    k: usize,
    writer: &mut W,
) -> io::Result<()> {
    for run in &report.runs {
        writeln!(writer, "Run {}", run.run)?;
        writeln!(writer, "-----")?;
        for (i, sse) in run.sse_trace.iter().enumerate() {
            writeln!(writer, "Iteration {}: SSE = {:.4}", i, sse)?;
        }
        writeln!(writer)?;
    }

    writeln!(
        writer,
        "After {} runs for {} with K = {}",
        report.runs.len(),
        dataset_label,
        k
    )?;
    writeln!(
        writer,
        "AvgSSE = {:?}. AvgIterations: {:?}",
        report.mean_sse, report.mean_iterations
    )?;
    writeln!(
        writer,
        "Best Run: {}: SSE = {:.4}",
        report.best_run, report.best_sse
    )?;

    Ok(())
}
