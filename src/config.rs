use crate::error::{KMeansError, Result};

/// Configuration for the multi-restart k-means algorithm
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters (at least 2)
    pub k: usize,

    /// Maximum number of iterations per run (at least 1)
    pub max_iters: usize,

    /// Convergence threshold on the relative SSE improvement between two
    /// iterations. A run stops once the improvement falls below it.
    pub tol: f64,

    /// Number of independent runs; the one with the lowest SSE wins
    pub n_runs: usize,

    /// Base random seed. Run `r` (1-based) draws from a generator seeded with
    /// `seed + r - 1`.
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 8,
            max_iters: 100,
            tol: 1e-4,
            n_runs: 10,
            seed: 0,
        }
    }
}

impl KMeansConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence threshold
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of runs
    pub fn with_n_runs(mut self, n_runs: usize) -> Self {
        self.n_runs = n_runs;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the parameter invariants. Called before any run starts.
    pub fn validate(&self) -> Result<()> {
        if self.k < 2 {
            return Err(KMeansError::InvalidParameter(format!(
                "k must be at least 2, got {}",
                self.k
            )));
        }
        if self.max_iters < 1 {
            return Err(KMeansError::InvalidParameter(
                "max_iters must be at least 1".to_string(),
            ));
        }
        if self.tol.is_nan() || self.tol < 0.0 {
            return Err(KMeansError::InvalidParameter(format!(
                "convergence threshold must be non-negative, got {}",
                self.tol
            )));
        }
        if self.n_runs < 1 {
            return Err(KMeansError::InvalidParameter(
                "n_runs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Seed for the generator of run `run` (1-based)
    pub(crate) fn run_seed(&self, run: usize) -> u64 {
        self.seed.wrapping_add(run.saturating_sub(1) as u64)
    }
}
