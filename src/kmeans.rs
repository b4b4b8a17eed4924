use crate::algorithm::{initialize_centroids, lloyd_run};
use crate::config::KMeansConfig;
use crate::dataset::Dataset;
use crate::distance::nearest_centroid;
use crate::error::{KMeansError, Result};
use crate::report::{KMeansReport, ResultAggregator, RunResult};
use ndarray::{Array1, Array2, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::info;

/// Multi-restart k-means clustering (Lloyd's algorithm).
///
/// Each run starts from `k` distinct random vectors and iterates until the
/// relative SSE improvement drops below the configured threshold or the
/// iteration limit is hit. The run with the lowest SSE is kept.
///
/// # Example
///
/// ```
/// use lloyd_kmeans_rs::{Dataset, KMeans, KMeansConfig};
///
/// let dataset: Dataset = "4 2\n0 0\n0 1\n10 0\n10 1\n".parse().unwrap();
///
/// let config = KMeansConfig::new(2).with_n_runs(20).with_tol(0.0).with_seed(7);
/// let mut kmeans = KMeans::with_config(config);
/// let report = kmeans.fit(&dataset).unwrap();
///
/// assert!((report.best_sse - 1.0).abs() < 1e-9);
/// assert_eq!(kmeans.centroids().unwrap().nrows(), 2);
/// ```
pub struct KMeans {
    /// Model configuration
    config: KMeansConfig,

    /// Number of features seen at fit time (0 before the first fit)
    d: usize,

    /// Report of the last successful fit
    report: Option<KMeansReport>,
}

impl KMeans {
    /// Create a new instance with default settings for `k` clusters.
    pub fn new(k: usize) -> Self {
        Self::with_config(KMeansConfig::new(k))
    }

    /// Create a new instance with a custom configuration.
    ///
    /// The configuration is validated by [`fit`](Self::fit), before any run starts.
    pub fn with_config(config: KMeansConfig) -> Self {
        Self {
            config,
            d: 0,
            report: None,
        }
    }

    /// Run `n_runs` independent clusterings of `dataset` and keep the best.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A parameter is out of range (nothing is computed)
    /// - The dataset has fewer distinct vectors than `k`
    /// - An empty cluster cannot be reseeded
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&KMeansReport> {
        self.config.validate()?;

        let start = Instant::now();
        info!(
            n_samples = dataset.n_samples(),
            n_features = dataset.n_features(),
            k = self.config.k,
            n_runs = self.config.n_runs,
            "starting k-means"
        );

        let mut aggregator = ResultAggregator::new();
        for run in 1..=self.config.n_runs {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.run_seed(run));
            let centroids = initialize_centroids(dataset, self.config.k, &mut rng)?;
            let result = lloyd_run(
                dataset,
                centroids,
                self.config.max_iters,
                self.config.tol,
                run,
            )?;

            info!(
                run,
                sse = result.sse,
                iterations = result.n_iterations,
                reseeds = result.reseeds,
                "run finished"
            );
            aggregator.record(result);
        }

        let report = aggregator.finish().ok_or_else(|| {
            KMeansError::InvalidParameter("n_runs must be at least 1".to_string())
        })?;

        info!(
            best_run = report.best_run,
            best_sse = report.best_sse,
            mean_sse = report.mean_sse,
            mean_iterations = report.mean_iterations,
            elapsed = ?start.elapsed(),
            "k-means finished"
        );

        self.d = dataset.n_features();
        Ok(&*self.report.insert(report))
    }

    /// Run a single clustering from caller-chosen starting centroids.
    ///
    /// Uses the configured `max_iters` and `tol`; `centroids` must have `k`
    /// rows and one column per feature. The model state is left untouched.
    pub fn run_with_centroids(
        &self,
        dataset: &Dataset,
        centroids: Array2<f64>,
    ) -> Result<RunResult> {
        self.config.validate()?;

        if centroids.nrows() != self.config.k {
            return Err(KMeansError::Initialization(format!(
                "expected {} starting centroids, got {}",
                self.config.k,
                centroids.nrows()
            )));
        }

        lloyd_run(dataset, centroids, self.config.max_iters, self.config.tol, 1)
    }

    /// Assign each row of `data` to the nearest centroid of the best run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model has not been fitted yet
    /// - Data dimensions don't match the training data
    pub fn predict(&self, data: &ArrayView2<f64>) -> Result<Array1<usize>> {
        let centroids = self.centroids().ok_or(KMeansError::NotFitted)?;

        let n_features = data.ncols();
        if n_features != self.d {
            return Err(KMeansError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d, n_features
            )));
        }

        let centroids = centroids.view();
        Ok(data
            .outer_iter()
            .map(|point| nearest_centroid(&point, &centroids).0)
            .collect())
    }

    /// Centroids of the best run, if the model has been fitted.
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.report
            .as_ref()
            .and_then(|report| report.best())
            .map(|best| &best.centroids)
    }

    /// Report of the last fit, if any.
    pub fn report(&self) -> Option<&KMeansReport> {
        self.report.as_ref()
    }

    /// Get the number of clusters.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the number of features seen at fit time.
    pub fn d(&self) -> usize {
        self.d
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn random_dataset(n_samples: usize, n_features: usize) -> Dataset {
        Dataset::new(Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0))).unwrap()
    }

    #[test]
    fn test_kmeans_new() {
        let kmeans = KMeans::new(10);
        assert_eq!(kmeans.k(), 10);
        assert_eq!(kmeans.d(), 0);
        assert!(kmeans.centroids().is_none());
        assert!(kmeans.report().is_none());
    }

    #[test]
    fn test_kmeans_fit() {
        let dataset = random_dataset(200, 8);
        let mut kmeans = KMeans::with_config(KMeansConfig::new(5).with_n_runs(3));

        let report = kmeans.fit(&dataset).unwrap();
        assert_eq!(report.runs.len(), 3);
        assert!(report.best_run >= 1 && report.best_run <= 3);

        let centroids = kmeans.centroids().unwrap();
        assert_eq!(centroids.nrows(), 5);
        assert_eq!(centroids.ncols(), 8);
        assert_eq!(kmeans.d(), 8);
    }

    #[test]
    fn test_kmeans_predict() {
        let train = random_dataset(300, 4);
        let test_data = Array2::random((50, 4), Uniform::new(-1.0, 1.0));

        let mut kmeans = KMeans::with_config(KMeansConfig::new(6).with_n_runs(2));
        kmeans.fit(&train).unwrap();

        let labels = kmeans.predict(&test_data.view()).unwrap();
        assert_eq!(labels.len(), 50);
        assert!(labels.iter().all(|&label| label < 6));
    }

    #[test]
    fn test_kmeans_predict_before_fit() {
        let data = Array2::<f64>::zeros((10, 3));
        let kmeans = KMeans::new(2);

        let result = kmeans.predict(&data.view());
        assert!(matches!(result, Err(KMeansError::NotFitted)));
    }

    #[test]
    fn test_kmeans_dimension_mismatch() {
        let train = random_dataset(100, 8);
        let test_data = Array2::<f64>::zeros((5, 16));

        let mut kmeans = KMeans::new(3);
        kmeans.fit(&train).unwrap();

        let result = kmeans.predict(&test_data.view());
        assert!(matches!(result, Err(KMeansError::InvalidDimensions(_))));
    }

    #[test]
    fn test_invalid_parameters_fail_before_running() {
        let dataset = random_dataset(20, 2);
        let mut kmeans = KMeans::new(1);

        assert!(matches!(
            kmeans.fit(&dataset),
            Err(KMeansError::InvalidParameter(_))
        ));
        assert!(kmeans.report().is_none());
    }

    #[test]
    fn test_run_with_centroids_wrong_count() {
        let dataset = Dataset::new(array![[0.0], [1.0], [2.0]]).unwrap();
        let kmeans = KMeans::new(2);

        let result = kmeans.run_with_centroids(&dataset, array![[0.0], [1.0], [2.0]]);
        assert!(matches!(result, Err(KMeansError::Initialization(_))));
    }
}
