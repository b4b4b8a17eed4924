use crate::dataset::Dataset;
use crate::distance::{assign_nearest, assignment_errors, squared_distance, Assignment};
use crate::error::{KMeansError, Result};
use crate::report::RunResult;
use ndarray::{Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;
use tracing::{debug, warn};

/// Initialize centroids by picking `k` distinct vectors uniformly at random.
///
/// Candidates are the first occurrence of every distinct vector, so the
/// starting centroids never coincide even when the dataset has duplicates.
pub fn initialize_centroids<R: Rng + ?Sized>(
    dataset: &Dataset,
    k: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let candidates = dataset.distinct_indices();
    if candidates.len() < k {
        return Err(KMeansError::Initialization(format!(
            "k ({}) exceeds the number of distinct vectors ({})",
            k,
            candidates.len()
        )));
    }

    let selected: Vec<usize> = candidates.choose_multiple(rng, k).cloned().collect();

    let mut centroids = Array2::zeros((k, dataset.n_features()));
    for (centroid_idx, &data_idx) in selected.iter().enumerate() {
        centroids.row_mut(centroid_idx).assign(&dataset.row(data_idx));
    }

    Ok(centroids)
}

/// Replace every non-empty centroid by the mean of its members.
///
/// Centroids without members keep their previous coordinates; they are
/// reseeded by [`repair_empty_clusters`] before the next assignment.
pub fn update_centroids(
    data: &ArrayView2<f64>,
    assignment: &Assignment,
    centroids: &mut Array2<f64>,
) {
    let mut cluster_sums: Array2<f64> = Array2::zeros(centroids.raw_dim());
    for (point, &label) in data.outer_iter().zip(assignment.labels.iter()) {
        let mut sum = cluster_sums.row_mut(label);
        sum += &point;
    }

    for (cluster_idx, mut centroid) in centroids.outer_iter_mut().enumerate() {
        let count = assignment.counts[cluster_idx];
        if count > 0 {
            centroid.assign(&(&cluster_sums.row(cluster_idx) / count as f64));
        }
    }
}

/// Reseed empty clusters onto the vectors with the largest assignment error.
///
/// Must run after [`update_centroids`] so errors are measured against the new
/// centroids. After each reseed a vector's error drops to its distance from
/// the reseeded centroid when that is smaller, which takes the donor out of
/// the running for the next empty cluster. A vector lying exactly on any live
/// centroid is never a donor, so a reseed cannot duplicate an existing
/// centroid.
///
/// Returns `(cluster, donor vector)` pairs in cluster order.
pub fn repair_empty_clusters(
    data: &ArrayView2<f64>,
    centroids: &mut Array2<f64>,
    assignment: &Assignment,
) -> Result<Vec<(usize, usize)>> {
    let empty_clusters = assignment.empty_clusters();
    if empty_clusters.is_empty() {
        return Ok(Vec::new());
    }

    let mut errors = assignment_errors(data, &centroids.view(), &assignment.labels.view());

    // a vector can sit on another cluster's new mean without belonging to it
    for (point, error) in data.outer_iter().zip(errors.iter_mut()) {
        let on_live_centroid = centroids
            .outer_iter()
            .zip(assignment.counts.iter())
            .any(|(centroid, &count)| count > 0 && squared_distance(&point, &centroid) == 0.0);
        if on_live_centroid {
            *error = 0.0;
        }
    }

    let mut reseeded = Vec::with_capacity(empty_clusters.len());

    for cluster_idx in empty_clusters {
        let (donor, worst) = errors
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (t, &error)| {
                if error > best.1 {
                    (t, error)
                } else {
                    best
                }
            });

        // every vector already sits on a centroid
        if worst <= 0.0 {
            return Err(KMeansError::Initialization(format!(
                "no distinct vector left to reseed empty cluster {}",
                cluster_idx
            )));
        }

        centroids.row_mut(cluster_idx).assign(&data.row(donor));

        let centroid = centroids.row(cluster_idx);
        for (point, error) in data.outer_iter().zip(errors.iter_mut()) {
            let dist = squared_distance(&point, &centroid);
            if dist < *error {
                *error = dist;
            }
        }

        reseeded.push((cluster_idx, donor));
    }

    Ok(reseeded)
}

/// Relative SSE improvement between two consecutive iterations
#[inline]
pub fn relative_improvement(previous_sse: f64, sse: f64) -> f64 {
    (previous_sse - sse) / previous_sse
}

/// Decides whether a run performs another iteration.
#[derive(Debug, Clone)]
pub struct ConvergenceTracker {
    tol: f64,
    max_iters: usize,
    previous_sse: Option<f64>,
    last_improvement: Option<f64>,
    sse_trace: Vec<f64>,
}

impl ConvergenceTracker {
    pub fn new(tol: f64, max_iters: usize) -> Self {
        Self {
            tol,
            max_iters,
            previous_sse: None,
            last_improvement: None,
            sse_trace: Vec::with_capacity(max_iters.min(1024)),
        }
    }

    /// Record the SSE of a finished iteration and report whether to continue.
    ///
    /// The first iteration has nothing to compare against and never stops the
    /// run on its own. Afterwards the run stops when the improvement is below
    /// `tol` or when there is no improvement at all (zero, negative, or
    /// undefined because the previous SSE was 0).
    pub fn record(&mut self, sse: f64) -> bool {
        self.sse_trace.push(sse);
        self.last_improvement = self
            .previous_sse
            .map(|previous| relative_improvement(previous, sse));
        self.previous_sse = Some(sse);

        if self.sse_trace.len() >= self.max_iters {
            return false;
        }

        match self.last_improvement {
            None => true,
            Some(improvement) => improvement > 0.0 && improvement >= self.tol,
        }
    }

    /// Iterations recorded so far
    pub fn iterations(&self) -> usize {
        self.sse_trace.len()
    }

    /// Improvement computed by the last call to [`record`](Self::record)
    pub fn last_improvement(&self) -> Option<f64> {
        self.last_improvement
    }

    /// SSE of the last recorded iteration
    pub fn last_sse(&self) -> Option<f64> {
        self.previous_sse
    }

    pub fn into_trace(self) -> Vec<f64> {
        self.sse_trace
    }
}

/// Run Lloyd's iterations from the given starting centroids until convergence
/// or `max_iters`.
///
/// Each iteration assigns, recomputes means, reseeds empty clusters and then
/// measures the SSE against the updated centroids.
pub fn lloyd_run(
    dataset: &Dataset,
    mut centroids: Array2<f64>,
    max_iters: usize,
    tol: f64,
    run: usize,
) -> Result<RunResult> {
    if centroids.nrows() == 0 || centroids.ncols() != dataset.n_features() {
        return Err(KMeansError::Initialization(format!(
            "starting centroids have shape {:?}, expected (k, {})",
            centroids.shape(),
            dataset.n_features()
        )));
    }

    let data = dataset.view();
    let mut tracker = ConvergenceTracker::new(tol, max_iters);
    let mut reseeds = 0;

    let labels = loop {
        let iter_start = Instant::now();

        let assignment = assign_nearest(&data, &centroids.view());
        update_centroids(&data, &assignment, &mut centroids);

        for (cluster, donor) in repair_empty_clusters(&data, &mut centroids, &assignment)? {
            warn!(run, cluster, donor, "reseeded empty cluster");
            reseeds += 1;
        }

        let sse = assignment_errors(&data, &centroids.view(), &assignment.labels.view()).sum();
        let keep_going = tracker.record(sse);

        debug!(
            run,
            iteration = tracker.iterations(),
            sse,
            improvement = ?tracker.last_improvement(),
            elapsed = ?iter_start.elapsed(),
            "iteration complete"
        );

        if !keep_going {
            break assignment.labels;
        }
    };

    let sse = tracker.last_sse().unwrap_or(0.0);
    let n_iterations = tracker.iterations();

    Ok(RunResult {
        run,
        sse,
        n_iterations,
        sse_trace: tracker.into_trace(),
        reseeds,
        centroids,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn four_points() -> Dataset {
        Dataset::new(array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_initialize_centroids() {
        let dataset = four_points();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let centroids = initialize_centroids(&dataset, 3, &mut rng).unwrap();

        assert_eq!(centroids.nrows(), 3);
        assert_eq!(centroids.ncols(), 2);
        for i in 0..3 {
            assert!(dataset.view().outer_iter().any(|row| row == centroids.row(i)));
            for j in (i + 1)..3 {
                assert_ne!(centroids.row(i), centroids.row(j));
            }
        }
    }

    #[test]
    fn test_initialize_is_reproducible() {
        let dataset = four_points();

        let a = initialize_centroids(&dataset, 2, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = initialize_centroids(&dataset, 2, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_initialize_needs_distinct_vectors() {
        let dataset = Dataset::new(array![[1.0], [1.0], [2.0], [2.0]]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(initialize_centroids(&dataset, 2, &mut rng).is_ok());
        assert!(matches!(
            initialize_centroids(&dataset, 3, &mut rng),
            Err(KMeansError::Initialization(_))
        ));
    }

    #[test]
    fn test_update_centroids_takes_means() {
        let dataset = four_points();
        let data = dataset.view();
        let assignment = Assignment {
            labels: array![0, 0, 1, 1],
            counts: array![2, 2],
        };
        let mut centroids = array![[0.0, 0.0], [10.0, 0.0]];

        update_centroids(&data, &assignment, &mut centroids);

        assert_eq!(centroids, array![[0.0, 0.5], [10.0, 0.5]]);
    }

    #[test]
    fn test_update_leaves_empty_centroid_finite() {
        let dataset = four_points();
        let data = dataset.view();
        let assignment = Assignment {
            labels: array![0, 0, 0, 0],
            counts: array![4, 0],
        };
        let mut centroids = array![[0.0, 0.0], [3.0, 3.0]];

        update_centroids(&data, &assignment, &mut centroids);

        assert_eq!(centroids.row(0), array![5.0, 0.5]);
        assert_eq!(centroids.row(1), array![3.0, 3.0]);
    }

    #[test]
    fn test_repair_picks_largest_error() {
        let dataset = Dataset::new(array![[0.0], [1.0], [2.0], [9.0]]).unwrap();
        let data = dataset.view();
        let assignment = Assignment {
            labels: array![0, 0, 0, 0],
            counts: array![4, 0],
        };
        let mut centroids = array![[3.0], [3.0]];

        let reseeded = repair_empty_clusters(&data, &mut centroids, &assignment).unwrap();

        assert_eq!(reseeded, vec![(1, 3)]);
        assert_eq!(centroids.row(1), array![9.0]);
    }

    #[test]
    fn test_repair_does_not_reuse_donor() {
        let dataset = Dataset::new(array![[0.0], [1.0], [8.0], [10.0]]).unwrap();
        let data = dataset.view();
        let assignment = Assignment {
            labels: array![0, 0, 0, 0],
            counts: array![4, 0, 0],
        };
        let mut centroids = array![[0.5], [0.0], [0.0]];

        let reseeded = repair_empty_clusters(&data, &mut centroids, &assignment).unwrap();

        // once 10 is taken, the error of 8 drops to 4 and is still the largest
        assert_eq!(reseeded, vec![(1, 3), (2, 2)]);
        assert_eq!(centroids, array![[0.5], [10.0], [8.0]]);
    }

    #[test]
    fn test_repair_skips_vectors_on_live_centroids() {
        // vector 1 has the largest error to its own centroid but coincides
        // with centroid 1
        let dataset = Dataset::new(array![[0.0], [6.0], [5.0]]).unwrap();
        let data = dataset.view();
        let assignment = Assignment {
            labels: array![0, 0, 1],
            counts: array![2, 1, 0],
        };
        let mut centroids = array![[0.0], [6.0], [99.0]];

        let reseeded = repair_empty_clusters(&data, &mut centroids, &assignment).unwrap();

        assert_eq!(reseeded, vec![(2, 2)]);
        assert_eq!(centroids, array![[0.0], [6.0], [5.0]]);
    }

    #[test]
    fn test_repair_without_donor_fails() {
        let dataset = Dataset::new(array![[1.0], [1.0]]).unwrap();
        let data = dataset.view();
        let assignment = Assignment {
            labels: array![0, 0],
            counts: array![2, 0],
        };
        let mut centroids = array![[1.0], [1.0]];

        assert!(matches!(
            repair_empty_clusters(&data, &mut centroids, &assignment),
            Err(KMeansError::Initialization(_))
        ));
    }

    #[test]
    fn test_convergence_first_iteration_always_runs() {
        let mut tracker = ConvergenceTracker::new(f64::MAX, 10);
        assert!(tracker.record(5.0));
        assert_eq!(tracker.last_improvement(), None);
        assert!(!tracker.record(4.0));
    }

    #[test]
    fn test_convergence_threshold() {
        let mut tracker = ConvergenceTracker::new(0.1, 10);
        assert!(tracker.record(100.0));
        assert!(tracker.record(50.0));
        assert!(!tracker.record(48.0));
        assert_relative_eq!(tracker.last_improvement().unwrap(), 0.04);
        assert_eq!(tracker.into_trace(), vec![100.0, 50.0, 48.0]);
    }

    #[test]
    fn test_convergence_no_improvement_stops() {
        let mut tracker = ConvergenceTracker::new(0.0, 10);
        assert!(tracker.record(1.0));
        assert!(!tracker.record(1.0));

        let mut zero = ConvergenceTracker::new(0.0, 10);
        assert!(zero.record(0.0));
        assert!(!zero.record(0.0));
    }

    #[test]
    fn test_convergence_max_iters() {
        let mut tracker = ConvergenceTracker::new(0.0, 2);
        assert!(tracker.record(10.0));
        assert!(!tracker.record(1.0));
        assert_eq!(tracker.iterations(), 2);

        let mut single = ConvergenceTracker::new(0.0, 1);
        assert!(!single.record(10.0));
    }

    #[test]
    fn test_lloyd_run_two_groups() {
        let dataset = four_points();
        let centroids = array![[0.0, 0.0], [10.0, 0.0]];

        let result = lloyd_run(&dataset, centroids, 5, 0.0, 1).unwrap();

        assert_eq!(result.labels, array![0, 0, 1, 1]);
        assert_eq!(result.centroids, array![[0.0, 0.5], [10.0, 0.5]]);
        assert_relative_eq!(result.sse, 1.0, epsilon = 1e-12);
        assert_eq!(result.n_iterations, 2);
        assert_eq!(result.sse_trace, vec![1.0, 1.0]);
        assert_eq!(result.reseeds, 0);
    }

    #[test]
    fn test_lloyd_run_reseeds_duplicate_centroids() {
        let dataset = four_points();
        let centroids = array![[0.0, 0.0], [0.0, 0.0]];

        let result = lloyd_run(&dataset, centroids, 10, 0.0, 1).unwrap();

        assert!(result.reseeds >= 1);
        assert_relative_eq!(result.sse, 1.0, epsilon = 1e-12);
        let counts = result.labels.iter().fold(Array1::<usize>::zeros(2), |mut acc, &l| {
            acc[l] += 1;
            acc
        });
        assert_eq!(counts, array![2, 2]);
    }

    #[test]
    fn test_lloyd_run_rejects_bad_centroid_shape() {
        let dataset = four_points();
        let centroids = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];

        assert!(matches!(
            lloyd_run(&dataset, centroids, 5, 0.0, 1),
            Err(KMeansError::Initialization(_))
        ));
    }
}
