use ndarray::{Array1, ArrayView1, ArrayView2};

/// Squared Euclidean distance between two vectors of equal length
#[inline]
pub fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Index of and distance to the closest centroid.
///
/// Centroids are scanned left to right and only a strictly smaller distance
/// replaces the running minimum, so ties go to the lowest index.
#[inline]
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> (usize, f64) {
    let mut best_idx = 0;
    let mut best_dist = squared_distance(point, &centroids.row(0));

    for (c, centroid) in centroids.outer_iter().enumerate().skip(1) {
        let dist = squared_distance(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = c;
        }
    }

    (best_idx, best_dist)
}

/// Outcome of one assignment pass
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Closest centroid index for each vector (N,)
    pub labels: Array1<usize>,

    /// Number of vectors assigned to each centroid (K,)
    pub counts: Array1<usize>,
}

impl Assignment {
    /// Centroids that received no members
    pub fn empty_clusters(&self) -> Vec<usize> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == 0)
            .map(|(c, _)| c)
            .collect()
    }
}

/// Assign every vector to its nearest centroid and count members per centroid
pub fn assign_nearest(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Assignment {
    let n_samples = data.nrows();
    let k = centroids.nrows();

    let mut labels = Array1::zeros(n_samples);
    let mut counts = Array1::zeros(k);

    for (i, point) in data.outer_iter().enumerate() {
        let (label, _) = nearest_centroid(&point, centroids);
        labels[i] = label;
        counts[label] += 1;
    }

    Assignment { labels, counts }
}

/// Per-vector assignment error: squared distance to the vector's own centroid
pub fn assignment_errors(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
) -> Array1<f64> {
    data.outer_iter()
        .zip(labels.iter())
        .map(|(point, &label)| squared_distance(&point, &centroids.row(label)))
        .collect()
}
