//! Basic example demonstrating lloyd-kmeans-rs usage
//!
//! Run with: cargo run --example basic --release

use lloyd_kmeans_rs::{render_report, Dataset, KMeans, KMeansConfig};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    println!("=== lloyd-kmeans-rs example ===\n");

    // Generate synthetic data: 3 clusters in 2D for easy visualization
    let n_samples = 300;
    let n_features = 2;
    let n_clusters = 3;

    println!("Generating {} samples with {} features...", n_samples, n_features);

    let mut data = Array2::<f64>::zeros((n_samples, n_features));

    // Cluster centers
    let centers = [[-5.0f64, -5.0], [0.0, 5.0], [5.0, -5.0]];

    let noise = Array2::random((n_samples, n_features), Uniform::new(-1.0f64, 1.0));
    for i in 0..n_samples {
        let cluster_idx = i % 3;
        data[[i, 0]] = centers[cluster_idx][0] + noise[[i, 0]];
        data[[i, 1]] = centers[cluster_idx][1] + noise[[i, 1]];
    }

    println!("True cluster centers:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Cluster {}: ({:.2}, {:.2})", i, center[0], center[1]);
    }
    println!();

    let dataset = Dataset::new(data).expect("Generated data is finite");

    let config = KMeansConfig::new(n_clusters)
        .with_max_iters(100)
        .with_tol(1e-6)
        .with_n_runs(5)
        .with_seed(42);

    println!("Running k-means with k={} (5 runs)...\n", n_clusters);

    let mut kmeans = KMeans::with_config(config);
    let report = kmeans.fit(&dataset).expect("Clustering failed");

    render_report(report, "synthetic", n_clusters, &mut std::io::stdout())
        .expect("Writing to stdout failed");

    println!("\nLearned centroids:");
    let centroids = kmeans.centroids().unwrap();
    for i in 0..centroids.nrows() {
        println!(
            "  Centroid {}: ({:.4}, {:.4})",
            i,
            centroids[[i, 0]],
            centroids[[i, 1]]
        );
    }
    println!();

    let labels = kmeans.predict(&dataset.view()).expect("Prediction failed");

    // Count samples per cluster
    let mut cluster_counts = vec![0usize; n_clusters];
    for &label in labels.iter() {
        cluster_counts[label] += 1;
    }

    println!("Cluster distribution:");
    for (i, count) in cluster_counts.iter().enumerate() {
        println!(
            "  Cluster {}: {} samples ({:.1}%)",
            i,
            count,
            (*count as f64 / n_samples as f64) * 100.0
        );
    }

    println!("\n=== Done! ===");
}
