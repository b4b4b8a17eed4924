//! # lloyd-kmeans-rs
//!
//! Multi-restart k-means clustering (Lloyd's algorithm) in Rust, built on
//! ndarray.
//!
//! ## Features
//!
//! - **Multi-restart search**: runs the algorithm `n_runs` times from
//!   independent random starts and keeps the run with the lowest SSE
//! - **Empty-cluster repair**: a centroid that loses all of its members is
//!   moved onto the vector with the largest assignment error
//! - **Relative-improvement convergence**: a run stops once the SSE improves
//!   by less than the configured fraction
//! - **Reproducible**: every run draws from its own seeded `ChaCha8Rng`
//! - **Structured results**: per-iteration SSE traces and a summary report;
//!   [`render_report`] turns them into text
//!
//! ## Example
//!
//! ```rust
//! use lloyd_kmeans_rs::{Dataset, KMeans, KMeansConfig};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! let data = Array2::random((500, 8), Uniform::new(-1.0, 1.0));
//! let dataset = Dataset::new(data).unwrap();
//!
//! let config = KMeansConfig::new(5)
//!     .with_max_iters(50)
//!     .with_tol(1e-6)
//!     .with_n_runs(4)
//!     .with_seed(42);
//!
//! let mut kmeans = KMeans::with_config(config);
//! let report = kmeans.fit(&dataset).unwrap();
//! assert_eq!(report.runs.len(), 4);
//!
//! let labels = kmeans.predict(&dataset.view()).unwrap();
//! assert_eq!(labels.len(), 500);
//! ```
//!
//! ## Reading the text format
//!
//! ```rust
//! use lloyd_kmeans_rs::Dataset;
//!
//! let dataset: Dataset = "3 2\n0.0 0.0\n1.0 1.0\n5.0 5.0\n".parse().unwrap();
//! assert_eq!(dataset.n_samples(), 3);
//! assert_eq!(dataset.n_features(), 2);
//! ```

mod algorithm;
mod config;
mod dataset;
mod distance;
mod error;
mod kmeans;
mod report;

pub use algorithm::ConvergenceTracker;
pub use config::KMeansConfig;
pub use dataset::Dataset;
pub use distance::squared_distance;
pub use error::{KMeansError, Result};
pub use kmeans::KMeans;
pub use report::{render_report, KMeansReport, ResultAggregator, RunResult};
