use thiserror::Error;

/// Error types for the lloyd-kmeans library
#[derive(Error, Debug)]
pub enum KMeansError {
    /// A clustering parameter is out of range (k, max_iters, tol or n_runs)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The dataset is malformed (header, field count, missing lines, non-finite values)
    #[error("Dataset format error: {0}")]
    DatasetFormat(String),

    /// Centroids could not be seeded from distinct vectors
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Model has not been fitted yet
    #[error("Model has not been fitted. Call fit() first.")]
    NotFitted,

    /// Dimension mismatch between data and model
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),

    /// Failure reading a dataset file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, KMeansError>;
