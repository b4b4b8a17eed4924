use crate::error::{KMeansError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// An immutable, fixed-dimension collection of numeric vectors.
///
/// Every row has exactly `n_features` finite values; this is checked once at
/// construction so the clustering loop never has to.
///
/// The text format read by [`Dataset::from_reader`] is:
///
/// ```text
/// N F
/// x11 x12 ... x1F
/// ...
/// xN1 xN2 ... xNF
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Array2<f64>,
}

impl Dataset {
    /// Wrap an existing matrix of shape (n_samples, n_features).
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(KMeansError::DatasetFormat(
                "dataset contains no vectors".to_string(),
            ));
        }
        if data.ncols() == 0 {
            return Err(KMeansError::DatasetFormat(
                "vectors must have at least one feature".to_string(),
            ));
        }
        if let Some(((i, j), value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(KMeansError::DatasetFormat(format!(
                "non-finite value {} at vector {}, feature {}",
                value, i, j
            )));
        }

        Ok(Self { data })
    }

    /// Build a dataset from rows, checking each against the declared feature count.
    pub fn from_rows(n_features: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_samples = rows.len();
        let mut flat = Vec::with_capacity(n_samples * n_features);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_features {
                return Err(KMeansError::DatasetFormat(format!(
                    "vector {} has {} features, expected {}",
                    i,
                    row.len(),
                    n_features
                )));
            }
            flat.extend(row);
        }

        let data = Array2::from_shape_vec((n_samples, n_features), flat)
            .map_err(|e| KMeansError::DatasetFormat(e.to_string()))?;
        Self::new(data)
    }

    /// Parse the `N F` header followed by N lines of F reals.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(i, line)| line.map(|l| (i + 1, l)))
            .filter(|line| !matches!(line, Ok((_, l)) if l.trim().is_empty()));

        let (header_no, header) = lines
            .next()
            .transpose()?
            .ok_or_else(|| KMeansError::DatasetFormat("missing header line".to_string()))?;

        let dims: Vec<&str> = header.split_whitespace().collect();
        if dims.len() != 2 {
            return Err(KMeansError::DatasetFormat(format!(
                "line {}: header must be `<vectors> <features>`, got {:?}",
                header_no, header
            )));
        }
        let n_samples = parse_count(dims[0], header_no)?;
        let n_features = parse_count(dims[1], header_no)?;

        // the header is untrusted, rows grow with the data actually read
        let mut rows = Vec::new();
        for line in lines {
            let (line_no, line) = line?;
            if rows.len() == n_samples {
                return Err(KMeansError::DatasetFormat(format!(
                    "line {}: more data lines than the declared {}",
                    line_no, n_samples
                )));
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != n_features {
                return Err(KMeansError::DatasetFormat(format!(
                    "line {}: expected {} values, found {}",
                    line_no,
                    n_features,
                    fields.len()
                )));
            }

            let row = fields
                .iter()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| {
                        KMeansError::DatasetFormat(format!(
                            "line {}: {:?} is not a number",
                            line_no, field
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        if rows.len() < n_samples {
            return Err(KMeansError::DatasetFormat(format!(
                "declared {} vectors but found {}",
                n_samples,
                rows.len()
            )));
        }

        Self::from_rows(n_features, rows)
    }

    /// Read a dataset file in the text format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Number of vectors (N)
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features per vector (F)
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow the underlying matrix
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Borrow vector `i`
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Index of the first occurrence of every distinct vector, in dataset order.
    pub fn distinct_indices(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.n_samples());
        self.data
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| {
                // -0.0 and 0.0 are the same point
                let key: Vec<u64> = row.iter().map(|&v| (v + 0.0).to_bits()).collect();
                seen.insert(key)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of distinct vectors
    pub fn distinct_count(&self) -> usize {
        self.distinct_indices().len()
    }
}

impl FromStr for Dataset {
    type Err = KMeansError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}

fn parse_count(field: &str, line_no: usize) -> Result<usize> {
    field.parse::<usize>().map_err(|_| {
        KMeansError::DatasetFormat(format!(
            "line {}: {:?} is not a non-negative integer",
            line_no, field
        ))
    })
}
