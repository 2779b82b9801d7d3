use crate::structs::{CorrError, Result, Timeseries};
use ndarray::Array1;
use std::fs;
use std::path::Path;

impl Timeseries {
    /// Load whitespace separated values written by `fslmeants`
    ///
    /// # Errors
    /// Returns error if the file cannot be read, holds a non-numeric token,
    /// or holds no values at all
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            CorrError::Parse(msg) => CorrError::Parse(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse whitespace separated floating-point values
    ///
    /// # Errors
    /// Returns error on a non-numeric token or empty input
    pub fn parse(content: &str) -> Result<Self> {
        let values = content
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| CorrError::Parse(format!("not a number: {tok:?}")))
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.is_empty() {
            return Err(CorrError::Parse("no values".into()));
        }

        Ok(Self {
            values: Array1::from_vec(values),
        })
    }
}
