//! Pearson correlation between two region timeseries

use crate::structs::{CorrError, Result, Timeseries};
use ndarray::{Array2, Axis};
use std::path::Path;
use tracing::{debug, info};

/// Pearson correlation matrix between the rows of `rows`.
///
/// Covariance uses `n - 1` degrees of freedom. Each entry is divided by the
/// standard deviation of its row, then of its column, and clipped to
/// [-1, 1]. A zero-variance row yields NaN entries.
///
/// # Errors
/// Returns error if there are fewer than 2 observations per row
#[allow(clippy::cast_precision_loss)]
pub fn correlation_matrix(rows: &Array2<f64>) -> Result<Array2<f64>> {
    let n = rows.ncols();
    if n < 2 {
        return Err(CorrError::Stats(
            "Need at least 2 values for correlation".into(),
        ));
    }

    let means = rows
        .mean_axis(Axis(1))
        .ok_or_else(|| CorrError::Stats("Cannot average empty rows".into()))?;
    let centered = rows - &means.insert_axis(Axis(1));
    let cov = centered.dot(&centered.t()) / (n as f64 - 1.0);
    let stddev = cov.diag().mapv(f64::sqrt);

    let mut corr = cov;
    for ((i, j), value) in corr.indexed_iter_mut() {
        *value = (*value / stddev[i] / stddev[j]).clamp(-1.0, 1.0);
    }

    Ok(corr)
}

/// Zero the entries above the main diagonal
#[must_use]
pub fn lower_triangle(m: &Array2<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.dim(), |(i, j)| if j <= i { m[[i, j]] } else { 0.0 })
}

/// Drop the main diagonal of a square matrix, giving `n x (n - 1)`
#[must_use]
pub fn remove_diagonal(m: &Array2<f64>) -> Array2<f64> {
    let n = m.nrows();
    let width = n.saturating_sub(1);
    Array2::from_shape_fn((n, width), |(i, k)| {
        let j = if k < i { k } else { k + 1 };
        m[[i, j]]
    })
}

/// Pearson correlation coefficient between two equal-length series
///
/// # Errors
/// Returns error if the series differ in length or hold fewer than 2 values
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(CorrError::Stats(format!(
            "Timeseries must have same length ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let rows = Array2::from_shape_vec((2, a.len()), a.iter().chain(b).copied().collect())
        .map_err(|e| CorrError::Stats(e.to_string()))?;
    let corr = correlation_matrix(&rows)?;

    // Off-diagonal lower triangle, row-major: [0, r]
    let off_diagonal = remove_diagonal(&lower_triangle(&corr));
    off_diagonal
        .iter()
        .nth(1)
        .copied()
        .ok_or_else(|| CorrError::Stats("Correlation matrix too small".into()))
}

/// Load two mean timeseries files and correlate them
///
/// # Errors
/// Returns error if either file cannot be loaded or correlation fails
pub fn pearson_files(seed: &Path, stat: &Path) -> Result<f64> {
    info!("Computing Pearson correlation");

    let a = Timeseries::from_file(seed)?;
    let b = Timeseries::from_file(stat)?;
    debug!(
        "Loaded {} seed and {} stat timepoints",
        a.values.len(),
        b.values.len()
    );

    pearson_correlation(&a.values.to_vec(), &b.values.to_vec())
}
