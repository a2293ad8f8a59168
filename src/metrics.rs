use crate::align::align_and_score;
use crate::align::contingency_matrix;
use crate::error::Error;
use crate::error::Result;
use crate::linalg::frobenius_norm;
use ndarray::ArrayView2;
use ndarray::Axis;
use serde::Deserialize;
use serde::Serialize;

/// Scores for one clustering run against ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
  /// Accuracy after optimal label alignment, in [0, 1].
  pub accuracy: f64,
  /// Adjusted Rand index; 1 for identical partitions, ~0 for random ones.
  pub adjusted_rand_index: f64,
  /// Normalized mutual information, in [0, 1].
  pub normalized_mutual_info: f64,
  /// ||X - X_hat||_F / ||X||_F.
  pub relative_error: f64,
}

/// Adjusted Rand index between two labelings.
///
/// Pair-counting form over the contingency matrix. Perfectly agreeing
/// partitions score 1, including the trivial inputs (single point, single
/// cluster) where the chance correction is undefined; 0 is returned when the
/// correction degenerates without perfect agreement.
pub fn adjusted_rand_index(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
  let counts = contingency_matrix(y_true, y_pred)?;
  let n = y_true.len() as f64;

  let choose2 = |x: f64| x * (x - 1.0) / 2.0;

  let sum_cells: f64 = counts.iter().map(|&c| choose2(c)).sum();
  let sum_rows: f64 = counts.sum_axis(Axis(1)).iter().map(|&c| choose2(c)).sum();
  let sum_cols: f64 = counts.sum_axis(Axis(0)).iter().map(|&c| choose2(c)).sum();

  // Equality of all three pair counts means no discordant pairs, i.e. the
  // partitions coincide up to relabeling. Checked before the correction,
  // whose denominator vanishes exactly on these inputs when n <= 1.
  if sum_cells == sum_rows && sum_cells == sum_cols {
    return Ok(1.0);
  }

  let expected = sum_rows * sum_cols / choose2(n);
  let max_index = (sum_rows + sum_cols) / 2.0;
  let denom = max_index - expected;
  if denom.abs() < 1e-15 {
    return Ok(0.0);
  }
  Ok((sum_cells - expected) / denom)
}

/// Normalized mutual information between two labelings.
///
/// 2 * MI / (H_true + H_pred), the arithmetic-mean normalization. Returns 0
/// when both entropies vanish (single-cluster partitions carry no
/// information to share).
pub fn normalized_mutual_info(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
  let counts = contingency_matrix(y_true, y_pred)?;
  let n = y_true.len() as f64;

  let row_sums = counts.sum_axis(Axis(1));
  let col_sums = counts.sum_axis(Axis(0));

  let entropy = |sums: &ndarray::Array1<f64>| -> f64 {
    sums
      .iter()
      .filter(|&&c| c > 0.0)
      .map(|&c| {
        let p = c / n;
        -p * p.ln()
      })
      .sum()
  };
  let h_true = entropy(&col_sums);
  let h_pred = entropy(&row_sums);
  if h_true + h_pred < 1e-15 {
    return Ok(0.0);
  }

  let mut mi = 0.0;
  for ((p, t), &c) in counts.indexed_iter() {
    if c > 0.0 {
      mi += (c / n) * ((n * c) / (row_sums[p] * col_sums[t])).ln();
    }
  }

  Ok(2.0 * mi / (h_true + h_pred))
}

/// ||X - X_hat||_F / ||X||_F.
///
/// A zero-norm X makes the ratio undefined and is reported as a degenerate
/// input rather than returned as NaN or infinity.
pub fn relative_reconstruction_error(x: ArrayView2<f64>, x_hat: ArrayView2<f64>) -> Result<f64> {
  if x.dim() != x_hat.dim() {
    return Err(Error::ShapeMismatch {
      expected: x.dim(),
      actual: x_hat.dim(),
    });
  }
  let x_norm = frobenius_norm(x);
  if x_norm == 0.0 {
    return Err(Error::DegenerateInput(
      "zero-norm data matrix: relative error undefined",
    ));
  }
  let residual = &x - &x_hat;
  Ok(frobenius_norm(residual.view()) / x_norm)
}

/// Score a factorization result against ground-truth labels.
pub fn evaluate(
  x: ArrayView2<f64>,
  reconstruction: ArrayView2<f64>,
  y_true: &[usize],
  y_pred: &[usize],
) -> Result<Evaluation> {
  Ok(Evaluation {
    accuracy: align_and_score(y_true, y_pred)?,
    adjusted_rand_index: adjusted_rand_index(y_true, y_pred)?,
    normalized_mutual_info: normalized_mutual_info(y_true, y_pred)?,
    relative_error: relative_reconstruction_error(x, reconstruction)?,
  })
}
