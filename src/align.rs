use crate::error::Error;
use crate::error::Result;
use ndarray::Array2;

/// Contingency matrix between two labelings of the same points.
///
/// Cell `(p, t)` counts points with predicted label `p` and true label `t`.
/// The matrix is square with side `max(max(true), max(pred)) + 1` so both
/// label sets fit even when their cardinalities differ; rows or columns for
/// labels absent from one side stay zero and cannot affect the optimum.
pub fn contingency_matrix(y_true: &[usize], y_pred: &[usize]) -> Result<Array2<f64>> {
  if y_true.len() != y_pred.len() {
    return Err(Error::LengthMismatch {
      left: y_true.len(),
      right: y_pred.len(),
    });
  }
  if y_true.is_empty() {
    return Err(Error::EmptyInput("label vectors"));
  }

  let max_true = y_true.iter().copied().max().unwrap_or(0);
  let max_pred = y_pred.iter().copied().max().unwrap_or(0);
  let d = max_true.max(max_pred) + 1;

  let mut counts = Array2::<f64>::zeros((d, d));
  for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
    counts[(p, t)] += 1.0;
  }
  Ok(counts)
}

/// Exact minimum-cost assignment on a square cost matrix.
///
/// Hungarian algorithm in the Jonker-Volgenant potential formulation, O(n^3).
/// Returns the column assigned to each row.
pub fn solve_assignment(cost: &Array2<f64>) -> Vec<usize> {
  let n = cost.nrows();
  debug_assert_eq!(n, cost.ncols());

  // 1-based arrays; index 0 is the virtual unmatched column.
  let mut u = vec![0.0f64; n + 1];
  let mut v = vec![0.0f64; n + 1];
  let mut matched_row = vec![0usize; n + 1];
  let mut way = vec![0usize; n + 1];

  for row in 1..=n {
    matched_row[0] = row;
    let mut j0 = 0usize;
    let mut min_slack = vec![f64::INFINITY; n + 1];
    let mut used = vec![false; n + 1];

    // Grow alternating tree until an unmatched column is reached.
    loop {
      used[j0] = true;
      let i0 = matched_row[j0];
      let mut delta = f64::INFINITY;
      let mut j1 = 0usize;

      for j in 1..=n {
        if used[j] {
          continue;
        }
        let reduced = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
        if reduced < min_slack[j] {
          min_slack[j] = reduced;
          way[j] = j0;
        }
        if min_slack[j] < delta {
          delta = min_slack[j];
          j1 = j;
        }
      }

      for j in 0..=n {
        if used[j] {
          u[matched_row[j]] += delta;
          v[j] -= delta;
        } else {
          min_slack[j] -= delta;
        }
      }

      j0 = j1;
      if matched_row[j0] == 0 {
        break;
      }
    }

    // Augment along the found path.
    loop {
      let j1 = way[j0];
      matched_row[j0] = matched_row[j1];
      j0 = j1;
      if j0 == 0 {
        break;
      }
    }
  }

  let mut assignment = vec![0usize; n];
  for j in 1..=n {
    if matched_row[j] > 0 {
      assignment[matched_row[j] - 1] = j - 1;
    }
  }
  assignment
}

/// Clustering accuracy under the optimal label permutation.
///
/// Builds the contingency matrix, solves the assignment problem that
/// maximizes the total matched count (by minimizing the negated counts),
/// remaps every predicted label through the resulting bijection, and returns
/// the fraction of points whose remapped label equals the true label.
pub fn align_and_score(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
  let counts = contingency_matrix(y_true, y_pred)?;
  let negated = counts.mapv(|c| -c);
  let mapping = solve_assignment(&negated);

  let matched = y_true
    .iter()
    .zip(y_pred.iter())
    .filter(|&(&t, &p)| mapping[p] == t)
    .count();
  Ok(matched as f64 / y_true.len() as f64)
}
