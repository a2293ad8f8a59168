use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;

/// Denominator guard used by every multiplicative update in the crate.
pub const EPS: f64 = 1e-10;

/// Absolute tolerance for treating a norm or a tie gap as zero.
///
/// Matches the defaults of `isclose`-style comparisons: values this close are
/// indistinguishable for assignment and normalization purposes.
pub const CLOSE_TOL: f64 = 1e-8;

/// Frobenius norm of a dense matrix.
pub fn frobenius_norm(m: ArrayView2<f64>) -> f64 {
  m.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Normalize each column to unit L2 norm, leaving near-zero columns untouched.
///
/// Zero-safe by construction: a column whose norm is below [`CLOSE_TOL`]
/// cannot be meaningfully scaled, so it passes through unchanged instead of
/// producing NaNs.
pub fn normalize_columns(m: &mut Array2<f64>) {
  for mut col in m.axis_iter_mut(Axis(1)) {
    let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > CLOSE_TOL {
      col.mapv_inplace(|v| v / norm);
    }
  }
}

/// Leading left singular vector of `a`, by alternating power iteration.
///
/// Iterates u ← normalize(A Aᵗ u) from a deterministic start (the column of
/// `a` with the largest norm) until the direction stabilizes. Only the
/// dominant vector is needed by the spherical clusterer, so no deflation or
/// full decomposition is performed.
///
/// Returns a zero vector when `a` is entirely zero.
pub fn leading_left_singular_vector(a: ArrayView2<f64>) -> Array1<f64> {
  let d = a.nrows();
  let n_iter = 100;

  // Start from the heaviest column: already in the column space of A, and
  // deterministic so repeated runs agree.
  let mut best_col = 0;
  let mut best_norm = 0.0;
  for (j, col) in a.axis_iter(Axis(1)).enumerate() {
    let norm_sq: f64 = col.iter().map(|v| v * v).sum();
    if norm_sq > best_norm {
      best_norm = norm_sq;
      best_col = j;
    }
  }
  if best_norm <= CLOSE_TOL * CLOSE_TOL {
    return Array1::zeros(d);
  }

  let mut u = a.column(best_col).to_owned();
  let norm = u.iter().map(|v| v * v).sum::<f64>().sqrt();
  u.mapv_inplace(|v| v / norm);

  for _ in 0..n_iter {
    // u ← A (Aᵗ u), normalized
    let v = a.t().dot(&u);
    let mut next = a.dot(&v);
    let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm <= CLOSE_TOL {
      break;
    }
    next.mapv_inplace(|x| x / norm);

    // Singular vectors are defined up to sign; compare directions.
    let dot: f64 = next.iter().zip(u.iter()).map(|(a, b)| a * b).sum();
    let diff: f64 = if dot >= 0.0 {
      next
        .iter()
        .zip(u.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
    } else {
      next
        .iter()
        .zip(u.iter())
        .map(|(a, b)| (a + b) * (a + b))
        .sum()
    };
    u = next;
    if diff.sqrt() < 1e-12 {
      break;
    }
  }

  u
}

/// Thin QR factor Q of a (d, r) matrix with r <= d, via modified Gram-Schmidt.
///
/// Only Q is returned; the callers rectify and renormalize it immediately, so
/// R is never needed. A column that becomes numerically dependent on its
/// predecessors is replaced by the first coordinate direction not yet spanned,
/// keeping Q full column rank.
pub fn gram_schmidt_q(a: ArrayView2<f64>) -> Array2<f64> {
  let d = a.nrows();
  let r = a.ncols();
  let mut q = a.to_owned();

  for j in 0..r {
    for i in 0..j {
      let qi = q.column(i).to_owned();
      let proj: f64 = qi.iter().zip(q.column(j).iter()).map(|(a, b)| a * b).sum();
      for (row, qi_v) in qi.iter().enumerate() {
        q[(row, j)] -= proj * qi_v;
      }
    }

    let norm: f64 = q.column(j).iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > CLOSE_TOL {
      for row in 0..d {
        q[(row, j)] /= norm;
      }
      continue;
    }

    // Dependent column: substitute a coordinate vector orthogonal to the
    // columns already produced.
    for basis in 0..d {
      let mut candidate = Array1::zeros(d);
      candidate[basis] = 1.0;
      for i in 0..j {
        let qi = q.column(i);
        let proj: f64 = qi.iter().zip(candidate.iter()).map(|(a, b)| a * b).sum();
        for (row, qi_v) in qi.iter().enumerate() {
          candidate[row] -= proj * qi_v;
        }
      }
      let cnorm: f64 = candidate.iter().map(|v| v * v).sum::<f64>().sqrt();
      if cnorm > CLOSE_TOL {
        for row in 0..d {
          q[(row, j)] = candidate[row] / cnorm;
        }
        break;
      }
    }
  }

  q
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::array;

  #[test]
  fn frobenius_norm_matches_hand_computation() {
    let m = array![[3.0, 0.0], [0.0, 4.0]];
    assert!((frobenius_norm(m.view()) - 5.0).abs() < 1e-12);
  }

  #[test]
  fn normalize_columns_leaves_zero_columns() {
    let mut m = array![[3.0, 0.0], [4.0, 0.0]];
    normalize_columns(&mut m);
    assert!((m[(0, 0)] - 0.6).abs() < 1e-12);
    assert!((m[(1, 0)] - 0.8).abs() < 1e-12);
    assert_eq!(m[(0, 1)], 0.0);
    assert_eq!(m[(1, 1)], 0.0);
  }

  #[test]
  fn power_iteration_recovers_dominant_direction() {
    // Rank-1 matrix: the left singular vector is u up to sign.
    let u = array![0.6, 0.8];
    let v = array![1.0, 2.0, 2.0];
    let mut a = Array2::zeros((2, 3));
    for i in 0..2 {
      for j in 0..3 {
        a[(i, j)] = u[i] * v[j];
      }
    }
    let got = leading_left_singular_vector(a.view());
    let aligned: f64 = got.iter().zip(u.iter()).map(|(a, b)| a * b).sum();
    assert!(aligned.abs() > 1.0 - 1e-8);
  }

  #[test]
  fn gram_schmidt_produces_orthonormal_columns() {
    let a = array![[1.0, 1.0], [1.0, 0.0], [0.0, 1.0]];
    let q = gram_schmidt_q(a.view());
    let gram = q.t().dot(&q);
    for i in 0..2 {
      for j in 0..2 {
        let expected = if i == j { 1.0 } else { 0.0 };
        assert!((gram[(i, j)] - expected).abs() < 1e-10);
      }
    }
  }
}
