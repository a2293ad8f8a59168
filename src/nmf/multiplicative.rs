use crate::error::Error;
use crate::error::Result;
use crate::linalg::EPS;
use ndarray::Array2;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;
use typed_builder::TypedBuilder;

/// Alternating multiplicative-update NMF with optional L1 sparsity on H.
///
/// Factors X (d, n) into W (d, rank) * H (rank, n) with all entries
/// nonnegative. Runs exactly `n_iter` passes; there is no convergence check,
/// so the output for a fixed seed and iteration budget is deterministic.
///
/// Nonnegativity is an algebraic invariant of the updates: both factors are
/// only ever scaled by ratios of nonnegative products, and the `EPS` term
/// keeps every denominator positive.
#[derive(TypedBuilder, Debug)]
pub struct MultiplicativeNmf<'a, 'r> {
  x: ArrayView2<'a, f64>,
  rank: usize,
  #[builder(default = 0.1)]
  l1_reg: f64,
  #[builder(default = 200)]
  n_iter: usize,
  /// Warm-start basis; drawn uniformly from [0, 1) when absent.
  #[builder(default, setter(strip_option))]
  w_init: Option<Array2<f64>>,
  /// Warm-start coefficients; drawn uniformly from [0, 1) when absent.
  #[builder(default, setter(strip_option))]
  h_init: Option<Array2<f64>>,
  rng: &'r mut StdRng,
}

impl MultiplicativeNmf<'_, '_> {
  pub fn exec(self) -> Result<(Array2<f64>, Array2<f64>)> {
    let MultiplicativeNmf {
      x,
      rank,
      l1_reg,
      n_iter,
      w_init,
      h_init,
      rng,
    } = self;

    let (d, n) = x.dim();
    if d == 0 || n == 0 {
      return Err(Error::EmptyInput("data matrix"));
    }
    if rank == 0 || rank > d.min(n) {
      return Err(Error::InvalidRank { rank, d, n });
    }

    let mut w = match w_init {
      Some(w) => {
        if w.dim() != (d, rank) {
          return Err(Error::ShapeMismatch {
            expected: (d, rank),
            actual: w.dim(),
          });
        }
        w
      }
      None => Array2::from_shape_fn((d, rank), |_| rng.random::<f64>()),
    };
    let mut h = match h_init {
      Some(h) => {
        if h.dim() != (rank, n) {
          return Err(Error::ShapeMismatch {
            expected: (rank, n),
            actual: h.dim(),
          });
        }
        h
      }
      None => Array2::from_shape_fn((rank, n), |_| rng.random::<f64>()),
    };

    for _ in 0..n_iter {
      // H <- H * (WᵗX) / (WᵗWH + l1 + eps); the L1 penalty lands on H only.
      let wh = w.dot(&h);
      let wt_x = w.t().dot(&x);
      let wt_wh = w.t().dot(&wh) + l1_reg + EPS;
      h = &h * &(&wt_x / &wt_wh);

      // W <- W * (XHᵗ) / (W(HHᵗ) + eps)
      let ht = h.t();
      let x_ht = x.dot(&ht);
      let w_hht = w.dot(&h.dot(&ht)) + EPS;
      w = &w * &(&x_ht / &w_hht);
    }

    debug!(rank, n_iter, "multiplicative updates complete");
    Ok((w, h))
  }
}
