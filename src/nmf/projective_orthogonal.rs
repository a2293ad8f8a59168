use crate::error::Error;
use crate::error::Result;
use crate::linalg::gram_schmidt_q;
use crate::linalg::EPS;
use crate::nmf::projective::projection_loss;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::info;
use typed_builder::TypedBuilder;

const LEARNING_RATE: f64 = 0.01;

/// Projective NMF with a hard orthogonality projection.
///
/// Alternates a fixed-rate gradient step on ||X - WWᵗX||²_F with a
/// constraint projection: floor entries at a small positive epsilon, thin-QR
/// orthonormalize, clip the orthonormal factor back to nonnegative, and
/// renormalize columns. Nonnegativity and exact orthonormality are in
/// tension, so after rectification WᵗW is only approximately the identity
/// (diagonal-dominant with unit-norm columns).
///
/// `tol` is accepted for interface compatibility but never consulted: the
/// solver always runs `max_iter` iterations, so a fixed budget yields a
/// fixed output. Convergence-based stopping would be a separate, opt-in
/// policy.
#[derive(TypedBuilder, Debug)]
pub struct ProjectiveNmfOrthogonal<'a, 'r> {
  x: ArrayView2<'a, f64>,
  rank: usize,
  #[builder(default = 200)]
  max_iter: usize,
  /// Reserved for convergence-based stopping; currently unused.
  #[builder(default = 1e-4)]
  tol: f64,
  rng: &'r mut StdRng,
}

impl ProjectiveNmfOrthogonal<'_, '_> {
  /// Returns the rectified basis W (d, rank) and the final loss.
  pub fn exec(self) -> Result<(Array2<f64>, f64)> {
    let ProjectiveNmfOrthogonal {
      x,
      rank,
      max_iter,
      tol,
      rng,
    } = self;

    let (d, n) = x.dim();
    if d == 0 || n == 0 {
      return Err(Error::EmptyInput("data matrix"));
    }
    if rank == 0 || rank > d.min(n) {
      return Err(Error::InvalidRank { rank, d, n });
    }
    info!(rank, max_iter, tol, "starting orthogonal projective nmf");

    let mut w =
      Array2::from_shape_fn((d, rank), |_| rng.sample::<f64, _>(StandardNormal).abs());
    let mut loss = projection_loss(x, w.view());

    for it in 0..max_iter {
      // Simplified gradient of ||X - WWᵗX||²_F in W, treating WᵗX as fixed:
      // 2(W(WᵗX)(WᵗX)ᵗ - X(WᵗX)ᵗ).
      let wtx = w.t().dot(&x);
      let grad = (w.dot(&wtx).dot(&wtx.t()) - x.dot(&wtx.t())) * 2.0;
      w = &w - &(grad * LEARNING_RATE);

      // Nonnegativity floor, then orthonormalize and rectify.
      w.mapv_inplace(|v| v.max(EPS));
      let q = gram_schmidt_q(w.view());
      w = q.mapv(|v| v.max(0.0));

      // Unit-norm columns; the epsilon keeps fully-clipped columns finite.
      for mut col in w.axis_iter_mut(Axis(1)) {
        let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
        col.mapv_inplace(|v| v / (norm + EPS));
      }

      loss = projection_loss(x, w.view());
      if it % 50 == 0 {
        info!(iteration = it, loss, "orthogonal projective nmf loss");
      }
    }

    Ok((w, loss))
  }
}
