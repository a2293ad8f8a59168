use crate::error::Error;
use crate::error::Result;
use crate::linalg::frobenius_norm;
use crate::linalg::EPS;
use ndarray::Array2;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::info;
use typed_builder::TypedBuilder;

/// Projective NMF: X ~ W Wᵗ X with W >= 0 and soft orthogonality.
///
/// The multiplicative update drives W toward a self-reconstructing basis;
/// WᵗW ~ I is never enforced and only emerges approximately from the
/// reconstruction objective. Runs a fixed number of iterations with no early
/// stopping, reporting the squared Frobenius loss every 50th pass.
#[derive(TypedBuilder, Debug)]
pub struct ProjectiveNmf<'a, 'r> {
  x: ArrayView2<'a, f64>,
  rank: usize,
  #[builder(default = 200)]
  max_iter: usize,
  rng: &'r mut StdRng,
}

impl ProjectiveNmf<'_, '_> {
  /// Returns the basis W (d, rank) and the final loss ||X - WWᵗX||²_F.
  pub fn exec(self) -> Result<(Array2<f64>, f64)> {
    let ProjectiveNmf {
      x,
      rank,
      max_iter,
      rng,
    } = self;

    let (d, n) = x.dim();
    if d == 0 || n == 0 {
      return Err(Error::EmptyInput("data matrix"));
    }
    if rank == 0 || rank > d.min(n) {
      return Err(Error::InvalidRank { rank, d, n });
    }

    // |N(0, 1)| draws: nonnegative init with more spread than uniform.
    let mut w =
      Array2::from_shape_fn((d, rank), |_| rng.sample::<f64, _>(StandardNormal).abs());
    let mut loss = projection_loss(x, w.view());

    for it in 0..max_iter {
      let wtx = w.t().dot(&x);
      let numer = x.dot(&wtx.t());
      let denom = w.dot(&wtx).dot(&wtx.t()) + EPS;
      w = &w * &(&numer / &denom);

      loss = projection_loss(x, w.view());
      if it % 50 == 0 {
        info!(iteration = it, loss, "projective nmf loss");
      }
    }

    Ok((w, loss))
  }
}

/// ||X - W Wᵗ X||²_F.
pub(crate) fn projection_loss(x: ArrayView2<f64>, w: ArrayView2<f64>) -> f64 {
  let recon = w.dot(&w.t().dot(&x));
  let residual = &x - &recon;
  let norm = frobenius_norm(residual.view());
  norm * norm
}
