use crate::config::GraphConfig;
use crate::error::Error;
use crate::error::Result;
use crate::kmeans::KMeans;
use crate::metrics::evaluate;
use crate::metrics::Evaluation;
use crate::spherical::SphericalKMeans;
use ndarray::Array2;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use tracing::info;
use typed_builder::TypedBuilder;

/// Capability boundary for an externally supplied graph-regularized NMF.
///
/// The GNMF pipeline only reads back the factors; any backend that can
/// produce W (d, k) and H (k, n) for a nonnegative X (d, n) plugs in here.
pub trait GraphFactorizer {
  fn compute_factors(
    &self,
    x: ArrayView2<f64>,
    k: usize,
    config: &GraphConfig,
  ) -> Result<(Array2<f64>, Array2<f64>)>;
}

/// Output of the ONMF-EM pipeline.
#[derive(Debug, Clone)]
pub struct OnmfEmReport {
  pub evaluation: Evaluation,
  /// Cluster-center basis, shape (d, k).
  pub basis: Array2<f64>,
  /// Hard-assignment coefficients, shape (k, n): column j has a single
  /// nonzero row, the cluster point j belongs to.
  pub coefficients: Array2<f64>,
  /// Predicted label per point (row-argmax of the coefficients).
  pub labels: Vec<usize>,
  /// Iterations used by the spherical clusterer.
  pub iterations: usize,
  /// Whether the clusterer reached a fixed point before its cap.
  pub converged: bool,
}

/// ONMF-EM: spherical clustering followed by hard-assignment coefficients.
///
/// Negative entries of X are clipped to zero before clustering. The basis is
/// the clusterer's center matrix; H is built by projecting each point onto
/// its own cluster's center only, so each column has exactly one nonzero row
/// and the row-argmax labels coincide with the clusterer's assignment.
#[derive(TypedBuilder, Debug)]
pub struct OnmfEm<'a, 'l, 'r> {
  x: ArrayView2<'a, f64>,
  k: usize,
  true_labels: &'l [usize],
  #[builder(default = 100)]
  max_iter: usize,
  rng: &'r mut StdRng,
}

impl OnmfEm<'_, '_, '_> {
  pub fn exec(self) -> Result<OnmfEmReport> {
    let OnmfEm {
      x,
      k,
      true_labels,
      max_iter,
      rng,
    } = self;

    let (_d, n) = x.dim();
    if true_labels.len() != n {
      return Err(Error::LengthMismatch {
        left: true_labels.len(),
        right: n,
      });
    }

    let x = x.mapv(|v| v.max(0.0));

    let clustering = SphericalKMeans::builder()
      .x(x.view())
      .k(k)
      .max_iter(max_iter)
      .rng(rng)
      .build()
      .exec()?;

    // H[k, j] = c_kᵗ x_j for j in cluster k; everything else stays zero.
    let mut h = Array2::<f64>::zeros((k, n));
    for (cluster, members) in clustering.clusters.iter().enumerate() {
      let center = clustering.centers.column(cluster);
      for &j in members {
        h[(cluster, j)] = center.dot(&x.column(j));
      }
    }

    let reconstruction = clustering.centers.dot(&h);
    let labels = column_argmax(h.view());

    let evaluation = evaluate(x.view(), reconstruction.view(), true_labels, &labels)?;
    info!(
      k,
      accuracy = evaluation.accuracy,
      relative_error = evaluation.relative_error,
      "onmf-em complete"
    );

    Ok(OnmfEmReport {
      evaluation,
      basis: clustering.centers,
      coefficients: h,
      labels,
      iterations: clustering.iterations,
      converged: clustering.converged,
    })
  }
}

/// Output of the GNMF pipeline.
#[derive(Debug, Clone)]
pub struct GnmfReport {
  pub evaluation: Evaluation,
  /// Basis from the external factorization, shape (d, k).
  pub basis: Array2<f64>,
  /// Dense coefficients from the external factorization, shape (k, n).
  pub coefficients: Array2<f64>,
  /// Predicted label per point, from k-means over coefficient columns.
  pub labels: Vec<usize>,
}

/// GNMF evaluation: external factorization plus coefficient re-clustering.
///
/// Factorization is deferred entirely to the [`GraphFactorizer`]. Because H
/// comes back dense rather than hard-assigned, predicted labels are obtained
/// by running k-means on the columns of H (as rows of Hᵗ).
#[derive(TypedBuilder)]
pub struct GnmfPipeline<'a, 'l, 'f, 'r> {
  x: ArrayView2<'a, f64>,
  k: usize,
  true_labels: &'l [usize],
  factorizer: &'f dyn GraphFactorizer,
  #[builder(default)]
  config: GraphConfig,
  rng: &'r mut StdRng,
}

impl GnmfPipeline<'_, '_, '_, '_> {
  pub fn exec(self) -> Result<GnmfReport> {
    let GnmfPipeline {
      x,
      k,
      true_labels,
      factorizer,
      config,
      rng,
    } = self;

    let (d, n) = x.dim();
    if true_labels.len() != n {
      return Err(Error::LengthMismatch {
        left: true_labels.len(),
        right: n,
      });
    }

    let (w, h) = factorizer.compute_factors(x, k, &config)?;
    if w.dim() != (d, k) {
      return Err(Error::ShapeMismatch {
        expected: (d, k),
        actual: w.dim(),
      });
    }
    if h.dim() != (k, n) {
      return Err(Error::ShapeMismatch {
        expected: (k, n),
        actual: h.dim(),
      });
    }

    let points = h.t().to_owned();
    let fit = KMeans::builder()
      .data(points.view())
      .k(k)
      .rng(rng)
      .build()
      .exec()?;

    let reconstruction = w.dot(&h);
    let evaluation = evaluate(x, reconstruction.view(), true_labels, &fit.labels)?;
    info!(
      k,
      lmd = config.lmd,
      accuracy = evaluation.accuracy,
      relative_error = evaluation.relative_error,
      "gnmf evaluation complete"
    );

    Ok(GnmfReport {
      evaluation,
      basis: w,
      coefficients: h,
      labels: fit.labels,
    })
  }
}

/// Index of the maximal row per column; the first maximum wins ties.
fn column_argmax(m: ArrayView2<f64>) -> Vec<usize> {
  let (rows, cols) = m.dim();
  let mut out = Vec::with_capacity(cols);
  for j in 0..cols {
    let mut best = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for i in 0..rows {
      if m[(i, j)] > best_val {
        best_val = m[(i, j)];
        best = i;
      }
    }
    out.push(best);
  }
  out
}
