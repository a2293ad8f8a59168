use crate::error::Error;
use crate::error::Result;
use crate::linalg::leading_left_singular_vector;
use crate::linalg::CLOSE_TOL;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::Rng;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;
use tracing::info;
use tracing::warn;
use typed_builder::TypedBuilder;

/// Result of spherical k-means clustering.
#[derive(Debug, Clone)]
pub struct SphericalClustering {
  /// Cluster index per point, length n.
  pub assignments: Vec<usize>,
  /// Point indices grouped per cluster; clusters may be empty.
  pub clusters: Vec<Vec<usize>>,
  /// Unit-norm cluster centers, shape (d, k). Not mutually orthonormal in
  /// general, only column-normalized.
  pub centers: Array2<f64>,
  /// Iterations actually run.
  pub iterations: usize,
  /// Whether the assignment reached a fixed point before `max_iter`.
  pub converged: bool,
}

/// Spherical k-means with leading-singular-vector centers.
///
/// Alternates two steps until the assignment vector repeats exactly or
/// `max_iter` is reached:
///
/// 1. Each nonempty cluster's center becomes the absolute value of the
///    leading left singular vector of its assigned columns (the absolute
///    value is a heuristic keeping downstream reconstructions nonnegative,
///    not a guarantee). Empty clusters fall back to a uniformly sampled data
///    column, normalized when its norm permits.
/// 2. Each point joins the cluster whose center has the maximal dot product
///    with it. Ties are broken uniformly at random with fresh noise each
///    iteration, except that a point whose previous cluster is still tied
///    keeps it.
///
/// Hitting the iteration cap is not an error: the caller receives the last
/// partition with `converged == false`.
#[derive(TypedBuilder, Debug)]
pub struct SphericalKMeans<'a, 'r> {
  x: ArrayView2<'a, f64>,
  k: usize,
  #[builder(default = 100)]
  max_iter: usize,
  /// Warm-start assignment; a uniform random partition when absent. An
  /// already-converged assignment is a fixed point: restarting from it
  /// reconverges in one iteration without changing the partition.
  #[builder(default, setter(strip_option))]
  init: Option<Vec<usize>>,
  rng: &'r mut StdRng,
}

impl SphericalKMeans<'_, '_> {
  pub fn exec(self) -> Result<SphericalClustering> {
    let SphericalKMeans {
      x,
      k,
      max_iter,
      init,
      rng,
    } = self;

    let (d, n) = x.dim();
    if d == 0 || n == 0 {
      return Err(Error::EmptyInput("data matrix"));
    }
    if k == 0 || k > n {
      return Err(Error::InvalidClusterCount { k, n });
    }

    let mut assignments: Vec<usize> = match init {
      Some(init) => {
        if init.len() != n {
          return Err(Error::LengthMismatch {
            left: init.len(),
            right: n,
          });
        }
        if init.iter().any(|&c| c >= k) {
          return Err(Error::DegenerateInput(
            "warm-start assignment references a cluster out of range",
          ));
        }
        init
      }
      // Uniform random initial assignment, materialized so the result is a
      // full-length vector even when the iteration cap is zero.
      None => (0..n).map(|_| rng.random_range(0..k)).collect(),
    };

    // Partition from the warm start or the random init; nonempty clusters
    // not guaranteed either way.
    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &cluster) in assignments.iter().enumerate() {
      clusters[cluster].push(i);
    }
    let mut centers = Array2::<f64>::zeros((d, k));
    let mut converged = false;
    let mut iterations = 0;

    while !converged && iterations < max_iter {
      iterations += 1;

      // Centers for nonempty clusters are independent of the RNG and of each
      // other, so they can be computed in parallel without affecting
      // reproducibility.
      let computed: Vec<Option<Array1<f64>>> = clusters
        .par_iter()
        .map(|members| {
          if members.is_empty() {
            return None;
          }
          let sub = x.select(Axis(1), members);
          Some(leading_left_singular_vector(sub.view()).mapv(f64::abs))
        })
        .collect();

      for (cluster, center) in computed.into_iter().enumerate() {
        match center {
          Some(u) => centers.column_mut(cluster).assign(&u),
          None => {
            // Empty cluster: reseed from a uniformly sampled data column.
            let col = x.column(rng.random_range(0..n));
            let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
            for (row, &v) in col.iter().enumerate() {
              centers[(row, cluster)] = if norm > CLOSE_TOL { v / norm } else { v };
            }
          }
        }
      }

      // Dot products between every point and every center.
      let dots = x.t().dot(&centers);

      let old_assignments = std::mem::take(&mut assignments);
      assignments = Vec::with_capacity(n);

      for i in 0..n {
        let row = dots.row(i);
        let max_dot = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Uniform random tie-break: each tied cluster draws fresh noise and
        // the largest draw wins.
        let mut best = 0usize;
        let mut best_noise = f64::NEG_INFINITY;
        for (cluster, &dot) in row.iter().enumerate() {
          if is_close(dot, max_dot) {
            let noise = rng.random::<f64>();
            if noise > best_noise {
              best_noise = noise;
              best = cluster;
            }
          }
        }

        // Stickiness: a previous assignment still tied for the maximum wins
        // over the random choice, favoring stability over churn.
        if let Some(&prev) = old_assignments.get(i) {
          if is_close(row[prev], max_dot) {
            best = prev;
          }
        }

        assignments.push(best);
      }

      clusters = vec![Vec::new(); k];
      for (i, &cluster) in assignments.iter().enumerate() {
        clusters[cluster].push(i);
      }

      converged = old_assignments == assignments;
    }

    if converged {
      info!(iterations, k, "spherical k-means converged");
    } else {
      warn!(
        iterations,
        k, "spherical k-means stopped at the iteration cap"
      );
    }

    Ok(SphericalClustering {
      assignments,
      clusters,
      centers,
      iterations,
      converged,
    })
  }
}

/// Tolerance comparison matching numpy's `isclose` defaults.
fn is_close(a: f64, b: f64) -> bool {
  (a - b).abs() <= CLOSE_TOL + 1e-5 * b.abs()
}
