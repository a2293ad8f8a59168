use crate::error::Error;
use crate::error::Result;
use ndarray::Array2;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;
use typed_builder::TypedBuilder;

/// Result of one Lloyd's k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
  /// Cluster index per point (per row of the input), length n.
  pub labels: Vec<usize>,
  /// Cluster centroids, shape (k, n_features).
  pub centroids: Array2<f64>,
  /// Sum of squared distances from each point to its centroid.
  pub inertia: f64,
}

/// Lloyd's k-means over points given as matrix rows.
///
/// Used by the GNMF pipeline to re-cluster dense coefficient rows, where no
/// hard assignment is available from the factorization itself. Centroids are
/// seeded from distinct random points; `n_init` independent restarts keep
/// the fit with the lowest inertia.
#[derive(TypedBuilder, Debug)]
pub struct KMeans<'a, 'r> {
  /// Points as rows, shape (n, n_features).
  data: ArrayView2<'a, f64>,
  k: usize,
  #[builder(default = 100)]
  max_iter: usize,
  #[builder(default = 1)]
  n_init: usize,
  rng: &'r mut StdRng,
}

impl KMeans<'_, '_> {
  pub fn exec(self) -> Result<KMeansFit> {
    let KMeans {
      data,
      k,
      max_iter,
      n_init,
      rng,
    } = self;

    let (n, _features) = data.dim();
    if n == 0 {
      return Err(Error::EmptyInput("point matrix"));
    }
    if k == 0 || k > n {
      return Err(Error::InvalidClusterCount { k, n });
    }

    let restarts = n_init.max(1);
    let mut best = lloyd_single_run(data, k, max_iter, rng);
    for _ in 1..restarts {
      let fit = lloyd_single_run(data, k, max_iter, rng);
      if fit.inertia < best.inertia {
        best = fit;
      }
    }

    debug!(k, restarts, inertia = best.inertia, "k-means complete");
    Ok(best)
  }
}

fn lloyd_single_run(
  data: ArrayView2<f64>,
  k: usize,
  max_iter: usize,
  rng: &mut StdRng,
) -> KMeansFit {
  let (n, features) = data.dim();

  // Seed centroids from k distinct points.
  let seeds = rand::seq::index::sample(rng, n, k);
  let mut centroids = Array2::<f64>::zeros((k, features));
  for (cluster, point) in seeds.iter().enumerate() {
    centroids.row_mut(cluster).assign(&data.row(point));
  }

  // Sentinel labels force the first pass to register as a change, so the
  // centroids always see at least one mean update before the convergence
  // break can fire.
  let mut labels = vec![usize::MAX; n];
  for _ in 0..max_iter.max(1) {
    let mut changed = false;
    for i in 0..n {
      let mut best_cluster = 0;
      let mut best_dist = f64::INFINITY;
      for cluster in 0..k {
        let dist: f64 = data
          .row(i)
          .iter()
          .zip(centroids.row(cluster).iter())
          .map(|(a, b)| (a - b) * (a - b))
          .sum();
        if dist < best_dist {
          best_dist = dist;
          best_cluster = cluster;
        }
      }
      if labels[i] != best_cluster {
        labels[i] = best_cluster;
        changed = true;
      }
    }
    if !changed {
      break;
    }

    // Mean update; an emptied cluster is reseeded from a random point.
    let mut sums = Array2::<f64>::zeros((k, features));
    let mut counts = vec![0usize; k];
    for (i, &cluster) in labels.iter().enumerate() {
      counts[cluster] += 1;
      let mut row = sums.row_mut(cluster);
      row += &data.row(i);
    }
    for cluster in 0..k {
      if counts[cluster] > 0 {
        let scale = 1.0 / counts[cluster] as f64;
        for f in 0..features {
          centroids[(cluster, f)] = sums[(cluster, f)] * scale;
        }
      } else {
        let point = rng.random_range(0..n);
        centroids.row_mut(cluster).assign(&data.row(point));
      }
    }
  }

  let inertia: f64 = labels
    .iter()
    .enumerate()
    .map(|(i, &cluster)| {
      data
        .row(i)
        .iter()
        .zip(centroids.row(cluster).iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
    })
    .sum();

  KMeansFit {
    labels,
    centroids,
    inertia,
  }
}
