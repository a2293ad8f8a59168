#[cfg(test)]
mod tests {
  use crate::align::align_and_score;
  use crate::config::GraphConfig;
  use crate::error::Error;
  use crate::kmeans::KMeans;
  use crate::metrics::evaluate;
  use crate::metrics::Evaluation;
  use crate::nmf::MultiplicativeNmf;
  use crate::nmf::ProjectiveNmf;
  use crate::nmf::ProjectiveNmfOrthogonal;
  use crate::pipeline::GnmfPipeline;
  use crate::pipeline::GraphFactorizer;
  use crate::pipeline::OnmfEm;
  use crate::spherical::SphericalKMeans;
  use ndarray::array;
  use ndarray::Array2;
  use ndarray::ArrayView2;
  use rand::rngs::StdRng;
  use rand::Rng;
  use rand::SeedableRng;

  /// Two rank-1 cones on disjoint coordinate supports: columns 0..n_a lie on
  /// the first direction, the rest on the second. Exactly rank 2, nonnegative,
  /// and trivially separable.
  fn disjoint_cone_data(n_a: usize, n_b: usize) -> (Array2<f64>, Vec<usize>) {
    let n = n_a + n_b;
    let mut x = Array2::<f64>::zeros((4, n));
    for j in 0..n_a {
      let scale = 1.0 + j as f64 * 0.3;
      x[(0, j)] = scale;
      x[(1, j)] = 0.5 * scale;
    }
    for j in 0..n_b {
      let scale = 1.0 + j as f64 * 0.2;
      x[(2, n_a + j)] = 0.7 * scale;
      x[(3, n_a + j)] = scale;
    }
    let mut labels = vec![0usize; n_a];
    labels.extend(std::iter::repeat(1).take(n_b));
    (x, labels)
  }

  fn random_nonnegative(d: usize, n: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((d, n), |_| rng.random::<f64>())
  }

  #[test]
  fn alignment_is_invariant_under_label_permutation() {
    let y_true = [0, 1, 2, 0, 1, 2, 2, 1];
    let perms: [[usize; 3]; 6] = [
      [0, 1, 2],
      [0, 2, 1],
      [1, 0, 2],
      [1, 2, 0],
      [2, 0, 1],
      [2, 1, 0],
    ];
    for perm in perms {
      let y_pred: Vec<usize> = y_true.iter().map(|&l| perm[l]).collect();
      let acc = align_and_score(&y_true, &y_pred).unwrap();
      assert!((acc - 1.0).abs() < 1e-12, "perm {perm:?} scored {acc}");
    }
  }

  #[test]
  fn alignment_is_symmetric_in_its_arguments() {
    let a = [0, 0, 1, 1, 2, 2, 0, 1];
    let b = [1, 1, 1, 0, 2, 0, 0, 2];
    let forward = align_and_score(&a, &b).unwrap();
    let backward = align_and_score(&b, &a).unwrap();
    assert!((forward - backward).abs() < 1e-12);
  }

  #[test]
  fn multiplicative_factors_stay_nonnegative() {
    let x = random_nonnegative(6, 9, 3);
    let mut rng = StdRng::seed_from_u64(11);
    let (w, h) = MultiplicativeNmf::builder()
      .x(x.view())
      .rank(3)
      .n_iter(25)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert_eq!(w.dim(), (6, 3));
    assert_eq!(h.dim(), (3, 9));
    assert!(w.iter().all(|&v| v >= 0.0));
    assert!(h.iter().all(|&v| v >= 0.0));
  }

  #[test]
  fn multiplicative_accepts_warm_start() {
    let x = random_nonnegative(5, 7, 4);
    let w0 = random_nonnegative(5, 2, 5);
    let h0 = random_nonnegative(2, 7, 6);
    let mut rng = StdRng::seed_from_u64(0);
    let (w, h) = MultiplicativeNmf::builder()
      .x(x.view())
      .rank(2)
      .n_iter(10)
      .w_init(w0)
      .h_init(h0)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert!(w.iter().all(|&v| v >= 0.0));
    assert!(h.iter().all(|&v| v >= 0.0));
  }

  #[test]
  fn multiplicative_rejects_bad_rank_and_warm_start_shape() {
    let x = random_nonnegative(4, 6, 1);
    let mut rng = StdRng::seed_from_u64(0);
    let err = MultiplicativeNmf::builder()
      .x(x.view())
      .rank(0)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap_err();
    assert!(matches!(err, Error::InvalidRank { .. }));

    let mut rng = StdRng::seed_from_u64(0);
    let err = MultiplicativeNmf::builder()
      .x(x.view())
      .rank(2)
      .w_init(Array2::zeros((4, 3)))
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
  }

  #[test]
  fn rank_one_matrix_is_recovered_by_multiplicative_updates() {
    // X = u vᵗ with u, v >= 0: a rank-1 factorization can reconstruct it
    // exactly, so enough unpenalized iterations drive the error down.
    let u = array![1.0, 0.4, 2.0, 0.7];
    let v = array![0.3, 1.5, 0.8, 2.0, 1.1];
    let mut x = Array2::<f64>::zeros((4, 5));
    for i in 0..4 {
      for j in 0..5 {
        x[(i, j)] = u[i] * v[j];
      }
    }

    let mut rng = StdRng::seed_from_u64(21);
    let (w, h) = MultiplicativeNmf::builder()
      .x(x.view())
      .rank(1)
      .l1_reg(0.0)
      .n_iter(500)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    let recon = w.dot(&h);
    let rel = crate::metrics::relative_reconstruction_error(x.view(), recon.view()).unwrap();
    assert!(rel < 1e-3, "relative error {rel}");
  }

  #[test]
  fn projective_nmf_reduces_loss_on_low_rank_data() {
    let (x, _) = disjoint_cone_data(5, 5);
    let mut rng = StdRng::seed_from_u64(9);
    let (w, loss) = ProjectiveNmf::builder()
      .x(x.view())
      .rank(2)
      .max_iter(300)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert_eq!(w.dim(), (4, 2));
    assert!(w.iter().all(|&v| v >= 0.0));
    // X is exactly rank 2 and self-reconstructible, so the loss collapses.
    let x_norm_sq = x.iter().map(|v| v * v).sum::<f64>();
    assert!(loss < 1e-2 * x_norm_sq, "loss {loss}");
  }

  #[test]
  fn orthogonal_projective_basis_has_unit_diagonal_dominant_gram() {
    let (x, _) = disjoint_cone_data(6, 6);
    let mut rng = StdRng::seed_from_u64(17);
    let (w, _loss) = ProjectiveNmfOrthogonal::builder()
      .x(x.view())
      .rank(2)
      .max_iter(150)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    assert!(w.iter().all(|&v| v >= 0.0));
    let gram = w.t().dot(&w);
    for i in 0..2 {
      assert!((gram[(i, i)] - 1.0).abs() < 1e-6, "column {i} not unit norm");
      for j in 0..2 {
        if i != j {
          assert!(
            gram[(i, i)] > gram[(i, j)].abs(),
            "gram not diagonal dominant: {gram:?}"
          );
        }
      }
    }
  }

  #[test]
  fn spherical_separates_two_obvious_clusters() {
    let x = array![[1.0, 0.9, 0.0, 0.1], [0.0, 0.1, 1.0, 0.9]];
    let mut rng = StdRng::seed_from_u64(42);
    let clustering = SphericalKMeans::builder()
      .x(x.view())
      .k(2)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    assert!(clustering.converged);
    assert_eq!(clustering.assignments.len(), 4);
    let acc = align_and_score(&[0, 0, 1, 1], &clustering.assignments).unwrap();
    assert!((acc - 1.0).abs() < 1e-12);

    // Centers live on the unit sphere.
    for col in clustering.centers.columns() {
      let norm: f64 = col.iter().map(|v| v * v).sum::<f64>().sqrt();
      assert!((norm - 1.0).abs() < 1e-6);
    }
  }

  #[test]
  fn spherical_is_reproducible_for_a_fixed_seed() {
    let (x, _) = disjoint_cone_data(8, 8);
    let run = |seed: u64| {
      let mut rng = StdRng::seed_from_u64(seed);
      SphericalKMeans::builder()
        .x(x.view())
        .k(2)
        .rng(&mut rng)
        .build()
        .exec()
        .unwrap()
    };
    let first = run(123);
    let second = run(123);
    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.iterations, second.iterations);
    assert_eq!(first.centers, second.centers);
  }

  #[test]
  fn spherical_converged_assignment_is_a_fixed_point() {
    let (x, _) = disjoint_cone_data(7, 7);
    let mut rng = StdRng::seed_from_u64(3);
    let first = SphericalKMeans::builder()
      .x(x.view())
      .k(2)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert!(first.converged);

    // Restarting from the converged partition changes nothing: the same
    // centers are recomputed and stickiness keeps every assignment, so the
    // clusterer reconverges in a single iteration.
    let mut rng = StdRng::seed_from_u64(99);
    let second = SphericalKMeans::builder()
      .x(x.view())
      .k(2)
      .init(first.assignments.clone())
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert!(second.converged);
    assert_eq!(second.iterations, 1);
    assert_eq!(second.assignments, first.assignments);
  }

  #[test]
  fn spherical_zero_iteration_cap_returns_full_initial_assignment() {
    let (x, _) = disjoint_cone_data(5, 5);
    let mut rng = StdRng::seed_from_u64(4);
    let clustering = SphericalKMeans::builder()
      .x(x.view())
      .k(3)
      .max_iter(0)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    assert!(!clustering.converged);
    assert_eq!(clustering.iterations, 0);
    assert_eq!(clustering.assignments.len(), 10);
    assert!(clustering.assignments.iter().all(|&c| c < 3));
    for (cluster, members) in clustering.clusters.iter().enumerate() {
      for &i in members {
        assert_eq!(clustering.assignments[i], cluster);
      }
    }
  }

  #[test]
  fn spherical_rejects_more_clusters_than_points() {
    let x = random_nonnegative(3, 4, 2);
    let mut rng = StdRng::seed_from_u64(0);
    let err = SphericalKMeans::builder()
      .x(x.view())
      .k(5)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap_err();
    assert!(matches!(err, Error::InvalidClusterCount { k: 5, n: 4 }));
  }

  #[test]
  fn kmeans_recovers_separated_blobs() {
    // Rows as points: two tight blobs far apart.
    let data = array![
      [0.0, 0.1],
      [0.1, 0.0],
      [0.05, 0.05],
      [5.0, 5.1],
      [5.1, 5.0],
      [5.05, 5.05]
    ];
    let mut rng = StdRng::seed_from_u64(8);
    let fit = KMeans::builder()
      .data(data.view())
      .k(2)
      .n_init(3)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    let acc = align_and_score(&[0, 0, 0, 1, 1, 1], &fit.labels).unwrap();
    assert!((acc - 1.0).abs() < 1e-12);
    assert!(fit.inertia < 0.1);
  }

  #[test]
  fn kmeans_single_cluster_centroid_is_the_mean() {
    // With k = 1 the assignment never changes, so the centroid must still be
    // updated to the mean before convergence is declared; inertia is then
    // measured against the mean, not a seed point.
    let data = array![[0.0, 0.0], [2.0, 0.0], [4.0, 0.0]];
    let mut rng = StdRng::seed_from_u64(5);
    let fit = KMeans::builder()
      .data(data.view())
      .k(1)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert_eq!(fit.labels, vec![0, 0, 0]);
    assert!((fit.centroids[(0, 0)] - 2.0).abs() < 1e-12);
    assert!((fit.centroids[(0, 1)] - 0.0).abs() < 1e-12);
    assert!((fit.inertia - 8.0).abs() < 1e-12);
  }

  #[test]
  fn onmf_em_scores_perfectly_on_disjoint_cones() {
    let (x, labels) = disjoint_cone_data(10, 10);
    let mut rng = StdRng::seed_from_u64(42);
    let report = OnmfEm::builder()
      .x(x.view())
      .k(2)
      .true_labels(&labels)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    assert!((report.evaluation.accuracy - 1.0).abs() < 1e-12);
    assert!((report.evaluation.adjusted_rand_index - 1.0).abs() < 1e-12);
    assert!((report.evaluation.normalized_mutual_info - 1.0).abs() < 1e-12);

    // Hard assignment: exactly one nonzero per column, agreeing with the
    // derived labels.
    for (j, &label) in report.labels.iter().enumerate() {
      for i in 0..2 {
        if i != label {
          assert_eq!(report.coefficients[(i, j)], 0.0);
        }
      }
    }
  }

  #[test]
  fn onmf_em_clips_negative_entries_before_clustering() {
    let (mut x, labels) = disjoint_cone_data(5, 5);
    x[(3, 0)] = -0.4; // off-support noise that clipping removes
    let mut rng = StdRng::seed_from_u64(42);
    let report = OnmfEm::builder()
      .x(x.view())
      .k(2)
      .true_labels(&labels)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();
    assert!((report.evaluation.accuracy - 1.0).abs() < 1e-12);
  }

  /// Plain NMF standing in for the external graph-regularized factorization:
  /// with lmd = 0 the regularization term vanishes, so this is a conformant
  /// backend for unregularized configs.
  struct PlainNmfBackend {
    seed: u64,
  }

  impl GraphFactorizer for PlainNmfBackend {
    fn compute_factors(
      &self,
      x: ArrayView2<f64>,
      k: usize,
      config: &GraphConfig,
    ) -> crate::error::Result<(Array2<f64>, Array2<f64>)> {
      let mut rng = StdRng::seed_from_u64(self.seed);
      MultiplicativeNmf::builder()
        .x(x)
        .rank(k)
        .l1_reg(0.0)
        .n_iter(config.max_iter)
        .rng(&mut rng)
        .build()
        .exec()
    }
  }

  #[test]
  fn gnmf_pipeline_clusters_coefficients_from_the_backend() {
    let (x, labels) = disjoint_cone_data(8, 8);
    let backend = PlainNmfBackend { seed: 13 };
    let config = GraphConfig {
      max_iter: 400,
      ..GraphConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(7);
    let report = GnmfPipeline::builder()
      .x(x.view())
      .k(2)
      .true_labels(&labels)
      .factorizer(&backend)
      .config(config)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    assert!((report.evaluation.accuracy - 1.0).abs() < 1e-12);
    assert!(report.evaluation.relative_error < 0.05);
    assert_eq!(report.basis.dim(), (4, 2));
    assert_eq!(report.coefficients.dim(), (2, 16));
  }

  struct MisshapenBackend;

  impl GraphFactorizer for MisshapenBackend {
    fn compute_factors(
      &self,
      x: ArrayView2<f64>,
      _k: usize,
      _config: &GraphConfig,
    ) -> crate::error::Result<(Array2<f64>, Array2<f64>)> {
      // Wrong rank on purpose.
      let (d, n) = x.dim();
      Ok((Array2::zeros((d, 1)), Array2::zeros((1, n))))
    }
  }

  #[test]
  fn gnmf_pipeline_rejects_misshapen_factors() {
    let (x, labels) = disjoint_cone_data(4, 4);
    let backend = MisshapenBackend;
    let mut rng = StdRng::seed_from_u64(0);
    let err = GnmfPipeline::builder()
      .x(x.view())
      .k(2)
      .true_labels(&labels)
      .factorizer(&backend)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
  }

  #[test]
  fn evaluation_rejects_zero_norm_data() {
    let x = Array2::<f64>::zeros((3, 4));
    let recon = Array2::<f64>::zeros((3, 4));
    let err = evaluate(x.view(), recon.view(), &[0, 0, 1, 1], &[0, 0, 1, 1]).unwrap_err();
    assert!(matches!(err, Error::DegenerateInput(_)));
  }

  #[test]
  fn evaluation_serializes_round_trip() {
    let (x, labels) = disjoint_cone_data(5, 5);
    let mut rng = StdRng::seed_from_u64(1);
    let report = OnmfEm::builder()
      .x(x.view())
      .k(2)
      .true_labels(&labels)
      .rng(&mut rng)
      .build()
      .exec()
      .unwrap();

    let json = serde_json::to_string(&report.evaluation).unwrap();
    let back: Evaluation = serde_json::from_str(&json).unwrap();
    assert_eq!(back.accuracy, report.evaluation.accuracy);
    assert_eq!(back.relative_error, report.evaluation.relative_error);

    let config_json = serde_json::to_string(&GraphConfig::default()).unwrap();
    let config: GraphConfig = serde_json::from_str(&config_json).unwrap();
    assert_eq!(config.max_iter, 1000);
  }
}
