use serde::Deserialize;
use serde::Serialize;

/// Neighborhood weighting scheme used by a graph-regularized factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightType {
  /// exp(-||x_i - x_j||² / param) affinity weights.
  HeatKernel,
  /// Raw inner-product affinity weights.
  DotWeighting,
}

/// Configuration handed to an external graph-regularized factorization.
///
/// The factorization itself lives behind [`crate::pipeline::GraphFactorizer`];
/// this struct only carries its knobs so backends can be swapped without
/// touching the evaluation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
  /// Iteration budget for the factorization.
  ///
  /// Default: 1000
  pub max_iter: usize,

  /// Weight of the graph-regularization term; 0 disables regularization and
  /// reduces the factorization to plain NMF.
  ///
  /// Default: 0.0
  pub lmd: f64,

  /// Affinity weighting scheme for the neighborhood graph.
  ///
  /// Default: heat kernel
  pub weight_type: WeightType,

  /// Scheme-specific parameter (the heat-kernel bandwidth).
  ///
  /// Default: 0.3
  pub param: f64,
}

impl Default for GraphConfig {
  fn default() -> Self {
    Self {
      max_iter: 1000,
      lmd: 0.0,
      weight_type: WeightType::HeatKernel,
      param: 0.3,
    }
  }
}
