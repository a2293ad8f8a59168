use thiserror::Error;

/// Errors reported at component boundaries.
///
/// Every variant corresponds to a condition detectable before any partial
/// computation. Non-convergence is deliberately *not* an error: solvers that
/// hit their iteration cap return best-effort results with a `converged` flag.
#[derive(Debug, Error)]
pub enum Error {
  /// Two label vectors that must be paired point-for-point differ in length.
  #[error("label vectors differ in length: {left} vs {right}")]
  LengthMismatch { left: usize, right: usize },

  /// Two matrices that must be compared entrywise have different shapes.
  #[error("matrix shape mismatch: expected {expected:?}, got {actual:?}")]
  ShapeMismatch {
    expected: (usize, usize),
    actual: (usize, usize),
  },

  /// A factorization rank that cannot produce a valid decomposition.
  #[error("invalid rank {rank} for a {d}x{n} matrix")]
  InvalidRank { rank: usize, d: usize, n: usize },

  /// A cluster count that cannot partition the given points.
  #[error("invalid cluster count {k} for {n} points")]
  InvalidClusterCount { k: usize, n: usize },

  /// An input with no data to operate on.
  #[error("empty input: {0}")]
  EmptyInput(&'static str),

  /// An input that makes the requested quantity undefined.
  #[error("degenerate input: {0}")]
  DegenerateInput(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
