//! Nonnegative matrix factorization solvers.
//!
//! Three fixed-iteration solvers over a dense nonnegative matrix X (d, n):
//!
//! * [`MultiplicativeNmf`] - alternating multiplicative updates for
//!   X ~ W H with an optional L1 sparsity penalty on H.
//! * [`ProjectiveNmf`] - multiplicative updates for X ~ W Wᵗ X, with
//!   orthogonality of W emerging only approximately from the objective.
//! * [`ProjectiveNmfOrthogonal`] - gradient descent on the same objective
//!   with hard nonnegativity and QR-rectified orthogonality projections.
//!
//! None of the solvers stops early: callers control cost through the
//! iteration count, and a fixed budget always produces the same output for
//! the same seed.

mod multiplicative;
mod projective;
mod projective_orthogonal;

pub use multiplicative::MultiplicativeNmf;
pub use projective::ProjectiveNmf;
pub use projective_orthogonal::ProjectiveNmfOrthogonal;
