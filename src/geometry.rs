//! Geometry of single simplices, independent of any mesh or PDE.

pub mod affine;
pub mod element;

pub use affine::AffineSubspace;
pub use element::Element;

use crate::{util::factorial, Dim};

/// Tolerance used by containment and distance queries unless the caller overrides it.
pub const DEFAULT_TOL: f64 = 10.0 * f64::EPSILON;

/// Volume of the reference simplex in `dim` dimensions.
pub fn refsimp_vol(dim: Dim) -> f64 {
  (factorial(dim) as f64).recip()
}

/// Number of lagrange nodes of an `dim`-simplex with polynomial order `order`.
pub fn nnodes(dim: Dim, order: usize) -> usize {
  num_integer::binomial(dim + order, dim)
}

pub fn nvertices(dim: Dim) -> usize {
  dim + 1
}

pub fn nedges(dim: Dim) -> usize {
  dim * (dim + 1) / 2
}
