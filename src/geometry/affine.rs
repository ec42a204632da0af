use super::DEFAULT_TOL;
use crate::{
  error::{Error, Result},
  linalg::nalgebra::{DMatrixExt, Matrix, Vector},
  Dim,
};

/// The affine span `origin + span(basis)` of some vectors in ambient space.
#[derive(Debug, Clone)]
pub struct AffineSubspace {
  origin: Vector,
  /// Spanning vectors in the columns.
  basis: Matrix,
  /// Orthonormal basis of the same linear space.
  orthonormal: Matrix,
}

impl AffineSubspace {
  pub fn new(origin: Vector, basis: Matrix) -> Result<Self> {
    if basis.nrows() != origin.len() {
      return Err(Error::inconsistent(format!(
        "basis vectors live in {} dimensions, the origin in {}",
        basis.nrows(),
        origin.len()
      )));
    }
    if basis.ncols() > basis.nrows() {
      return Err(Error::degenerate(format!(
        "{} vectors cannot be independent in {} dimensions",
        basis.ncols(),
        basis.nrows()
      )));
    }
    let scale = basis.column_iter().map(|c| c.norm()).fold(0.0, f64::max);
    if basis.ncols() > 0 && !basis.is_full_rank(DEFAULT_TOL * scale) {
      return Err(Error::degenerate("spanning vectors are linearly dependent"));
    }
    let orthonormal = basis.clone().orthonormalized();
    Ok(Self {
      origin,
      basis,
      orthonormal,
    })
  }

  pub fn dim(&self) -> Dim {
    self.basis.ncols()
  }
  pub fn dim_ambient(&self) -> Dim {
    self.basis.nrows()
  }
  pub fn origin(&self) -> &Vector {
    &self.origin
  }
  pub fn basis(&self) -> &Matrix {
    &self.basis
  }

  /// Orthogonal projection of `x` onto the subspace.
  pub fn project(&self, x: &Vector) -> Vector {
    let rel = x - &self.origin;
    &self.origin + &self.orthonormal * (self.orthonormal.transpose() * rel)
  }

  /// Euclidean distance of `x` to the subspace.
  pub fn distance(&self, x: &Vector) -> f64 {
    (x - self.project(x)).norm()
  }

  /// Least-squares coefficients of `x - origin` in the spanning vectors.
  pub fn to_local(&self, x: &Vector) -> Result<Vector> {
    if self.dim() == 0 {
      return Ok(Vector::zeros(0));
    }
    self
      .basis
      .clone()
      .svd(true, true)
      .solve(&(x - &self.origin), 1e-12)
      .map_err(|e| Error::degenerate(e.to_string()))
  }

  pub fn to_global(&self, local: &Vector) -> Vector {
    &self.basis * local + &self.origin
  }
}
