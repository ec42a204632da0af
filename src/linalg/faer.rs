use faer::solvers::SpSolver;
use tracing::debug;

use super::nalgebra::{CscMatrix, Vector};
use crate::error::{Error, Result};

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: CscMatrix) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: CscMatrix) -> Result<Self> {
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|e| Error::Factorization(format!("sparse LU: {e:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &Vector) -> Vector {
    let b = faer::col::from_slice(b.as_slice());
    Vector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}

pub struct FaerCholesky {
  raw: faer::sparse::linalg::solvers::Cholesky<usize, f64>,
}
impl FaerCholesky {
  pub fn new(a: CscMatrix) -> Result<Self> {
    let raw = nalgebra2faer(a)
      .sp_cholesky(faer::Side::Upper)
      .map_err(|e| Error::Factorization(format!("sparse Cholesky: {e:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &Vector) -> Vector {
    let b = faer::col::from_slice(b.as_slice());
    Vector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}

/// Sparse direct solver, picked from the symmetry of the system.
pub enum SparseDirect {
  Cholesky(FaerCholesky),
  Lu(FaerLu),
}
impl SparseDirect {
  /// Symmetric systems are tried with Cholesky first. Symmetric but
  /// indefinite systems (e.g. negative reaction) fall back to LU.
  pub fn factorize(a: CscMatrix, symmetric: bool) -> Result<Self> {
    if symmetric {
      match FaerCholesky::new(a.clone()) {
        Ok(chol) => return Ok(Self::Cholesky(chol)),
        Err(e) => debug!("{e}, falling back to LU"),
      }
    }
    FaerLu::new(a).map(Self::Lu)
  }

  pub fn solve(&self, b: &Vector) -> Vector {
    match self {
      Self::Cholesky(chol) => chol.solve(b),
      Self::Lu(lu) => lu.solve(b),
    }
  }
}
