use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// The affine map of a simplex (or the basis of an affine subspace) is not invertible.
  #[error("degenerate geometry: {0}")]
  DegenerateGeometry(String),

  #[error("invalid truncation rank {rank}, expected a rank in 1..={max}")]
  InvalidRank { rank: usize, max: usize },

  #[error("inconsistent data: {0}")]
  InconsistentData(String),

  /// A result was requested before `init`/`solve` produced it.
  #[error("`{0}` is not available before the system has been assembled and solved")]
  Unsolved(&'static str),

  #[error("unsupported polynomial order {0}, only linear lagrange elements are available")]
  UnsupportedOrder(usize),

  #[error("factorization of the system matrix failed: {0}")]
  Factorization(String),
}

impl Error {
  pub(crate) fn inconsistent(msg: impl Into<String>) -> Self {
    Self::InconsistentData(msg.into())
  }
  pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
    Self::DegenerateGeometry(msg.into())
  }
}
