//! Rank truncated singular value decomposition.
//!
//! The exact policy truncates a full SVD. The randomized policies project the
//! matrix onto an approximate range, found either by subspace (power) iteration
//! or by a block Krylov iteration, and decompose the small projected matrix.

use crate::{
  error::{Error, Result},
  linalg::nalgebra::{hstack, DMatrixExt, Matrix, Vector},
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SvdPolicy {
  #[default]
  Exact,
  RandomizedSubspace,
  RandomizedBlockKrylov,
}

/// Tuning of the randomized policies, ignored by [`SvdPolicy::Exact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomizedOptions {
  /// Extra columns of the random test matrix beyond the requested rank.
  pub oversampling: usize,
  /// Power iterations resp. Krylov blocks. `None` picks a per policy default.
  pub iterations: Option<usize>,
  pub seed: u64,
}

impl Default for RandomizedOptions {
  fn default() -> Self {
    Self {
      oversampling: 10,
      iterations: None,
      seed: 0x5eed,
    }
  }
}

#[derive(Debug, Clone)]
pub struct TruncatedSvd {
  u: Matrix,
  v: Matrix,
  sigma: Vector,
  policy: SvdPolicy,
}

impl TruncatedSvd {
  pub fn new(a: &Matrix, rank: usize, policy: SvdPolicy) -> Result<Self> {
    Self::with_options(a, rank, policy, RandomizedOptions::default())
  }

  pub fn with_options(
    a: &Matrix,
    rank: usize,
    policy: SvdPolicy,
    options: RandomizedOptions,
  ) -> Result<Self> {
    let max = a.nrows().min(a.ncols());
    if rank == 0 || rank > max {
      return Err(Error::InvalidRank { rank, max });
    }

    let (u, sigma, v) = match policy {
      SvdPolicy::Exact => {
        let (u, sigma, v) = sorted_svd(a.clone())?;
        truncate(u, sigma, v, rank)
      }
      SvdPolicy::RandomizedSubspace => {
        let iterations = options.iterations.unwrap_or(4);
        let q = subspace_iteration(a, rank, iterations, &options);
        project(a, &q, rank)?
      }
      SvdPolicy::RandomizedBlockKrylov => {
        let iterations = options.iterations.unwrap_or(3);
        let q = block_krylov_iteration(a, rank, iterations, &options);
        project(a, &q, rank)?
      }
    };
    debug!(
      ?policy,
      rank,
      nrows = a.nrows(),
      ncols = a.ncols(),
      "computed truncated svd"
    );

    Ok(Self { u, v, sigma, policy })
  }

  pub fn matrix_u(&self) -> &Matrix {
    &self.u
  }
  pub fn matrix_v(&self) -> &Matrix {
    &self.v
  }
  /// Non-negative and non-increasing.
  pub fn singular_values(&self) -> &Vector {
    &self.sigma
  }
  pub fn rank(&self) -> usize {
    self.sigma.len()
  }
  pub fn policy(&self) -> SvdPolicy {
    self.policy
  }

  /// $U Sigma V^T$
  pub fn reconstruct(&self) -> Matrix {
    &self.u * Matrix::from_diagonal(&self.sigma) * self.v.transpose()
  }
}

/// Thin SVD with singular values sorted in decreasing order.
fn sorted_svd(a: Matrix) -> Result<(Matrix, Vector, Matrix)> {
  let svd = a.svd(true, true);
  let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
    return Err(Error::Factorization("singular vectors were not computed".into()));
  };
  let sigma = svd.singular_values;

  let mut order: Vec<usize> = (0..sigma.len()).collect();
  order.sort_by(|&i, &j| sigma[j].total_cmp(&sigma[i]));

  let u = Matrix::from_columns(&order.iter().map(|&i| u.column(i)).collect::<Vec<_>>());
  let v = Matrix::from_columns(&order.iter().map(|&i| v_t.row(i).transpose()).collect::<Vec<_>>());
  let sigma = Vector::from_iterator(order.len(), order.iter().map(|&i| sigma[i]));
  Ok((u, sigma, v))
}

fn truncate(u: Matrix, sigma: Vector, v: Matrix, rank: usize) -> (Matrix, Vector, Matrix) {
  (
    u.columns(0, rank).into_owned(),
    sigma.rows(0, rank).into_owned(),
    v.columns(0, rank).into_owned(),
  )
}

fn gaussian_matrix(nrows: usize, ncols: usize, seed: u64) -> Matrix {
  let mut rng = ChaCha8Rng::seed_from_u64(seed);
  Matrix::from_fn(nrows, ncols, |_, _| StandardNormal.sample(&mut rng))
}

fn sample_size(a: &Matrix, rank: usize, options: &RandomizedOptions) -> usize {
  (rank + options.oversampling).min(a.nrows().min(a.ncols()))
}

/// Orthonormal basis approximating the range of `a`, refined by power iterations.
fn subspace_iteration(a: &Matrix, rank: usize, iterations: usize, options: &RandomizedOptions) -> Matrix {
  let omega = gaussian_matrix(a.ncols(), sample_size(a, rank, options), options.seed);
  let mut q = (a * omega).orthonormalized();
  for _ in 0..iterations {
    let z = (a.transpose() * &q).orthonormalized();
    q = (a * z).orthonormalized();
  }
  q
}

/// Orthonormal basis of the block Krylov space $[A Omega, (A A^T) A Omega, ...]$.
fn block_krylov_iteration(
  a: &Matrix,
  rank: usize,
  iterations: usize,
  options: &RandomizedOptions,
) -> Matrix {
  let omega = gaussian_matrix(a.ncols(), sample_size(a, rank, options), options.seed);
  let mut block = (a * omega).orthonormalized();
  let mut blocks = vec![block.clone()];
  for _ in 0..iterations {
    block = (a * (a.transpose() * &block)).orthonormalized();
    blocks.push(block.clone());
  }
  hstack(&blocks).orthonormalized()
}

/// Decomposes $Q^T A$ and lifts the left singular vectors back with $Q$.
fn project(a: &Matrix, q: &Matrix, rank: usize) -> Result<(Matrix, Vector, Matrix)> {
  let b = q.transpose() * a;
  let (ub, sigma, v) = sorted_svd(b)?;
  let u = q * ub;
  Ok(truncate(u, sigma, v, rank))
}
