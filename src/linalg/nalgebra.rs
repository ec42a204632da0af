use std::mem;

pub type Matrix = na::DMatrix<f64>;
pub type Vector = na::DVector<f64>;

pub type CooMatrix = nas::CooMatrix<f64>;
pub type CsrMatrix = nas::CsrMatrix<f64>;
pub type CscMatrix = nas::CscMatrix<f64>;

pub trait DMatrixExt {
  fn is_full_rank(&self, eps: f64) -> bool;
  fn orthonormalized(self) -> Self;
}
impl DMatrixExt for Matrix {
  fn is_full_rank(&self, eps: f64) -> bool {
    self.rank(eps) == self.nrows().min(self.ncols())
  }
  /// Orthonormal basis of the column space, obtained from a thin QR factorization.
  fn orthonormalized(self) -> Self {
    if self.is_empty() {
      return Matrix::zeros(self.nrows(), 0);
    }
    self.qr().q()
  }
}

/// Places the blocks next to each other, column-wise.
pub fn hstack(blocks: &[Matrix]) -> Matrix {
  let nrows = blocks.first().map_or(0, |b| b.nrows());
  assert!(blocks.iter().all(|b| b.nrows() == nrows));
  let ncols = blocks.iter().map(|b| b.ncols()).sum();

  let mut stacked = Matrix::zeros(nrows, ncols);
  let mut offset = 0;
  for block in blocks {
    stacked
      .view_mut((0, offset), (nrows, block.ncols()))
      .copy_from(block);
    offset += block.ncols();
  }
  stacked
}

pub trait CooMatrixExt {
  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool;
}

impl CooMatrixExt for CooMatrix {
  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    let nrows = self.nrows();
    let ncols = self.ncols();
    let (mut rows, mut cols, mut vals) = mem::replace(self, Self::new(0, 0)).disassemble();
    let mut i = 0;
    while i < rows.len() {
      let r = rows[i];
      let c = cols[i];
      if predicate(r, c) {
        rows.swap_remove(i);
        cols.swap_remove(i);
        vals.swap_remove(i);
      } else {
        i += 1;
      }
    }
    // Indices were valid before and entries are only removed.
    *self = Self::try_from_triplets(nrows, ncols, rows, cols, vals)
      .unwrap_or_else(|_| unreachable!("removing triplets keeps the coo matrix valid"));
  }
}
