//! Structured mesh generators.

use super::Mesh;
use crate::{
  error::{Error, Result},
  linalg::nalgebra::Matrix,
};

/// $[0,1]$ split into `n` segments.
pub fn unit_interval(n: usize) -> Result<Mesh> {
  check_subdivisions(n)?;
  let nodes = Matrix::from_fn(1, n + 1, |_, i| i as f64 / n as f64);
  let cells = (0..n).map(|i| vec![i, i + 1]).collect();
  Mesh::new(nodes, cells)
}

/// $[0,1]^2$ with `n` squares per side, each split into two triangles.
pub fn unit_square(n: usize) -> Result<Mesh> {
  let (nodes, cells) = square_grid(n)?;
  Mesh::new(nodes, cells)
}

/// The unit square, embedded into the plane $z = 0$ of 3D space.
pub fn unit_square_surface(n: usize) -> Result<Mesh> {
  let (nodes, cells) = square_grid(n)?;
  let nodes = nodes.insert_row(2, 0.0);
  Mesh::new(nodes, cells)
}

/// A network of consecutive segments through the given points (columns).
pub fn polyline(points: Matrix) -> Result<Mesh> {
  if points.ncols() < 2 {
    return Err(Error::inconsistent("a polyline needs at least two points"));
  }
  let cells = (0..points.ncols() - 1).map(|i| vec![i, i + 1]).collect();
  Mesh::new(points, cells)
}

fn check_subdivisions(n: usize) -> Result<()> {
  if n == 0 {
    return Err(Error::inconsistent("number of subdivisions must be positive"));
  }
  Ok(())
}

fn square_grid(n: usize) -> Result<(Matrix, Vec<Vec<usize>>)> {
  check_subdivisions(n)?;
  let nside = n + 1;
  let h = (n as f64).recip();

  let nodes = Matrix::from_fn(2, nside * nside, |icomp, inode| {
    let cart = [inode % nside, inode / nside];
    cart[icomp] as f64 * h
  });

  let mut cells = Vec::with_capacity(2 * n * n);
  for j in 0..n {
    for i in 0..n {
      let v0 = i + j * nside;
      let v1 = v0 + 1;
      let v2 = v0 + nside;
      let v3 = v2 + 1;
      cells.push(vec![v0, v1, v3]);
      cells.push(vec![v0, v3, v2]);
    }
  }
  Ok((nodes, cells))
}
