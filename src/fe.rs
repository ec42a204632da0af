//! Finite element basis functions and simplex quadrature.

use crate::{
  error::{Error, Result},
  geometry::{nnodes, Element},
  linalg::nalgebra::{Matrix, Vector},
  Dim,
};

pub type DofIdx = usize;

/// Local shape functions on a simplex.
pub trait Basis: Sync {
  /// Polynomial order of the shape functions.
  fn order(&self) -> usize;

  fn nlocal_dofs(&self, dim: Dim) -> usize {
    nnodes(dim, self.order())
  }

  /// Values of all local shape functions at a point given in barycentric coordinates.
  fn eval(&self, bary: &Vector) -> Vector;

  /// Gradients of all local shape functions (rows) in ambient coordinates.
  fn eval_grads(&self, element: &Element, bary: &Vector) -> Matrix;
}

/// Linear lagrange elements, the shape functions are the barycentric coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct LagrangeP1;

impl Basis for LagrangeP1 {
  fn order(&self) -> usize {
    1
  }
  fn eval(&self, bary: &Vector) -> Vector {
    bary.clone()
  }
  fn eval_grads(&self, element: &Element, _bary: &Vector) -> Matrix {
    element.barycentric_gradients()
  }
}

/// Quadrature rule on a simplex.
///
/// Nodes are given in barycentric coordinates and the weights sum to one,
/// such that $integral_K f approx |K| sum_q w_q f(x_q)$.
#[derive(Debug, Clone)]
pub struct QuadRule {
  dim: Dim,
  nodes: Vec<Vector>,
  weights: Vec<f64>,
}

impl QuadRule {
  pub fn new(dim: Dim, nodes: Vec<Vector>, weights: Vec<f64>) -> Result<Self> {
    if nodes.len() != weights.len() {
      return Err(Error::inconsistent(format!(
        "{} quadrature nodes but {} weights",
        nodes.len(),
        weights.len()
      )));
    }
    if nodes.iter().any(|n| n.len() != dim + 1) {
      return Err(Error::inconsistent(format!(
        "quadrature nodes of a {dim}-simplex need {} barycentric coordinates",
        dim + 1
      )));
    }
    Ok(Self {
      dim,
      nodes,
      weights,
    })
  }

  /// Single node at the barycenter. Integrates affine functions exactly.
  pub fn barycenter(dim: Dim) -> Self {
    let node = Vector::from_element(dim + 1, 1.0 / (dim + 1) as f64);
    Self {
      dim,
      nodes: vec![node],
      weights: vec![1.0],
    }
  }

  /// Trapezoidal rule on the vertices. Gives lumped mass matrices.
  pub fn vertex(dim: Dim) -> Self {
    let nvertices = dim + 1;
    let nodes = (0..nvertices)
      .map(|i| {
        let mut node = Vector::zeros(nvertices);
        node[i] = 1.0;
        node
      })
      .collect();
    let weights = vec![1.0 / nvertices as f64; nvertices];
    Self {
      dim,
      nodes,
      weights,
    }
  }

  /// Symmetric rule with $n+1$ nodes, exact for quadratic polynomials.
  pub fn degree2(dim: Dim) -> Self {
    let n = dim as f64;
    let nvertices = dim + 1;
    let sqrt = (n + 2.0).sqrt();
    let denom = (n + 1.0) * (n + 2.0);
    let major = (n + 2.0 + n * sqrt) / denom;
    let minor = (n + 2.0 - sqrt) / denom;

    let nodes = (0..nvertices)
      .map(|i| {
        let mut node = Vector::from_element(nvertices, minor);
        node[i] = major;
        node
      })
      .collect();
    let weights = vec![1.0 / nvertices as f64; nvertices];
    Self {
      dim,
      nodes,
      weights,
    }
  }

  pub fn dim(&self) -> Dim {
    self.dim
  }
  pub fn npoints(&self) -> usize {
    self.nodes.len()
  }
  pub fn nodes(&self) -> &[Vector] {
    &self.nodes
  }
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }
  pub fn iter(&self) -> impl Iterator<Item = (&Vector, f64)> {
    self.nodes.iter().zip(self.weights.iter().copied())
  }

  pub fn check_element(&self, element: &Element) -> Result<()> {
    if element.dim_intrinsic() != self.dim {
      return Err(Error::inconsistent(format!(
        "quadrature rule for {}-simplices used on element {} of dimension {}",
        self.dim,
        element.id(),
        element.dim_intrinsic()
      )));
    }
    Ok(())
  }

  /// Integrates a function of ambient coordinates over the element.
  pub fn integrate<F>(&self, element: &Element, f: F) -> Result<f64>
  where
    F: Fn(&Vector) -> f64,
  {
    self.check_element(element)?;
    let mut sum = 0.0;
    for (bary, w) in self.iter() {
      sum += w * f(&element.from_barycentric_coords(bary)?);
    }
    Ok(element.measure() * sum)
  }
}
