use super::{affine::AffineSubspace, refsimp_vol, DEFAULT_TOL};
use crate::{
  error::{Error, Result},
  linalg::nalgebra::{Matrix, Vector},
  Dim,
};

pub type ElementId = usize;
pub type NodeId = usize;

/// A single simplicial mesh element.
///
/// Purely geometric: the vertex coordinates together with the affine map
/// from the reference simplex, which is precomputed on construction.
/// Supports volume elements (`dim_intrinsic == dim_ambient`) as well as
/// manifold elements (surfaces in 3D, network edges in 2D, ...).
#[derive(Debug, Clone)]
pub struct Element {
  id: ElementId,
  node_ids: Vec<NodeId>,
  /// Vertex coordinates in the columns, 1-1 with `node_ids`.
  coords: Matrix,
  neighbors: Vec<ElementId>,
  /// Whether at least one vertex lies on the boundary of the mesh.
  boundary: bool,
  measure: f64,
  /// $[J]_(i j) = (v_(j+1) - v_0)_i$
  jacobian: Matrix,
  /// $J^(-1)$, the Penrose pseudo-inverse for manifold elements.
  inv_jacobian: Matrix,
  /// Affine span of the vertices.
  space: AffineSubspace,
}

impl Element {
  pub fn new(
    id: ElementId,
    node_ids: Vec<NodeId>,
    coords: Matrix,
    neighbors: Vec<ElementId>,
    boundary: bool,
  ) -> Result<Self> {
    if node_ids.len() != coords.ncols() {
      return Err(Error::inconsistent(format!(
        "element {id} has {} node ids but {} vertex coordinates",
        node_ids.len(),
        coords.ncols()
      )));
    }
    if coords.ncols() < 2 {
      return Err(Error::inconsistent(format!(
        "element {id} needs at least two vertices"
      )));
    }
    let dim_intrinsic = coords.ncols() - 1;
    let dim_ambient = coords.nrows();
    if dim_intrinsic > dim_ambient {
      return Err(Error::inconsistent(format!(
        "element {id} of dimension {dim_intrinsic} cannot live in {dim_ambient} dimensions"
      )));
    }

    // first vertex is the reference vertex
    let base = coords.column(0);
    let mut jacobian = Matrix::zeros(dim_ambient, dim_intrinsic);
    for j in 0..dim_intrinsic {
      jacobian.set_column(j, &(coords.column(j + 1) - base));
    }

    let degenerate = || Error::degenerate(format!("element {id} has a singular affine map"));
    let (inv_jacobian, det) = if dim_intrinsic == dim_ambient {
      let det = jacobian.determinant();
      let inv = jacobian.clone().try_inverse().ok_or_else(degenerate)?;
      (inv, det.abs())
    } else {
      // generalized Penrose inverse (J^T J)^-1 J^T
      let gram = jacobian.transpose() * &jacobian;
      let gram_det = gram.determinant();
      let chol = na::Cholesky::new(gram).ok_or_else(degenerate)?;
      (chol.inverse() * jacobian.transpose(), gram_det.max(0.0).sqrt())
    };
    let measure = refsimp_vol(dim_intrinsic) * det;

    let scale = jacobian
      .column_iter()
      .map(|c| c.norm())
      .fold(0.0, f64::max)
      .powi(dim_intrinsic as i32);
    if !measure.is_finite() || measure <= DEFAULT_TOL * scale {
      return Err(Error::degenerate(format!(
        "element {id} has vanishing measure {measure:e}"
      )));
    }
    let space = AffineSubspace::new(base.into_owned(), jacobian.clone())
      .map_err(|e| Error::degenerate(format!("element {id}: {e}")))?;

    Ok(Self {
      id,
      node_ids,
      coords,
      neighbors,
      boundary,
      measure,
      jacobian,
      inv_jacobian,
      space,
    })
  }

  pub fn id(&self) -> ElementId {
    self.id
  }
  pub fn node_ids(&self) -> &[NodeId] {
    &self.node_ids
  }
  pub fn coords(&self) -> &Matrix {
    &self.coords
  }
  pub fn coord(&self, ivertex: usize) -> Vector {
    self.coords.column(ivertex).into_owned()
  }
  pub fn coord_iter(&self) -> impl Iterator<Item = Vector> + '_ {
    self.coords.column_iter().map(|c| c.into_owned())
  }
  pub fn neighbors(&self) -> &[ElementId] {
    &self.neighbors
  }
  pub fn is_on_boundary(&self) -> bool {
    self.boundary
  }
  pub fn measure(&self) -> f64 {
    self.measure
  }
  pub fn barycentric_matrix(&self) -> &Matrix {
    &self.jacobian
  }
  pub fn inv_barycentric_matrix(&self) -> &Matrix {
    &self.inv_jacobian
  }

  pub fn dim_intrinsic(&self) -> Dim {
    self.jacobian.ncols()
  }
  pub fn dim_ambient(&self) -> Dim {
    self.jacobian.nrows()
  }
  pub fn is_manifold(&self) -> bool {
    self.dim_intrinsic() != self.dim_ambient()
  }
  pub fn nvertices(&self) -> usize {
    self.node_ids.len()
  }
  pub fn nedges(&self) -> usize {
    super::nedges(self.dim_intrinsic())
  }
  pub fn nnodes(&self, order: usize) -> usize {
    super::nnodes(self.dim_intrinsic(), order)
  }

  /// Barycentric coordinates of `x`, they always sum to one.
  pub fn to_barycentric_coords(&self, x: &Vector) -> Result<Vector> {
    self.check_ambient(x)?;
    Ok(self.barycentric_unchecked(x))
  }

  pub fn from_barycentric_coords(&self, bary: &Vector) -> Result<Vector> {
    if bary.len() != self.nvertices() {
      return Err(Error::inconsistent(format!(
        "{} barycentric coordinates given to element {} with {} vertices",
        bary.len(),
        self.id,
        self.nvertices()
      )));
    }
    Ok(&self.coords * bary)
  }

  fn check_ambient(&self, x: &Vector) -> Result<()> {
    if x.len() != self.dim_ambient() {
      return Err(Error::inconsistent(format!(
        "point of dimension {} queried on element {} in {} dimensions",
        x.len(),
        self.id,
        self.dim_ambient()
      )));
    }
    Ok(())
  }

  fn barycentric_unchecked(&self, x: &Vector) -> Vector {
    let z = &self.inv_jacobian * (x - self.coords.column(0));
    let bary0 = 1.0 - z.sum();
    z.insert_row(0, bary0)
  }

  /// Gradients of the barycentric coordinate functions in the rows.
  ///
  /// For manifold elements these are the tangential gradients.
  pub fn barycentric_gradients(&self) -> Matrix {
    let difs = self.inv_jacobian.clone();
    let mut difs = difs.insert_row(0, 0.0);
    difs.set_row(0, &-difs.row_sum());
    difs
  }

  pub fn contains(&self, x: &Vector) -> bool {
    self.contains_with_tol(x, DEFAULT_TOL)
  }

  /// Points of a different dimension are never contained.
  pub fn contains_with_tol(&self, x: &Vector, tol: f64) -> bool {
    if x.len() != self.dim_ambient() {
      return false;
    }
    if self.is_manifold() && self.space.distance(x) > tol {
      return false;
    }
    self.barycentric_unchecked(x).iter().all(|&b| b >= -tol)
  }

  /// The barycenter, where all barycentric coordinates equal $1/(n+1)$.
  pub fn mid_point(&self) -> Vector {
    let n = self.dim_intrinsic();
    let bary_mid = Vector::from_element(n, 1.0 / (n + 1) as f64);
    &self.jacobian * bary_mid + self.coords.column(0)
  }

  /// Smallest axis aligned box containing the element, as (lower-left, upper-right).
  pub fn bounding_box(&self) -> (Vector, Vector) {
    let ll = Vector::from_iterator(self.dim_ambient(), self.coords.row_iter().map(|r| r.min()));
    let ur = Vector::from_iterator(self.dim_ambient(), self.coords.row_iter().map(|r| r.max()));
    (ll, ur)
  }

  /// Affine space through the element.
  pub fn spanned_space(&self) -> &AffineSubspace {
    &self.space
  }
}
