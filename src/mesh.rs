//! A mesh is a container of simplicial elements over a common set of nodes.
//! It provides the facet adjacency between elements, the boundary of the domain
//! and point location.

pub mod gen;

use crate::{
  error::{Error, Result},
  geometry::{
    element::{ElementId, NodeId},
    Element, DEFAULT_TOL,
  },
  linalg::nalgebra::{Matrix, Vector},
  Dim,
};

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Mesh {
  /// Node coordinates in the columns.
  nodes: Matrix,
  elements: Vec<Element>,
  /// Sorted, without duplicates.
  boundary_nodes: Vec<NodeId>,
  boundary_flags: Vec<bool>,
}

impl Mesh {
  /// Builds the mesh from node coordinates (columns) and the vertex lists of the cells.
  pub fn new(nodes: Matrix, cells: Vec<Vec<NodeId>>) -> Result<Self> {
    let nnodes = nodes.ncols();
    let dim_ambient = nodes.nrows();

    let nvertices = cells
      .first()
      .map(|c| c.len())
      .ok_or_else(|| Error::inconsistent("a mesh needs at least one cell"))?;
    if let Some((icell, cell)) = cells.iter().find_position(|c| c.len() != nvertices) {
      return Err(Error::inconsistent(format!(
        "cell {icell} has {} vertices, expected {nvertices}",
        cell.len()
      )));
    }
    if nvertices < 2 || nvertices - 1 > dim_ambient {
      return Err(Error::inconsistent(format!(
        "cells with {nvertices} vertices do not fit into {dim_ambient} dimensions"
      )));
    }
    if let Some(&inode) = cells.iter().flatten().find(|&&v| v >= nnodes) {
      return Err(Error::inconsistent(format!(
        "node {inode} referenced, but the mesh has only {nnodes} nodes"
      )));
    }

    // facets are identified by their sorted vertices
    let mut facets: IndexMap<Vec<NodeId>, Vec<ElementId>> = IndexMap::new();
    for (icell, cell) in cells.iter().enumerate() {
      for facet in cell.iter().copied().combinations(nvertices - 1) {
        let facet = facet.into_iter().sorted_unstable().collect_vec();
        facets.entry(facet).or_default().push(icell);
      }
    }

    let mut neighbors = vec![Vec::new(); cells.len()];
    for cocells in facets.values() {
      for (&a, &b) in cocells.iter().tuple_combinations() {
        neighbors[a].push(b);
        neighbors[b].push(a);
      }
    }

    // boundary facets only have a single cell as super entity
    let boundary_nodes = facets
      .iter()
      .filter(|(_, cocells)| cocells.len() == 1)
      .flat_map(|(facet, _)| facet.iter().copied())
      .sorted_unstable()
      .dedup()
      .collect_vec();
    let mut boundary_flags = vec![false; nnodes];
    boundary_nodes.iter().for_each(|&i| boundary_flags[i] = true);

    let elements = cells
      .into_iter()
      .zip(neighbors)
      .enumerate()
      .map(|(icell, (node_ids, neighbors))| {
        let mut coords = Matrix::zeros(dim_ambient, nvertices);
        for (i, &inode) in node_ids.iter().enumerate() {
          coords.set_column(i, &nodes.column(inode));
        }
        let neighbors = neighbors.into_iter().sorted_unstable().dedup().collect();
        let boundary = node_ids.iter().any(|&i| boundary_flags[i]);
        Element::new(icell, node_ids, coords, neighbors, boundary)
      })
      .collect::<Result<Vec<_>>>()?;

    debug!(
      nnodes,
      nelements = elements.len(),
      nboundary_nodes = boundary_nodes.len(),
      "built simplicial mesh of dimension {}",
      nvertices - 1
    );

    Ok(Self {
      nodes,
      elements,
      boundary_nodes,
      boundary_flags,
    })
  }

  pub fn dim_intrinsic(&self) -> Dim {
    self.elements[0].dim_intrinsic()
  }
  pub fn dim_ambient(&self) -> Dim {
    self.nodes.nrows()
  }
  pub fn is_manifold(&self) -> bool {
    self.dim_intrinsic() != self.dim_ambient()
  }
  pub fn nnodes(&self) -> usize {
    self.nodes.ncols()
  }
  /// Number of degrees of freedom of the linear lagrange space on this mesh.
  pub fn ndofs(&self) -> usize {
    self.nnodes()
  }
  pub fn nelements(&self) -> usize {
    self.elements.len()
  }
  pub fn nodes(&self) -> &Matrix {
    &self.nodes
  }
  pub fn node(&self, inode: NodeId) -> Vector {
    self.nodes.column(inode).into_owned()
  }
  pub fn elements(&self) -> &[Element] {
    &self.elements
  }
  pub fn element(&self, id: ElementId) -> Option<&Element> {
    self.elements.get(id)
  }
  pub fn boundary_nodes(&self) -> &[NodeId] {
    &self.boundary_nodes
  }
  pub fn is_boundary_node(&self, inode: NodeId) -> bool {
    self.boundary_flags.get(inode).copied().unwrap_or(false)
  }

  /// Total measure of the domain.
  pub fn measure(&self) -> f64 {
    self.elements.iter().map(|e| e.measure()).sum()
  }

  pub fn bounding_box(&self) -> (Vector, Vector) {
    let ll = Vector::from_iterator(self.dim_ambient(), self.nodes.row_iter().map(|r| r.min()));
    let ur = Vector::from_iterator(self.dim_ambient(), self.nodes.row_iter().map(|r| r.max()));
    (ll, ur)
  }

  /// Finds an element containing `x` by linear search.
  pub fn locate(&self, x: &Vector) -> Option<&Element> {
    self.locate_with_tol(x, DEFAULT_TOL)
  }

  pub fn locate_with_tol(&self, x: &Vector, tol: f64) -> Option<&Element> {
    if x.len() != self.dim_ambient() {
      return None;
    }
    self.elements.iter().find(|elem| {
      let (ll, ur) = elem.bounding_box();
      let in_box = x
        .iter()
        .zip(ll.iter().zip(ur.iter()))
        .all(|(&xi, (&lo, &hi))| xi >= lo - tol && xi <= hi + tol);
      in_box && elem.contains_with_tol(x, tol)
    })
  }
}
