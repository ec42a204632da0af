//! Galerkin assembly of the discrete system and enforcement of Dirichlet conditions.

use crate::{
  error::{Error, Result},
  fe::{Basis, DofIdx, QuadRule},
  geometry::Element,
  linalg::nalgebra::{CooMatrix, CooMatrixExt, CsrMatrix, Matrix, Vector},
  mesh::Mesh,
  operators::{self, BilinearForm, ElMat},
  util,
};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::debug;

pub type GalMat = CooMatrix;
pub type GalVec = Vector;

/// The assembled discrete system of a PDE.
///
/// `r1` discretizes the spatial operator, `r0` is the mass matrix and the
/// columns of `force` are the load vectors of the forcing data.
#[derive(Debug, Clone)]
pub struct Assembly {
  pub r1: CsrMatrix,
  pub r0: CsrMatrix,
  pub force: Matrix,
}

/// Assembles the system matrices and the load vectors of a PDE.
pub trait Assembler {
  fn assemble(
    &self,
    mesh: &Mesh,
    form: &BilinearForm,
    basis: &impl Basis,
    quad: &QuadRule,
    forcing: &Matrix,
  ) -> Result<Assembly>;
}

/// Standard Galerkin assembler for nodal lagrange elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct GalerkinAssembler;

impl Assembler for GalerkinAssembler {
  fn assemble(
    &self,
    mesh: &Mesh,
    form: &BilinearForm,
    basis: &impl Basis,
    quad: &QuadRule,
    forcing: &Matrix,
  ) -> Result<Assembly> {
    if basis.order() != 1 {
      return Err(Error::UnsupportedOrder(basis.order()));
    }
    if forcing.nrows() != mesh.ndofs() {
      return Err(Error::inconsistent(format!(
        "forcing data has {} rows, the mesh has {} dofs",
        forcing.nrows(),
        mesh.ndofs()
      )));
    }

    let r1 = assemble_galmat(mesh, |elem| form.elmat(elem, basis, quad))?;
    let r0 = assemble_galmat(mesh, |elem| operators::mass_elmat(elem, basis, quad))?;
    let r1 = CsrMatrix::from(&r1);
    let r0 = CsrMatrix::from(&r0);
    let force = &r0 * forcing;

    debug!(
      ndofs = mesh.ndofs(),
      nnz_r1 = r1.nnz(),
      nnz_r0 = r0.nnz(),
      ntimes = forcing.ncols(),
      "assembled galerkin system for {form}"
    );
    Ok(Assembly { r1, r0, force })
  }
}

/// Assembly algorithm for the Galerkin Matrix.
pub fn assemble_galmat<F>(mesh: &Mesh, elmat: F) -> Result<GalMat>
where
  F: Fn(&Element) -> Result<ElMat> + Sync,
{
  let ndofs = mesh.ndofs();

  let triplets: Vec<Vec<(usize, usize, f64)>> = mesh
    .elements()
    .par_iter()
    .map(|elem| {
      let elmat = elmat(elem)?;
      let mut local_triplets = Vec::new();
      for (ilocal, &iglobal) in elem.node_ids().iter().enumerate() {
        for (jlocal, &jglobal) in elem.node_ids().iter().enumerate() {
          let val = elmat[(ilocal, jlocal)];
          if val != 0.0 {
            local_triplets.push((iglobal, jglobal, val));
          }
        }
      }
      Ok(local_triplets)
    })
    .collect::<Result<_>>()?;

  let (rows, cols, values) = triplets.into_iter().flatten().multiunzip();
  GalMat::try_from_triplets(ndofs, ndofs, rows, cols, values)
    .map_err(|e| Error::inconsistent(format!("invalid galerkin triplets: {e}")))
}

/// Assembly algorithm for the Galerkin Vector.
pub fn assemble_galvec<F>(mesh: &Mesh, elvec: F) -> Result<GalVec>
where
  F: Fn(&Element) -> Result<Vector> + Sync,
{
  let entries: Vec<Vec<(usize, f64)>> = mesh
    .elements()
    .par_iter()
    .map(|elem| {
      let elvec = elvec(elem)?;
      Ok(
        elem
          .node_ids()
          .iter()
          .zip(elvec.iter())
          .filter(|&(_, &v)| v != 0.0)
          .map(|(&iglobal, &v)| (iglobal, v))
          .collect(),
      )
    })
    .collect::<Result<_>>()?;

  let mut galvec = GalVec::zeros(mesh.ndofs());
  for (irow, val) in entries.into_iter().flatten() {
    galvec[irow] += val;
  }
  Ok(galvec)
}

/// Fix DOFs of FE solution.
///
/// Modifies supplied galerkin matrix and galerkin vector,
/// such that the FE solution has the given coefficents on the dofs.
/// $mat(A_0, 0; 0, I) vec(mu_0, mu_diff) = vec(phi - A_(0 diff) gamma, gamma)$
pub fn fix_dofs_coeff(dof_coeffs: &[(DofIdx, f64)], galmat: &mut GalMat, galvec: &mut GalVec) {
  let galmat_csr = CsrMatrix::from(&*galmat);
  lift_dofs_coeff(dof_coeffs, &galmat_csr, galvec);
  fix_dofs_galmat(dof_coeffs, galmat);
}

/// Right-hand side part of [`fix_dofs_coeff`], for a matrix that stays fixed
/// while the prescribed coefficients change (e.g. over time steps).
pub fn lift_dofs_coeff(dof_coeffs: &[(DofIdx, f64)], galmat: &CsrMatrix, galvec: &mut GalVec) {
  let ndofs = galmat.nrows();
  let dof_coeffs_opt = util::sparse_to_dense_data(dof_coeffs.to_vec(), ndofs);
  let dof_coeffs_zeroed =
    Vector::from_iterator(ndofs, dof_coeffs_opt.iter().map(|v| v.unwrap_or(0.0)));

  *galvec -= galmat * dof_coeffs_zeroed;

  // Set galvec to prescribed coefficents.
  dof_coeffs.iter().for_each(|&(i, v)| galvec[i] = v);
}

/// Matrix part of [`fix_dofs_coeff`].
pub fn fix_dofs_galmat(dof_coeffs: &[(DofIdx, f64)], galmat: &mut GalMat) {
  let dofs = dof_coeffs.iter().map(|&(i, _)| i).collect_vec();
  let dof_flags = util::indicies_to_flags(&dofs, galmat.nrows());

  // Set entires zero that share a (row or column) index with a fixed dof.
  galmat.set_zero(|r, c| dof_flags[r] || dof_flags[c]);

  // Set galmat diagonal for dofs to one.
  for &i in &dofs {
    galmat.push(i, i, 1.0);
  }
}
