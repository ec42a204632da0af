//! Weak-form operator expressions and their element matrices.

use crate::{
  error::{Error, Result},
  fe::{Basis, QuadRule},
  geometry::Element,
  linalg::nalgebra::{Matrix, Vector},
};

use std::{fmt, ops::Add};

pub type ElMat = Matrix;
pub type ElVec = Vector;

/// A single term of a bilinear form $a(u, v)$.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
  /// $integral partial_t u v$
  TimeDerivative,
  /// $integral mu grad u dot grad v$
  Diffusion(f64),
  /// $integral (b dot grad u) v$
  Advection(Vector),
  /// $integral c u v$
  Reaction(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
  /// Stationary, no time derivative.
  Elliptic,
  /// Time dependent.
  Parabolic,
}

/// The differential operator of a PDE in weak formulation, as a sum of terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BilinearForm {
  terms: Vec<Term>,
}

pub fn dt() -> BilinearForm {
  Term::TimeDerivative.into()
}
pub fn laplacian() -> BilinearForm {
  diffusion(1.0)
}
pub fn diffusion(mu: f64) -> BilinearForm {
  Term::Diffusion(mu).into()
}
pub fn advection(b: Vector) -> BilinearForm {
  Term::Advection(b).into()
}
pub fn reaction(c: f64) -> BilinearForm {
  Term::Reaction(c).into()
}

impl From<Term> for BilinearForm {
  fn from(term: Term) -> Self {
    Self { terms: vec![term] }
  }
}

impl Add for BilinearForm {
  type Output = BilinearForm;
  fn add(mut self, rhs: Self) -> Self::Output {
    self.terms.extend(rhs.terms);
    self
  }
}

impl fmt::Display for BilinearForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.terms.is_empty() {
      return write!(f, "0");
    }
    for (i, term) in self.terms.iter().enumerate() {
      if i > 0 {
        write!(f, " + ")?;
      }
      match term {
        Term::TimeDerivative => write!(f, "dt(u)")?,
        Term::Diffusion(mu) => write!(f, "{mu}*laplacian(u)")?,
        Term::Advection(b) => write!(f, "advection({:?}, u)", b.as_slice())?,
        Term::Reaction(c) => write!(f, "{c}*u")?,
      }
    }
    Ok(())
  }
}

impl BilinearForm {
  pub fn terms(&self) -> &[Term] {
    &self.terms
  }

  pub fn is_parabolic(&self) -> bool {
    self.terms.contains(&Term::TimeDerivative)
  }
  pub fn is_elliptic(&self) -> bool {
    !self.is_parabolic()
  }
  pub fn kind(&self) -> OperatorKind {
    if self.is_parabolic() {
      OperatorKind::Parabolic
    } else {
      OperatorKind::Elliptic
    }
  }
  /// The discretized operator is symmetric unless there is an advection term.
  pub fn is_symmetric(&self) -> bool {
    !self
      .terms
      .iter()
      .any(|t| matches!(t, Term::Advection(_)))
  }

  /// Element matrix of the spatial part of the operator, $[a(phi_j, phi_i)]_(i j)$.
  pub fn elmat(&self, element: &Element, basis: &impl Basis, quad: &QuadRule) -> Result<ElMat> {
    quad.check_element(element)?;
    let ndofs = basis.nlocal_dofs(element.dim_intrinsic());
    let vol = element.measure();

    let mut elmat = ElMat::zeros(ndofs, ndofs);
    for term in &self.terms {
      match term {
        Term::TimeDerivative => {}
        Term::Diffusion(mu) => {
          for (bary, w) in quad.iter() {
            let grads = basis.eval_grads(element, bary);
            elmat += (*mu * w * vol) * &grads * grads.transpose();
          }
        }
        Term::Advection(b) => {
          if b.len() != element.dim_ambient() {
            return Err(Error::inconsistent(format!(
              "advection field of dimension {} on an element in {} dimensions",
              b.len(),
              element.dim_ambient()
            )));
          }
          for (bary, w) in quad.iter() {
            let values = basis.eval(bary);
            let directional = basis.eval_grads(element, bary) * b;
            elmat += (w * vol) * values * directional.transpose();
          }
        }
        Term::Reaction(c) => elmat += *c * mass_elmat(element, basis, quad)?,
      }
    }
    Ok(elmat)
  }
}

/// Element mass matrix $[integral_K phi_j phi_i]_(i j)$.
pub fn mass_elmat(element: &Element, basis: &impl Basis, quad: &QuadRule) -> Result<ElMat> {
  quad.check_element(element)?;
  let ndofs = basis.nlocal_dofs(element.dim_intrinsic());
  let vol = element.measure();

  let mut elmat = ElMat::zeros(ndofs, ndofs);
  for (bary, w) in quad.iter() {
    let values = basis.eval(bary);
    elmat += (w * vol) * &values * values.transpose();
  }
  Ok(elmat)
}
