//! Top level description of a partial differential equation on a mesh.

use crate::{
  assemble::{Assembler, GalerkinAssembler},
  error::{Error, Result},
  fe::{Basis, QuadRule},
  linalg::nalgebra::{CsrMatrix, Matrix, Vector},
  mesh::Mesh,
  operators::BilinearForm,
  solver::{BoundaryData, PdeSolver, SolveInput, SolverArgs, SolverKind},
};

use tracing::{debug, warn};

/// A PDE in weak formulation, discretized on a borrowed mesh.
///
/// The forcing data is a matrix with one row per dof and one column per time
/// step, stationary problems have a single column. The solver is chosen from
/// the operator on construction: elliptic operators get a stationary solver,
/// parabolic operators a time stepping one.
#[derive(Debug)]
pub struct Pde<'a> {
  domain: &'a Mesh,
  bilinear_form: BilinearForm,
  forcing_data: Matrix,
  initial_condition: Option<Vector>,
  boundary_data: BoundaryData,
  solver: PdeSolver,
}

impl<'a> Pde<'a> {
  pub fn new(domain: &'a Mesh, bilinear_form: BilinearForm, forcing_data: Matrix) -> Result<Self> {
    if forcing_data.nrows() != domain.ndofs() {
      return Err(Error::inconsistent(format!(
        "forcing data has {} rows, the mesh has {} dofs",
        forcing_data.nrows(),
        domain.ndofs()
      )));
    }
    let kind = SolverKind::from(bilinear_form.kind());
    match kind {
      SolverKind::Stationary if forcing_data.ncols() != 1 => {
        return Err(Error::inconsistent(format!(
          "stationary problems take a single forcing column, got {}",
          forcing_data.ncols()
        )));
      }
      SolverKind::SpaceTime if forcing_data.ncols() == 0 => {
        return Err(Error::inconsistent("forcing data needs at least one time step"));
      }
      _ => {}
    }
    debug!(?kind, form = %bilinear_form, "selected pde solver");

    Ok(Self {
      domain,
      bilinear_form,
      forcing_data,
      initial_condition: None,
      boundary_data: BoundaryData::new(),
      solver: PdeSolver::new(kind),
    })
  }

  /// Stationary problem with a single forcing vector.
  pub fn from_forcing_vector(
    domain: &'a Mesh,
    bilinear_form: BilinearForm,
    forcing_data: Vector,
  ) -> Result<Self> {
    let forcing_data = Matrix::from_column_slice(forcing_data.len(), 1, forcing_data.as_slice());
    Self::new(domain, bilinear_form, forcing_data)
  }

  pub fn ntimes(&self) -> usize {
    self.forcing_data.ncols()
  }

  /// Replaces the dirichlet data.
  ///
  /// Every key must be a boundary node of the mesh, every value vector holds
  /// either one value per time step or a single value for all of them.
  pub fn set_dirichlet_bc(&mut self, data: BoundaryData) -> Result<()> {
    let ntimes = self.ntimes();
    for (&inode, values) in &data {
      if !self.domain.is_boundary_node(inode) {
        warn!(inode, "rejected dirichlet data on a node off the boundary");
        return Err(Error::inconsistent(format!(
          "node {inode} is not a boundary node of the mesh"
        )));
      }
      if values.len() != 1 && values.len() != ntimes {
        return Err(Error::inconsistent(format!(
          "dirichlet data of node {inode} has {} values, expected 1 or {ntimes}",
          values.len()
        )));
      }
    }
    self.boundary_data = data;
    Ok(())
  }

  /// Takes the dirichlet data of all boundary nodes from the rows of a dense
  /// `ndofs x ntimes` matrix.
  pub fn set_dirichlet_bc_dense(&mut self, data: &Matrix) -> Result<()> {
    if data.nrows() != self.domain.ndofs() {
      return Err(Error::inconsistent(format!(
        "dirichlet data has {} rows, the mesh has {} dofs",
        data.nrows(),
        self.domain.ndofs()
      )));
    }
    let boundary_data = self
      .domain
      .boundary_nodes()
      .iter()
      .map(|&inode| (inode, data.row(inode).transpose()))
      .collect();
    self.set_dirichlet_bc(boundary_data)
  }

  /// Initial condition of a time dependent problem.
  pub fn set_initial_condition(&mut self, data: Vector) -> Result<()> {
    if self.solver.kind() != SolverKind::SpaceTime {
      return Err(Error::inconsistent(
        "initial conditions are only meaningful for time dependent problems",
      ));
    }
    if data.len() != self.domain.ndofs() {
      return Err(Error::inconsistent(format!(
        "initial condition has length {}, the mesh has {} dofs",
        data.len(),
        self.domain.ndofs()
      )));
    }
    self.initial_condition = Some(data);
    Ok(())
  }

  /// Assembles `R1`, `R0` and the forcing vectors without solving.
  pub fn init(&mut self, basis: &impl Basis, integrator: &QuadRule, args: &SolverArgs) -> Result<()> {
    args.validate()?;
    let assembly = GalerkinAssembler.assemble(
      self.domain,
      &self.bilinear_form,
      basis,
      integrator,
      &self.forcing_data,
    )?;
    self.solver.set_assembly(assembly);
    Ok(())
  }

  /// Assembles and solves the discrete problem.
  pub fn solve(&mut self, basis: &impl Basis, integrator: &QuadRule, args: &SolverArgs) -> Result<()> {
    self.init(basis, integrator, args)?;
    let input = SolveInput {
      boundary_data: &self.boundary_data,
      initial_condition: self.initial_condition.as_ref(),
      symmetric: self.bilinear_form.is_symmetric(),
      args,
    };
    self.solver.solve(input)
  }

  pub fn domain(&self) -> &'a Mesh {
    self.domain
  }
  pub fn bilinear_form(&self) -> &BilinearForm {
    &self.bilinear_form
  }
  pub fn forcing_data(&self) -> &Matrix {
    &self.forcing_data
  }
  pub fn initial_condition(&self) -> Option<&Vector> {
    self.initial_condition.as_ref()
  }
  pub fn boundary_data(&self) -> &BoundaryData {
    &self.boundary_data
  }
  pub fn solver_kind(&self) -> SolverKind {
    self.solver.kind()
  }

  /// Solution with one column per time step.
  pub fn solution(&self) -> Result<&Matrix> {
    self.solver.solution()
  }
  /// Right-hand side of the discrete system, one column per time step.
  pub fn force(&self) -> Result<&Matrix> {
    self.solver.force()
  }
  pub fn r0(&self) -> Result<&CsrMatrix> {
    self.solver.r0()
  }
  pub fn r1(&self) -> Result<&CsrMatrix> {
    self.solver.r1()
  }
}
