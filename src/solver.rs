//! Solving strategies for the assembled system.
//!
//! Elliptic problems are solved once by [`StationarySolver`], parabolic
//! problems are advanced in time by [`SpaceTimeSolver`]. A PDE selects one of
//! them on construction and keeps it for its whole lifetime.

use crate::{
  assemble::{self, Assembly, GalMat},
  error::{Error, Result},
  fe::DofIdx,
  linalg::{
    faer::SparseDirect,
    nalgebra::{CscMatrix, CsrMatrix, Matrix, Vector},
  },
  operators::OperatorKind,
};

use indexmap::IndexMap;
use tracing::{debug, info};

/// Prescribed values on boundary nodes, one value per time step or a single value.
pub type BoundaryData = IndexMap<DofIdx, Vector>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
  Stationary,
  SpaceTime,
}

impl From<OperatorKind> for SolverKind {
  fn from(kind: OperatorKind) -> Self {
    match kind {
      OperatorKind::Elliptic => Self::Stationary,
      OperatorKind::Parabolic => Self::SpaceTime,
    }
  }
}

/// Parameters of the solve step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverArgs {
  /// Time step size of parabolic problems.
  pub time_step: f64,
  /// Parameter of the theta scheme: 1 is implicit euler, 0.5 is crank-nicolson.
  pub theta: f64,
}

impl Default for SolverArgs {
  fn default() -> Self {
    Self {
      time_step: 1.0,
      theta: 1.0,
    }
  }
}

impl SolverArgs {
  pub fn new(time_step: f64) -> Self {
    Self {
      time_step,
      ..Default::default()
    }
  }
  pub fn with_theta(mut self, theta: f64) -> Self {
    self.theta = theta;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if !(self.time_step.is_finite() && self.time_step > 0.0) {
      return Err(Error::inconsistent(format!(
        "time step must be positive, got {}",
        self.time_step
      )));
    }
    if !(0.5..=1.0).contains(&self.theta) {
      return Err(Error::inconsistent(format!(
        "theta must lie in [0.5, 1], got {}",
        self.theta
      )));
    }
    Ok(())
  }
}

/// Everything a solve needs besides the assembled system.
pub struct SolveInput<'a> {
  pub boundary_data: &'a BoundaryData,
  pub initial_condition: Option<&'a Vector>,
  pub symmetric: bool,
  pub args: &'a SolverArgs,
}

/// Results shared by both solvers, absent until computed.
#[derive(Debug, Clone, Default)]
struct SolverState {
  assembly: Option<Assembly>,
  solution: Option<Matrix>,
}

impl SolverState {
  fn assembly(&self, what: &'static str) -> Result<&Assembly> {
    self.assembly.as_ref().ok_or(Error::Unsolved(what))
  }
  fn set_assembly(&mut self, assembly: Assembly) {
    self.assembly = Some(assembly);
    self.solution = None;
  }
}

/// Boundary values at time step `istep`, a single value holds for all steps.
fn boundary_coeffs(boundary_data: &BoundaryData, istep: usize) -> Vec<(DofIdx, f64)> {
  boundary_data
    .iter()
    .map(|(&idof, values)| {
      let v = if values.len() == 1 { values[0] } else { values[istep] };
      (idof, v)
    })
    .collect()
}

#[derive(Debug, Clone, Default)]
pub struct StationarySolver {
  state: SolverState,
}

impl StationarySolver {
  pub fn solve(&mut self, input: SolveInput) -> Result<()> {
    let assembly = self.state.assembly("solution")?;
    let dof_coeffs = boundary_coeffs(input.boundary_data, 0);

    let mut galmat = GalMat::from(&assembly.r1);
    let mut galvec = assembly.force.column(0).into_owned();
    assemble::fix_dofs_coeff(&dof_coeffs, &mut galmat, &mut galvec);

    let solver = SparseDirect::factorize(CscMatrix::from(&galmat), input.symmetric)?;
    let solution = solver.solve(&galvec);
    debug!(ndofs = solution.len(), "solved stationary system");

    self.state.solution = Some(Matrix::from_column_slice(
      solution.len(),
      1,
      solution.as_slice(),
    ));
    Ok(())
  }
}

#[derive(Debug, Clone, Default)]
pub struct SpaceTimeSolver {
  state: SolverState,
}

impl SpaceTimeSolver {
  /// Theta scheme
  /// $(R_0 / Delta t + theta R_1) u_k = (R_0 / Delta t - (1 - theta) R_1) u_(k-1) + theta F_k + (1 - theta) F_(k-1)$
  pub fn solve(&mut self, input: SolveInput) -> Result<()> {
    let assembly = self.state.assembly("solution")?;
    let initial = input.initial_condition.ok_or_else(|| {
      Error::inconsistent("a time dependent problem needs an initial condition")
    })?;
    let ndofs = assembly.r0.nrows();
    if initial.len() != ndofs {
      return Err(Error::inconsistent(format!(
        "initial condition has length {}, expected {ndofs}",
        initial.len()
      )));
    }
    input.args.validate()?;

    let dt = input.args.time_step;
    let theta = input.args.theta;
    let r0 = &assembly.r0;
    let r1 = &assembly.r1;
    let force = &assembly.force;
    let nsteps = force.ncols();

    let lhs: CsrMatrix = &(dt.recip() * r0) + &(theta * r1);
    let explicit: CsrMatrix = &(dt.recip() * r0) - &((1.0 - theta) * r1);

    let mut lhs_fixed = GalMat::from(&lhs);
    assemble::fix_dofs_galmat(&boundary_coeffs(input.boundary_data, 0), &mut lhs_fixed);
    let solver = SparseDirect::factorize(CscMatrix::from(&lhs_fixed), input.symmetric)?;

    let mut solution = Matrix::zeros(ndofs, nsteps);
    let mut prev = initial.clone();
    for (idof, v) in boundary_coeffs(input.boundary_data, 0) {
      prev[idof] = v;
    }
    solution.set_column(0, &prev);

    for istep in 1..nsteps {
      debug!("solving time step {istep}/{}", nsteps - 1);
      let mut rhs = &explicit * &prev
        + theta * force.column(istep)
        + (1.0 - theta) * force.column(istep - 1);
      assemble::lift_dofs_coeff(&boundary_coeffs(input.boundary_data, istep), &lhs, &mut rhs);
      let next = solver.solve(&rhs);
      solution.set_column(istep, &next);
      prev = next;
    }

    self.state.solution = Some(solution);
    Ok(())
  }
}

/// The solving strategy embedded into a PDE, fixed at construction.
#[derive(Debug, Clone)]
pub enum PdeSolver {
  Stationary(StationarySolver),
  SpaceTime(SpaceTimeSolver),
}

impl PdeSolver {
  pub fn new(kind: SolverKind) -> Self {
    match kind {
      SolverKind::Stationary => Self::Stationary(StationarySolver::default()),
      SolverKind::SpaceTime => Self::SpaceTime(SpaceTimeSolver::default()),
    }
  }

  pub fn kind(&self) -> SolverKind {
    match self {
      Self::Stationary(_) => SolverKind::Stationary,
      Self::SpaceTime(_) => SolverKind::SpaceTime,
    }
  }

  fn state(&self) -> &SolverState {
    match self {
      Self::Stationary(s) => &s.state,
      Self::SpaceTime(s) => &s.state,
    }
  }
  fn state_mut(&mut self) -> &mut SolverState {
    match self {
      Self::Stationary(s) => &mut s.state,
      Self::SpaceTime(s) => &mut s.state,
    }
  }

  /// Stores a freshly assembled system, invalidating any previous solution.
  pub fn set_assembly(&mut self, assembly: Assembly) {
    self.state_mut().set_assembly(assembly);
  }

  pub fn solve(&mut self, input: SolveInput) -> Result<()> {
    info!(kind = ?self.kind(), "solving pde");
    match self {
      Self::Stationary(s) => s.solve(input),
      Self::SpaceTime(s) => s.solve(input),
    }
  }

  pub fn solution(&self) -> Result<&Matrix> {
    self
      .state()
      .solution
      .as_ref()
      .ok_or(Error::Unsolved("solution"))
  }
  pub fn force(&self) -> Result<&Matrix> {
    self.state().assembly("force").map(|a| &a.force)
  }
  pub fn r0(&self) -> Result<&CsrMatrix> {
    self.state().assembly("R0").map(|a| &a.r0)
  }
  pub fn r1(&self) -> Result<&CsrMatrix> {
    self.state().assembly("R1").map(|a| &a.r1)
  }
}
