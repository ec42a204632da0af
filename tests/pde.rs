extern crate nalgebra as na;

use simpde::{
  fe::{LagrangeP1, QuadRule},
  mesh::{gen, Mesh},
  operators::{advection, diffusion, dt, laplacian, reaction, BilinearForm},
  solver::{BoundaryData, SolverArgs, SolverKind},
  Error, Pde,
};

use approx::assert_relative_eq;

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_test_writer()
    .try_init();
}

/// Dirichlet data of `f` on all boundary nodes.
fn boundary_data_of<F>(mesh: &Mesh, f: F) -> BoundaryData
where
  F: Fn(&na::DVector<f64>) -> f64,
{
  mesh
    .boundary_nodes()
    .iter()
    .map(|&inode| (inode, na::dvector![f(&mesh.node(inode))]))
    .collect()
}

fn nodal_values<F>(mesh: &Mesh, f: F) -> na::DVector<f64>
where
  F: Fn(&na::DVector<f64>) -> f64,
{
  na::DVector::from_iterator(mesh.nnodes(), (0..mesh.nnodes()).map(|i| f(&mesh.node(i))))
}

fn solve_stationary(mesh: &Mesh, form: BilinearForm, bc: BoundaryData) -> na::DVector<f64> {
  let mut pde = Pde::new(mesh, form, na::DMatrix::zeros(mesh.ndofs(), 1)).unwrap();
  assert_eq!(pde.solver_kind(), SolverKind::Stationary);
  pde.set_dirichlet_bc(bc).unwrap();
  pde
    .solve(
      &LagrangeP1,
      &QuadRule::degree2(mesh.dim_intrinsic()),
      &SolverArgs::default(),
    )
    .unwrap();
  pde.solution().unwrap().column(0).into_owned()
}

#[test]
fn solver_selection() {
  let mesh = gen::unit_interval(2).unwrap();
  let stationary = Pde::new(&mesh, laplacian(), na::DMatrix::zeros(3, 1)).unwrap();
  assert_eq!(stationary.solver_kind(), SolverKind::Stationary);

  let form = dt() + diffusion(2.0) + reaction(1.0);
  let parabolic = Pde::new(&mesh, form, na::DMatrix::zeros(3, 5)).unwrap();
  assert_eq!(parabolic.solver_kind(), SolverKind::SpaceTime);
  assert_eq!(parabolic.ntimes(), 5);
}

#[test]
fn results_before_solve() {
  let mesh = gen::unit_interval(2).unwrap();
  let pde = Pde::new(&mesh, laplacian(), na::DMatrix::zeros(3, 1)).unwrap();
  assert!(matches!(pde.solution(), Err(Error::Unsolved(_))));
  assert!(matches!(pde.force(), Err(Error::Unsolved(_))));
  assert!(matches!(pde.r0(), Err(Error::Unsolved(_))));
  assert!(matches!(pde.r1(), Err(Error::Unsolved(_))));
}

#[test]
fn single_triangle_reproduces_constant() {
  init_tracing();
  let nodes = na::dmatrix![
    0.0, 1.0, 0.0;
    0.0, 0.0, 1.0;
  ];
  let mesh = Mesh::new(nodes, vec![vec![0, 1, 2]]).unwrap();
  assert_eq!(mesh.boundary_nodes(), &[0, 1, 2]);

  let solution = solve_stationary(&mesh, laplacian(), boundary_data_of(&mesh, |_| 7.0));
  assert_relative_eq!(solution, na::DVector::from_element(3, 7.0), epsilon = 1e-12);
}

#[test]
fn laplace_reproduces_affine_solution() {
  init_tracing();
  let exact = |x: &na::DVector<f64>| x[0] + x[1];
  for mesh in [gen::unit_square(4).unwrap(), gen::unit_square_surface(4).unwrap()] {
    let solution = solve_stationary(&mesh, laplacian(), boundary_data_of(&mesh, exact));
    assert_relative_eq!(solution, nodal_values(&mesh, exact), epsilon = 1e-10);
  }
}

#[test]
fn advection_diffusion_reproduces_constant() {
  let mesh = gen::unit_square(3).unwrap();
  let form = laplacian() + advection(na::dvector![1.0, -0.5]);
  let solution = solve_stationary(&mesh, form, boundary_data_of(&mesh, |_| 2.0));
  assert_relative_eq!(solution, na::DVector::from_element(mesh.ndofs(), 2.0), epsilon = 1e-10);
}

/// $-Delta u - 30 u = 0$ is symmetric but indefinite, since 30 lies between
/// the first two Dirichlet eigenvalues of the unit square.
#[test]
fn helmholtz_is_solved() {
  init_tracing();
  let mesh = gen::unit_square(8).unwrap();
  let mut pde = Pde::new(&mesh, laplacian() + reaction(-30.0), na::DMatrix::zeros(mesh.ndofs(), 1)).unwrap();
  pde.set_dirichlet_bc(boundary_data_of(&mesh, |_| 1.0)).unwrap();
  pde
    .solve(&LagrangeP1, &QuadRule::degree2(2), &SolverArgs::default())
    .unwrap();

  let solution = pde.solution().unwrap().column(0).into_owned();
  assert!(solution.iter().all(|v| v.is_finite()));
  for &inode in mesh.boundary_nodes() {
    assert_relative_eq!(solution[inode], 1.0, epsilon = 1e-12);
  }

  // discrete equation holds in the interior
  let residual = pde.r1().unwrap() * &solution;
  let force = pde.force().unwrap();
  for inode in (0..mesh.nnodes()).filter(|&i| !mesh.is_boundary_node(i)) {
    assert!((residual[inode] - force[(inode, 0)]).abs() < 1e-8);
  }
}

/// On a bent line the harmonic functions are affine in the arc length.
#[test]
fn polyline_arc_length() {
  let points = na::dmatrix![
    0.0, 1.0, 1.0, 3.0;
    0.0, 0.0, 2.0, 2.0;
  ];
  let mesh = gen::polyline(points).unwrap();
  assert!(mesh.is_manifold());
  assert_eq!(mesh.boundary_nodes(), &[0, 3]);
  assert_relative_eq!(mesh.measure(), 5.0, epsilon = 1e-12);

  let bc: BoundaryData = [(0, na::dvector![0.0]), (3, na::dvector![5.0])]
    .into_iter()
    .collect();
  let solution = solve_stationary(&mesh, laplacian(), bc);
  assert_relative_eq!(solution, na::dvector![0.0, 1.0, 3.0, 5.0], epsilon = 1e-10);
}

/// $-u'' = 2$ on $[0,1]$ with zero boundary values, nodally exact in 1D.
#[test]
fn poisson_1d_nodally_exact() {
  let mesh = gen::unit_interval(8).unwrap();
  let forcing = na::DMatrix::from_element(mesh.ndofs(), 1, 2.0);
  let mut pde = Pde::new(&mesh, laplacian(), forcing).unwrap();
  pde
    .set_dirichlet_bc(boundary_data_of(&mesh, |_| 0.0))
    .unwrap();
  pde
    .solve(&LagrangeP1, &QuadRule::degree2(1), &SolverArgs::default())
    .unwrap();

  let exact = nodal_values(&mesh, |x| x[0] * (1.0 - x[0]));
  assert_relative_eq!(pde.solution().unwrap().column(0).into_owned(), exact, epsilon = 1e-10);
}

#[test]
fn heat_keeps_constant_state() {
  init_tracing();
  let mesh = gen::unit_square(3).unwrap();
  let ntimes = 6;
  let mut pde = Pde::new(&mesh, dt() + laplacian(), na::DMatrix::zeros(mesh.ndofs(), ntimes)).unwrap();
  pde.set_initial_condition(na::DVector::from_element(mesh.ndofs(), 3.0)).unwrap();
  pde.set_dirichlet_bc(boundary_data_of(&mesh, |_| 3.0)).unwrap();

  for theta in [1.0, 0.5] {
    let args = SolverArgs::new(0.1).with_theta(theta);
    pde.solve(&LagrangeP1, &QuadRule::degree2(2), &args).unwrap();
    let solution = pde.solution().unwrap();
    assert_eq!(solution.shape(), (mesh.ndofs(), ntimes));
    assert_relative_eq!(
      solution.clone(),
      na::DMatrix::from_element(mesh.ndofs(), ntimes, 3.0),
      epsilon = 1e-10
    );
  }
}

#[test]
fn advection_diffusion_keeps_constant_state() {
  let mesh = gen::unit_square(3).unwrap();
  let ntimes = 5;
  let form = dt() + laplacian() + advection(na::dvector![1.0, -0.5]);
  let mut pde = Pde::new(&mesh, form, na::DMatrix::zeros(mesh.ndofs(), ntimes)).unwrap();
  assert_eq!(pde.solver_kind(), SolverKind::SpaceTime);
  pde.set_initial_condition(na::DVector::from_element(mesh.ndofs(), 2.0)).unwrap();
  pde.set_dirichlet_bc(boundary_data_of(&mesh, |_| 2.0)).unwrap();

  for theta in [1.0, 0.5] {
    let args = SolverArgs::new(0.1).with_theta(theta);
    pde.solve(&LagrangeP1, &QuadRule::degree2(2), &args).unwrap();
    assert_relative_eq!(
      pde.solution().unwrap().clone(),
      na::DMatrix::from_element(mesh.ndofs(), ntimes, 2.0),
      epsilon = 1e-10
    );
  }
}

#[test]
fn heat_decays_to_boundary_values() {
  let mesh = gen::unit_interval(8).unwrap();
  let ntimes = 40;
  let mut pde = Pde::new(&mesh, dt() + laplacian(), na::DMatrix::zeros(mesh.ndofs(), ntimes)).unwrap();
  let initial = nodal_values(&mesh, |x| (std::f64::consts::PI * x[0]).sin());
  pde.set_initial_condition(initial).unwrap();
  pde.set_dirichlet_bc(boundary_data_of(&mesh, |_| 0.0)).unwrap();

  pde
    .solve(&LagrangeP1, &QuadRule::degree2(1), &SolverArgs::new(0.05))
    .unwrap();
  let solution = pde.solution().unwrap();
  let norms: Vec<f64> = solution.column_iter().map(|c| c.amax()).collect();
  assert!(norms.windows(2).all(|w| w[1] <= w[0] + 1e-12));
  assert!(norms[ntimes - 1] < 0.1 * norms[0]);
}

#[test]
fn time_dependent_boundary_values() {
  let mesh = gen::unit_interval(4).unwrap();
  let ntimes = 3;
  let mut pde = Pde::new(&mesh, dt() + laplacian(), na::DMatrix::zeros(mesh.ndofs(), ntimes)).unwrap();
  pde.set_initial_condition(na::DVector::zeros(mesh.ndofs())).unwrap();
  let bc: BoundaryData = [(0, na::dvector![0.0, 1.0, 2.0]), (4, na::dvector![0.0])]
    .into_iter()
    .collect();
  pde.set_dirichlet_bc(bc).unwrap();
  pde
    .solve(&LagrangeP1, &QuadRule::degree2(1), &SolverArgs::new(0.1))
    .unwrap();

  let solution = pde.solution().unwrap();
  for (istep, &value) in [0.0, 1.0, 2.0].iter().enumerate() {
    assert_relative_eq!(solution[(0, istep)], value, epsilon = 1e-12);
    assert_relative_eq!(solution[(4, istep)], 0.0, epsilon = 1e-12);
  }
}

#[test]
fn parabolic_without_initial_condition() {
  let mesh = gen::unit_interval(2).unwrap();
  let mut pde = Pde::new(&mesh, dt() + laplacian(), na::DMatrix::zeros(3, 2)).unwrap();
  let result = pde.solve(&LagrangeP1, &QuadRule::degree2(1), &SolverArgs::default());
  assert!(matches!(result, Err(Error::InconsistentData(_))));
}
