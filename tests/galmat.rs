//! Verify Galerkin matrices of the negative laplacian by comparing
//! to finite differences and to a hand written 3D FEM assembly.

extern crate nalgebra as na;

use simpde::{
  assemble::{Assembler, GalerkinAssembler},
  fe::{LagrangeP1, QuadRule},
  mesh::{gen, Mesh},
  operators::laplacian,
};

fn stiffness(mesh: &Mesh) -> na::DMatrix<f64> {
  let dim = mesh.dim_intrinsic();
  let forcing = na::DMatrix::zeros(mesh.ndofs(), 1);
  let assembly = GalerkinAssembler
    .assemble(mesh, &laplacian(), &LagrangeP1, &QuadRule::barycenter(dim), &forcing)
    .unwrap();
  na::DMatrix::from(&assembly.r1)
}

fn compare_galmats(fem: &na::DMatrix<f64>, other: &na::DMatrix<f64>) {
  let diff = fem - other;
  let equal = diff.norm() <= 1e3 * f64::EPSILON;
  if !equal {
    println!("FEM:\n{fem:.2}");
    println!("other:\n{other:.2}");
    println!("diff:\n{diff:.2}");
    panic!("FEM and other disagree");
  }
}

/// In 1D the FEM stiffness matrix is the FD stencil $1/h (-1, 2, -1)$.
#[test]
fn fem_vs_fd_1d() {
  for n in 1..=6 {
    let mesh = gen::unit_interval(n).unwrap();
    let h = (n as f64).recip();
    let nnodes = n + 1;

    let mut fd = na::DMatrix::zeros(nnodes, nnodes);
    for i in 0..n {
      fd[(i, i)] += 1.0;
      fd[(i + 1, i + 1)] += 1.0;
      fd[(i, i + 1)] -= 1.0;
      fd[(i + 1, i)] -= 1.0;
    }
    fd /= h;
    compare_galmats(&stiffness(&mesh), &fd);
  }
}

/// On the structured triangulation the interior rows are the 5 point stencil.
#[test]
fn fem_vs_fd_2d_interior() {
  let n = 4;
  let mesh = gen::unit_square(n).unwrap();
  let galmat = stiffness(&mesh);
  let nside = n + 1;
  for j in 1..n {
    for i in 1..n {
      let inode = i + j * nside;
      let mut expected = na::DVector::zeros(mesh.ndofs());
      expected[inode] = 4.0;
      for neighbor in [inode - 1, inode + 1, inode - nside, inode + nside] {
        expected[neighbor] = -1.0;
      }
      let row = galmat.row(inode).transpose();
      assert!((row - expected).norm() <= 1e3 * f64::EPSILON);
    }
  }
}

#[test]
fn fem_vs_fem3d() {
  let (mesh, tets) = unit_cube();
  compare_galmats(&stiffness(&mesh), &fem3d_galmat(&mesh, &tets));
}

fn unit_cube() -> (Mesh, Vec<Vec<usize>>) {
  let nodes = na::DMatrix::from_fn(3, 8, |icomp, inode| ((inode >> icomp) & 1) as f64);
  let tets = vec![
    vec![0, 1, 3, 7],
    vec![0, 1, 5, 7],
    vec![0, 2, 3, 7],
    vec![0, 2, 6, 7],
    vec![0, 4, 5, 7],
    vec![0, 4, 6, 7],
  ];
  (Mesh::new(nodes, tets.clone()).unwrap(), tets)
}

/// Stiffness matrix from the face normals of each tetrahedron.
fn fem3d_galmat(mesh: &Mesh, tets: &[Vec<usize>]) -> na::DMatrix<f64> {
  let vertices: Vec<na::Vector3<f64>> = (0..mesh.nnodes())
    .map(|i| mesh.node(i).fixed_rows::<3>(0).into_owned())
    .collect();
  let tet_vol = 1.0 / 6.0;

  let mut galmat = na::DMatrix::<f64>::zeros(vertices.len(), vertices.len());
  for tet_ivertices in tets {
    let tet_vertices: Vec<_> = tet_ivertices.iter().map(|&i| vertices[i]).collect();

    let ns: Vec<na::Vector3<f64>> = (0..4)
      .map(|i| {
        let mut face = tet_vertices.clone();
        face.remove(i);

        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let b0 = face[1] - face[0];
        let b1 = face[2] - face[0];
        sign * b0.cross(&b1)
      })
      .collect();

    let elmat = na::DMatrix::from_fn(4, 4, |i, j| ns[i].dot(&ns[j])) / (36.0 * tet_vol);

    for (ilocal, &iglobal) in tet_ivertices.iter().enumerate() {
      for (jlocal, &jglobal) in tet_ivertices.iter().enumerate() {
        galmat[(iglobal, jglobal)] += elmat[(ilocal, jlocal)];
      }
    }
  }
  galmat
}
