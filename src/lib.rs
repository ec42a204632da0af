extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod error;
pub mod fe;
pub mod geometry;
pub mod linalg;
pub mod mesh;
pub mod operators;
pub mod pde;
pub mod solver;
pub mod svd;
pub mod util;

pub use error::{Error, Result};
pub use geometry::{AffineSubspace, Element};
pub use mesh::Mesh;
pub use pde::Pde;
pub use svd::{SvdPolicy, TruncatedSvd};

pub type Dim = usize;
