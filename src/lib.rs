//! Finite element matrix layer for 2D photonic-crystal waveguides
//!
//! * [linalg]: dense and symmetric band matrix storage behind one addressing trait, plus
//!   products, sums, transposes and inverse-via-solve over real and complex entries
//! * [domain]: the mesh, media and boundary-edge inputs to assembly
//! * [fem_problem]: quadratic-triangle Helmholtz element matrices and their assembly into
//!   global or periodic-cell systems

/// Mesh, media and boundary descriptions of a waveguide cross-section
pub mod domain;
/// Element matrices and global/periodic assembly
pub mod fem_problem;
/// Matrix storage, algebra and external solve primitives
pub mod linalg;

pub use domain::{
    DofMap, Edge, EdgeAxis, ForceNodeSet, GridPoint, GridSpec, MediaInfo, MediaSet, Mesh,
    StandardMedia, WaveMode,
};
pub use fem_problem::{
    assembly::{assemble_helmholtz, required_bandwidth},
    periodic::{assemble_periodic, PeriodicEigenSolver, PeriodicSystem},
    AssemblyError, HelmholtzSettings, PeriodicAxis,
};
pub use linalg::{
    nalgebra_solve::NalgebraSolver, DenseMatrix, EigenPair, LinearSolver, MatrixAccess,
    SolveError, SymmetricBandMatrix,
};
