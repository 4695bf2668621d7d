/// Boundary edges, forced-node classification and free-DOF numbering
pub mod boundary;
/// Material parameters and the Helmholtz media lookup
pub mod media;
/// Second-order triangular mesh (external input)
pub mod mesh;

pub use boundary::{
    edge::{Edge, EdgeAxis, EdgeError, GridPoint},
    DofMap, ForceNodeSet, GridSpec,
};
pub use media::{HelmholtzMedia, MediaInfo, MediaSet, StandardMedia, WaveMode};
pub use mesh::{Element, Mesh, Node, Point};
