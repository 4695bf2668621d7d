use super::element_matrix::{
    helmholtz_matrix, signed_area, ElementIntegrals, LocalMatrix, TriangleGeometry,
};
use super::{AssemblyError, HelmholtzSettings};
use crate::domain::boundary::DofMap;
use crate::domain::media::{HelmholtzMedia, MediaSet};
use crate::domain::mesh::{Element, Mesh, Point};
use crate::linalg::MatrixAccess;

use nalgebra::{ComplexField, Matrix3};

/// Validated geometry and media tensors of one Element
pub(crate) struct ElementSetup {
    pub integrals: ElementIntegrals,
    pub p: Matrix3<f64>,
    pub q: Matrix3<f64>,
}

/// Resolve an Element's vertices, integrals and `(P, Q)` tensors.
pub(crate) fn setup_element<L: HelmholtzMedia>(
    mesh: &Mesh,
    element: &Element,
    media: &MediaSet,
    lookup: &L,
    settings: &HelmholtzSettings,
) -> Result<ElementSetup, AssemblyError> {
    let mut vertices = [Point::default(); 3];
    for (vertex, node) in vertices.iter_mut().zip(element.vertices()) {
        *vertex = mesh
            .node(node)
            .ok_or(AssemblyError::NodeOutOfRange {
                element: element.number,
                node,
            })?
            .coords;
    }
    if let Some(node) = element.nodes[3..].iter().find(|n| mesh.node(**n).is_none()) {
        return Err(AssemblyError::NodeOutOfRange {
            element: element.number,
            node: *node,
        });
    }

    let area = signed_area(&vertices);
    if area <= 0.0 || !area.is_finite() {
        return Err(AssemblyError::DegenerateElement {
            element: element.number,
            area,
        });
    }

    let media_info = media
        .get(element.media)
        .ok_or(AssemblyError::MediaOutOfRange {
            element: element.number,
            media: element.media,
        })?;
    let (p, q) = lookup
        .helmholtz_tensors(settings.k0(), media_info, settings.mode)
        .map_err(|source| AssemblyError::Media {
            element: element.number,
            source,
        })?;

    Ok(ElementSetup {
        integrals: ElementIntegrals::new(&TriangleGeometry::new(&vertices)),
        p,
        q,
    })
}

/// The ordinary Helmholtz matrix of one Element
pub fn helmholtz_element<L: HelmholtzMedia>(
    mesh: &Mesh,
    element: &Element,
    media: &MediaSet,
    lookup: &L,
    settings: &HelmholtzSettings,
) -> Result<LocalMatrix, AssemblyError> {
    let setup = setup_element(mesh, element, media, lookup, settings)?;
    Ok(helmholtz_matrix(
        &setup.integrals,
        &setup.p,
        &setup.q,
        settings.k0(),
    ))
}

/// Add a local matrix into a global one.
///
/// Any (i, j) pair touching a forced Node is skipped. Accumulation is purely additive, so
/// Elements may be scattered in any order.
///
/// Panics if `target` has no room for one of the free (i, j) pairs, e.g. a
/// [SymmetricBandMatrix](crate::linalg::SymmetricBandMatrix) narrower than [required_bandwidth].
pub fn scatter<M: MatrixAccess>(
    element: &Element,
    local: &LocalMatrix,
    dofs: &DofMap,
    target: &mut M,
) {
    for (i, node_i) in element.nodes.iter().enumerate() {
        let row = match dofs.dof(*node_i) {
            Some(row) => row,
            None => continue,
        };
        for (j, node_j) in element.nodes.iter().enumerate() {
            if let Some(col) = dofs.dof(*node_j) {
                assert!(
                    target.stores(row, col),
                    "Target matrix cannot store entry ({}, {}) of element {}; cannot assemble!",
                    row,
                    col,
                    element.number
                );
                target.add_to(row, col, M::Elem::from_real(local[i][j]));
            }
        }
    }
}

/// Assemble the global Helmholtz matrix over the free Degrees of Freedom into `target`.
///
/// `target` must be a `dofs.num_free()` square matrix; it is accumulated into, not cleared.
/// A [SymmetricBandMatrix](crate::linalg::SymmetricBandMatrix) target needs at least
/// [required_bandwidth] super-diagonals.
pub fn assemble_helmholtz<M, L>(
    mesh: &Mesh,
    media: &MediaSet,
    lookup: &L,
    settings: &HelmholtzSettings,
    dofs: &DofMap,
    target: &mut M,
) -> Result<(), AssemblyError>
where
    M: MatrixAccess,
    L: HelmholtzMedia,
{
    assert!(
        target.rows() == dofs.num_free() && target.cols() == dofs.num_free(),
        "Target matrix ({}x{}) must match the number of free DoFs ({}); cannot assemble!",
        target.rows(),
        target.cols(),
        dofs.num_free()
    );

    for element in mesh.elements.iter() {
        let local = helmholtz_element(mesh, element, media, lookup, settings)?;
        if element.nodes.iter().all(|node| dofs.dof(*node).is_none()) {
            log::warn!("Every node of element {} is forced", element.number);
        }
        log::trace!("Scattering element {}", element.number);
        scatter(element, &local, dofs, target);
    }

    log::debug!(
        "Assembled Helmholtz system: {} elements, {} free DoFs (k0 = {:.6}, {})",
        mesh.elements.len(),
        dofs.num_free(),
        settings.k0(),
        settings.mode
    );

    Ok(())
}

/// Largest distance between the free indices of two Nodes sharing an Element
pub fn required_bandwidth(mesh: &Mesh, dofs: &DofMap) -> usize {
    mesh.elements
        .iter()
        .filter_map(|element| {
            let free: Vec<usize> = element
                .nodes
                .iter()
                .filter_map(|node| dofs.dof(*node))
                .collect();
            let lo = free.iter().min()?;
            let hi = free.iter().max()?;
            Some(hi - lo)
        })
        .max()
        .unwrap_or(0)
}
