use super::assembly::setup_element;
use super::element_matrix::{periodic_matrices, LocalMatrix, PeriodicElementMatrices};
use super::{AssemblyError, HelmholtzSettings};
use crate::domain::boundary::DofMap;
use crate::domain::media::{HelmholtzMedia, MediaSet};
use crate::domain::mesh::{Element, Mesh};
use crate::linalg::{EigenPair, SolveError};

use bytes::{BufMut, BytesMut};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// PETSc binary matrix file identifier
pub const MAT_FILE_CLASSID: u32 = 1_211_216;

/// Stiffness, damping and mass matrices of a periodic cell
///
/// All three are dense `num_dofs x num_dofs` buffers addressed `row + num_dofs * col`.
/// `c` and `m` stay zero unless the slowly-varying-envelope formulation is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicSystem {
    num_dofs: usize,
    pub k: Vec<f64>,
    pub c: Vec<f64>,
    pub m: Vec<f64>,
}

impl PeriodicSystem {
    pub fn new(num_dofs: usize) -> Self {
        assert!(
            num_dofs <= (std::u32::MAX as usize),
            "Matrix Dimension cannot exceed the size of a u32!"
        );
        Self {
            num_dofs,
            k: vec![0.0; num_dofs * num_dofs],
            c: vec![0.0; num_dofs * num_dofs],
            m: vec![0.0; num_dofs * num_dofs],
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    /// Flat buffer offset of (`row`, `col`)
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.num_dofs && col < self.num_dofs,
            "index ({}, {}) exceeded system size ({}); cannot access periodic system!",
            row,
            col,
            self.num_dofs
        );
        row + self.num_dofs * col
    }

    /// Add one Element's matrices, skipping any pair touching a forced Node
    pub fn scatter(&mut self, element: &Element, local: &PeriodicElementMatrices, dofs: &DofMap) {
        self.scatter_into(Buffer::K, element, &local.k, dofs);
        if let Some(c) = &local.c {
            self.scatter_into(Buffer::C, element, c, dofs);
        }
        if let Some(m) = &local.m {
            self.scatter_into(Buffer::M, element, m, dofs);
        }
    }

    fn scatter_into(&mut self, which: Buffer, element: &Element, local: &LocalMatrix, dofs: &DofMap) {
        let n = self.num_dofs;
        let buffer = match which {
            Buffer::K => &mut self.k,
            Buffer::C => &mut self.c,
            Buffer::M => &mut self.m,
        };

        for (i, node_i) in element.nodes.iter().enumerate() {
            let row = match dofs.dof(*node_i) {
                Some(row) => row,
                None => continue,
            };
            for (j, node_j) in element.nodes.iter().enumerate() {
                if let Some(col) = dofs.dof(*node_j) {
                    buffer[row + n * col] += local[i][j];
                }
            }
        }
    }

    /// Write K, C and M to `{prefix}_k.dat`, `{prefix}_c.dat` and `{prefix}_m.dat` in `dir`
    /// (PETSc binary AIJ format) for an out-of-process eigensolver
    pub fn write_to_binary_files(
        &self,
        dir: impl AsRef<Path>,
        prefix: impl AsRef<str>,
    ) -> std::io::Result<()> {
        for (name, values) in [("k", &self.k), ("c", &self.c), ("m", &self.m)] {
            let path = dir
                .as_ref()
                .join(format!("{}_{}.dat", prefix.as_ref(), name));
            let file = File::create(&path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(petsc_binary(values, self.num_dofs).as_ref())?;
            writer.flush()?;
            log::debug!("Wrote {}x{} matrix to {}", self.num_dofs, self.num_dofs, path.display());
        }
        Ok(())
    }
}

enum Buffer {
    K,
    C,
    M,
}

/// Encode a dense column-major matrix as a (row-compressed) PETSc binary AIJ matrix, dropping zeros
pub fn petsc_binary(values: &[f64], dim: usize) -> BytesMut {
    assert_eq!(
        values.len(),
        dim * dim,
        "Buffer length must be dim * dim; cannot encode matrix!"
    );

    let mut row_counts = vec![0_u32; dim];
    let mut col_ids = Vec::new();
    let mut entries = Vec::new();
    for row in 0..dim {
        for col in 0..dim {
            let v = values[row + dim * col];
            if v != 0.0 {
                row_counts[row] += 1;
                col_ids.push(col as u32);
                entries.push(v);
            }
        }
    }

    let mut buf = BytesMut::with_capacity(16 + 4 * (dim + col_ids.len()) + 8 * entries.len());

    // header
    buf.put_u32(MAT_FILE_CLASSID);
    buf.put_u32(dim as u32);
    buf.put_u32(dim as u32);
    buf.put_u32(entries.len() as u32);

    for &count in row_counts.iter() {
        buf.put_u32(count);
    }
    for &col in col_ids.iter() {
        buf.put_u32(col);
    }
    for &v in entries.iter() {
        buf.put_f64(v);
    }

    buf
}

/// Assemble the periodic-cell matrices over every Element.
///
/// `K` is always assembled; `C` and `M` only when `settings.svea` is set.
pub fn assemble_periodic<L: HelmholtzMedia>(
    mesh: &Mesh,
    media: &MediaSet,
    lookup: &L,
    settings: &HelmholtzSettings,
    dofs: &DofMap,
    system: &mut PeriodicSystem,
) -> Result<(), AssemblyError> {
    assert_eq!(
        system.num_dofs(),
        dofs.num_free(),
        "Periodic system size must match the number of free DoFs; cannot assemble!"
    );

    let k0 = settings.k0();
    for element in mesh.elements.iter() {
        let setup = setup_element(mesh, element, media, lookup, settings)?;
        let local = periodic_matrices(
            &setup.integrals,
            &setup.p,
            &setup.q,
            k0,
            settings.periodic_axis,
            settings.svea,
        );
        log::trace!("Scattering periodic element {}", element.number);
        system.scatter(element, &local, dofs);
    }

    log::debug!(
        "Assembled periodic system: {} free DoFs, axis {}, svea = {}",
        dofs.num_free(),
        settings.periodic_axis,
        settings.svea
    );

    Ok(())
}

/// Generalized/quadratic eigenvalue solver for `(K − jβC − β²M)·u = 0`
///
/// Returns up to `num_pairs` propagation constants `β` with their eigenvectors.
pub trait PeriodicEigenSolver {
    fn solve(
        &self,
        system: &PeriodicSystem,
        num_pairs: usize,
    ) -> Result<Vec<EigenPair>, SolveError>;
}
