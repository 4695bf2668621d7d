/// Axis-aligned boundary segments on the drawing grid
pub mod edge;

use super::mesh::{Mesh, Point};
use edge::{Edge, EdgeAxis, GridPoint};

use std::collections::{BTreeMap, BTreeSet};

/// Relative tolerance (in cell sizes) used to decide whether a mesh Node lies on an Edge
pub const DEFAULT_GRID_TOLERANCE: f64 = 1.0e-6;

/// Mapping between integer grid cells and real-space coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Real-space location of grid point `(0, 0)`
    pub origin: Point,
    /// Length of one grid step
    pub cell_size: f64,
    /// Absolute distance under which a Node counts as lying on a grid line
    pub tolerance: f64,
}

impl GridSpec {
    pub fn new(origin: Point, cell_size: f64) -> Self {
        assert!(
            cell_size > 0.0,
            "Grid cell size must be positive ({}); cannot construct GridSpec!",
            cell_size
        );
        Self {
            origin,
            cell_size,
            tolerance: cell_size * DEFAULT_GRID_TOLERANCE,
        }
    }

    pub fn to_real(&self, p: GridPoint) -> Point {
        Point::new(
            self.origin.x + p.x as f64 * self.cell_size,
            self.origin.y + p.y as f64 * self.cell_size,
        )
    }

    /// Does `point` lie on `edge` (end points included)?
    pub fn on_edge(&self, point: &Point, edge: &Edge) -> bool {
        let [p0, p1] = match edge.points() {
            Some(points) => points,
            None => return false,
        };
        let (start, end) = (self.to_real(p0), self.to_real(p1));

        let (along, lo, hi, across, line) = match edge.axis() {
            EdgeAxis::X => (point.x, start.x, end.x, point.y, start.y),
            EdgeAxis::Y => (point.y, start.y, end.y, point.x, start.x),
        };

        (across - line).abs() <= self.tolerance
            && along >= lo - self.tolerance
            && along <= hi + self.tolerance
    }

    /// Position of `point` along `edge`'s axis (used to order port Nodes)
    fn along(point: &Point, axis: EdgeAxis) -> f64 {
        match axis {
            EdgeAxis::X => point.x,
            EdgeAxis::Y => point.y,
        }
    }
}

/// Set of forced (Dirichlet) node numbers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceNodeSet {
    nodes: BTreeSet<usize>,
}

impl ForceNodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: usize) -> bool {
        self.nodes.insert(node)
    }

    pub fn contains(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Forced node numbers in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &usize> + '_ {
        self.nodes.iter()
    }
}

impl FromIterator<usize> for ForceNodeSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl Extend<usize> for ForceNodeSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        self.nodes.extend(iter)
    }
}

/// Free Degree-of-Freedom numbering
///
/// Every node which is not forced is assigned a 0-based index, in ascending node order.
/// Global system matrices are `num_free() x num_free()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    /// Indexed by `node_number - 1`
    dof_ids: Vec<Option<usize>>,
    /// Indexed by dof index
    dof_nodes: Vec<usize>,
}

impl DofMap {
    pub fn new(num_nodes: usize, forced: &ForceNodeSet) -> Self {
        let mut dof_nodes = Vec::with_capacity(num_nodes.saturating_sub(forced.len()));
        let dof_ids = (1..=num_nodes)
            .map(|node| {
                if forced.contains(node) {
                    None
                } else {
                    dof_nodes.push(node);
                    Some(dof_nodes.len() - 1)
                }
            })
            .collect();

        Self { dof_ids, dof_nodes }
    }

    /// Number every node of `mesh`, excluding `forced`
    pub fn from_mesh(mesh: &Mesh, forced: &ForceNodeSet) -> Self {
        Self::new(mesh.num_nodes(), forced)
    }

    /// Free index of a (1-based) node; `None` if the node is forced or does not exist
    pub fn dof(&self, node: usize) -> Option<usize> {
        node.checked_sub(1)
            .and_then(|idx| self.dof_ids.get(idx))
            .copied()
            .flatten()
    }

    /// The node number carrying a free index
    pub fn node(&self, dof: usize) -> Option<usize> {
        self.dof_nodes.get(dof).copied()
    }

    pub fn num_free(&self) -> usize {
        self.dof_nodes.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.dof_ids.len()
    }
}

/// Find every Node of `mesh` lying on one of the (non-empty) `edges`.
pub fn classify_nodes<'a>(
    mesh: &Mesh,
    edges: impl IntoIterator<Item = &'a Edge>,
    grid: &GridSpec,
) -> ForceNodeSet {
    let edges: Vec<&Edge> = edges.into_iter().filter(|edge| !edge.is_empty()).collect();

    let forced: ForceNodeSet = mesh
        .nodes
        .iter()
        .filter(|node| edges.iter().any(|edge| grid.on_edge(&node.coords, edge)))
        .map(|node| node.number)
        .collect();

    log::debug!(
        "Classified {} of {} nodes as forced ({} edges)",
        forced.len(),
        mesh.num_nodes(),
        edges.len()
    );

    forced
}

/// Collect the Nodes on each port Edge, grouped by Edge number and ordered along the Edge.
///
/// Edges which share a number are treated as one port; their Nodes are merged.
pub fn port_nodes<'a>(
    mesh: &Mesh,
    edges: impl IntoIterator<Item = &'a Edge>,
    grid: &GridSpec,
) -> BTreeMap<usize, Vec<usize>> {
    let mut ports: BTreeMap<usize, Vec<(f64, usize)>> = BTreeMap::new();

    for edge in edges.into_iter().filter(|edge| !edge.is_empty()) {
        let port = ports.entry(edge.no).or_default();
        for node in mesh.nodes.iter() {
            if grid.on_edge(&node.coords, edge)
                && !port.iter().any(|(_, number)| *number == node.number)
            {
                port.push((GridSpec::along(&node.coords, edge.axis()), node.number));
            }
        }
    }

    ports
        .into_iter()
        .map(|(no, mut nodes)| {
            nodes.sort_by(|(a, _), (b, _)| a.total_cmp(b));
            (no, nodes.into_iter().map(|(_, number)| number).collect())
        })
        .collect()
}
