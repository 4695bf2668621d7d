use json::{array, object, JsonValue};
use std::fmt;
use std::fs::read_to_string;
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;
use thiserror::Error;

/// Number of Nodes on a quadratic triangle (3 vertices followed by 3 edge midpoints)
pub const NODES_PER_ELEMENT: usize = 6;

/// Mid-edge nodes sit between these vertex pairs: `3 = (0, 1)`, `4 = (1, 2)`, `5 = (2, 0)`
pub const MIDPOINT_VERTICES: [[usize; 2]; 3] = [[0, 1], [1, 2], [2, 0]];

/// A Point in Real Space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

/// A mesh Node: identified by a 1-based number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub number: usize,
    pub coords: Point,
}

/// A quadratic triangular Element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// 1-based Element number
    pub number: usize,
    /// 1-based node numbers: vertices first, then the midpoints of edges (0-1), (1-2), (2-0)
    pub nodes: [usize; NODES_PER_ELEMENT],
    /// Index of this Element's medium in the [MediaSet](crate::domain::media::MediaSet)
    pub media: usize,
}

impl Element {
    pub fn vertices(&self) -> [usize; 3] {
        [self.nodes[0], self.nodes[1], self.nodes[2]]
    }

    pub fn to_json(&self) -> JsonValue {
        object! {
            "node_ids": JsonValue::from(self.nodes.to_vec()),
            "media": self.media,
        }
    }
}

/// Second-order triangular mesh of a waveguide cross-section
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
}

impl Mesh {
    /// Build a Mesh from node coordinates (numbered from 1 in order) and Elements.
    ///
    /// Every Element must reference existing, distinct Nodes.
    pub fn new(points: Vec<Point>, elements: Vec<Element>) -> Result<Self, MeshError> {
        let num_nodes = points.len();

        for element in elements.iter() {
            for node in element.nodes {
                if node == 0 || node > num_nodes {
                    return Err(MeshError::NodeOutOfRange {
                        element: element.number,
                        node,
                        num_nodes,
                    });
                }
            }
            if has_duplicates(&element.nodes) {
                return Err(MeshError::DuplicateNodes(element.number));
            }
        }

        Ok(Self {
            nodes: points
                .into_iter()
                .enumerate()
                .map(|(i, coords)| Node {
                    number: i + 1,
                    coords,
                })
                .collect(),
            elements,
        })
    }

    /// Construct a Mesh from a JSON file with the following format:
    ///
    /// ```Text
    /// {
    ///     "Elements": [
    ///         {
    ///             "node_ids": [v0, v1, v2, m01, m12, m20],
    ///             "media": 0,
    ///         },
    ///         {
    ///             "node_ids": [3, 2, 4, 8, 9, 10],
    ///             "media": 1,
    ///         },
    ///     ],
    ///     "Nodes": [
    ///         [x_coordinate, y_coordinate],
    ///         [0.0, 0.0],
    ///         [1.0, 0.0],
    ///     ]
    /// }
    /// ```
    ///
    /// Node ids are 1-based. Media index `0` is the background and `1` is the rod material.
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, MeshError> {
        let mesh_file_contents = read_to_string(path.as_ref())?;
        let mesh = Self::from_json(&json::parse(&mesh_file_contents)?)?;

        log::info!(
            "Loaded mesh '{}': {} nodes, {} elements",
            path.as_ref(),
            mesh.nodes.len(),
            mesh.elements.len()
        );

        Ok(mesh)
    }

    /// Construct a Mesh from an already parsed JSON object (see [Mesh::from_file])
    pub fn from_json(mesh_json: &JsonValue) -> Result<Self, MeshError> {
        let points = parse_node_information(mesh_json)?;
        let elements = parse_element_information(mesh_json)?;

        Self::new(points, elements)
    }

    /// Print the mesh to a JSON file specified by path (in the [Mesh::from_file] format).
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        self.to_json().write_pretty(&mut w, 4)?;

        Ok(())
    }

    pub fn to_json(&self) -> JsonValue {
        object! {
            "Elements": JsonValue::from(self.elements.iter().map(|element| element.to_json()).collect::<Vec<_>>()),
            "Nodes": JsonValue::from(self.nodes.iter().map(|node| array![node.coords.x, node.coords.y]).collect::<Vec<_>>()),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a Node by its 1-based number
    pub fn node(&self, number: usize) -> Option<&Node> {
        number.checked_sub(1).and_then(|idx| self.nodes.get(idx))
    }

    /// The real-space coordinates of an Element's six Nodes (in local node order)
    pub fn element_points(&self, element: &Element) -> Option<[Point; NODES_PER_ELEMENT]> {
        let mut points = [Point::default(); NODES_PER_ELEMENT];
        for (point, node) in points.iter_mut().zip(element.nodes.iter()) {
            *point = self.node(*node)?.coords;
        }
        Some(points)
    }

    /// Get the three vertex [Point]s composing an [Element]
    pub fn element_vertices(&self, element: &Element) -> Option<[Point; 3]> {
        let [p0, p1, p2, ..] = self.element_points(element)?;
        Some([p0, p1, p2])
    }
}

fn parse_element_information(mesh_json: &JsonValue) -> Result<Vec<Element>, MeshError> {
    if !mesh_json["Elements"].is_array() {
        return Err(MeshError::Format("Elements must be an Array!".into()));
    }

    mesh_json["Elements"]
        .members()
        .enumerate()
        .map(|(idx, json_element)| {
            let number = idx + 1;

            if !json_element["node_ids"].is_array()
                || json_element["node_ids"].len() != NODES_PER_ELEMENT
            {
                return Err(MeshError::Format(format!(
                    "Element {} must have an Array of {} node_ids!",
                    number, NODES_PER_ELEMENT
                )));
            }

            let mut nodes = [0; NODES_PER_ELEMENT];
            for (node, node_json) in nodes.iter_mut().zip(json_element["node_ids"].members()) {
                *node = node_json.as_usize().ok_or_else(|| {
                    MeshError::Format(format!(
                        "Element {}'s node_ids must be positive integers!",
                        number
                    ))
                })?;
            }

            let media = json_element["media"].as_usize().ok_or_else(|| {
                MeshError::Format(format!(
                    "Element {} must have a non-negative integer media index!",
                    number
                ))
            })?;

            Ok(Element {
                number,
                nodes,
                media,
            })
        })
        .collect()
}

fn parse_node_information(mesh_json: &JsonValue) -> Result<Vec<Point>, MeshError> {
    if !mesh_json["Nodes"].is_array() {
        return Err(MeshError::Format("Nodes must be an Array!".into()));
    }

    mesh_json["Nodes"]
        .members()
        .map(|json_node_point| {
            if !json_node_point.is_array() || json_node_point.len() != 2 {
                return Err(MeshError::Format(
                    "Nodes must be arrays of length 2!".into(),
                ));
            }

            match (json_node_point[0].as_f64(), json_node_point[1].as_f64()) {
                (Some(x), Some(y)) => Ok(Point::new(x, y)),
                _ => Err(MeshError::Format(
                    "Nodes must be composed of numerical values!".into(),
                )),
            }
        })
        .collect()
}

fn has_duplicates<T>(values: &[T]) -> bool
where
    T: PartialEq,
{
    values
        .iter()
        .enumerate()
        .any(|(i, a)| values[(i + 1)..].iter().any(|b| a == b))
}

/// Errors produced while loading a [Mesh]
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Unable to read mesh file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse mesh file as JSON: {0}")]
    Parse(#[from] json::Error),
    #[error("Invalid mesh: {0}")]
    Format(String),
    #[error("Element {element} references node {node}, but the mesh only has {num_nodes} nodes!")]
    NodeOutOfRange {
        element: usize,
        node: usize,
        num_nodes: usize,
    },
    #[error("Element {0} references the same node more than once!")]
    DuplicateNodes(usize),
}
