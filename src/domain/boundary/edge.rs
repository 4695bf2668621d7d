use json::{array, object, JsonValue};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A point on the uniform drawing grid (integer cell coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn at(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The grid axis an [Edge] runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeAxis {
    X,
    Y,
}

impl EdgeAxis {
    /// Derive the axis from a direction delta. Only pure-X or pure-Y deltas are supported.
    pub fn from_delta([dx, dy]: [i32; 2]) -> Result<Self, EdgeError> {
        match (dx, dy) {
            (dx, 0) if dx != 0 => Ok(Self::X),
            (0, dy) if dy != 0 => Ok(Self::Y),
            _ => Err(EdgeError::UnsupportedDirection { dx, dy }),
        }
    }

    /// Unit step along this axis
    pub fn delta(&self) -> [i32; 2] {
        match self {
            Self::X => [1, 0],
            Self::Y => [0, 1],
        }
    }

    /// Coordinate of `p` measured along this axis
    #[inline]
    pub fn along(&self, p: GridPoint) -> i32 {
        match self {
            Self::X => p.x,
            Self::Y => p.y,
        }
    }

    /// Coordinate of `p` measured across this axis
    #[inline]
    pub fn across(&self, p: GridPoint) -> i32 {
        match self {
            Self::X => p.y,
            Self::Y => p.x,
        }
    }

    fn point(&self, along: i32, across: i32) -> GridPoint {
        match self {
            Self::X => GridPoint::at(along, across),
            Self::Y => GridPoint::at(across, along),
        }
    }
}

impl fmt::Display for EdgeAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

/// An axis-aligned boundary segment on the drawing grid
///
/// The axis is fixed when the Edge is constructed. The endpoints are optional: an Edge without
/// endpoints is empty. Endpoints are always stored in increasing order along the axis.
///
/// ```text
///     X-Axis:   p0 *----*----*----* p1       Y-Axis:   * p1
///                                                      |
///                                                      *
///                                                      |
///                                                      * p0
/// ```
///
/// Two boundary conventions coexist on purpose:
/// * [Edge::hit_test] treats the Edge as the half-open interval `[p0, p1)` (selection)
/// * [Edge::contains_point] treats it as the closed interval `[p0, p1]` (node classification)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Group number (port number). Zero marks a newly split piece which still needs a number.
    pub no: usize,
    axis: EdgeAxis,
    points: Option<[GridPoint; 2]>,
}

impl Edge {
    /// Construct an empty Edge running along the direction `delta`
    pub fn new(delta: [i32; 2], no: usize) -> Result<Self, EdgeError> {
        Ok(Self::along(EdgeAxis::from_delta(delta)?, no))
    }

    /// Construct an empty Edge along `axis`
    pub fn along(axis: EdgeAxis, no: usize) -> Self {
        Self {
            no,
            axis,
            points: None,
        }
    }

    /// Construct an Edge along `axis` between two points
    pub fn with_points(
        axis: EdgeAxis,
        no: usize,
        p0: GridPoint,
        p1: GridPoint,
    ) -> Result<Self, EdgeError> {
        let mut edge = Self::along(axis, no);
        edge.set(p0, p1)?;
        Ok(edge)
    }

    pub fn axis(&self) -> EdgeAxis {
        self.axis
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_none()
    }

    /// The ordered endpoints, if any
    pub fn points(&self) -> Option<[GridPoint; 2]> {
        self.points
    }

    pub fn start(&self) -> Option<GridPoint> {
        self.points.map(|[p0, _]| p0)
    }

    pub fn end(&self) -> Option<GridPoint> {
        self.points.map(|[_, p1]| p1)
    }

    /// Number of unit steps between the endpoints (0 for an empty Edge)
    pub fn len(&self) -> usize {
        match self.points {
            Some([p0, p1]) => (self.axis.along(p1) - self.axis.along(p0)) as usize,
            None => 0,
        }
    }

    /// Set the endpoints of this Edge.
    ///
    /// Identical points collapse the Edge to empty. The points may be given in either order.
    /// Points which do not lie on a line along this Edge's axis are not supported.
    pub fn set(&mut self, p0: GridPoint, p1: GridPoint) -> Result<(), EdgeError> {
        if p0 == p1 {
            self.points = None;
            return Ok(());
        }
        if self.axis.across(p0) != self.axis.across(p1) {
            return Err(EdgeError::UnsupportedSegment {
                from: p0,
                to: p1,
                axis: self.axis,
            });
        }

        self.points = match self.axis.along(p0).cmp(&self.axis.along(p1)) {
            Ordering::Less => Some([p0, p1]),
            _ => Some([p1, p0]),
        };
        Ok(())
    }

    /// Remove the endpoints, leaving an empty Edge
    pub fn clear(&mut self) {
        self.points = None;
    }

    /// Every grid point from the start to the end of this Edge (inclusive).
    ///
    /// The iterator can be cloned to restart the walk. An empty Edge yields nothing.
    pub fn all_points(&self) -> impl Iterator<Item = GridPoint> + Clone {
        let axis = self.axis;
        let (start, count) = match self.points {
            Some([p0, _]) => (p0, self.len() as i32 + 1),
            None => (GridPoint::default(), 0),
        };
        let [dx, dy] = axis.delta();

        (0..count).map(move |step| GridPoint::at(start.x + dx * step, start.y + dy * step))
    }

    /// Selection hit-test: is `p` on this Edge (excluding its end point) and does `axis` match?
    pub fn hit_test(&self, p: GridPoint, axis: EdgeAxis) -> bool {
        axis == self.axis && self.span_of(p).map_or(false, |(pos, lo, hi)| lo <= pos && pos < hi)
    }

    /// Is `p` on this Edge (including both end points)?
    pub fn contains_point(&self, p: GridPoint) -> bool {
        self.span_of(p).map_or(false, |(pos, lo, hi)| lo <= pos && pos <= hi)
    }

    /// Does this Edge contain every point of `other`?
    ///
    /// Edges along different axes never contain one another. An empty `other` has no points, so
    /// it is contained by any Edge along the same axis.
    pub fn contains_edge(&self, other: &Self) -> bool {
        if other.axis != self.axis {
            return false;
        }
        match other.points {
            Some([q0, q1]) => self.contains_point(q0) && self.contains_point(q1),
            None => true,
        }
    }

    /// Extend this Edge to cover `other` as well.
    ///
    /// Only touching or overlapping collinear Edges along the same axis are merged; for anything else
    /// this is a no-op. Returns `true` if this Edge was changed.
    pub fn merge_edge(&mut self, other: &Self) -> bool {
        if other.axis != self.axis {
            return false;
        }

        match (self.points, other.points) {
            (_, None) => false,
            (None, Some(_)) => {
                self.points = other.points;
                true
            }
            (Some([p0, p1]), Some([q0, q1])) => {
                let axis = self.axis;
                let touching = axis.across(p0) == axis.across(q0)
                    && axis.along(q0) <= axis.along(p1)
                    && axis.along(p0) <= axis.along(q1);
                if !touching {
                    return false;
                }

                let merged = [p0.min_along(q0, axis), p1.max_along(q1, axis)];
                let changed = merged != [p0, p1];
                self.points = Some(merged);
                changed
            }
        }
    }

    /// Remove the interval covered by `delimiter` from this Edge.
    ///
    /// Intervals are half-open: touching Edges do not overlap. The result holds
    /// * a copy of this Edge if the two do not overlap (or run along different axes)
    /// * nothing if the delimiter covers this whole Edge
    /// * the remaining piece (keeping this Edge's number) if the delimiter covers one end
    /// * two pieces if the delimiter is strictly inside: the first keeps this Edge's number, the second is numbered `0`
    pub fn split_edge(&self, delimiter: &Self) -> SmallVec<[Self; 2]> {
        let axis = self.axis;
        let ([p0, p1], [d0, d1]) = match (self.points, delimiter.points) {
            (Some(ps), Some(ds)) if delimiter.axis == axis => (ps, ds),
            _ => return smallvec![self.clone()],
        };

        let across = axis.across(p0);
        let (e_lo, e_hi) = (axis.along(p0), axis.along(p1));
        let d_lo = axis.along(d0);
        // delimiter extending past this edge is clamped to its end
        let d_hi = axis.along(d1).min(e_hi);

        if axis.across(d0) != across || d_lo >= e_hi || d_hi <= e_lo {
            return smallvec![self.clone()];
        }

        let piece = |lo: i32, hi: i32, no: usize| Self {
            no,
            axis,
            points: Some([axis.point(lo, across), axis.point(hi, across)]),
        };

        match (d_lo <= e_lo, d_hi >= e_hi) {
            (true, true) => SmallVec::new(),
            (true, false) => smallvec![piece(d_hi, e_hi, self.no)],
            (false, true) => smallvec![piece(e_lo, d_lo, self.no)],
            (false, false) => smallvec![piece(e_lo, d_lo, self.no), piece(d_hi, e_hi, 0)],
        }
    }

    /// Position of `p` along the edge together with the edge's bounds, if `p` is collinear with it
    fn span_of(&self, p: GridPoint) -> Option<(i32, i32, i32)> {
        let [p0, p1] = self.points?;
        if self.axis.across(p) != self.axis.across(p0) {
            return None;
        }
        Some((
            self.axis.along(p),
            self.axis.along(p0),
            self.axis.along(p1),
        ))
    }

    /// Produce a Json Object that describes this Edge (used for undo/redo snapshots)
    pub fn to_json(&self) -> JsonValue {
        let [dx, dy] = self.axis.delta();
        object! {
            "no": self.no,
            "delta": array![dx, dy],
            "points": match self.points {
                Some([p0, p1]) => array![array![p0.x, p0.y], array![p1.x, p1.y]],
                None => array![],
            },
        }
    }

    /// Rebuild an Edge from the output of [Edge::to_json]
    pub fn from_json(edge_json: &JsonValue) -> Result<Self, EdgeError> {
        let no = edge_json["no"]
            .as_usize()
            .ok_or_else(|| EdgeError::Format("'no' must be a non-negative integer".into()))?;

        let delta = parse_pair(&edge_json["delta"])?;
        let mut edge = Self::new(delta, no)?;

        match edge_json["points"].len() {
            0 => {}
            2 => {
                let [x0, y0] = parse_pair(&edge_json["points"][0])?;
                let [x1, y1] = parse_pair(&edge_json["points"][1])?;
                edge.set(GridPoint::at(x0, y0), GridPoint::at(x1, y1))?;
            }
            n => {
                return Err(EdgeError::Format(format!(
                    "'points' must hold 0 or 2 points (found {})",
                    n
                )))
            }
        }

        Ok(edge)
    }
}

impl GridPoint {
    fn min_along(self, other: Self, axis: EdgeAxis) -> Self {
        if axis.along(other) < axis.along(self) {
            other
        } else {
            self
        }
    }

    fn max_along(self, other: Self, axis: EdgeAxis) -> Self {
        if axis.along(other) > axis.along(self) {
            other
        } else {
            self
        }
    }
}

fn parse_pair(pair_json: &JsonValue) -> Result<[i32; 2], EdgeError> {
    if !pair_json.is_array() || pair_json.len() != 2 {
        return Err(EdgeError::Format(format!(
            "expected an array of two integers; found: {}",
            pair_json.dump()
        )));
    }
    let coord = |v: &JsonValue| {
        v.as_i32()
            .ok_or_else(|| EdgeError::Format(format!("expected an integer; found: {}", v.dump())))
    };
    Ok([coord(&pair_json[0])?, coord(&pair_json[1])?])
}

/// Error type for [Edge] construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EdgeError {
    #[error("Edge direction ({dx}, {dy}) is not a pure X or Y step; not implemented!")]
    UnsupportedDirection { dx: i32, dy: i32 },
    #[error("Segment {from} -> {to} does not run along the {axis} axis; not implemented!")]
    UnsupportedSegment {
        from: GridPoint,
        to: GridPoint,
        axis: EdgeAxis,
    },
    #[error("Invalid Edge description: {0}")]
    Format(String),
}
