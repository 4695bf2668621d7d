//! Closed-form integration of second-order (6-node) triangle shape functions
//!
//! Shape functions are written in area coordinates `L0, L1, L2`:
//!
//! ```text
//!     N0 = L0(2L0 - 1)   N3 = 4L0L1          2
//!     N1 = L1(2L1 - 1)   N4 = 4L1L2          | \
//!     N2 = L2(2L2 - 1)   N5 = 4L2L0          5   4
//!                                            |     \
//!                                            0 - 3 - 1
//! ```
//!
//! Every integrand is a polynomial in the `L_k`, integrated exactly with
//! `∫ L0^a L1^b L2^c dA = 2A · a! b! c! / (a + b + c + 2)!`

use crate::domain::mesh::{Point, MIDPOINT_VERTICES, NODES_PER_ELEMENT};
use crate::fem_problem::PeriodicAxis;

use nalgebra::Matrix3;
use smallvec::SmallVec;

/// A dense 6x6 element matrix indexed `[row][col]`
pub type LocalMatrix = [[f64; NODES_PER_ELEMENT]; NODES_PER_ELEMENT];

/// Standard quadratic-triangle mass matrix `∫NiNj dA`, in units of `A/180`
const MASS_TEMPLATE: LocalMatrix = [
    [6.0, -1.0, -1.0, 0.0, -4.0, 0.0],
    [-1.0, 6.0, -1.0, 0.0, 0.0, -4.0],
    [-1.0, -1.0, 6.0, -4.0, 0.0, 0.0],
    [0.0, 0.0, -4.0, 32.0, 16.0, 16.0],
    [-4.0, 0.0, 0.0, 16.0, 32.0, 16.0],
    [0.0, -4.0, 0.0, 16.0, 16.0, 32.0],
];

/// Signed area of a triangle: positive for counter-clockwise vertices
pub fn signed_area(vertices: &[Point; 3]) -> f64 {
    let [p0, p1, p2] = vertices;
    0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y))
}

/// Area and area-coordinate gradients of a (counter-clockwise) triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleGeometry {
    pub area: f64,
    /// `dL_k/dx`
    pub dl_dx: [f64; 3],
    /// `dL_k/dy`
    pub dl_dy: [f64; 3],
}

impl TriangleGeometry {
    pub fn new(vertices: &[Point; 3]) -> Self {
        let area = signed_area(vertices);
        assert!(
            area > 0.0,
            "Triangle area must be positive ({}); cannot compute element geometry!",
            area
        );

        let mut dl_dx = [0.0; 3];
        let mut dl_dy = [0.0; 3];
        for k in 0..3 {
            let a = &vertices[(k + 1) % 3];
            let b = &vertices[(k + 2) % 3];
            dl_dx[k] = (a.y - b.y) / (2.0 * area);
            dl_dy[k] = (b.x - a.x) / (2.0 * area);
        }

        Self { area, dl_dx, dl_dy }
    }
}

/// Exact integral of `L0^a L1^b L2^c` over a triangle of the given area
pub fn area_moment([a, b, c]: [u32; 3], area: f64) -> f64 {
    2.0 * area * (factorial(a) * factorial(b) * factorial(c)) / factorial(a + b + c + 2)
}

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

/// A polynomial in area coordinates: the sum of `coef · L0^a L1^b L2^c` terms
#[derive(Debug, Clone, Default)]
struct AreaPolynomial {
    terms: SmallVec<[(f64, [u32; 3]); 16]>,
}

impl AreaPolynomial {
    fn term(coef: f64, exponents: [u32; 3]) -> Self {
        let mut poly = Self::default();
        poly.push(coef, exponents);
        poly
    }

    fn push(&mut self, coef: f64, exponents: [u32; 3]) {
        if coef != 0.0 {
            self.terms.push((coef, exponents));
        }
    }

    /// The quadratic shape function of local node `i`
    fn shape_function(i: usize) -> Self {
        if i < 3 {
            let mut square = [0; 3];
            square[i] = 2;
            let mut linear = [0; 3];
            linear[i] = 1;

            let mut poly = Self::term(2.0, square);
            poly.push(-1.0, linear);
            poly
        } else {
            let [a, b] = MIDPOINT_VERTICES[i - 3];
            let mut exponents = [0; 3];
            exponents[a] = 1;
            exponents[b] = 1;
            Self::term(4.0, exponents)
        }
    }

    /// Gradient component of shape function `i`, given `dL_k/ds` for one direction `s`.
    ///
    /// The result is linear in the area coordinates.
    fn shape_derivative(i: usize, dl: &[f64; 3]) -> Self {
        let mut poly = Self::default();
        if i < 3 {
            // d/ds L(2L - 1) = (4L - 1) dL/ds
            let mut linear = [0; 3];
            linear[i] = 1;
            poly.push(4.0 * dl[i], linear);
            poly.push(-dl[i], [0; 3]);
        } else {
            // d/ds 4LaLb = 4(Lb dLa/ds + La dLb/ds)
            let [a, b] = MIDPOINT_VERTICES[i - 3];
            let mut lb = [0; 3];
            lb[b] = 1;
            let mut la = [0; 3];
            la[a] = 1;
            poly.push(4.0 * dl[a], lb);
            poly.push(4.0 * dl[b], la);
        }
        poly
    }

    fn product(&self, other: &Self) -> Self {
        let mut poly = Self::default();
        for (ca, ea) in self.terms.iter() {
            for (cb, eb) in other.terms.iter() {
                poly.push(ca * cb, [ea[0] + eb[0], ea[1] + eb[1], ea[2] + eb[2]]);
            }
        }
        poly
    }

    fn integrate(&self, area: f64) -> f64 {
        self.terms
            .iter()
            .map(|(coef, exponents)| coef * area_moment(*exponents, area))
            .sum()
    }
}

/// The direction-separated integrals every element matrix is built from
#[derive(Debug, Clone, PartialEq)]
pub struct ElementIntegrals {
    /// `∫ ∂Ni/∂x ∂Nj/∂x dA`
    pub kxx: LocalMatrix,
    /// `∫ ∂Ni/∂y ∂Nj/∂y dA`
    pub kyy: LocalMatrix,
    /// `∫ Ni Nj dA`
    pub mass: LocalMatrix,
    /// `∫ (∂Ni/∂x) Nj dA`
    pub lx: LocalMatrix,
    /// `∫ (∂Ni/∂y) Nj dA`
    pub ly: LocalMatrix,
}

impl ElementIntegrals {
    pub fn new(geometry: &TriangleGeometry) -> Self {
        let area = geometry.area;
        let shape: Vec<AreaPolynomial> = (0..NODES_PER_ELEMENT)
            .map(AreaPolynomial::shape_function)
            .collect();
        let dx: Vec<AreaPolynomial> = (0..NODES_PER_ELEMENT)
            .map(|i| AreaPolynomial::shape_derivative(i, &geometry.dl_dx))
            .collect();
        let dy: Vec<AreaPolynomial> = (0..NODES_PER_ELEMENT)
            .map(|i| AreaPolynomial::shape_derivative(i, &geometry.dl_dy))
            .collect();

        let mut ints = Self {
            kxx: [[0.0; NODES_PER_ELEMENT]; NODES_PER_ELEMENT],
            kyy: [[0.0; NODES_PER_ELEMENT]; NODES_PER_ELEMENT],
            mass: mass_matrix(area),
            lx: [[0.0; NODES_PER_ELEMENT]; NODES_PER_ELEMENT],
            ly: [[0.0; NODES_PER_ELEMENT]; NODES_PER_ELEMENT],
        };

        for i in 0..NODES_PER_ELEMENT {
            for j in 0..NODES_PER_ELEMENT {
                if j >= i {
                    ints.kxx[i][j] = dx[i].product(&dx[j]).integrate(area);
                    ints.kyy[i][j] = dy[i].product(&dy[j]).integrate(area);
                    ints.kxx[j][i] = ints.kxx[i][j];
                    ints.kyy[j][i] = ints.kyy[i][j];
                }
                ints.lx[i][j] = dx[i].product(&shape[j]).integrate(area);
                ints.ly[i][j] = dy[i].product(&shape[j]).integrate(area);
            }
        }

        ints
    }

    /// First-moment matrix along the periodic axis
    pub fn first_moment(&self, axis: PeriodicAxis) -> &LocalMatrix {
        match axis {
            PeriodicAxis::X => &self.lx,
            PeriodicAxis::Y => &self.ly,
        }
    }
}

/// `∫NiNj dA` from the standard template
pub fn mass_matrix(area: f64) -> LocalMatrix {
    MASS_TEMPLATE.map(|row| row.map(|t| t * area / 180.0))
}

/// Ordinary Helmholtz element matrix:
/// `P_yy·∫∂Ni/∂y∂Nj/∂y + P_xx·∫∂Ni/∂x∂Nj/∂x − k0²·Q_zz·∫NiNj`
pub fn helmholtz_matrix(
    ints: &ElementIntegrals,
    p: &Matrix3<f64>,
    q: &Matrix3<f64>,
    k0: f64,
) -> LocalMatrix {
    let (p_xx, p_yy, q_zz) = (p[(0, 0)], p[(1, 1)], q[(2, 2)]);
    let k0_sq = k0 * k0;

    let mut emat = [[0.0; NODES_PER_ELEMENT]; NODES_PER_ELEMENT];
    for i in 0..NODES_PER_ELEMENT {
        for j in 0..NODES_PER_ELEMENT {
            emat[i][j] = p_yy * ints.kyy[i][j] + p_xx * ints.kxx[i][j]
                - k0_sq * q_zz * ints.mass[i][j];
        }
    }
    emat
}

/// Element contributions to the periodic-cell eigenproblem `(K − jβC − β²M)·u = 0`
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicElementMatrices {
    /// `k0²·Q_zz·M − P_xx·Kxx − P_yy·Kyy`
    pub k: LocalMatrix,
    /// Antisymmetric damping matrix (slowly-varying-envelope formulation only)
    pub c: Option<LocalMatrix>,
    /// Mass matrix (slowly-varying-envelope formulation only)
    pub m: Option<LocalMatrix>,
}

pub fn periodic_matrices(
    ints: &ElementIntegrals,
    p: &Matrix3<f64>,
    q: &Matrix3<f64>,
    k0: f64,
    axis: PeriodicAxis,
    svea: bool,
) -> PeriodicElementMatrices {
    let helmholtz = helmholtz_matrix(ints, p, q, k0);
    let k = helmholtz.map(|row| row.map(|v| -v));

    if !svea {
        return PeriodicElementMatrices { k, c: None, m: None };
    }

    let p_yy = p[(1, 1)];
    let l = ints.first_moment(axis);
    let sign = match axis {
        PeriodicAxis::X => 1.0,
        PeriodicAxis::Y => -1.0,
    };

    let mut c = [[0.0; NODES_PER_ELEMENT]; NODES_PER_ELEMENT];
    for i in 0..NODES_PER_ELEMENT {
        for j in 0..NODES_PER_ELEMENT {
            c[i][j] = sign * p_yy * (l[i][j] - l[j][i]);
        }
    }

    PeriodicElementMatrices {
        k,
        c: Some(c),
        m: Some(ints.mass.map(|row| row.map(|v| p_yy * v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-13;

    fn unit_right_triangle() -> TriangleGeometry {
        TriangleGeometry::new(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ])
    }

    fn assert_matrix_eq(actual: &LocalMatrix, expected: &LocalMatrix) {
        for i in 0..NODES_PER_ELEMENT {
            for j in 0..NODES_PER_ELEMENT {
                assert_abs_diff_eq!(actual[i][j], expected[i][j], epsilon = TOL);
            }
        }
    }

    #[test]
    fn geometry() {
        let geom = unit_right_triangle();

        assert_abs_diff_eq!(geom.area, 0.5);
        assert_eq!(geom.dl_dx, [-1.0, 1.0, 0.0]);
        assert_eq!(geom.dl_dy, [-1.0, 0.0, 1.0]);
    }

    #[test]
    #[should_panic]
    fn clockwise_triangle() {
        let _ = TriangleGeometry::new(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
        ]);
    }

    #[test]
    fn moments() {
        assert_abs_diff_eq!(area_moment([0, 0, 0], 0.5), 0.5, epsilon = TOL);
        assert_abs_diff_eq!(area_moment([1, 0, 0], 3.0), 1.0, epsilon = TOL);
        assert_abs_diff_eq!(area_moment([1, 1, 0], 12.0), 1.0, epsilon = TOL);
        assert_abs_diff_eq!(area_moment([2, 0, 0], 6.0), 1.0, epsilon = TOL);
    }

    #[test]
    fn mass_template_matches_direct_integration() {
        let geom = TriangleGeometry::new(&[
            Point::new(0.2, -0.1),
            Point::new(1.7, 0.4),
            Point::new(0.5, 1.3),
        ]);
        let ints = ElementIntegrals::new(&geom);

        for i in 0..NODES_PER_ELEMENT {
            for j in 0..NODES_PER_ELEMENT {
                let direct = AreaPolynomial::shape_function(i)
                    .product(&AreaPolynomial::shape_function(j))
                    .integrate(geom.area);
                assert_abs_diff_eq!(ints.mass[i][j], direct, epsilon = TOL);
            }
        }
    }

    #[test]
    fn directional_stiffness_fixture() {
        let ints = ElementIntegrals::new(&unit_right_triangle());
        let (s, t, z) = (1.0 / 6.0, 2.0 / 3.0, 4.0 / 3.0);

        assert_matrix_eq(
            &ints.kxx,
            &[
                [0.5, s, 0.0, -t, 0.0, 0.0],
                [s, 0.5, 0.0, -t, 0.0, 0.0],
                [0.0; 6],
                [-t, -t, 0.0, z, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0, z, -z],
                [0.0, 0.0, 0.0, 0.0, -z, z],
            ],
        );
        assert_matrix_eq(
            &ints.kyy,
            &[
                [0.5, 0.0, s, 0.0, 0.0, -t],
                [0.0; 6],
                [s, 0.0, 0.5, 0.0, 0.0, -t],
                [0.0, 0.0, 0.0, z, -z, 0.0],
                [0.0, 0.0, 0.0, -z, z, 0.0],
                [-t, 0.0, -t, 0.0, 0.0, z],
            ],
        );
    }

    #[test]
    fn helmholtz_fixture() {
        let ints = ElementIntegrals::new(&unit_right_triangle());
        let identity = Matrix3::identity();
        let k0 = 1.0;

        let emat = helmholtz_matrix(&ints, &identity, &identity, k0);

        let (s, t, e, f) = (1.0 / 6.0, 2.0 / 3.0, 8.0 / 3.0, 4.0 / 3.0);
        let stiffness: LocalMatrix = [
            [1.0, s, s, -t, 0.0, -t],
            [s, 0.5, 0.0, -t, 0.0, 0.0],
            [s, 0.0, 0.5, 0.0, 0.0, -t],
            [-t, -t, 0.0, e, -f, 0.0],
            [0.0, 0.0, 0.0, -f, e, -f],
            [-t, 0.0, -t, 0.0, -f, e],
        ];
        let expected = {
            let mut expected = stiffness;
            for i in 0..NODES_PER_ELEMENT {
                for j in 0..NODES_PER_ELEMENT {
                    expected[i][j] -= MASS_TEMPLATE[i][j] / 360.0;
                }
            }
            expected
        };

        assert_matrix_eq(&emat, &expected);
    }

    #[test]
    fn stiffness_rows_sum_to_zero() {
        let geom = TriangleGeometry::new(&[
            Point::new(-0.3, 0.1),
            Point::new(0.9, -0.2),
            Point::new(0.4, 0.8),
        ]);
        let ints = ElementIntegrals::new(&geom);
        let p = Matrix3::new(2.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.0);

        let emat = helmholtz_matrix(&ints, &p, &Matrix3::identity(), 0.0);

        for row in emat.iter() {
            assert_abs_diff_eq!(row.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn element_matrix_is_symmetric() {
        let geom = TriangleGeometry::new(&[
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.5),
            Point::new(0.7, 1.1),
        ]);
        let ints = ElementIntegrals::new(&geom);
        let emat = helmholtz_matrix(&ints, &Matrix3::identity(), &(Matrix3::identity() * 3.0), 2.5);

        for i in 0..NODES_PER_ELEMENT {
            for j in 0..NODES_PER_ELEMENT {
                assert_abs_diff_eq!(emat[i][j], emat[j][i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn stiffness_is_scale_invariant() {
        let small = ElementIntegrals::new(&unit_right_triangle());
        let large = ElementIntegrals::new(&TriangleGeometry::new(&[
            Point::new(5.0, 5.0),
            Point::new(8.0, 5.0),
            Point::new(5.0, 8.0),
        ]));

        assert_matrix_eq(&large.kxx, &small.kxx);
        assert_matrix_eq(&large.kyy, &small.kyy);
        for i in 0..NODES_PER_ELEMENT {
            for j in 0..NODES_PER_ELEMENT {
                assert_abs_diff_eq!(large.mass[i][j], 9.0 * small.mass[i][j], epsilon = 1e-12);
                assert_abs_diff_eq!(large.lx[i][j], 3.0 * small.lx[i][j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn first_moment_fixture() {
        let ints = ElementIntegrals::new(&unit_right_triangle());
        let (a, b, c, d, e) = (1.0 / 15.0, 1.0 / 30.0, 1.0 / 10.0, 2.0 / 15.0, 4.0 / 15.0);

        assert_matrix_eq(
            &ints.lx,
            &[
                [-a, b, b, -c, b, -c],
                [-b, a, -b, c, c, -b],
                [0.0; 6],
                [c, -c, 0.0, 0.0, -d, d],
                [-b, -b, a, d, e, e],
                [b, b, -a, -d, -e, -e],
            ],
        );
    }

    #[test]
    fn first_moment_rows_integrate_the_gradient() {
        let geom = TriangleGeometry::new(&[
            Point::new(0.1, 0.0),
            Point::new(1.3, 0.2),
            Point::new(0.4, 0.9),
        ]);
        let ints = ElementIntegrals::new(&geom);

        // Σ_j Nj = 1, so each row reduces to ∫∂Ni/∂y
        for i in 0..NODES_PER_ELEMENT {
            let gradient = AreaPolynomial::shape_derivative(i, &geom.dl_dy).integrate(geom.area);
            assert_abs_diff_eq!(ints.ly[i].iter().sum::<f64>(), gradient, epsilon = 1e-12);
        }
    }

    #[test]
    fn periodic_without_svea() {
        let ints = ElementIntegrals::new(&unit_right_triangle());
        let identity = Matrix3::identity();

        let periodic = periodic_matrices(&ints, &identity, &identity, 1.3, PeriodicAxis::X, false);
        let ordinary = helmholtz_matrix(&ints, &identity, &identity, 1.3);

        assert!(periodic.c.is_none());
        assert!(periodic.m.is_none());
        assert_matrix_eq(&periodic.k, &ordinary.map(|row| row.map(|v| -v)));
    }

    #[test]
    fn periodic_with_svea() {
        let ints = ElementIntegrals::new(&unit_right_triangle());
        let p = Matrix3::identity() * 2.0;
        let q = Matrix3::identity();

        let along_x = periodic_matrices(&ints, &p, &q, 1.0, PeriodicAxis::X, true);
        let along_y = periodic_matrices(&ints, &p, &q, 1.0, PeriodicAxis::Y, true);

        let c = along_x.c.unwrap();
        let m = along_x.m.unwrap();
        for i in 0..NODES_PER_ELEMENT {
            for j in 0..NODES_PER_ELEMENT {
                assert_abs_diff_eq!(c[i][j], -c[j][i], epsilon = TOL);
                assert_abs_diff_eq!(c[i][j], 2.0 * (ints.lx[i][j] - ints.lx[j][i]), epsilon = TOL);
                assert_abs_diff_eq!(m[i][j], 2.0 * ints.mass[i][j], epsilon = TOL);
            }
        }

        let c_y = along_y.c.unwrap();
        assert_abs_diff_eq!(c_y[0][2], -2.0 * (ints.ly[0][2] - ints.ly[2][0]), epsilon = TOL);
    }
}
