//! Quadrature rules on the reference hexahedron `[-1, 1]^3`.
use crate::Real;
use itertools::iproduct;
use nalgebra::Point3;
use numeric_literals::replace_float_literals;

/// Weights and points of a quadrature rule.
pub type QuadraturePair3d<T> = (Vec<T>, Vec<Point3<T>>);

/// The two-point Gauss-Legendre rule on `[-1, 1]`, exact for cubic polynomials.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn gauss_legendre_2<T: Real>() -> ([T; 2], [T; 2]) {
    let a = (1.0 / 3.0).sqrt();
    ([1.0, 1.0], [-a, a])
}

/// The 2x2x2 tensor-product Gauss rule on the reference hexahedron.
///
/// The rule integrates polynomials of degree at most three in each coordinate exactly. This
/// covers the Jacobian determinant and the cofactor-weighted shape function gradients of any
/// trilinear hexahedron, so volumes and volume-averaged gradients computed with it are exact.
pub fn hexahedron_gauss_2x2x2<T: Real>() -> QuadraturePair3d<T> {
    let (weights_1d, points_1d) = gauss_legendre_2::<T>();
    let mut weights = Vec::with_capacity(8);
    let mut points = Vec::with_capacity(8);
    for (k, j, i) in iproduct!(0..2, 0..2, 0..2) {
        weights.push(weights_1d[i] * weights_1d[j] * weights_1d[k]);
        points.push(Point3::new(points_1d[i], points_1d[j], points_1d[k]));
    }
    (weights, points)
}
