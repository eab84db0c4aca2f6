//! Proptest strategies for kinematic quantities.
use crate::element::Hex8Element;
use ::proptest::prelude::*;
use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

pub fn vector3() -> impl Strategy<Value = Vector3<f64>> {
    // Pick a reasonably small range to pick coordinates from,
    // otherwise we can easily get floating point numbers that are
    // so ridiculously large as to break anything we might want to do with them
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range].prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

pub fn unit_vector3() -> impl Strategy<Value = Vector3<f64>> {
    vector3()
        .prop_filter("vector must not be close to zero", |v| v.norm() > 1e-3)
        .prop_map(|v| v.normalize())
}

/// Proper rotation matrices.
pub fn rotation3() -> impl Strategy<Value = Matrix3<f64>> {
    (unit_vector3(), -std::f64::consts::PI..std::f64::consts::PI)
        .prop_map(|(axis, angle)| *Rotation3::from_axis_angle(&Unit::new_unchecked(axis), angle).matrix())
}

/// Deformation gradients `F = R U` with a rotation `R` and a symmetric positive definite
/// stretch `U` whose principal stretches lie in `[min_stretch, max_stretch]`.
///
/// `min_stretch` must be positive.
pub fn deformation_gradient(min_stretch: f64, max_stretch: f64) -> impl Strategy<Value = Matrix3<f64>> {
    let stretches = [
        min_stretch..=max_stretch,
        min_stretch..=max_stretch,
        min_stretch..=max_stretch,
    ];
    (rotation3(), rotation3(), stretches).prop_map(|(r, q, [l1, l2, l3])| {
        let u = q * Matrix3::from_diagonal(&Vector3::new(l1, l2, l3)) * q.transpose();
        r * u
    })
}

/// Deformation gradients with moderate stretches, as met in typical Newton iterations.
pub fn moderate_deformation_gradient() -> impl Strategy<Value = Matrix3<f64>> {
    deformation_gradient(0.7, 1.4)
}

/// Hexahedra obtained by perturbing the vertices of the unit cube by at most `max_perturbation`
/// in each coordinate.
///
/// With `max_perturbation < 0.1` every column of the reference Jacobian stays diagonally
/// dominant, so the element is never inverted.
pub fn perturbed_unit_cube(max_perturbation: f64) -> impl Strategy<Value = [Point3<f64>; 8]> {
    let range = -max_perturbation..=max_perturbation;
    let perturbation = [range.clone(), range.clone(), range].prop_map(|[x, y, z]| Vector3::new(x, y, z));
    ::proptest::array::uniform8(perturbation).prop_map(|perturbations| {
        let mut vertices = unit_cube_vertices();
        for (v, p) in vertices.iter_mut().zip(perturbations) {
            *v += p;
        }
        vertices
    })
}

/// Vertices of `[0, 1]^3` in reference element order.
pub fn unit_cube_vertices() -> [Point3<f64>; 8] {
    let reference = *Hex8Element::<f64>::reference().vertices();
    reference.map(|v| Point3::from((v.coords + Vector3::repeat(1.0)) * 0.5))
}
