use super::{
    arruda_boyce, assert_energy_consistent_with_stress, assert_tangent_matches_finite_differences, deformation_gradient,
    sheared_deformation_gradient,
};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq, prop_assert_matrix_eq};
use proptest::prelude::*;
use udgfem::constitutive::{ConstitutiveModel, UncoupledMaterial};
use udgfem::error::ParameterError;
use udgfem::material_point::MaterialPoint;
use udgfem::nalgebra::{Matrix3, Vector3};
use udgfem::proptest::{moderate_deformation_gradient, rotation3};
use udgfem_solid::materials::{ArrudaBoyce, ArrudaBoyceParameters};

#[test]
fn stress_and_energy_vanish_in_reference_state() {
    let material = arruda_boyce(5.0);
    let point = MaterialPoint::new(Matrix3::identity()).unwrap();

    let stress = material.stress(&point).unwrap();
    assert_matrix_eq!(stress, Matrix3::zeros(), comp = abs, tol = 1e-14);
    let energy = material.strain_energy_density(&point).unwrap().unwrap();
    assert_scalar_eq!(energy, 0.0, comp = abs, tol = 1e-14);
}

#[test]
fn deviatoric_stress_vanishes_under_pure_dilation() {
    let material = arruda_boyce(5.0);
    let point = MaterialPoint::new(Matrix3::identity() * 1.2).unwrap();

    let deviatoric = material.deviatoric_stress(&point).unwrap();
    assert_matrix_eq!(deviatoric, Matrix3::zeros(), comp = abs, tol = 1e-14);

    // Only the volumetric pressure k ln(J) / J remains
    let j = 1.2f64.powi(3);
    let stress = material.stress(&point).unwrap();
    assert_matrix_eq!(stress, Matrix3::identity() * (5.0 * j.ln() / j), comp = abs, tol = 1e-12);
}

#[test]
fn deviatoric_stress_is_trace_free() {
    let material = arruda_boyce(5.0);
    let point = MaterialPoint::new(sheared_deformation_gradient()).unwrap();
    let deviatoric = material.deviatoric_stress(&point).unwrap();
    assert_scalar_eq!(deviatoric.trace(), 0.0, comp = abs, tol = 1e-14);
}

#[test]
fn tangent_in_reference_state_is_isotropic_linear_elasticity() {
    let k = 5.0;
    let material = arruda_boyce(k);
    let c = material
        .tangent(&MaterialPoint::new(Matrix3::identity()).unwrap())
        .unwrap();

    let shear = c.get(0, 1, 0, 1);
    assert_scalar_eq!(c.get(1, 2, 1, 2), shear, comp = abs, tol = 1e-14);
    assert_scalar_eq!(c.get(0, 2, 0, 2), shear, comp = abs, tol = 1e-14);
    assert_scalar_eq!(c.get(0, 0, 0, 0) - c.get(0, 0, 1, 1), 2.0 * shear, comp = abs, tol = 1e-13);

    let bulk = (c.get(0, 0, 0, 0) + 2.0 * c.get(0, 0, 1, 1)) / 3.0;
    assert_scalar_eq!(bulk, k, comp = abs, tol = 1e-13);
}

#[test]
fn initial_shear_modulus_approaches_mu_for_many_chain_links() {
    let material = ArrudaBoyce::new(ArrudaBoyceParameters {
        mu: 2.5,
        N: 1e8,
        k: 0.0,
    })
    .unwrap();
    let c = material
        .tangent(&MaterialPoint::new(Matrix3::identity()).unwrap())
        .unwrap();
    assert_scalar_eq!(c.get(0, 1, 0, 1), 2.5, comp = abs, tol = 1e-6);
}

#[test]
fn incompressible_uniaxial_stress_difference_matches_reference() {
    // For an incompressible material the axial stress under uniaxial tension is the difference
    // of the deviatoric principal stresses
    let material = arruda_boyce(0.0);
    let lateral = 1.0 / 1.2f64.sqrt();
    let f = Matrix3::from_diagonal(&Vector3::new(1.2, lateral, lateral));
    let stress = material.stress(&MaterialPoint::new(f).unwrap()).unwrap();

    assert_scalar_eq!(stress[(0, 0)] - stress[(1, 1)], 0.6948938781846496, comp = abs, tol = 1e-12);
    assert_scalar_eq!(stress[(1, 1)], stress[(2, 2)], comp = abs, tol = 1e-14);
}

#[test]
fn tangent_matches_finite_differences() {
    let material = arruda_boyce(5.0);
    for f in [deformation_gradient(), sheared_deformation_gradient()] {
        let point = MaterialPoint::new(f).unwrap();
        assert_tangent_matches_finite_differences(&material, &point, 1e-7);
    }
}

#[test]
fn deviatoric_response_without_bulk_modulus_matches_finite_differences() {
    let material = arruda_boyce(0.0);
    let point = MaterialPoint::new(deformation_gradient()).unwrap();
    assert_tangent_matches_finite_differences(&material, &point, 1e-7);
}

#[test]
fn energy_is_consistent_with_stress() {
    let material = arruda_boyce(5.0);
    for f in [deformation_gradient(), sheared_deformation_gradient()] {
        let point = MaterialPoint::new(f).unwrap();
        assert_energy_consistent_with_stress(&material, &point, 1e-7);
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let valid = ArrudaBoyceParameters { mu: 1.0, N: 10.0, k: 1.0 };

    let error = ArrudaBoyce::new(ArrudaBoyceParameters { mu: 0.0, ..valid }).unwrap_err();
    assert!(matches!(error, ParameterError::OutOfRange { name: "mu", .. }));

    let error = ArrudaBoyce::new(ArrudaBoyceParameters { N: -1.0, ..valid }).unwrap_err();
    assert!(matches!(error, ParameterError::OutOfRange { name: "N", .. }));

    let error = ArrudaBoyce::new(ArrudaBoyceParameters { k: f64::NAN, ..valid }).unwrap_err();
    assert!(matches!(error, ParameterError::OutOfRange { name: "k", .. }));
}

proptest! {
    #[test]
    fn tangent_matches_finite_differences_for_arbitrary_deformations(f in moderate_deformation_gradient()) {
        let material = arruda_boyce(5.0);
        let point = MaterialPoint::new(f).unwrap();
        let tangent = material.tangent(&point).unwrap().to_voigt_matrix();
        let approx = udgfem::calculus::approximate_spatial_tangent(&material, &point, 1e-6).unwrap();
        prop_assert_matrix_eq!(tangent, approx, comp = abs, tol = 1e-6 * tangent.amax().max(1.0));
    }

    #[test]
    fn response_is_frame_indifferent(f in moderate_deformation_gradient(), q in rotation3()) {
        let material = arruda_boyce(5.0);
        let point = MaterialPoint::new(f).unwrap();
        let rotated_point = MaterialPoint::new(q * f).unwrap();

        let stress = material.stress(&point).unwrap();
        let rotated_stress = material.stress(&rotated_point).unwrap();
        prop_assert_matrix_eq!(rotated_stress, q * stress * q.transpose(), comp = abs, tol = 1e-10);

        let tangent = material.tangent(&point).unwrap().rotated(&q);
        let rotated_tangent = material.tangent(&rotated_point).unwrap();
        prop_assert_matrix_eq!(
            rotated_tangent.to_voigt_matrix(),
            tangent.to_voigt_matrix(),
            comp = abs,
            tol = 1e-9
        );
    }
}
