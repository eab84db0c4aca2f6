use super::{affine_nodes, arruda_boyce, deformation_gradient, unit_cube_nodes};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq, prop_assert_matrix_eq};
use proptest::prelude::*;
use udgfem::calculus::approximate_jacobian_fd;
use udgfem::constitutive::ConstitutiveModel;
use udgfem::element::udg::{
    hourglass_shape_vectors, Configuration, ElementVector, UdgHexKernel, UdgHexNodes, UdgSettings,
};
use udgfem::element::{hex_volume, HOURGLASS_BASE_VECTORS};
use udgfem::error::{ElementError, MaterialError};
use udgfem::material_point::{EvaluationContext, PointHistory};
use udgfem::nalgebra::{DMatrix, DVector, Matrix3, Point3, Rotation3, SMatrix, Vector3};
use udgfem::proptest::{perturbed_unit_cube, rotation3, unit_cube_vertices};
use udgfem::tensor::SymmetricTensor4;
use udgfem_solid::fiber::FiberField;
use udgfem_solid::materials::{ActiveFiberParameters, ActiveFiberStress};

const NO_HOURGLASS: UdgSettings<f64> = UdgSettings { hourglass: 0.0 };

/// A unit cube with some vertices moved, so that it is no longer a parallelepiped.
fn distorted_cube() -> [Point3<f64>; 8] {
    let mut vertices = unit_cube_vertices();
    vertices[1] += Vector3::new(0.05, -0.03, 0.02);
    vertices[6] += Vector3::new(-0.04, 0.06, 0.03);
    vertices[7] += Vector3::new(0.02, 0.01, -0.05);
    vertices
}

fn displaced_nodes(reference: [Point3<f64>; 8], u: &DVector<f64>) -> UdgHexNodes<f64> {
    let mut current = reference;
    for (a, x) in current.iter_mut().enumerate() {
        *x += u.fixed_rows::<3>(3 * a).into_owned();
    }
    UdgHexNodes::new(reference, current)
}

/// A smooth, non-affine displacement of the distorted cube.
fn deformed_nodes() -> UdgHexNodes<f64> {
    let reference = distorted_cube();
    let current = reference.map(|x| {
        let u = Vector3::new(0.1 * x.x * x.y, -0.05 * x.z * x.x + 0.02 * x.y, 0.08 * x.y * x.z - 0.03 * x.x);
        x + u
    });
    UdgHexNodes::new(reference, current)
}

fn hourglass_mode(alpha: usize, direction: usize, scale: f64) -> ElementVector<f64> {
    let mut u = ElementVector::zeros();
    for a in 0..8 {
        u[3 * a + direction] = scale * HOURGLASS_BASE_VECTORS[alpha][a];
    }
    u
}

fn active_fiber(fiber: FiberField<f64>) -> ActiveFiberStress<f64> {
    ActiveFiberStress::new(ActiveFiberParameters {
        smax: 2.0,
        activation: 1.0,
        stl: None,
        stv: None,
        fiber,
    })
    .unwrap()
}

#[test]
fn settings_are_validated() {
    assert_eq!(UdgSettings::<f64>::default().hourglass, 1.0);
    assert!(NO_HOURGLASS.validate().is_ok());
    assert!(UdgSettings { hourglass: -0.1 }.validate().is_err());
    assert!(UdgSettings { hourglass: f64::NAN }.validate().is_err());
}

#[test]
fn nodes_report_displacements_by_node() {
    let nodes = affine_nodes(unit_cube_vertices(), &Matrix3::identity(), &Vector3::new(1.0, 2.0, 3.0));
    let u = nodes.displacements();
    for a in 0..8 {
        assert_matrix_eq!(u.fixed_rows::<3>(3 * a), Vector3::new(1.0, 2.0, 3.0), comp = abs, tol = 1e-15);
    }
    assert_eq!(nodes.vertices(Configuration::Reference), &unit_cube_vertices());
}

#[test]
fn affine_motion_gives_its_deformation_gradient() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let f = deformation_gradient();
    let nodes = affine_nodes(distorted_cube(), &f, &Vector3::new(0.3, -0.2, 0.1));
    assert_matrix_eq!(kernel.average_deformation_gradient(&nodes).unwrap(), f, comp = abs, tol = 1e-13);

    let history = PointHistory { fiber_stretch: Some(1.5) };
    let point = kernel.material_point(&unit_cube_nodes(), &history).unwrap();
    assert_matrix_eq!(point.position().coords, Vector3::repeat(0.5), comp = abs, tol = 1e-15);
    assert_eq!(point.history(), &history);
}

#[test]
fn rigid_motion_produces_no_force() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let rotation = *Rotation3::from_euler_angles(0.3, -0.7, 1.1).matrix();
    let nodes = affine_nodes(distorted_cube(), &rotation, &Vector3::new(1.0, -2.0, 0.5));
    let force = kernel.internal_force(&nodes, &PointHistory::default()).unwrap();
    assert_matrix_eq!(force, ElementVector::zeros(), comp = abs, tol = 1e-12);
}

#[test]
fn internal_force_is_gradient_of_strain_energy() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, NO_HOURGLASS);
    let reference = distorted_cube();
    let history = PointHistory::default();
    let energy = |u: &DVector<f64>, e: &mut DVector<f64>| {
        let nodes = displaced_nodes(reference, u);
        e[0] = kernel.strain_energy(&nodes, &history).unwrap().unwrap();
    };

    let affine = affine_nodes(reference, &deformation_gradient(), &Vector3::zeros());
    for nodes in [affine, deformed_nodes()] {
        let u = DVector::from_column_slice(nodes.displacements().as_slice());
        let gradient = approximate_jacobian_fd(1, energy, &u, 1e-6);
        let force = kernel.internal_force(&nodes, &history).unwrap();
        assert_matrix_eq!(force.transpose(), gradient, comp = abs, tol = 1e-7);
    }
}

#[test]
fn strain_energy_is_reference_volume_times_density() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let nodes = affine_nodes(distorted_cube(), &deformation_gradient(), &Vector3::zeros());
    let point = kernel.material_point(&nodes, &PointHistory::default()).unwrap();

    let energy = kernel.strain_energy(&nodes, &PointHistory::default()).unwrap().unwrap();
    let expected = hex_volume(&distorted_cube()) * material.strain_energy_density(&point).unwrap().unwrap();
    assert_scalar_eq!(energy, expected, comp = abs, tol = 1e-14);

    let active = active_fiber(FiberField::uniform(Vector3::x()).unwrap());
    let kernel = UdgHexKernel::new(&active, UdgSettings::default());
    assert!(kernel.strain_energy(&nodes, &PointHistory::default()).is_none());
}

#[test]
fn stiffness_matches_finite_differences_in_rest_state() {
    let material = arruda_boyce(5.0);
    let reference = distorted_cube();
    let history = PointHistory::default();
    for settings in [NO_HOURGLASS, UdgSettings { hourglass: 1.0 }] {
        let kernel = UdgHexKernel::new(&material, settings);
        let force = |u: &DVector<f64>, f: &mut DVector<f64>| {
            let nodes = displaced_nodes(reference, u);
            f.copy_from(&kernel.internal_force(&nodes, &history).unwrap());
        };
        let stiffness_fd = approximate_jacobian_fd(24, force, &DVector::zeros(24), 1e-6);
        let stiffness = kernel.stiffness(&UdgHexNodes::undeformed(reference), &history).unwrap();
        assert_matrix_eq!(stiffness, stiffness_fd, comp = abs, tol = 1e-7);
    }
}

#[test]
fn stiffness_matches_finite_differences_in_deformed_state() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, NO_HOURGLASS);
    let reference = distorted_cube();
    let history = PointHistory::default();
    let force = |u: &DVector<f64>, f: &mut DVector<f64>| {
        let nodes = displaced_nodes(reference, u);
        f.copy_from(&kernel.internal_force(&nodes, &history).unwrap());
    };

    let nodes = deformed_nodes();
    let u = DVector::from_column_slice(nodes.displacements().as_slice());
    let stiffness_fd = approximate_jacobian_fd(24, force, &u, 1e-6);
    let stiffness = kernel.stiffness(&nodes, &history).unwrap();
    assert_matrix_eq!(stiffness, stiffness_fd, comp = abs, tol = 1e-6);
}

#[test]
fn hourglass_stiffness_is_derivative_of_hourglass_force_for_fixed_tangent() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings { hourglass: 2.0 });
    let reference = distorted_cube();
    let nodes = deformed_nodes();
    let point = kernel.material_point(&nodes, &PointHistory::default()).unwrap();
    let tangent = material.tangent(&point).unwrap();

    let hourglass_force = |u: &DVector<f64>, f: &mut DVector<f64>| {
        let nodes = displaced_nodes(reference, u);
        f.copy_from(&kernel.hourglass_force(&nodes, &tangent).unwrap());
    };
    let u = DVector::from_column_slice(nodes.displacements().as_slice());
    let stiffness_fd = approximate_jacobian_fd(24, hourglass_force, &u, 1e-6);
    let stiffness = kernel.hourglass_stiffness(&nodes, &tangent).unwrap();
    assert_matrix_eq!(stiffness, stiffness_fd, comp = abs, tol = 1e-8);
}

#[test]
fn stabilized_stiffness_only_omits_variation_of_hourglass_modulus() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let reference = distorted_cube();
    let history = PointHistory::default();
    let nodes = deformed_nodes();
    let u = DVector::from_column_slice(nodes.displacements().as_slice());

    let force = |u: &DVector<f64>, f: &mut DVector<f64>| {
        let nodes = displaced_nodes(reference, u);
        f.copy_from(&kernel.internal_force(&nodes, &history).unwrap());
    };
    let modulus = |u: &DVector<f64>, m: &mut DVector<f64>| {
        let nodes = displaced_nodes(reference, u);
        m[0] = kernel.evaluate(&nodes, &history).unwrap().hourglass_modulus;
    };
    let stiffness_fd = approximate_jacobian_fd(24, force, &u, 1e-6);
    let modulus_gradient = approximate_jacobian_fd(1, modulus, &u, 1e-6);

    let response = kernel.evaluate(&nodes, &history).unwrap();
    assert!(response.hourglass_modulus > 0.0);
    let point = kernel.material_point(&nodes, &history).unwrap();
    let k_hg = kernel
        .hourglass_stiffness(&nodes, &material.tangent(&point).unwrap())
        .unwrap();
    // d(K_hg(μ) u)/du = K_hg + (K_hg u / μ) ⊗ dμ/du
    let hourglass_force = k_hg * nodes.displacements();
    let hourglass_force = DVector::from_column_slice(hourglass_force.as_slice());
    let modulus_variation = hourglass_force * modulus_gradient / response.hourglass_modulus;
    let stiffness = DMatrix::from_column_slice(24, 24, response.stiffness.as_slice()) + modulus_variation;
    assert_matrix_eq!(stiffness, stiffness_fd, comp = abs, tol = 1e-6);
}

#[test]
fn evaluate_combines_individual_contributions() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings { hourglass: 0.5 });
    let nodes = deformed_nodes();
    let history = PointHistory::default();

    let response = kernel.evaluate(&nodes, &history).unwrap();
    let point = kernel.material_point(&nodes, &history).unwrap();
    let tangent = material.tangent(&point).unwrap();

    assert_matrix_eq!(response.deformation_gradient, *point.deformation_gradient());
    assert_scalar_eq!(response.jacobian, point.jacobian());
    assert_scalar_eq!(response.volume, hex_volume(&nodes.current), comp = abs, tol = 1e-14);
    assert_matrix_eq!(response.stress, material.stress(&point).unwrap(), comp = abs, tol = 1e-14);
    assert_scalar_eq!(response.hourglass_modulus, tangent.shear_moduli_mean(), comp = abs, tol = 1e-14);

    let force = kernel.internal_force(&nodes, &history).unwrap();
    assert_matrix_eq!(response.force, force, comp = abs, tol = 1e-13);

    let stiffness = kernel.material_stiffness(&nodes, &history).unwrap()
        + kernel.geometric_stiffness(&nodes, &history).unwrap()
        + kernel.hourglass_stiffness(&nodes, &tangent).unwrap();
    assert_matrix_eq!(response.stiffness, stiffness, comp = abs, tol = 1e-12);
    assert_matrix_eq!(kernel.stiffness(&nodes, &history).unwrap(), response.stiffness);

    // The element stiffness of a hyperelastic material is symmetric
    assert_matrix_eq!(response.stiffness, response.stiffness.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn hourglass_modes_are_only_resisted_by_stabilization() {
    let material = arruda_boyce(5.0);
    let history = PointHistory::default();
    let rest = unit_cube_nodes();
    let scale = 0.01;

    for alpha in 0..4 {
        for direction in 0..3 {
            let u = hourglass_mode(alpha, direction, scale);
            let mut current = rest.reference;
            for (a, x) in current.iter_mut().enumerate() {
                *x += u.fixed_rows::<3>(3 * a).into_owned();
            }
            let deformed = UdgHexNodes::new(rest.reference, current);

            // The averaged deformation gradient does not see the mode
            let unstabilized = UdgHexKernel::new(&material, NO_HOURGLASS);
            assert_matrix_eq!(
                unstabilized.average_deformation_gradient(&deformed).unwrap(),
                Matrix3::identity(),
                comp = abs,
                tol = 1e-15
            );
            let force = unstabilized.internal_force(&deformed, &history).unwrap();
            assert_matrix_eq!(force, ElementVector::zeros(), comp = abs, tol = 1e-14);
            let k = unstabilized.stiffness(&rest, &history).unwrap();
            assert_scalar_eq!(u.dot(&(k * u)), 0.0, comp = abs, tol = 1e-14);

            // With stabilization, u^T K u = V₀ |G₀|² μ_hg (γ_α · u)² with |G₀|² = 3/2 for the cube
            let stabilized = UdgHexKernel::new(&material, UdgSettings::default());
            let response = stabilized.evaluate(&rest, &history).unwrap();
            let expected = 1.5 * response.hourglass_modulus * scale * scale;
            assert!(response.hourglass_modulus > 0.0);
            assert_scalar_eq!(u.dot(&(response.stiffness * u)), expected, comp = abs, tol = 1e-14);
            let force = stabilized.internal_force(&deformed, &history).unwrap();
            assert!(force.norm() > 0.0);
        }
    }
}

#[test]
fn hourglass_modulus_is_clamped_mean_shear_modulus() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let isotropic = SymmetricTensor4::identity_dyad() * 3.0 + SymmetricTensor4::symmetric_identity() * 1.5;
    assert_scalar_eq!(kernel.hourglass_modulus(&isotropic), 0.75, comp = abs, tol = 1e-15);
    assert_eq!(kernel.hourglass_modulus(&-isotropic), 0.0);

    // The hourglass force vanishes for a vanishing modulus
    let nodes = deformed_nodes();
    let force = kernel.hourglass_force(&nodes, &SymmetricTensor4::zeros()).unwrap();
    assert_matrix_eq!(force, ElementVector::zeros());
    let force = kernel.hourglass_force(&nodes, &isotropic).unwrap();
    assert_matrix_eq!(
        force,
        kernel.hourglass_stiffness(&nodes, &isotropic).unwrap() * nodes.displacements()
    );
}

#[test]
fn inverted_elements_are_reported() {
    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let history = PointHistory::default();

    let mirror = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
    let mirrored = affine_nodes(unit_cube_vertices(), &mirror, &Vector3::zeros());
    let error = kernel.internal_force(&mirrored, &history).unwrap_err();
    assert!(error.is_inverted());
    assert!(kernel.evaluate(&mirrored, &history).unwrap_err().is_inverted());

    let collapsed = affine_nodes(unit_cube_vertices(), &Matrix3::zeros(), &Vector3::zeros());
    assert!(kernel.stiffness(&collapsed, &history).unwrap_err().is_inverted());
}

#[test]
fn material_failures_are_propagated() {
    // The material point sits at the centroid, where the radial fiber field is undefined
    let material = active_fiber(FiberField::spherical(Point3::new(0.5, 0.5, 0.5)));
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let error = kernel.internal_force(&unit_cube_nodes(), &PointHistory::default()).unwrap_err();
    assert_eq!(error, ElementError::Material(MaterialError::DegenerateFiber));
    assert!(!error.is_inverted());
}

#[test]
fn context_is_forwarded_to_material() {
    let material = active_fiber(FiberField::uniform(Vector3::x()).unwrap());
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    let nodes = unit_cube_nodes();
    let history = PointHistory::default();

    // σ = 2 e_x ⊗ e_x acting on the averaged gradients ξ_a / 4 of the unit cube
    let force = kernel.internal_force(&nodes, &history).unwrap();
    for (a, xi) in udgfem::element::Hex8Element::<f64>::reference().vertices().iter().enumerate() {
        assert_matrix_eq!(
            force.fixed_rows::<3>(3 * a),
            Vector3::new(xi.x / 2.0, 0.0, 0.0),
            comp = abs,
            tol = 1e-14
        );
    }

    let scaled = kernel.with_context(EvaluationContext {
        activation_scale: 0.25,
        time_step: 0.0,
    });
    let scaled_force = scaled.internal_force(&nodes, &history).unwrap();
    assert_matrix_eq!(scaled_force, force * 0.25, comp = abs, tol = 1e-14);
}

#[test]
fn fiber_stretch_is_reported_for_fiber_materials() {
    let stretch = Matrix3::from_diagonal(&Vector3::new(1.2, 1.0, 1.0));
    let nodes = affine_nodes(unit_cube_vertices(), &stretch, &Vector3::zeros());
    let history = PointHistory::default();

    let active = active_fiber(FiberField::uniform(Vector3::x()).unwrap());
    let kernel = UdgHexKernel::new(&active, UdgSettings::default());
    let lambda = kernel.fiber_stretch(&nodes, &history).unwrap().unwrap();
    assert_scalar_eq!(lambda, 1.2, comp = abs, tol = 1e-14);

    let material = arruda_boyce(5.0);
    let kernel = UdgHexKernel::new(&material, UdgSettings::default());
    assert_eq!(kernel.fiber_stretch(&nodes, &history), Ok(None));
}

#[test]
fn kernel_accepts_trait_objects() {
    let material = arruda_boyce(5.0);
    let model: &dyn ConstitutiveModel<f64> = &material;
    let kernel = UdgHexKernel::new(model, UdgSettings::default());
    let nodes = deformed_nodes();
    let expected = UdgHexKernel::new(&material, UdgSettings::default())
        .internal_force(&nodes, &PointHistory::default())
        .unwrap();
    assert_matrix_eq!(kernel.internal_force(&nodes, &PointHistory::default()).unwrap(), expected);
}

proptest! {
    #[test]
    fn hourglass_shape_vectors_are_orthogonal_to_linear_fields(vertices in perturbed_unit_cube(0.08)) {
        let nodes = UdgHexNodes::undeformed(vertices);
        let (gradients, _) = nodes.average_cartesian_derivatives(Configuration::Reference).unwrap();
        let x = SMatrix::<f64, 3, 8>::from_fn(|i, a| vertices[a][i]);
        let gamma = hourglass_shape_vectors(&x, &gradients);

        prop_assert_matrix_eq!(x * gamma, SMatrix::<f64, 3, 4>::zeros(), comp = abs, tol = 1e-13);
        prop_assert_matrix_eq!(gamma.row_sum(), SMatrix::<f64, 1, 4>::zeros(), comp = abs, tol = 1e-13);
    }

    #[test]
    fn rotated_elements_have_no_force(vertices in perturbed_unit_cube(0.08), q in rotation3()) {
        let material = arruda_boyce(5.0);
        let kernel = UdgHexKernel::new(&material, UdgSettings::default());
        let nodes = affine_nodes(vertices, &q, &Vector3::new(0.5, 0.5, 0.5));
        let force = kernel.internal_force(&nodes, &PointHistory::default()).unwrap();
        prop_assert_matrix_eq!(force, ElementVector::zeros(), comp = abs, tol = 1e-11);
    }
}
