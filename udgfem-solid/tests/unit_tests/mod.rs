use matrixcompare::assert_matrix_eq;
use udgfem::calculus::approximate_spatial_tangent;
use udgfem::constitutive::ConstitutiveModel;
use udgfem::material_point::MaterialPoint;
use udgfem::nalgebra::{matrix, Matrix3, Vector3};
use udgfem::tensor::double_contraction;
use udgfem_solid::fiber::FiberField;
use udgfem_solid::materials::{ArrudaBoyce, ArrudaBoyceParameters, MuscleParameters};

mod arruda_boyce;

/// A general deformation with moderate stretches and shear, `det(F) > 0`.
fn deformation_gradient() -> Matrix3<f64> {
    matrix![1.1, 0.2, -0.05;
            0.05, 0.95, 0.1;
            0.02, -0.1, 1.05]
}

/// A larger deformation that stretches fibers along `(1, 1, 1)` into the active range of the
/// muscle law.
fn sheared_deformation_gradient() -> Matrix3<f64> {
    matrix![1.3, 0.3, -0.1;
            0.1, 0.85, 0.2;
            0.05, -0.15, 1.1]
}

fn diagonal_fiber() -> FiberField<f64> {
    FiberField::uniform(Vector3::new(1.0, 1.0, 1.0)).unwrap()
}

fn arruda_boyce(k: f64) -> ArrudaBoyce<f64> {
    ArrudaBoyce::new(ArrudaBoyceParameters { mu: 1.0, N: 10.0, k }).unwrap()
}

fn muscle_parameters() -> MuscleParameters<f64> {
    MuscleParameters {
        g1: 0.3,
        g2: 0.7,
        g3: 0.2,
        p1: 0.05,
        p2: 6.6,
        Lofl: 1.07,
        smax: 0.3,
        lam_max: 1.4,
        activation: 0.6,
        k: 2.0,
        fiber: diagonal_fiber(),
    }
}

/// Checks the analytic spatial tangent against central differences of the stress.
fn assert_tangent_matches_finite_differences(model: &dyn ConstitutiveModel<f64>, point: &MaterialPoint<f64>, tol: f64) {
    let tangent = model.tangent(point).unwrap().to_voigt_matrix();
    let approx = approximate_spatial_tangent(model, point, 1e-6).unwrap();
    assert_matrix_eq!(tangent, approx, comp = abs, tol = tol);
}

/// Checks that `dW/dh` along `F(h) = (I + h d) F` equals `J σ : d`.
fn assert_energy_consistent_with_stress(model: &dyn ConstitutiveModel<f64>, point: &MaterialPoint<f64>, tol: f64) {
    let d = matrix![0.3, 0.1, -0.2;
                    0.1, -0.4, 0.25;
                    -0.2, 0.25, 0.5];
    let h = 1e-6;
    let f = *point.deformation_gradient();
    let energy_at = |h: f64| {
        let perturbed = point
            .with_deformation_gradient((Matrix3::identity() + d * h) * f)
            .unwrap();
        model.strain_energy_density(&perturbed).unwrap().unwrap()
    };

    let power_fd = (energy_at(h) - energy_at(-h)) / (2.0 * h);
    let power = point.jacobian() * double_contraction(&model.stress(point).unwrap(), &d);
    assert!(
        (power_fd - power).abs() <= tol,
        "finite difference power {power_fd} does not match stress power {power}"
    );
}
