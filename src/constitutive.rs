//! The constitutive model contract and the common deviatoric/volumetric split.
use crate::error::MaterialError;
use crate::material_point::MaterialPoint;
use crate::tensor::SymmetricTensor4;
use crate::Real;
use nalgebra::Matrix3;
use numeric_literals::replace_float_literals;

/// A constitutive model mapping the state of a material point to Cauchy stress and spatial
/// elasticity tensor.
///
/// Implementations must be pure: the result depends only on the material point and the
/// parameters of the model. The tangent must be the derivative of [`stress`](Self::stress) with
/// respect to the spatial (Truesdell) strain rate, so that it has both minor symmetries and the
/// major symmetry whenever the model derives from a strain energy.
pub trait ConstitutiveModel<T: Real> {
    fn stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError>;

    fn tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError>;

    /// Computes stress and tangent together.
    ///
    /// Models may override this to share intermediate quantities between the two.
    fn stress_and_tangent(
        &self,
        point: &MaterialPoint<T>,
    ) -> Result<(Matrix3<T>, SymmetricTensor4<T>), MaterialError> {
        Ok((self.stress(point)?, self.tangent(point)?))
    }

    /// Strain energy per unit reference volume, if the model derives from a potential.
    fn strain_energy_density(&self, _point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        None
    }

    /// Current fiber stretch, for models that carry a fiber direction.
    ///
    /// Used to commit history at the end of a converged step.
    fn fiber_stretch(&self, _point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        None
    }
}

/// A hyperelastic law with strain energy split into `W = W_dev(B̄) + U(J)`.
///
/// Implementors provide the deviatoric response only, and implement [`ConstitutiveModel`] by
/// delegating to [`uncoupled_stress`], [`uncoupled_tangent`] and
/// [`uncoupled_strain_energy_density`], which add the volumetric penalty `U(J) = k/2 (ln J)^2`
/// with `k` the [bulk modulus](Self::bulk_modulus). A zero bulk modulus gives the purely
/// deviatoric response.
pub trait UncoupledMaterial<T: Real> {
    fn bulk_modulus(&self) -> T;

    /// Deviatoric Cauchy stress. Must be trace-free.
    fn deviatoric_stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError>;

    fn deviatoric_tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError>;

    fn deviatoric_strain_energy_density(&self, point: &MaterialPoint<T>) -> Result<T, MaterialError>;
}

/// Pressure `p = U'(J)` and stiffness `U''(J)` of the volumetric penalty `U(J) = k/2 (ln J)^2`.
pub fn volumetric_pressure_and_stiffness<T: Real>(bulk_modulus: T, jacobian: T) -> (T, T) {
    let k = bulk_modulus;
    let log_j = jacobian.ln();
    let pressure = k * log_j / jacobian;
    let stiffness = k * (T::one() - log_j) / (jacobian * jacobian);
    (pressure, stiffness)
}

/// Volumetric strain energy density `U(J) = k/2 (ln J)^2`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn volumetric_strain_energy_density<T: Real>(bulk_modulus: T, jacobian: T) -> T {
    let log_j = jacobian.ln();
    0.5 * bulk_modulus * log_j * log_j
}

/// The volumetric contribution `p (I ⊗ I - 2 I ⊙ I) + J U'' I ⊗ I` to the spatial tangent.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn volumetric_tangent<T: Real>(bulk_modulus: T, jacobian: T) -> SymmetricTensor4<T> {
    let (p, d2u) = volumetric_pressure_and_stiffness(bulk_modulus, jacobian);
    let ixi = SymmetricTensor4::identity_dyad();
    let i4 = SymmetricTensor4::symmetric_identity();
    ixi * (p + jacobian * d2u) - i4 * (2.0 * p)
}

/// Cauchy stress `σ = σ_dev + p I` of an uncoupled material.
pub fn uncoupled_stress<T, M>(material: &M, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError>
where
    T: Real,
    M: UncoupledMaterial<T> + ?Sized,
{
    let (p, _) = volumetric_pressure_and_stiffness(material.bulk_modulus(), point.jacobian());
    Ok(material.deviatoric_stress(point)? + Matrix3::from_diagonal_element(p))
}

/// Spatial tangent `c = c_dev + c_vol` of an uncoupled material.
pub fn uncoupled_tangent<T, M>(material: &M, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError>
where
    T: Real,
    M: UncoupledMaterial<T> + ?Sized,
{
    Ok(material.deviatoric_tangent(point)? + volumetric_tangent(material.bulk_modulus(), point.jacobian()))
}

pub fn uncoupled_strain_energy_density<T, M>(material: &M, point: &MaterialPoint<T>) -> Result<T, MaterialError>
where
    T: Real,
    M: UncoupledMaterial<T> + ?Sized,
{
    let volumetric = volumetric_strain_energy_density(material.bulk_modulus(), point.jacobian());
    Ok(material.deviatoric_strain_energy_density(point)? + volumetric)
}
