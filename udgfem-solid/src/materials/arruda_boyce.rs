use super::{check_non_negative, check_positive};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use udgfem::constitutive::{
    uncoupled_strain_energy_density, uncoupled_stress, uncoupled_tangent, ConstitutiveModel, UncoupledMaterial,
};
use udgfem::error::{MaterialError, ParameterError};
use udgfem::material_point::MaterialPoint;
use udgfem::nalgebra::Matrix3;
use udgfem::tensor::{deviator, SymmetricTensor4};
use udgfem::Real;

#[allow(non_snake_case)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrudaBoyceParameters<T> {
    /// Initial shear modulus.
    pub mu: T,
    /// Number of chain links, which controls the locking stretch `sqrt(N)`.
    pub N: T,
    /// Bulk modulus of the volumetric penalty.
    pub k: T,
}

impl<T: Real> ArrudaBoyceParameters<T> {
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_positive("mu", self.mu)?;
        check_positive("N", self.N)?;
        check_non_negative("k", self.k)
    }
}

/// The uncoupled Arruda-Boyce (eight-chain) model.
///
/// The deviatoric strain energy density is the five-term expansion of the inverse Langevin
/// function in the isochoric invariant $\bar I_1 = \operatorname{tr} \bar{\vec B}$,
/// $$
/// W_{dev} = \mu \sum_{i=1}^5 \frac{a_i}{N^{i-1}} \left( \bar I_1^i - 3^i \right),
/// \qquad a = \left\\{ \tfrac{1}{2}, \tfrac{1}{10}, \tfrac{11}{350}, \tfrac{19}{1750}, \tfrac{519}{134750} \right\\}.
/// $$
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArrudaBoyce<T> {
    parameters: ArrudaBoyceParameters<T>,
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn series_coefficients<T: Real>() -> [T; 5] {
    [0.5, 0.1, 11.0 / 350.0, 19.0 / 1750.0, 519.0 / 134750.0]
}

impl<T: Real> ArrudaBoyce<T> {
    pub fn new(parameters: ArrudaBoyceParameters<T>) -> Result<Self, ParameterError> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &ArrudaBoyceParameters<T> {
        &self.parameters
    }

    /// The derivatives `dW/dI1` and `d²W/dI1²` of the deviatoric energy.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn invariant_derivatives(&self, i1: T) -> (T, T) {
        let ArrudaBoyceParameters { mu, N: n, .. } = self.parameters;
        let [a1, a2, a3, a4, a5] = series_coefficients::<T>();
        let f = i1 / n;
        let w1 = mu * (a1 + (2.0 * a2 + (3.0 * a3 + (4.0 * a4 + 5.0 * a5 * f) * f) * f) * f);
        let w11 = 2.0 * mu * (a2 + (3.0 * a3 + (6.0 * a4 + 10.0 * a5 * f) * f) * f) / n;
        (w1, w11)
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> UncoupledMaterial<T> for ArrudaBoyce<T> {
    fn bulk_modulus(&self) -> T {
        self.parameters.k
    }

    fn deviatoric_stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError> {
        let b = point.isochoric_left_cauchy_green();
        let (w1, _) = self.invariant_derivatives(b.trace());
        Ok(deviator(&(b * w1)) * (2.0 / point.jacobian()))
    }

    fn deviatoric_tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError> {
        let j_inv = 1.0 / point.jacobian();
        let b = point.isochoric_left_cauchy_green();
        let i1 = b.trace();
        let (w1, w11) = self.invariant_derivatives(i1);
        let s = deviator(&(b * w1)) * (2.0 * j_inv);

        let identity = Matrix3::identity();
        let ixi = SymmetricTensor4::identity_dyad();
        let i4 = SymmetricTensor4::symmetric_identity();

        // W_C : C and C : W_CC : C expressed through B̄
        let wc = w1 * i1;
        let cwwc = w11 * i1 * i1;
        let wcc_c = b * (w11 * i1);

        let cw = SymmetricTensor4::dyad1s(&b) * (4.0 * w11 * j_inv)
            - SymmetricTensor4::dyad1s_pair(&wcc_c, &identity) * (4.0 / 3.0 * j_inv)
            + ixi * (4.0 / 9.0 * j_inv * cwwc);

        Ok(SymmetricTensor4::dyad1s_pair(&s, &identity) * (-2.0 / 3.0)
            + i4 * (4.0 / 3.0 * j_inv * wc)
            - ixi * (4.0 / 9.0 * j_inv * wc)
            + cw)
    }

    #[allow(non_snake_case)]
    fn deviatoric_strain_energy_density(&self, point: &MaterialPoint<T>) -> Result<T, MaterialError> {
        let ArrudaBoyceParameters { mu, N, .. } = self.parameters;
        let i1 = point.isochoric_left_cauchy_green().trace();

        let mut energy = T::zero();
        let (mut i1_pow, mut three_pow, mut n_pow) = (T::one(), T::one(), T::one());
        for (i, a_i) in series_coefficients::<T>().into_iter().enumerate() {
            i1_pow *= i1;
            three_pow *= 3.0;
            if i > 0 {
                n_pow *= N;
            }
            energy += a_i * (i1_pow - three_pow) / n_pow;
        }
        Ok(mu * energy)
    }
}

impl<T: Real> ConstitutiveModel<T> for ArrudaBoyce<T> {
    fn stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError> {
        uncoupled_stress(self, point)
    }

    fn tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError> {
        uncoupled_tangent(self, point)
    }

    fn strain_energy_density(&self, point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        Some(uncoupled_strain_energy_density(self, point))
    }
}
