//! Finite difference approximations used to verify analytic derivatives.
use crate::constitutive::ConstitutiveModel;
use crate::error::MaterialError;
use crate::material_point::MaterialPoint;
use crate::tensor::VOIGT_PAIRS;
use crate::Real;
use nalgebra::{DMatrix, DVector, Matrix3, Matrix6};
use numeric_literals::replace_float_literals;

/// Approximates the spatial elasticity tensor of `model` at `point` with central differences of
/// the Cauchy stress.
///
/// For every Voigt direction `d = sym(e_k ⊗ e_l)`, the deformation gradient is perturbed as
/// $$
/// \vec F_\pm = (\vec I \pm h \vec d) \vec F
/// $$
/// and the stress difference is corrected to the Truesdell rate,
/// $$
/// \vec c : \vec d \approx \frac{\vec \sigma_+ - \vec \sigma_-}{2h}
///     - \vec d \vec \sigma - \vec \sigma \vec d + \operatorname{tr}(\vec d) \vec \sigma.
/// $$
/// The result is returned as a 6x6 Voigt matrix. It is *not* symmetrized, so its asymmetry is
/// itself a measure of how far the model is from deriving from a potential.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn approximate_spatial_tangent<T, M>(model: &M, point: &MaterialPoint<T>, h: T) -> Result<Matrix6<T>, MaterialError>
where
    T: Real,
    M: ConstitutiveModel<T> + ?Sized,
{
    let f = *point.deformation_gradient();
    let sigma = model.stress(point)?;
    let mut tangent = Matrix6::zeros();

    for (col, &(k, l)) in VOIGT_PAIRS.iter().enumerate() {
        let mut d = Matrix3::zeros();
        d[(k, l)] += 0.5;
        d[(l, k)] += 0.5;

        let point_plus = point.with_deformation_gradient((Matrix3::identity() + d * h) * f)?;
        let point_minus = point.with_deformation_gradient((Matrix3::identity() - d * h) * f)?;
        let sigma_plus = model.stress(&point_plus)?;
        let sigma_minus = model.stress(&point_minus)?;

        let rate = (sigma_plus - sigma_minus) / (2.0 * h) - d * sigma - sigma * d + sigma * d.trace();
        for (row, &(i, j)) in VOIGT_PAIRS.iter().enumerate() {
            tangent[(row, col)] = rate[(i, j)];
        }
    }

    Ok(tangent)
}

/// Approximates the Jacobian of the function $f: \mathbb{R}^n \rightarrow \mathbb{R}^m$
/// with central finite differences of step size `h`.
///
/// The function writes its value for the given input into the provided output vector of
/// length `m`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn approximate_jacobian_fd<T>(
    m: usize,
    mut f: impl FnMut(&DVector<T>, &mut DVector<T>),
    x: &DVector<T>,
    h: T,
) -> DMatrix<T>
where
    T: Real,
{
    let n = x.len();
    let mut jacobian = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();
    let mut f_plus = DVector::zeros(m);
    let mut f_minus = DVector::zeros(m);

    for j in 0..n {
        let x_j = x[j];
        x_perturbed[j] = x_j + h;
        f(&x_perturbed, &mut f_plus);
        x_perturbed[j] = x_j - h;
        f(&x_perturbed, &mut f_minus);
        x_perturbed[j] = x_j;

        let mut column = jacobian.column_mut(j);
        column.copy_from(&f_plus);
        column -= &f_minus;
        column /= 2.0 * h;
    }

    jacobian
}

/// Approximates the derivative of a scalar function of one variable at `x` with central
/// differences.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn approximate_derivative_fd<T: Real>(mut f: impl FnMut(T) -> T, x: T, h: T) -> T {
    (f(x + h) - f(x - h)) / (2.0 * h)
}
