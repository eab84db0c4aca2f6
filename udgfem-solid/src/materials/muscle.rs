use super::{check_non_negative, check_parameter, check_positive, check_unit_interval};
use crate::fiber::FiberField;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use udgfem::constitutive::{
    uncoupled_strain_energy_density, uncoupled_stress, uncoupled_tangent, ConstitutiveModel, UncoupledMaterial,
};
use udgfem::error::{MaterialError, ParameterError};
use udgfem::material_point::MaterialPoint;
use udgfem::nalgebra::{Matrix3, Scalar, Vector3};
use udgfem::tensor::{deviator, dyad, dyad_sym, SymmetricTensor4};
use udgfem::Real;

/// Values of the cross-fiber shear invariant `ω` at or below this threshold use the limit values
/// `β = 1` and `ξ = -1/3` in place of the closed forms, which are singular at `ω = 1`.
pub const OMEGA_THRESHOLD: f64 = 1.0001;

#[allow(non_snake_case)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MuscleParameters<T: Scalar> {
    /// Along-fiber shear modulus.
    pub g1: T,
    /// Cross-fiber shear modulus.
    pub g2: T,
    /// Fiber stretch modulus.
    pub g3: T,
    /// Exponential coefficient of the passive fiber curve.
    pub p1: T,
    /// Exponent of the passive fiber curve.
    pub p2: T,
    /// Optimal fiber length (stretch at which active force peaks).
    pub Lofl: T,
    /// Maximum isometric fiber stress.
    pub smax: T,
    /// Stretch at which the passive curve turns linear.
    pub lam_max: T,
    pub activation: T,
    /// Bulk modulus of the volumetric penalty.
    pub k: T,
    pub fiber: FiberField<T>,
}

impl<T: Real> MuscleParameters<T> {
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_non_negative("g1", self.g1)?;
        check_non_negative("g2", self.g2)?;
        check_non_negative("g3", self.g3)?;
        check_non_negative("p1", self.p1)?;
        check_non_negative("p2", self.p2)?;
        check_positive("Lofl", self.Lofl)?;
        check_non_negative("smax", self.smax)?;
        let lofl = self.Lofl;
        check_parameter("lam_max", self.lam_max, |lam_max| lam_max >= lofl, ">= Lofl")?;
        check_unit_interval("activation", self.activation)?;
        check_non_negative("k", self.k)?;
        self.fiber.validate()
    }
}

/// A transversely isotropic, uncoupled model of skeletal muscle.
///
/// The deviatoric energy is a function of the isochoric invariants
/// $\tilde I_1, \tilde I_4 = \tilde\lambda^2, \tilde I_5$ of $\bar{\vec C}$ and the fiber
/// direction,
/// $$
/// W = G_1 \beta_1^2 + G_2 \beta_2^2 + \frac{9}{16} G_3 (\ln \tilde I_4)^2 + W_f(\tilde \lambda),
/// $$
/// with the along-fiber shear $\beta_1^2 = \tilde I_5 / \tilde I_4^2 - 1$ and the cross-fiber
/// shear $\beta_2 = \cosh^{-1} \omega$, $\omega = (\tilde I_1 \tilde I_4 - \tilde I_5) / (2 \tilde\lambda)$.
/// The fiber energy $W_f$ integrates the fiber force, made of a passive exponential-then-linear
/// part and an active bell-shaped part scaled by the activation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MuscleMaterial<T: Scalar> {
    parameters: MuscleParameters<T>,
}

/// Isochoric fiber kinematics at a material point.
struct FiberInvariants<T: Scalar> {
    /// Unit current fiber direction.
    a: Vector3<T>,
    b: Matrix3<T>,
    /// Isochoric fiber stretch.
    stretch: T,
    i1: T,
    i4: T,
    i5: T,
}

/// First and second derivatives of the deviatoric energy with respect to `I1`, `I4` and `I5`.
///
/// Derivatives involving `I2` vanish for this model.
struct InvariantDerivatives<T> {
    w1: T,
    w4: T,
    w5: T,
    w11: T,
    w14: T,
    w15: T,
    w44: T,
    w45: T,
    w55: T,
}

impl<T: Real> MuscleMaterial<T> {
    pub fn new(parameters: MuscleParameters<T>) -> Result<Self, ParameterError> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &MuscleParameters<T> {
        &self.parameters
    }

    /// The activation of the current step, `activation * activation_scale`.
    pub fn effective_activation(&self, point: &MaterialPoint<T>) -> T {
        self.parameters.activation * point.context().activation_scale
    }

    /// The cross-fiber shear invariant `ω` at the point.
    pub fn omega(&self, point: &MaterialPoint<T>) -> Result<T, MaterialError> {
        Ok(omega(&self.invariants(point)?))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn invariants(&self, point: &MaterialPoint<T>) -> Result<FiberInvariants<T>, MaterialError> {
        let a0 = self.parameters.fiber.direction_at(point.position())?;
        let (a, lambda) = point.push_forward_fiber(&a0)?;
        let stretch = lambda * point.jacobian().powf(-1.0 / 3.0);
        let b = point.isochoric_left_cauchy_green();
        let i4 = stretch * stretch;
        let i5 = i4 * a.dot(&(b * a));
        Ok(FiberInvariants {
            a,
            b,
            stretch,
            i1: b.trace(),
            i4,
            i5,
        })
    }

    /// Passive fiber force and its derivative with respect to the fiber stretch.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn passive_force(&self, stretch: T) -> (T, T) {
        let MuscleParameters {
            p1, p2, Lofl: lofl, lam_max, ..
        } = self.parameters;
        if stretch <= lofl {
            (0.0, 0.0)
        } else if stretch < lam_max {
            let e = (p2 * (stretch / lofl - 1.0)).exp();
            (p1 * (e - 1.0), p1 * p2 * e / lofl)
        } else {
            let (p3, p4) = self.passive_linear_coefficients();
            (p3 * stretch / lofl + p4, p3 / lofl)
        }
    }

    /// Slope and offset of the linear branch of the passive curve, which continues the
    /// exponential branch with matching value and slope at `lam_max`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn passive_linear_coefficients(&self) -> (T, T) {
        let MuscleParameters {
            p1, p2, Lofl: lofl, lam_max, ..
        } = self.parameters;
        let e = (p2 * (lam_max / lofl - 1.0)).exp();
        let p3 = p1 * p2 * e;
        let p4 = p1 * (e - 1.0) - p3 * lam_max / lofl;
        (p3, p4)
    }

    /// Integral of the passive fiber force from zero to `stretch`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn passive_energy(&self, stretch: T) -> T {
        let MuscleParameters {
            p1, p2, Lofl: lofl, lam_max, ..
        } = self.parameters;
        if stretch <= lofl || p2 <= 0.0 {
            return 0.0;
        }
        let exponential = |l: T| p1 * (lofl / p2 * ((p2 * (l / lofl - 1.0)).exp() - 1.0) - (l - lofl));
        if stretch < lam_max {
            exponential(stretch)
        } else {
            let (p3, p4) = self.passive_linear_coefficients();
            exponential(lam_max)
                + p3 / (2.0 * lofl) * (stretch * stretch - lam_max * lam_max)
                + p4 * (stretch - lam_max)
        }
    }

    /// Normalized active force and its derivative with respect to the fiber stretch.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn active_force(&self, stretch: T) -> (T, T) {
        let lofl = self.parameters.Lofl;
        let x = stretch / lofl;
        if x <= 0.4 || x >= 1.6 {
            (0.0, 0.0)
        } else if x <= 0.6 {
            (9.0 * (x - 0.4) * (x - 0.4), 18.0 * (x - 0.4) / lofl)
        } else if x >= 1.4 {
            (9.0 * (x - 1.6) * (x - 1.6), 18.0 * (x - 1.6) / lofl)
        } else {
            (1.0 - 4.0 * (1.0 - x) * (1.0 - x), 8.0 * (1.0 - x) / lofl)
        }
    }

    /// Integral of the normalized active force from zero to `stretch`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn active_energy(&self, stretch: T) -> T {
        let lofl = self.parameters.Lofl;
        let x = stretch / lofl;
        let cube = |y: T| y * y * y;

        let mut integral = 0.0;
        if x > 0.4 {
            integral += 3.0 * cube(x.min(0.6) - 0.4);
        }
        if x > 0.6 {
            let x2 = x.min(1.4);
            integral += (x2 - 0.6) + 4.0 / 3.0 * (cube(1.0 - x2) - cube(0.4));
        }
        if x > 1.4 {
            integral += 3.0 * (cube(x.min(1.6) - 1.6) - cube(-0.2));
        }
        lofl * integral
    }

    /// Fiber energy `W_f` together with its first and second derivatives with respect to `I4`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn fiber_response(&self, stretch: T, activation: T) -> (T, T) {
        let MuscleParameters { smax, Lofl: lofl, .. } = self.parameters;
        let (fp, fp_dl) = self.passive_force(stretch);
        let (fa, fa_dl) = self.active_force(stretch);
        let w_dl = smax * (fp + activation * fa) / lofl;
        let w_dll = smax * (fp_dl + activation * fa_dl) / lofl;
        let i4 = stretch * stretch;
        (0.5 * w_dl / stretch, 0.25 * (w_dll - w_dl / stretch) / i4)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn invariant_derivatives(&self, inv: &FiberInvariants<T>, activation: T) -> InvariantDerivatives<T> {
        let MuscleParameters { g1, g2, g3, .. } = self.parameters;
        let FiberInvariants {
            stretch, i1, i4, i5, ..
        } = *inv;
        let (beta, xi) = cross_shear_coefficients(omega(inv));

        // Along-fiber shear G1 (I5 / I4^2 - 1)
        let f1_4 = -2.0 * g1 * i5 / (i4 * i4 * i4);
        let f1_5 = g1 / (i4 * i4);
        let f1_44 = 6.0 * g1 * i5 / (i4 * i4 * i4 * i4);
        let f1_45 = -2.0 * g1 / (i4 * i4 * i4);

        // Cross-fiber shear G2 acosh(ω)^2
        let i4_sqrt3 = i4 * stretch;
        let f2_1 = g2 * beta * stretch;
        let f2_4 = g2 * beta * (i1 * i4 + i5) * 0.5 / i4_sqrt3;
        let f2_5 = -g2 * beta / stretch;
        let f2_11 = 0.5 * xi * g2 * i4;
        let f2_44 = 2.0 * g2 * xi * (0.25 * (i1 * i4 + i5) / i4_sqrt3).powi(2)
            - g2 * beta * 0.25 * (i1 * i4 + 3.0 * i5) / (i4 * i4_sqrt3);
        let f2_55 = 0.5 * g2 * xi / i4;
        let f2_14 = g2 * beta * 0.5 / stretch + g2 * xi * (i1 * i4 + i5) * 0.25 / i4;
        let f2_15 = -0.5 * g2 * xi;
        let f2_45 = g2 * beta * 0.5 / i4_sqrt3 - g2 * xi * 0.25 * (i1 * i4 + i5) / (i4 * i4);

        // Fiber stretch 9/16 G3 (ln I4)^2
        let f3_4 = 9.0 * g3 * 0.125 * i4.ln() / i4;
        let f3_44 = 9.0 * g3 * 0.125 * (1.0 - i4.ln()) / (i4 * i4);

        let (ff_4, ff_44) = self.fiber_response(stretch, activation);

        InvariantDerivatives {
            w1: f2_1,
            w4: f1_4 + f2_4 + f3_4 + ff_4,
            w5: f1_5 + f2_5,
            w11: f2_11,
            w14: f2_14,
            w15: f2_15,
            w44: f1_44 + f2_44 + f3_44 + ff_44,
            w45: f1_45 + f2_45,
            w55: f2_55,
        }
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn omega<T: Real>(inv: &FiberInvariants<T>) -> T {
    0.5 * (inv.i1 * inv.i4 - inv.i5) / inv.stretch
}

/// The auxiliary terms `β = acosh(ω) / sqrt(ω² - 1)` and
/// `ξ = (1 - ω β) / (ω² - 1)`, replaced by their limits at `ω = 1` up to [`OMEGA_THRESHOLD`].
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn cross_shear_coefficients<T: Real>(omega: T) -> (T, T) {
    let threshold = T::from_f64(OMEGA_THRESHOLD).expect("Literal must fit in T");
    if omega > threshold {
        let denominator = omega * omega - 1.0;
        let beta = omega.acosh() / denominator.sqrt();
        let xi = (1.0 - omega * beta) / denominator;
        (beta, xi)
    } else {
        (1.0, -1.0 / 3.0)
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> UncoupledMaterial<T> for MuscleMaterial<T> {
    fn bulk_modulus(&self) -> T {
        self.parameters.k
    }

    fn deviatoric_stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError> {
        let inv = self.invariants(point)?;
        let d = self.invariant_derivatives(&inv, self.effective_activation(point));
        let a_x_a = dyad(&inv.a);
        let a_b_a = dyad_sym(&inv.a, &(inv.b * inv.a));
        let t = inv.b * d.w1 + a_x_a * (inv.i4 * d.w4) + a_b_a * (inv.i4 * d.w5);
        Ok(deviator(&t) * (2.0 / point.jacobian()))
    }

    fn deviatoric_tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError> {
        let inv = self.invariants(point)?;
        let d = self.invariant_derivatives(&inv, self.effective_activation(point));
        let FiberInvariants { i1, i4, i5, .. } = inv;
        let j = point.jacobian();
        let b = inv.b;

        let identity = Matrix3::identity();
        let a_x_a = dyad(&inv.a);
        // Push-forward of dI5/dC̄
        let i5_c = dyad_sym(&inv.a, &(b * inv.a)) * i4;
        let s = deviator(&(b * d.w1 + a_x_a * (i4 * d.w4) + i5_c * d.w5)) * (2.0 / j);

        let wcc = d.w1 * i1 + d.w4 * i4 + 2.0 * d.w5 * i5;
        let coeff_b = d.w11 * i1 + d.w14 * i4 + 2.0 * d.w15 * i5;
        let coeff_a = d.w14 * i1 + d.w44 * i4 + 2.0 * d.w45 * i5;
        let coeff_i5 = d.w15 * i1 + d.w45 * i4 + 2.0 * d.w55 * i5;
        let c_w2_c = coeff_b * i1 + coeff_a * i4 + coeff_i5 * 2.0 * i5 + 2.0 * d.w5 * i5;
        let wccc = b * coeff_b + a_x_a * (coeff_a * i4) + i5_c * (coeff_i5 + d.w5);

        let w2cc = SymmetricTensor4::dyad1s(&b) * d.w11
            + SymmetricTensor4::dyad1s_pair(&b, &a_x_a) * (d.w14 * i4)
            + SymmetricTensor4::dyad1s_pair(&b, &i5_c) * d.w15
            + SymmetricTensor4::dyad1s(&a_x_a) * (d.w44 * i4 * i4)
            + SymmetricTensor4::dyad1s_pair(&a_x_a, &i5_c) * (d.w45 * i4)
            + SymmetricTensor4::dyad1s(&i5_c) * d.w55
            + SymmetricTensor4::dyad4s_pair(&a_x_a, &b) * (d.w5 * i4);

        let ixi = SymmetricTensor4::identity_dyad();
        let cw = ixi * (4.0 / (9.0 * j) * c_w2_c) + w2cc * (4.0 / j)
            - SymmetricTensor4::dyad1s_pair(&wccc, &identity) * (4.0 / (3.0 * j));

        Ok(SymmetricTensor4::dyad1s_pair(&s, &identity) * (-2.0 / 3.0)
            + SymmetricTensor4::symmetric_identity() * (4.0 * wcc / (3.0 * j))
            - ixi * (4.0 * wcc / (9.0 * j))
            + cw)
    }

    fn deviatoric_strain_energy_density(&self, point: &MaterialPoint<T>) -> Result<T, MaterialError> {
        let inv = self.invariants(point)?;
        let MuscleParameters {
            g1, g2, g3, smax, Lofl: lofl, ..
        } = self.parameters;
        let activation = self.effective_activation(point);

        let b1_squared = (inv.i5 / (inv.i4 * inv.i4) - 1.0).max(0.0);
        let b2 = omega(&inv).max(1.0).acosh();
        let log_i4 = inv.i4.ln();
        let fiber =
            smax * (self.passive_energy(inv.stretch) + activation * self.active_energy(inv.stretch)) / lofl;

        Ok(g1 * b1_squared + g2 * b2 * b2 + 9.0 / 16.0 * g3 * log_i4 * log_i4 + fiber)
    }
}

impl<T: Real> ConstitutiveModel<T> for MuscleMaterial<T> {
    fn stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError> {
        uncoupled_stress(self, point)
    }

    fn tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError> {
        uncoupled_tangent(self, point)
    }

    fn strain_energy_density(&self, point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        Some(uncoupled_strain_energy_density(self, point))
    }

    fn fiber_stretch(&self, point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        let stretch = self
            .parameters
            .fiber
            .direction_at(point.position())
            .and_then(|a0| point.push_forward_fiber(&a0))
            .map(|(_, lambda)| lambda);
        Some(stretch)
    }
}
