use super::{check_non_negative, check_unit_interval};
use crate::curve::ResponseCurve;
use crate::fiber::FiberField;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use udgfem::constitutive::ConstitutiveModel;
use udgfem::error::{MaterialError, ParameterError};
use udgfem::material_point::MaterialPoint;
use udgfem::nalgebra::{Matrix3, Scalar};
use udgfem::tensor::{dyad, SymmetricTensor4};
use udgfem::Real;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveFiberParameters<T: Scalar> {
    /// Maximum active stress.
    pub smax: T,
    pub activation: T,
    /// Length-tension curve, a function of the fiber stretch. Identically one if absent.
    pub stl: Option<ResponseCurve<T>>,
    /// Velocity-tension curve, a function of the fiber stretch rate. Identically one if absent.
    pub stv: Option<ResponseCurve<T>>,
    pub fiber: FiberField<T>,
}

impl<T: Real> ActiveFiberParameters<T> {
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_non_negative("smax", self.smax)?;
        check_unit_interval("activation", self.activation)?;
        for curve in self.stl.iter().chain(&self.stv) {
            curve.validate()?;
        }
        self.fiber.validate()
    }
}

/// A contractile stress acting along the current fiber direction,
/// $$
/// \vec \sigma = \frac{\alpha \, s_{max} \, s_l(\lambda) \, s_v(v)}{J} \, \vec a \otimes \vec a,
/// $$
/// where $\lambda$ is the fiber stretch and $v$ the fiber stretch rate relative to the committed
/// stretch of the previous step.
///
/// The model has no strain energy. It is typically combined with a passive material through
/// separate element sets sharing the same nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveFiberStress<T: Scalar> {
    parameters: ActiveFiberParameters<T>,
}

/// Scalar fiber stress and its derivative with respect to the fiber stretch.
struct FiberStress<T: Scalar> {
    a_x_a: Matrix3<T>,
    stretch: T,
    stress: T,
    stress_derivative: T,
}

impl<T: Real> FiberStress<T> {
    /// `c = (λ s'(λ) - 2 s) / J  a ⊗ a ⊗ a ⊗ a`
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn spatial_tangent(&self, jacobian: T) -> SymmetricTensor4<T> {
        let coefficient = (self.stretch * self.stress_derivative - 2.0 * self.stress) / jacobian;
        SymmetricTensor4::dyad1s(&self.a_x_a) * coefficient
    }
}

impl<T: Real> ActiveFiberStress<T> {
    pub fn new(parameters: ActiveFiberParameters<T>) -> Result<Self, ParameterError> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &ActiveFiberParameters<T> {
        &self.parameters
    }

    /// The fiber stretch rate `(λ - λ_prev) / Δt`.
    ///
    /// Zero without committed history or without a positive time step.
    pub fn stretch_rate(&self, point: &MaterialPoint<T>, stretch: T) -> T {
        let dt = point.context().time_step;
        match point.history().fiber_stretch {
            Some(previous) if dt > T::zero() => (stretch - previous) / dt,
            _ => T::zero(),
        }
    }

    fn fiber_stress(&self, point: &MaterialPoint<T>) -> Result<FiberStress<T>, MaterialError> {
        let a0 = self.parameters.fiber.direction_at(point.position())?;
        let (a, stretch) = point.push_forward_fiber(&a0)?;

        let ActiveFiberParameters { smax, activation, .. } = self.parameters;
        let scale = activation * point.context().activation_scale * smax;

        let (stl, dstl) = match &self.parameters.stl {
            Some(curve) => (curve.value(stretch), curve.derivative(stretch)),
            None => (T::one(), T::zero()),
        };

        let dt = point.context().time_step;
        let v = self.stretch_rate(point, stretch);
        let (stv, dstv) = match &self.parameters.stv {
            // The rate only depends on the stretch when it is computed from history
            Some(curve) if dt > T::zero() && point.history().fiber_stretch.is_some() => {
                (curve.value(v), curve.derivative(v) / dt)
            }
            Some(curve) => (curve.value(v), T::zero()),
            None => (T::one(), T::zero()),
        };

        Ok(FiberStress {
            a_x_a: dyad(&a),
            stretch,
            stress: scale * stl * stv,
            stress_derivative: scale * (dstl * stv + stl * dstv),
        })
    }
}

impl<T: Real> ConstitutiveModel<T> for ActiveFiberStress<T> {
    fn stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError> {
        let fiber = self.fiber_stress(point)?;
        Ok(fiber.a_x_a * (fiber.stress / point.jacobian()))
    }

    fn tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError> {
        let fiber = self.fiber_stress(point)?;
        Ok(fiber.spatial_tangent(point.jacobian()))
    }

    fn stress_and_tangent(
        &self,
        point: &MaterialPoint<T>,
    ) -> Result<(Matrix3<T>, SymmetricTensor4<T>), MaterialError> {
        let fiber = self.fiber_stress(point)?;
        let j = point.jacobian();
        Ok((fiber.a_x_a * (fiber.stress / j), fiber.spatial_tangent(j)))
    }

    fn fiber_stretch(&self, point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        let stretch = self
            .parameters
            .fiber
            .direction_at(point.position())
            .and_then(|a0| point.push_forward_fiber(&a0))
            .map(|(_, stretch)| stretch);
        Some(stretch)
    }
}
