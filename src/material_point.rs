//! Mechanical state at a single evaluation location.
use crate::error::{report_value, MaterialError};
use crate::Real;
use nalgebra::{Matrix3, Point3, Scalar, Vector3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Values set by the global driver once per step and forwarded to every material evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext<T> {
    /// Scales the prescribed activation of active materials (load curve value of the step).
    pub activation_scale: T,
    /// Size of the current time increment. Zero disables rate effects.
    pub time_step: T,
}

impl<T: Real> Default for EvaluationContext<T> {
    fn default() -> Self {
        Self {
            activation_scale: T::one(),
            time_step: T::zero(),
        }
    }
}

/// History variables committed at the end of a converged step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointHistory<T> {
    pub fiber_stretch: Option<T>,
}

impl<T> Default for PointHistory<T> {
    fn default() -> Self {
        Self { fiber_stretch: None }
    }
}

/// The state of one material point for a single evaluation.
///
/// A material point is built transiently from a deformation gradient with positive determinant.
/// It carries the driver context and the committed history, but it never stores results of the
/// evaluation itself: constitutive models are pure functions of a material point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaterialPoint<T: Scalar> {
    deformation_gradient: Matrix3<T>,
    jacobian: T,
    position: Point3<T>,
    context: EvaluationContext<T>,
    history: PointHistory<T>,
}

#[allow(non_snake_case)]
impl<T: Real> MaterialPoint<T> {
    /// Creates a material point at the origin with default context and empty history.
    ///
    /// Fails with [`MaterialError::DegenerateDeformation`] unless `det(F)` is positive and finite.
    pub fn new(deformation_gradient: Matrix3<T>) -> Result<Self, MaterialError> {
        let jacobian = checked_jacobian(&deformation_gradient)?;
        Ok(Self {
            deformation_gradient,
            jacobian,
            position: Point3::origin(),
            context: EvaluationContext::default(),
            history: PointHistory::default(),
        })
    }

    pub fn with_position(self, position: Point3<T>) -> Self {
        Self { position, ..self }
    }

    pub fn with_context(self, context: &EvaluationContext<T>) -> Self {
        Self {
            context: *context,
            ..self
        }
    }

    pub fn with_history(self, history: PointHistory<T>) -> Self {
        Self { history, ..self }
    }

    /// Returns a copy of this point with a different deformation gradient, keeping position,
    /// context and history.
    pub fn with_deformation_gradient(&self, deformation_gradient: Matrix3<T>) -> Result<Self, MaterialError> {
        let jacobian = checked_jacobian(&deformation_gradient)?;
        Ok(Self {
            deformation_gradient,
            jacobian,
            ..*self
        })
    }

    pub fn deformation_gradient(&self) -> &Matrix3<T> {
        &self.deformation_gradient
    }

    /// The volume ratio `J = det(F)`, always positive.
    pub fn jacobian(&self) -> T {
        self.jacobian
    }

    /// Position of the point in the reference configuration.
    pub fn position(&self) -> &Point3<T> {
        &self.position
    }

    pub fn context(&self) -> &EvaluationContext<T> {
        &self.context
    }

    pub fn history(&self) -> &PointHistory<T> {
        &self.history
    }

    /// The left Cauchy-Green tensor `B = F F^T`.
    pub fn left_cauchy_green(&self) -> Matrix3<T> {
        let F = &self.deformation_gradient;
        F * F.transpose()
    }

    /// The isochoric left Cauchy-Green tensor `B̄ = J^(-2/3) B`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn isochoric_left_cauchy_green(&self) -> Matrix3<T> {
        self.left_cauchy_green() * self.jacobian.powf(-2.0 / 3.0)
    }

    /// Pushes a reference fiber direction forward, returning the unit current direction and
    /// the fiber stretch `|F a0|`.
    ///
    /// `a0` is expected to have unit length. A fiber that collapses to zero length yields
    /// [`MaterialError::DegenerateFiber`].
    pub fn push_forward_fiber(&self, a0: &Vector3<T>) -> Result<(Vector3<T>, T), MaterialError> {
        let a = self.deformation_gradient * a0;
        let stretch = a.norm();
        if stretch > T::zero() && stretch.is_finite() {
            Ok((a / stretch, stretch))
        } else {
            Err(MaterialError::DegenerateFiber)
        }
    }
}

fn checked_jacobian<T: Real>(deformation_gradient: &Matrix3<T>) -> Result<T, MaterialError> {
    let jacobian = deformation_gradient.determinant();
    if jacobian > T::zero() && jacobian.is_finite() {
        Ok(jacobian)
    } else {
        Err(MaterialError::DegenerateDeformation {
            jacobian: report_value(jacobian),
        })
    }
}
