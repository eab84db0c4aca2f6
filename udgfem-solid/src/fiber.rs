//! Reference fiber directions of anisotropic and active materials.
use serde::{Deserialize, Serialize};
use udgfem::error::{MaterialError, ParameterError};
use udgfem::nalgebra::{Point3, Scalar, Vector3};
use udgfem::Real;

/// Assigns a unit reference fiber direction `a0` to every material point.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FiberField<T: Scalar> {
    /// The same direction everywhere. The stored vector need not have unit length.
    Uniform { direction: Vector3<T> },
    /// Fibers pointing radially away from `center`.
    Spherical { center: Point3<T> },
}

impl<T: Real> FiberField<T> {
    /// A uniform fiber field along `direction`, which is normalized.
    pub fn uniform(direction: Vector3<T>) -> Result<Self, ParameterError> {
        let field = Self::Uniform {
            direction: direction
                .try_normalize(T::zero())
                .ok_or(ParameterError::ZeroFiberDirection)?,
        };
        Ok(field)
    }

    pub fn spherical(center: Point3<T>) -> Self {
        Self::Spherical { center }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        match self {
            Self::Uniform { direction } if !(direction.norm() > T::zero()) => Err(ParameterError::ZeroFiberDirection),
            _ => Ok(()),
        }
    }

    /// The unit reference direction at the reference position `x`.
    ///
    /// Fails with [`MaterialError::DegenerateFiber`] if the direction is undefined there, which
    /// for a spherical field happens at its center.
    pub fn direction_at(&self, x: &Point3<T>) -> Result<Vector3<T>, MaterialError> {
        let direction = match self {
            Self::Uniform { direction } => *direction,
            Self::Spherical { center } => x - center,
        };
        direction
            .try_normalize(T::zero())
            .ok_or(MaterialError::DegenerateFiber)
    }
}
