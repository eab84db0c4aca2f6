//! Constitutive models.
mod active_fiber;
mod arruda_boyce;
mod muscle;

pub use active_fiber::*;
pub use arruda_boyce::*;
pub use muscle::*;

use udgfem::error::{report_value, ParameterError};
use udgfem::Real;

/// Fails with [`ParameterError::OutOfRange`] unless `admissible` holds for a finite `value`.
fn check_parameter<T: Real>(
    name: &'static str,
    value: T,
    admissible: impl FnOnce(T) -> bool,
    expected: &'static str,
) -> Result<(), ParameterError> {
    if value.is_finite() && admissible(value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value: report_value(value),
            expected,
        })
    }
}

fn check_positive<T: Real>(name: &'static str, value: T) -> Result<(), ParameterError> {
    check_parameter(name, value, |v| v > T::zero(), "> 0")
}

fn check_non_negative<T: Real>(name: &'static str, value: T) -> Result<(), ParameterError> {
    check_parameter(name, value, |v| v >= T::zero(), ">= 0")
}

fn check_unit_interval<T: Real>(name: &'static str, value: T) -> Result<(), ParameterError> {
    check_parameter(name, value, |v| v >= T::zero() && v <= T::one(), "in [0, 1]")
}
