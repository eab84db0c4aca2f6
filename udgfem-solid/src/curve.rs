//! Piecewise-linear response curves used to scale active stress.
use serde::{Deserialize, Serialize};
use udgfem::error::{report_value, ParameterError};
use udgfem::Real;

/// A piecewise-linear curve through a list of `(x, y)` points, extended as a constant beyond the
/// first and last point.
///
/// Serializes as a plain list of `[x, y]` pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCurve<T> {
    points: Vec<(T, T)>,
}

impl<T: Real> ResponseCurve<T> {
    /// Creates a curve from points with strictly increasing `x`.
    pub fn new(points: Vec<(T, T)>) -> Result<Self, ParameterError> {
        let curve = Self { points };
        curve.validate()?;
        Ok(curve)
    }

    /// A curve that takes the value `y` everywhere.
    pub fn constant(y: T) -> Self {
        Self {
            points: vec![(T::zero(), y)],
        }
    }

    pub fn points(&self) -> &[(T, T)] {
        &self.points
    }

    /// Checks that the curve has at least one point, that all coordinates are finite and that
    /// `x` is strictly increasing.
    ///
    /// Deserialized curves are not validated until this is called.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.points.is_empty() {
            return Err(ParameterError::InvalidCurve {
                reason: "curve must have at least one point".to_string(),
            });
        }
        if let Some((x, y)) = self
            .points
            .iter()
            .find(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ParameterError::InvalidCurve {
                reason: format!("point ({}, {}) is not finite", report_value(*x), report_value(*y)),
            });
        }
        if let Some(window) = self.points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(ParameterError::InvalidCurve {
                reason: format!(
                    "x must be strictly increasing, but {} follows {}",
                    report_value(window[1].0),
                    report_value(window[0].0)
                ),
            });
        }
        Ok(())
    }

    /// Index of the segment `[x_i, x_{i+1})` containing `x`, if `x` lies inside the curve's range.
    fn segment(&self, x: T) -> Option<usize> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        if x < first.0 || x >= last.0 {
            return None;
        }
        // Number of points with x_i <= x, which is at least one here
        let upper = self.points.partition_point(|(x_i, _)| *x_i <= x);
        Some(upper - 1)
    }

    pub fn value(&self, x: T) -> T {
        match (self.points.first(), self.points.last()) {
            (Some(&(x0, y0)), _) if x <= x0 => y0,
            (_, Some(&(x1, y1))) if x >= x1 => y1,
            _ => match self.segment(x) {
                Some(i) => {
                    let (x0, y0) = self.points[i];
                    let (x1, y1) = self.points[i + 1];
                    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
                }
                None => T::zero(),
            },
        }
    }

    /// Slope of the curve at `x`.
    ///
    /// At a breakpoint the slope of the segment to its right is returned. The slope is zero
    /// outside of `[x_first, x_last)`.
    pub fn derivative(&self, x: T) -> T {
        match self.segment(x) {
            Some(i) => {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[i + 1];
                (y1 - y0) / (x1 - x0)
            }
            None => T::zero(),
        }
    }
}
