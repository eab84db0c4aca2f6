//! Error types for parameter validation, constitutive evaluation, element kernels and assembly.
//!
//! Parameter errors abort model setup, while [`MaterialError`] and
//! [`ElementError::InvertedElement`] are recoverable by the global nonlinear driver (typically by
//! cutting the load or time increment).
use thiserror::Error;

/// Errors raised when constructing or validating material models and settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A named scalar parameter lies outside its admissible range.
    #[error("parameter `{name}` = {value} is out of range (expected {expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// A response curve could not be constructed.
    #[error("invalid response curve: {reason}")]
    InvalidCurve { reason: String },

    /// A prescribed fiber direction has zero length.
    #[error("fiber direction must have non-zero length")]
    ZeroFiberDirection,
}

/// Errors raised during evaluation of a constitutive model.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MaterialError {
    /// The deformation gradient has a non-positive (or non-finite) determinant.
    #[error("degenerate deformation: det(F) = {jacobian} must be positive")]
    DegenerateDeformation { jacobian: f64 },

    /// The fiber direction has zero length in the reference or current configuration.
    #[error("degenerate deformation: fiber direction has zero length")]
    DegenerateFiber,
}

/// Errors raised by the element kernel.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ElementError {
    /// The averaged Jacobian or the element volume is non-positive.
    #[error("inverted element: volume = {volume}, det(F) = {jacobian}")]
    InvertedElement { volume: f64, jacobian: f64 },

    #[error(transparent)]
    Material(#[from] MaterialError),
}

impl ElementError {
    pub fn is_inverted(&self) -> bool {
        matches!(self, ElementError::InvertedElement { .. })
    }
}

/// Errors raised while assembling domain contributions into global containers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("evaluation of element {element_index} failed: {source}")]
    Element {
        element_index: usize,
        #[source]
        source: ElementError,
    },

    #[error("element {element_index} references node {node}, which does not exist in the mesh")]
    NodeOutOfBounds { element_index: usize, node: usize },

    #[error("global container has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("sparse matrix has no entry at ({row}, {col})")]
    MissingMatrixEntry { row: usize, col: usize },
}

impl AssemblyError {
    /// Whether the failure stems from the current deformation state, so that retrying with a
    /// smaller increment may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AssemblyError::Element { .. })
    }

    /// The element error that aborted the pass, if any.
    pub fn element_error(&self) -> Option<&ElementError> {
        match self {
            AssemblyError::Element { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Converts a scalar into `f64` for error reporting.
pub fn report_value<T: crate::Real>(value: T) -> f64 {
    value.to_subset().unwrap_or(f64::NAN)
}
