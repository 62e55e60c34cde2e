//! Module containing the Zincite universal error type
use crate::mesh::ElementId;
use thiserror::Error;

/// Universal error type for Zincite
///
/// Failures are ordinary values: a field being undefined on part of the mesh
/// is a normal outcome of finite-element evaluation, not a panic.
#[derive(Error, Debug)]
pub enum Error {
    /// Field has no parameters on the given element
    #[error("field '{field}' is not defined on element {element}")]
    NotDefined {
        /// Name of the field being evaluated
        field: String,
        /// Element the evaluation was requested on
        element: ElementId,
    },

    /// Element is not present in the mesh
    #[error("element {0} is not present in the mesh")]
    UnknownElement(ElementId),

    /// Element dimension is outside the supported range
    #[error("element dimension {0} is outside the supported range")]
    BadDimension(usize),

    /// Child element dimension must be below its parent's
    #[error("child dimension {0} is not below parent dimension {1}")]
    BadChildDimension(usize, usize),

    /// Xi coordinate count does not match the element dimension
    #[error("got {0} xi coordinates, expected {1}")]
    BadXiCount(usize, usize),

    /// Xi direction index exceeds the element dimension
    #[error("xi index {0} exceeds element dimension {1}")]
    BadXiIndex(usize, usize),

    /// Parameter matrix shape does not match the field and element
    #[error(
        "parameter matrix is {rows}x{cols}, expected {components} components x {corners} corners"
    )]
    BadParameterShape {
        /// Rows of the offending matrix
        rows: usize,
        /// Columns of the offending matrix
        cols: usize,
        /// Component count of the field
        components: usize,
        /// Corner count of the element
        corners: usize,
    },

    /// Per-time-step parameter count does not match the field's time sequence
    #[error("got {0} parameter time steps, expected {1}")]
    BadTimeStepCount(usize, usize),

    /// Time sequence must be non-empty and strictly increasing
    #[error("time sequence must be non-empty and strictly increasing")]
    BadTimeSequence,

    /// Coefficient count does not match the monomial orders
    #[error("got {0} coefficients, expected {1}")]
    BadCoefficientCount(usize, usize),

    /// Derivative coefficients were not computed for these element values
    #[error("derivative coefficients were not computed for these element values")]
    DerivativesNotComputed,

    /// Element values are cleared and hold no coefficients
    #[error("element values are cleared and hold no coefficients")]
    NoValues,

    /// No evaluation location has been set in the field cache
    #[error("no evaluation location has been set in the field cache")]
    NoLocation,
}
