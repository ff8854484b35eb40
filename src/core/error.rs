//! Signal container error types

use thiserror::Error;

/// Result type for container operations
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors raised while building or mutating a [`SignalDataContainer`](super::SignalDataContainer)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    /// One or more mandatory metadata keys are absent
    #[error("Missing mandatory metadata fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A numeric field lies outside its inclusive bounds
    #[error("{field} = {value} is outside [{min}, {max}] {unit}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
        unit: &'static str,
    },

    /// An enumerated field holds a value outside its allowed set
    #[error("{field} = \"{value}\" must be one of {}", .allowed.join(", "))]
    InvalidChoice {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A field holds a value of the wrong type
    #[error("{field} must be {expected}")]
    InvalidType { field: String, expected: &'static str },

    /// The three sample sequences differ in length
    #[error("Sequence length mismatch: SIN={in_phase}, COS={quadrature}, t={time_base}")]
    LengthMismatch {
        in_phase: usize,
        quadrature: usize,
        time_base: usize,
    },

    /// Time stamps decrease at `index`
    #[error("Time base decreases at index {index}")]
    NonMonotonicTimeBase { index: usize },

    /// A sample is non-numeric or not finite
    #[error("Invalid sample in {channel} at index {index}")]
    InvalidSample { channel: &'static str, index: usize },

    /// A time base asks for more points than any valid configuration produces
    #[error("Time base of {requested} points exceeds the limit of {max}")]
    TimeBaseTooLarge { requested: f64, max: usize },
}

impl SignalError {
    /// Name of the offending metadata field, if the error concerns one
    pub fn field(&self) -> Option<&str> {
        match self {
            SignalError::OutOfRange { field, .. }
            | SignalError::InvalidChoice { field, .. }
            | SignalError::InvalidType { field, .. } => Some(field),
            SignalError::MissingFields(fields) => fields.first().map(String::as_str),
            _ => None,
        }
    }
}
