use thiserror::Error;

/// Errors raised while constructing entities from raw attribute values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EntityError {
    /// A required attribute was absent from the element.
    #[error("missing `{attribute}` attribute")]
    MissingAttribute {
        /// Name of the attribute that was expected.
        attribute: &'static str,
    },
    /// An identifier or reference did not parse as an integer.
    #[error("invalid identifier {value:?}")]
    InvalidId {
        /// Raw attribute text.
        value: String,
    },
    /// A coordinate did not parse as a floating-point number.
    #[error("invalid {axis} {value:?}")]
    InvalidCoordinate {
        /// `lon` or `lat`.
        axis: &'static str,
        /// Raw attribute text.
        value: String,
    },
    /// A coordinate parsed but lies outside the WGS84 range.
    #[error("{axis} {value} outside [{min}, {max}]")]
    CoordinateOutOfRange {
        /// `lon` or `lat`.
        axis: &'static str,
        /// Parsed value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}
