//! Error types for the data_augmentation crate.
//!
//! Every failure the engine raises on its own is a [`TransformError`].
//! Functions return `anyhow::Result`, so callers that need the category
//! use [`error_kind`] (or `downcast_ref::<TransformError>()`) to recover it.

use thiserror::Error;

/// Category of a failure, mirroring the type/value split of the keyword surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value of the wrong kind was supplied (e.g. a list where a tuple is required).
    Type,
    /// A value of the right kind but outside its valid domain.
    Value,
}

/// Errors raised by containers, transforms and the exporter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// `data_indices` was not a tuple.
    #[error("data_indices must be a tuple of integers or None, got {0}")]
    IndicesNotTuple(&'static str),

    /// `data_indices` contained a non-integer element.
    #[error("data_indices elements must be integers, got {kind} at position {position}")]
    IndexNotInteger {
        /// Position inside the tuple.
        position: usize,
        /// Kind of the offending element.
        kind: &'static str,
    },

    /// `data_indices` contained a negative element.
    #[error("data_indices elements must be non-negative, got {0}")]
    NegativeIndex(i64),

    /// Probability outside `[0, 1]` or not finite.
    #[error("probability must be in [0.0, 1.0], got {0}")]
    InvalidProbability(f64),

    /// Parameter has the wrong kind of value.
    #[error("parameter `{name}` expects {expected}, got {got}")]
    ParameterType {
        /// Parameter name.
        name: String,
        /// What was expected.
        expected: &'static str,
        /// Kind of the supplied value.
        got: &'static str,
    },

    /// Parameter value is outside its valid domain.
    #[error("parameter `{name}` is invalid: {reason}")]
    ParameterValue {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Parameter is not accepted by the transform.
    #[error("{transform} does not accept parameter `{name}`")]
    UnknownParameter {
        /// Transform name.
        transform: &'static str,
        /// Parameter name.
        name: String,
    },

    /// No transform with this name in the registry.
    #[error("unknown transform `{0}`")]
    UnknownTransform(String),

    /// Raw input of a shape `wrap` cannot turn into a container.
    #[error("cannot wrap {0} into a data container")]
    UnsupportedInput(&'static str),

    /// Type code outside the closed alphabet.
    #[error("unsupported type code `{0}`")]
    UnknownTypeCode(char),

    /// The item at a position does not carry the variant its code announces.
    #[error("item {position} is tagged `{code}` but holds {actual}")]
    CodeMismatch {
        /// Position in the container.
        position: usize,
        /// Declared code.
        code: char,
        /// Actual item kind.
        actual: &'static str,
    },

    /// A dictionary field holds the wrong item variant.
    #[error("field `{field}` holds {actual}")]
    FieldMismatch {
        /// Field name.
        field: &'static str,
        /// Actual item kind.
        actual: &'static str,
    },

    /// Number of items differs from number of type codes.
    #[error("container has {items} items but {codes} type codes")]
    LengthMismatch {
        /// Number of items.
        items: usize,
        /// Number of codes.
        codes: usize,
    },

    /// Dictionary input with an unrecognised field name.
    #[error("unknown field `{0}` (expected image, mask, keypoints or label)")]
    UnknownField(String),

    /// Position outside the container.
    #[error("index {index} out of range for container of length {len}")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Container length.
        len: usize,
    },

    /// Targeted items of a data-dependent transform disagree on their frame.
    #[error(
        "{transform} requires all targeted items to share a frame: \
         item {first} is {first_frame}, item {second} is {second_frame}"
    )]
    FrameMismatch {
        /// Transform name.
        transform: &'static str,
        /// Position of the reference item.
        first: usize,
        /// Frame of the reference item.
        first_frame: String,
        /// Position of the mismatching item.
        second: usize,
        /// Frame of the mismatching item.
        second_frame: String,
    },

    /// Invalid geometry (empty frame, crop larger than the frame, non-finite points).
    #[error("invalid geometry: {0}")]
    Geometry(String),

    /// Pixel layout the kernel does not handle.
    #[error("unsupported pixel format: {0}")]
    PixelFormat(String),

    /// Invalid exporter configuration.
    #[error("invalid export options: {0}")]
    ExportOptions(String),
}

impl TransformError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IndicesNotTuple(_)
            | Self::IndexNotInteger { .. }
            | Self::ParameterType { .. }
            | Self::UnknownParameter { .. }
            | Self::UnsupportedInput(_)
            | Self::UnknownTypeCode(_)
            | Self::CodeMismatch { .. }
            | Self::FieldMismatch { .. } => ErrorKind::Type,
            Self::NegativeIndex(_)
            | Self::InvalidProbability(_)
            | Self::ParameterValue { .. }
            | Self::UnknownTransform(_)
            | Self::LengthMismatch { .. }
            | Self::UnknownField(_)
            | Self::IndexOutOfRange { .. }
            | Self::FrameMismatch { .. }
            | Self::Geometry(_)
            | Self::PixelFormat(_)
            | Self::ExportOptions(_) => ErrorKind::Value,
        }
    }

    /// Creates a parameter type error.
    #[must_use]
    pub fn parameter_type(name: impl Into<String>, expected: &'static str, got: &'static str) -> Self {
        Self::ParameterType {
            name: name.into(),
            expected,
            got,
        }
    }

    /// Creates a parameter value error.
    #[must_use]
    pub fn parameter_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParameterValue {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a geometry error.
    #[must_use]
    pub fn geometry(reason: impl Into<String>) -> Self {
        Self::Geometry(reason.into())
    }

    /// Creates a pixel format error.
    #[must_use]
    pub fn pixel_format(reason: impl Into<String>) -> Self {
        Self::PixelFormat(reason.into())
    }
}

/// Finds the first [`TransformError`] in an error chain and returns its kind.
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TransformError>())
        .map(TransformError::kind)
}
