//! Error types for index construction and queries.

use std::fmt;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Coarse classification of an [`IndexError`], for layers that map errors onto their own
/// type/shape/value convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The coordinate type is not supported.
    Type,
    /// The point buffer does not have the expected number of axes.
    Shape,
    /// A parameter or an input length is out of range.
    Value,
    /// A system resource could not be acquired.
    Resource,
}

/// Errors that can occur while building or querying an index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Coordinate type name that has no index specialisation.
    UnsupportedCoordinateType { name: String },

    /// Point buffer is not two-dimensional.
    Shape {
        expected_ndim: usize,
        actual_ndim: usize,
    },

    /// Metric tag is neither `1`/`2` nor a string starting with `l1`/`l2`.
    InvalidMetric { tag: String },

    /// Query points do not have the dimensionality of the indexed points.
    DimensionMismatch {
        expected: usize,
        actual: usize,
        context: &'static str,
    },

    /// Batch of queries and batch of radii differ in length.
    LengthMismatch { queries: usize, radii: usize },

    /// Invalid parameter value.
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    /// Coordinates cannot be ordered (NaN).
    UndefinedOrder { context: &'static str },

    /// Worker pool could not be started.
    ThreadPool(String),
}

impl IndexError {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedCoordinateType { .. } => ErrorKind::Type,
            Self::Shape { .. } => ErrorKind::Shape,
            Self::ThreadPool(_) => ErrorKind::Resource,
            Self::InvalidMetric { .. }
            | Self::DimensionMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::InvalidParameter { .. }
            | Self::UndefinedOrder { .. } => ErrorKind::Value,
        }
    }

    pub(crate) fn invalid(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            message: message.into(),
        }
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCoordinateType { name } => {
                write!(f, "Unsupported coordinate type '{}'", name)
            }
            Self::Shape {
                expected_ndim,
                actual_ndim,
            } => {
                write!(
                    f,
                    "Point buffer must have {} axes, got {}",
                    expected_ndim, actual_ndim
                )
            }
            Self::InvalidMetric { tag } => {
                write!(
                    f,
                    "Invalid metric '{}': expected 1 or 2 (alternatively 'L1' or 'L2')",
                    tag
                )
            }
            Self::DimensionMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch in {}: expected {}, got {}",
                    context, expected, actual
                )
            }
            Self::LengthMismatch { queries, radii } => {
                write!(
                    f,
                    "Query length ({}) and radii length ({}) differ",
                    queries, radii
                )
            }
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::UndefinedOrder { context } => {
                write!(f, "Coordinates cannot be ordered in {} (NaN?)", context)
            }
            Self::ThreadPool(msg) => {
                write!(f, "Failed to start worker threads: {}", msg)
            }
        }
    }
}

impl std::error::Error for IndexError {}

impl From<rayon::ThreadPoolBuildError> for IndexError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(err.to_string())
    }
}
