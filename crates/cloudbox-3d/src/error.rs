use thiserror::Error;

/// Error types for the geometry pipeline.
///
/// Degenerate inputs (empty clouds, empty regions, sparse neighborhoods) are not
/// errors: they produce well defined defaults. Only caller contract violations are
/// reported here.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// A configuration value is out of its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A point index does not address the point set.
    #[error("Point index {index} is out of bounds for {len} points")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of points available.
        len: usize,
    },

    /// Two buffers that must run in parallel have different lengths.
    #[error("Mismatched lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedLengths {
        /// Label for the left-hand buffer.
        left_name: &'static str,
        /// Length of the left-hand buffer.
        left_len: usize,
        /// Label for the right-hand buffer.
        right_name: &'static str,
        /// Length of the right-hand buffer.
        right_len: usize,
    },
}

impl GeometryError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
