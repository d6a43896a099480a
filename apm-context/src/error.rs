use thiserror::Error;

/// A specialized `Result` type for context codec operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Reasons an incoming identity could not be accepted.
///
/// These never cross the instrumentation boundary: [`TraceContext`] collapses
/// all of them into a boolean outcome and falls back to a fresh root context.
///
/// [`TraceContext`]: crate::TraceContext
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    /// An id segment had the wrong length or contained a non-hex character.
    #[error("malformed id: expected {expected} hex digits")]
    MalformedId {
        /// Number of hex digits the id field requires.
        expected: usize,
    },

    /// A trace id or parent id was all zeros where a non-zero value is required.
    #[error("{field} must not be all zeros")]
    EmptyRequiredId {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A version `00` header or a binary buffer did not have the exact required length.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Required length.
        expected: usize,
        /// Length that was received.
        actual: usize,
    },

    /// The header had fewer than four `-` separated fields.
    #[error("truncated traceparent: expected at least 4 fields, got {0}")]
    TruncatedGrammar(usize),
}
