//! Record access errors

/// Errors while reading tokens from a record or encoding results
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Input record or separator has not been set
    #[error("cannot tokenize: {0} is not set")]
    MissingContext(&'static str),

    /// Requested token index is past the end of the record
    #[error("token index {index} out of range for record with {len} tokens")]
    TokenOutOfRange { index: usize, len: usize },

    /// Every candidate delimiter occurs in the values to encode
    #[error("no delimiter candidate is free of the values to encode")]
    NoUniqueSeparator,
}

impl RecordError {
    /// Whether the record itself was incomplete rather than too short
    #[inline]
    #[must_use]
    pub fn is_missing_context(&self) -> bool {
        matches!(self, Self::MissingContext(_))
    }
}
