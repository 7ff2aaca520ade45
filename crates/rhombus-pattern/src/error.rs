//! Error types for pattern generation

/// Pattern generation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Requested line count is not a positive integer
    #[error("invalid input: lines must be a positive integer, got {lines}")]
    InvalidInput {
        /// The rejected request
        lines: i64,
    },

    /// Glyph source word has no characters
    #[error("invalid word: must contain at least one character")]
    EmptyWord,
}

impl PatternError {
    /// Check if the error was caused by caller input
    #[inline]
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
