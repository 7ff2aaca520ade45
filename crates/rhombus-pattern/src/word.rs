//! Repeating glyph source for diamond rows

use crate::error::PatternError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Word used when none is configured
pub const DEFAULT_WORD: &str = "FORMULAQSOLUTIONS";

/// Non-empty word whose characters fill the diamond
///
/// Length is measured in `char`s, so multi-byte words lay out one glyph per
/// column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word {
    text: String,
    char_len: usize,
}

impl Word {
    /// Create a word, rejecting the empty string
    ///
    /// # Errors
    /// - `PatternError::EmptyWord` if `text` has no characters
    pub fn new(text: impl Into<String>) -> Result<Self, PatternError> {
        let text = text.into();
        let char_len = text.chars().count();
        if char_len == 0 {
            return Err(PatternError::EmptyWord);
        }
        Ok(Self { text, char_len })
    }

    /// Word text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of characters (always at least one)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.char_len
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Endless character stream starting at `offset mod len`
    pub fn cycle_from(&self, offset: usize) -> impl Iterator<Item = char> + '_ {
        self.text.chars().cycle().skip(offset % self.char_len)
    }
}

impl Default for Word {
    fn default() -> Self {
        Self {
            text: DEFAULT_WORD.to_string(),
            char_len: DEFAULT_WORD.chars().count(),
        }
    }
}

impl FromStr for Word {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Word {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.text
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_word() {
        let word = Word::default();
        assert_eq!(word.as_str(), "FORMULAQSOLUTIONS");
        assert_eq!(word.len(), 17);
    }

    #[test]
    fn empty_word_rejected() {
        assert_eq!(Word::new(""), Err(PatternError::EmptyWord));
        assert!("".parse::<Word>().is_err());
    }

    #[test]
    fn cycle_wraps_past_end() {
        let word = Word::new("ABC").unwrap();
        let chars: String = word.cycle_from(2).take(7).collect();
        assert_eq!(chars, "CABCABC");
    }

    #[test]
    fn cycle_offset_is_modular() {
        let word = Word::new("ABC").unwrap();
        let a: String = word.cycle_from(1).take(4).collect();
        let b: String = word.cycle_from(7).take(4).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn multibyte_length_counts_chars() {
        let word = Word::new("αβγ").unwrap();
        assert_eq!(word.len(), 3);
        let chars: String = word.cycle_from(1).take(3).collect();
        assert_eq!(chars, "βγα");
    }

    #[test]
    fn default_matches_explicit_construction() {
        let explicit = Word::new(DEFAULT_WORD).unwrap();
        assert_eq!(Word::default(), explicit);
        assert_eq!(Word::default().len(), DEFAULT_WORD.chars().count());
    }

    #[test]
    fn serde_rejects_empty() {
        let ok: Word = serde_json::from_str("\"XY\"").unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<Word>("\"\"").is_err());
    }
}
