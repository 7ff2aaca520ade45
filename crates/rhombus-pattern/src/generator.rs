//! Diamond pattern generator
//!
//! Pure layout over a [`Word`]:
//! - Validate and normalize the requested height
//! - Build the odd width profile
//! - Fill each row from a rotating offset into the word
//! - Center rows to the peak width

use crate::error::PatternError;
use crate::word::Word;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter;

/// Largest grid (rows x columns) a single allocation can hold
const MAX_CELLS: usize = isize::MAX.unsigned_abs();

/// Validated request for a diamond of a given height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRequest {
    lines_requested: i64,
    effective_lines: usize,
}

impl PatternRequest {
    /// Validate a requested line count
    ///
    /// Even counts are bumped to the next odd number.
    ///
    /// # Errors
    /// - `PatternError::InvalidInput` if `lines_requested <= 0`, or if the
    ///   count or its square grid does not fit in memory on this platform
    pub fn new(lines_requested: i64) -> Result<Self, PatternError> {
        if lines_requested <= 0 {
            return Err(PatternError::InvalidInput {
                lines: lines_requested,
            });
        }
        // i64::MAX is odd, so bumping an even count cannot overflow
        let odd = if lines_requested % 2 == 0 {
            lines_requested + 1
        } else {
            lines_requested
        };
        let effective_lines = usize::try_from(odd)
            .ok()
            .filter(|&n| n.checked_mul(n).is_some_and(|cells| cells <= MAX_CELLS))
            .ok_or(PatternError::InvalidInput {
                lines: lines_requested,
            })?;
        Ok(Self {
            lines_requested,
            effective_lines,
        })
    }

    /// Line count as supplied by the caller
    #[inline]
    #[must_use]
    pub fn lines_requested(&self) -> i64 {
        self.lines_requested
    }

    /// Number of rows that will be produced (always odd)
    #[inline]
    #[must_use]
    pub fn effective_lines(&self) -> usize {
        self.effective_lines
    }
}

/// Content widths for a diamond of `effective_lines` rows
///
/// Ascending run of raw sizes `1..=mid+1` then descending `mid..=1`, each
/// mapped to `2r - 1`. For odd input the result has exactly
/// `effective_lines` entries and peaks at `effective_lines`.
#[must_use]
pub fn row_widths(effective_lines: usize) -> Vec<usize> {
    let mid = effective_lines / 2;
    (1..=mid + 1)
        .chain((1..=mid).rev())
        .map(|raw| 2 * raw - 1)
        .collect()
}

/// Pad `content` with spaces to `width` columns, odd remainder on the right
///
/// Content already at or beyond `width` is returned unchanged.
#[must_use]
pub fn center(content: &str, width: usize) -> String {
    let len = content.chars().count();
    let pad = width.saturating_sub(len);
    let left = pad / 2;
    let right = pad - left;

    let mut out = String::with_capacity(content.len() + pad);
    out.extend(iter::repeat(' ').take(left));
    out.push_str(content);
    out.extend(iter::repeat(' ').take(right));
    out
}

/// Rendered diamond
///
/// Immutable once built; all rows have `max_width` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternResult {
    lines_requested: i64,
    effective_lines: usize,
    max_width: usize,
    widths: Vec<usize>,
    rows: Vec<String>,
}

impl PatternResult {
    /// Centered rows, top to bottom
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Content width of each row before centering
    #[inline]
    #[must_use]
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Line count as supplied by the caller
    #[inline]
    #[must_use]
    pub fn lines_requested(&self) -> i64 {
        self.lines_requested
    }

    /// Number of rows produced
    #[inline]
    #[must_use]
    pub fn effective_lines(&self) -> usize {
        self.effective_lines
    }

    /// Width of every centered row
    #[inline]
    #[must_use]
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Rows joined by `\n`, no trailing newline
    #[must_use]
    pub fn text(&self) -> String {
        self.rows.join("\n")
    }

    /// Flatten into the serializable caller-facing shape
    #[must_use]
    pub fn into_rendered(self) -> RenderedPattern {
        RenderedPattern {
            text: self.text(),
            rows: self.effective_lines,
            width: self.max_width,
        }
    }
}

impl fmt::Display for PatternResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}

/// Caller-facing pattern: text plus its dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPattern {
    /// Rows joined by `\n`
    pub text: String,
    /// Number of rows
    pub rows: usize,
    /// Width of each row
    pub width: usize,
}

/// Stateless diamond generator over a fixed word
///
/// Cheap to clone and safe to share between threads; every call is
/// independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternGenerator {
    word: Word,
}

impl PatternGenerator {
    /// Create generator over `word`
    #[inline]
    #[must_use]
    pub fn new(word: Word) -> Self {
        Self { word }
    }

    /// Glyph source
    #[inline]
    #[must_use]
    pub fn word(&self) -> &Word {
        &self.word
    }

    /// Render a diamond of (at least) `lines_requested` rows
    ///
    /// # Errors
    /// - `PatternError::InvalidInput` if `lines_requested <= 0`
    pub fn generate(&self, lines_requested: i64) -> Result<PatternResult, PatternError> {
        let request = PatternRequest::new(lines_requested)?;
        Ok(self.render(request))
    }

    /// Render an already validated request
    #[must_use]
    pub fn render(&self, request: PatternRequest) -> PatternResult {
        let effective_lines = request.effective_lines();
        let max_width = effective_lines;
        let widths = row_widths(effective_lines);

        let rows = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let content: String = self.word.cycle_from(i).take(width).collect();
                center(&content, max_width)
            })
            .collect();

        PatternResult {
            lines_requested: request.lines_requested(),
            effective_lines,
            max_width,
            widths,
            rows,
        }
    }
}

/// Render with the default word into the caller-facing shape
///
/// # Errors
/// - `PatternError::InvalidInput` if `lines_requested <= 0`
pub fn generate_pattern(lines_requested: i64) -> Result<RenderedPattern, PatternError> {
    PatternGenerator::default()
        .generate(lines_requested)
        .map(PatternResult::into_rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_keeps_odd() {
        let req = PatternRequest::new(7).unwrap();
        assert_eq!(req.effective_lines(), 7);
        assert_eq!(req.lines_requested(), 7);
    }

    #[test]
    fn request_bumps_even() {
        assert_eq!(PatternRequest::new(8).unwrap().effective_lines(), 9);
    }

    #[test]
    fn request_rejects_non_positive() {
        assert_eq!(
            PatternRequest::new(0),
            Err(PatternError::InvalidInput { lines: 0 })
        );
        assert_eq!(
            PatternRequest::new(-3),
            Err(PatternError::InvalidInput { lines: -3 })
        );
    }

    #[test]
    fn request_rejects_unrepresentable_grid() {
        assert_eq!(
            PatternRequest::new(i64::MAX),
            Err(PatternError::InvalidInput { lines: i64::MAX })
        );
        assert!(PatternGenerator::default().generate(i64::MAX).is_err());
        assert!(PatternRequest::new(i64::from(u32::MAX) + 2).is_err());
    }

    #[test]
    fn width_count_matches_lines() {
        for n in [1_i64, 2, 3, 4, 5, 100, 101] {
            let eff = PatternRequest::new(n).unwrap().effective_lines();
            assert_eq!(row_widths(eff).len(), eff, "n = {n}");
        }
    }

    #[test]
    fn widths_for_five() {
        assert_eq!(row_widths(5), vec![1, 3, 5, 3, 1]);
    }

    #[test]
    fn center_even_padding() {
        assert_eq!(center("ab", 6), "  ab  ");
    }

    #[test]
    fn center_odd_padding_goes_right() {
        assert_eq!(center("ab", 5), " ab  ");
    }

    #[test]
    fn center_wider_content_untouched() {
        assert_eq!(center("abcdef", 3), "abcdef");
    }

    #[test]
    fn three_lines() {
        let result = PatternGenerator::default().generate(3).unwrap();
        assert_eq!(result.rows(), [" F ", "ORM", " R "]);
        assert_eq!(result.widths(), [1, 3, 1]);
        assert_eq!(result.max_width(), 3);
    }

    #[test]
    fn display_matches_text() {
        let result = PatternGenerator::default().generate(5).unwrap();
        assert_eq!(result.to_string(), result.text());
        assert!(!result.text().ends_with('\n'));
    }

    #[test]
    fn rendered_shape() {
        let rendered = generate_pattern(2).unwrap();
        assert_eq!(rendered.rows, 3);
        assert_eq!(rendered.width, 3);
        assert_eq!(rendered.text, " F \nORM\n R ");
    }

    #[test]
    fn custom_word_wraps() {
        let generator = PatternGenerator::new(Word::new("AB").unwrap());
        let result = generator.generate(5).unwrap();
        assert_eq!(result.rows(), ["  A  ", " BAB ", "ABABA", " BAB ", "  A  "]);
    }
}
