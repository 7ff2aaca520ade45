//! Rhombus Pattern - diamond text layout
//!
//! Renders a repeating word into a symmetric diamond:
//! - Odd row count (even requests are bumped by one)
//! - Row widths `1, 3, 5, …, peak, …, 5, 3, 1`
//! - Each row starts one character further into the word
//! - Every row centered to the peak width
//!
//! # Example
//!
//! ```rust
//! use rhombus_pattern::PatternGenerator;
//!
//! let generator = PatternGenerator::default();
//! let result = generator.generate(3).unwrap();
//!
//! assert_eq!(result.rows(), [" F ", "ORM", " R "]);
//! assert_eq!(result.to_string(), " F \nORM\n R ");
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod generator;
pub mod word;

pub use error::PatternError;
pub use generator::{
    center, generate_pattern, row_widths, PatternGenerator, PatternRequest, PatternResult,
    RenderedPattern,
};
pub use word::{Word, DEFAULT_WORD};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for rendering patterns
    pub use crate::{
        generate_pattern, PatternError, PatternGenerator, PatternResult, RenderedPattern, Word,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
