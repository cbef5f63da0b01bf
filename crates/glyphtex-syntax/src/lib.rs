//! # glyphtex syntax
//!
//! Turns a small LaTeX subset (letters, digits, Greek letters, spacing
//! commands, braces, `^`/`_` scripts and `\\` line breaks) into a tree of
//! [`Segment`]s ready for layout.
//!
//! ```text
//! markup ──► Lexer ──► [Token] ──► Parser ──► Segment tree
//! ```
//!
//! ```
//! use glyphtex_syntax::parse;
//!
//! let tree = parse(r"x^2_i").unwrap();
//! assert_eq!(tree.glyph_count(), 3);
//! assert_eq!(
//!     tree.to_string(),
//!     "(group (glyph body-italic 'x') (supsub (glyph upright '2') (glyph body-italic 'i')))"
//! );
//! ```

pub mod lexer;
pub mod parser;
pub mod segment;
pub mod tables;
pub mod token;

pub use lexer::{tokenize, GapPolicy, LexError, Lexer, TokenDescriptor};
pub use parser::{parse, parse_all, parse_with, ParseError};
pub use rowan::{TextRange, TextSize};
pub use segment::{LogicalFont, Point, Segment, SegmentKind};
pub use token::{Token, TokenKind};

/// Any failure turning markup into a segment tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
