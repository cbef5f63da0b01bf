//! # glyphtex layout
//!
//! Composes a [`Segment`](glyphtex_syntax::Segment) tree into a flat,
//! document-ordered list of [`GlyphDescriptor`]s.
//!
//! ## Model
//!
//! Layout works in a normalized coordinate system where the root em is one
//! unit and y points up from the baseline. Each segment's own `scale`
//! multiplies its ancestors' and its `offset` is measured in the parent's
//! scaled frame. Groups advance a cursor left to right, `\\` resets it to the
//! start of the next line, and scripts are drawn at 0.7 scale raised by 0.45
//! or lowered by 0.2. The result is finally multiplied by the root size.
//!
//! Font data comes from a [`FontMetrics`] provider injected by the caller.
//!
//! ## Examples
//!
//! ```
//! use glyphtex_layout::{markup_to_glyphs, FixedMetrics, LayoutConfig};
//!
//! let config = LayoutConfig::default();
//! let layout = markup_to_glyphs("a^b", &FixedMetrics::new(0.5, 1.0), &config).unwrap();
//!
//! let (a, b) = (&layout.glyphs[0], &layout.glyphs[1]);
//! assert_eq!(b.size, 0.7 * a.size);
//! assert!((b.offset.y - 0.45 * config.root_size).abs() < 1e-9);
//! assert_eq!(b.offset.x, a.advance_width);
//! ```

pub mod batch;
pub mod config;
pub mod layout;
pub mod metrics;

pub use batch::{batch, RenderBatch};
pub use config::{ConfigError, LayoutConfig, ScriptStyle, DEFAULT_ROOT_SIZE};
pub use layout::{layout, GlyphDescriptor, Layout, LayoutError};
pub use metrics::{
    nearest_master, CachedMetrics, FixedMetrics, FontMetrics, GlyphMetrics, MetricsError,
    Substituting, TableMetrics,
};

use glyphtex_syntax::{Lexer, SyntaxError};

/// Any failure of the markup to glyphs pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Tokenizes, parses and lays out `markup` in one call.
pub fn markup_to_glyphs<M: FontMetrics + ?Sized>(
    markup: &str,
    metrics: &M,
    config: &LayoutConfig,
) -> Result<Layout, RenderError> {
    let lexer = Lexer::latex().with_gap_policy(config.gap_policy);
    let tree = glyphtex_syntax::parse_with(&lexer, markup)?;
    log::debug!("parsed tree with {} glyphs", tree.glyph_count());
    Ok(layout(&tree, metrics, config)?)
}
