//! Font metrics providers.
//!
//! Layout never loads fonts itself. It asks a [`FontMetrics`] implementation
//! for the glyph index and normalized advances of each character. All
//! advances are relative to the em, so a glyph drawn at size `s` advances by
//! `advance_width * s`.

use dashmap::DashMap;
use glyphtex_syntax::LogicalFont;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Metrics of one resolved glyph, normalized to a 1-unit em.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphMetrics {
    pub glyph_index: u16,
    pub advance_width: f64,
    pub advance_height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("{font} has no glyph for {ch:?}")]
    MissingGlyph { font: LogicalFont, ch: char },
    #[error("{font} is unavailable: {reason}")]
    Unavailable { font: LogicalFont, reason: String },
}

/// Resolves characters of a logical font to glyph metrics.
pub trait FontMetrics {
    /// Fails with [`MetricsError::MissingGlyph`] when the font has no mapping for `ch`.
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError>;

    /// Names the concrete face used to draw `font` at `size`.
    ///
    /// Providers backed by optically-sized masters return the master closest
    /// to `size`; the default is the logical font's own name.
    fn pick_variant(&self, font: LogicalFont, _size: f64) -> String {
        font.name().to_string()
    }
}

impl<M: FontMetrics + ?Sized> FontMetrics for &M {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        (**self).resolve(font, ch)
    }

    fn pick_variant(&self, font: LogicalFont, size: f64) -> String {
        (**self).pick_variant(font, size)
    }
}

impl<M: FontMetrics + ?Sized> FontMetrics for Box<M> {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        (**self).resolve(font, ch)
    }

    fn pick_variant(&self, font: LogicalFont, size: f64) -> String {
        (**self).pick_variant(font, size)
    }
}

impl<M: FontMetrics + ?Sized> FontMetrics for Arc<M> {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        (**self).resolve(font, ch)
    }

    fn pick_variant(&self, font: LogicalFont, size: f64) -> String {
        (**self).pick_variant(font, size)
    }
}

/// Picks the master whose nominal size is numerically closest to `size`.
///
/// Ties go to the master listed first. Returns `None` for an empty list.
pub fn nearest_master(masters: &[u32], size: f64) -> Option<u32> {
    masters
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (f64::from(*a) - size).abs();
            let db = (f64::from(*b) - size).abs();
            da.total_cmp(&db)
        })
}

/// Uniform metrics: every character is its own glyph index with the same advances.
///
/// Useful for tests and for dumping layouts without font files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    pub advance_width: f64,
    pub advance_height: f64,
}

impl FixedMetrics {
    pub fn new(advance_width: f64, advance_height: f64) -> Self {
        Self {
            advance_width,
            advance_height,
        }
    }
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self::new(0.5, 1.0)
    }
}

impl FontMetrics for FixedMetrics {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        let glyph_index =
            u16::try_from(u32::from(ch)).map_err(|_| MetricsError::MissingGlyph { font, ch })?;
        Ok(GlyphMetrics {
            glyph_index,
            advance_width: self.advance_width,
            advance_height: self.advance_height,
        })
    }
}

/// Explicit per-character metrics. Anything not in the table is missing.
#[derive(Debug, Clone, Default)]
pub struct TableMetrics {
    entries: HashMap<(LogicalFont, char), GlyphMetrics>,
}

impl TableMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, font: LogicalFont, ch: char, metrics: GlyphMetrics) {
        self.entries.insert((font, ch), metrics);
    }

    pub fn with(mut self, font: LogicalFont, ch: char, metrics: GlyphMetrics) -> Self {
        self.insert(font, ch, metrics);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FontMetrics for TableMetrics {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        self.entries
            .get(&(font, ch))
            .copied()
            .ok_or(MetricsError::MissingGlyph { font, ch })
    }
}

/// Falls back to a placeholder character when the inner provider has no glyph.
#[derive(Debug, Clone)]
pub struct Substituting<M> {
    inner: M,
    placeholder: char,
}

impl<M> Substituting<M> {
    pub fn new(inner: M, placeholder: char) -> Self {
        Self { inner, placeholder }
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: FontMetrics> FontMetrics for Substituting<M> {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        match self.inner.resolve(font, ch) {
            Err(MetricsError::MissingGlyph { .. }) if ch != self.placeholder => {
                log::warn!(
                    "{} has no glyph for {:?}, substituting {:?}",
                    font,
                    ch,
                    self.placeholder
                );
                self.inner.resolve(font, self.placeholder)
            }
            other => other,
        }
    }

    fn pick_variant(&self, font: LogicalFont, size: f64) -> String {
        self.inner.pick_variant(font, size)
    }
}

/// Memoizes successful resolutions of the inner provider.
///
/// The cache belongs to this instance; two `CachedMetrics` never share entries.
#[derive(Debug)]
pub struct CachedMetrics<M> {
    inner: M,
    cache: DashMap<(LogicalFont, char), GlyphMetrics>,
}

impl<M> CachedMetrics<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: FontMetrics> FontMetrics for CachedMetrics<M> {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        if let Some(hit) = self.cache.get(&(font, ch)) {
            return Ok(*hit);
        }
        let metrics = self.inner.resolve(font, ch)?;
        self.cache.insert((font, ch), metrics);
        Ok(metrics)
    }

    fn pick_variant(&self, font: LogicalFont, size: f64) -> String {
        self.inner.pick_variant(font, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const A: GlyphMetrics = GlyphMetrics {
        glyph_index: 36,
        advance_width: 0.5,
        advance_height: 0.7,
    };

    #[test]
    fn test_nearest_master() {
        let masters = [5, 6, 7, 8, 9, 10, 12];
        assert_eq!(nearest_master(&masters, 10.0), Some(10));
        assert_eq!(nearest_master(&masters, 20.0), Some(12));
        assert_eq!(nearest_master(&masters, 7.4), Some(7));
        assert_eq!(nearest_master(&masters, 1.0), Some(5));
        // 11 is as close to 10 as to 12; the earlier master wins.
        assert_eq!(nearest_master(&masters, 11.0), Some(10));
        assert_eq!(nearest_master(&[], 10.0), None);
    }

    #[test]
    fn test_fixed_metrics() {
        let metrics = FixedMetrics::new(0.6, 0.9);
        let m = metrics.resolve(LogicalFont::Upright, 'A').unwrap();
        assert_eq!(m.glyph_index, 65);
        assert_eq!(m.advance_width, 0.6);
        assert_eq!(
            metrics.resolve(LogicalFont::Upright, '\u{1F600}'),
            Err(MetricsError::MissingGlyph {
                font: LogicalFont::Upright,
                ch: '\u{1F600}'
            })
        );
    }

    #[test]
    fn test_table_metrics() {
        let table = TableMetrics::new().with(LogicalFont::BodyItalic, 'a', A);
        assert_eq!(table.resolve(LogicalFont::BodyItalic, 'a'), Ok(A));
        assert!(table.resolve(LogicalFont::Upright, 'a').is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_substituting() {
        let table = TableMetrics::new().with(LogicalFont::BodyItalic, '?', A);
        let metrics = Substituting::new(table, '?');
        assert_eq!(metrics.resolve(LogicalFont::BodyItalic, 'z'), Ok(A));
        // No placeholder in this font either: the failure still surfaces.
        assert!(metrics.resolve(LogicalFont::Upright, 'z').is_err());
    }

    struct Counting {
        calls: AtomicUsize,
    }

    impl FontMetrics for Counting {
        fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FixedMetrics::default().resolve(font, ch)
        }
    }

    #[test]
    fn test_cached_metrics_resolves_once_per_key() {
        let cached = CachedMetrics::new(Counting {
            calls: AtomicUsize::new(0),
        });
        for _ in 0..3 {
            cached.resolve(LogicalFont::BodyItalic, 'x').unwrap();
        }
        cached.resolve(LogicalFont::Upright, 'x').unwrap();

        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached_len(), 2);
    }

    #[test]
    fn test_default_variant_is_logical_name() {
        assert_eq!(
            FixedMetrics::default().pick_variant(LogicalFont::BodyItalic, 12.0),
            "body-italic"
        );
    }
}
