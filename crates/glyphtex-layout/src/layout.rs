use crate::config::LayoutConfig;
use crate::metrics::{FontMetrics, MetricsError};
use glyphtex_syntax::{LogicalFont, Point, Segment, SegmentKind};
use serde::Serialize;

/// A renderer-ready glyph: font, index, size and baseline position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphDescriptor {
    pub font: LogicalFont,
    pub ch: char,
    pub glyph_index: u16,
    /// Absolute size: root size times every enclosing scale.
    pub size: f64,
    /// Absolute baseline origin, y pointing up.
    pub offset: Point,
    pub advance_width: f64,
    pub advance_height: f64,
}

/// The output of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// Glyphs in document order.
    pub glyphs: Vec<GlyphDescriptor>,
    /// Width of the widest line, in absolute units.
    pub width: f64,
    /// Height of the tallest element, in absolute units.
    pub height: f64,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("root size must be positive and finite, got {0}")]
    InvalidRootSize(f64),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Where a segment's local origin sits and how much it is scaled, both in
/// normalized (root em) units.
#[derive(Debug, Clone, Copy)]
struct Frame {
    origin: Point,
    scale: f64,
}

impl Frame {
    const ROOT: Frame = Frame {
        origin: Point::ORIGIN,
        scale: 1.0,
    };

    /// Applies a segment's own transform. Its offset is measured in this frame.
    fn enter(self, segment: &Segment) -> Frame {
        Frame {
            origin: self.origin + segment.offset * self.scale,
            scale: self.scale * segment.scale,
        }
    }

    fn shifted(self, by: Point) -> Frame {
        Frame {
            origin: self.origin + by,
            scale: self.scale,
        }
    }

    /// A child frame raised by `shift` local units and scaled by `factor`.
    fn script(self, shift: f64, factor: f64) -> Frame {
        Frame {
            origin: self.origin + Point::new(0.0, shift * self.scale),
            scale: self.scale * factor,
        }
    }
}

/// Normalized width and height of a laid out segment.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    width: f64,
    height: f64,
}

struct Walker<'m, M: ?Sized> {
    metrics: &'m M,
    config: &'m LayoutConfig,
    glyphs: Vec<GlyphDescriptor>,
}

impl<M: FontMetrics + ?Sized> Walker<'_, M> {
    fn walk(&mut self, segment: &Segment, parent: Frame) -> Result<Extent, LayoutError> {
        let frame = parent.enter(segment);

        match &segment.kind {
            SegmentKind::Empty | SegmentKind::LineBreak => Ok(Extent::default()),
            SegmentKind::Glyph { font, ch } => self.glyph(*font, *ch, frame),
            SegmentKind::Space { width, height } => Ok(Extent {
                width: width * frame.scale,
                height: height * frame.scale,
            }),
            SegmentKind::Group { children } => self.group(children, frame),
            SegmentKind::SupSub {
                superscript,
                subscript,
            } => {
                let style = self.config.script;
                let sup = self.walk(
                    superscript,
                    frame.script(style.superscript_shift, style.scale),
                )?;
                let sub = self.walk(subscript, frame.script(style.subscript_shift, style.scale))?;
                Ok(Extent {
                    width: sup.width.max(sub.width),
                    height: sup.height + sub.height + style.gap * frame.scale,
                })
            }
        }
    }

    fn glyph(&mut self, font: LogicalFont, ch: char, frame: Frame) -> Result<Extent, LayoutError> {
        let metrics = self.metrics.resolve(font, ch)?;
        let root_size = self.config.root_size;
        let size = root_size * frame.scale;

        self.glyphs.push(GlyphDescriptor {
            font,
            ch,
            glyph_index: metrics.glyph_index,
            size,
            offset: frame.origin * root_size,
            advance_width: metrics.advance_width * size,
            advance_height: metrics.advance_height * size,
        });

        Ok(Extent {
            width: metrics.advance_width * frame.scale,
            height: metrics.advance_height * frame.scale,
        })
    }

    fn group(&mut self, children: &[Segment], frame: Frame) -> Result<Extent, LayoutError> {
        let line_step = self.config.line_height * frame.scale;
        let mut x = 0.0;
        let mut y = 0.0;
        let mut widest = f64::NEG_INFINITY;
        let mut height = 0.0_f64;

        for child in children {
            if matches!(child.kind, SegmentKind::LineBreak) {
                widest = widest.max(x);
                x = 0.0;
                y -= line_step;
                continue;
            }
            let extent = self.walk(child, frame.shifted(Point::new(x, y)))?;
            x += extent.width;
            height = height.max(extent.height);
        }

        Ok(Extent {
            width: widest.max(x),
            height,
        })
    }
}

/// Lays out a segment tree into absolutely positioned glyphs.
///
/// Glyphs come out in document order. Offsets and sizes are in the same
/// absolute units as `config.root_size`.
pub fn layout<M: FontMetrics + ?Sized>(
    segment: &Segment,
    metrics: &M,
    config: &LayoutConfig,
) -> Result<Layout, LayoutError> {
    let root_size = config.root_size;
    if !(root_size.is_finite() && root_size > 0.0) {
        return Err(LayoutError::InvalidRootSize(root_size));
    }

    let mut walker = Walker {
        metrics,
        config,
        glyphs: Vec::with_capacity(segment.glyph_count()),
    };
    let extent = walker.walk(segment, Frame::ROOT)?;
    log::debug!(
        "laid out {} glyphs, extent {}x{}",
        walker.glyphs.len(),
        extent.width,
        extent.height
    );

    Ok(Layout {
        glyphs: walker.glyphs,
        width: extent.width * root_size,
        height: extent.height * root_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{FixedMetrics, GlyphMetrics, TableMetrics};

    fn config() -> LayoutConfig {
        LayoutConfig::default().with_root_size(10.0)
    }

    fn glyph(ch: char) -> Segment {
        Segment::glyph(LogicalFont::BodyItalic, ch)
    }

    #[test]
    fn test_empty_segment() {
        let result = layout(&Segment::empty(), &FixedMetrics::default(), &config()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.width, 0.0);
        assert_eq!(result.height, 0.0);
    }

    #[test]
    fn test_single_glyph() {
        let result = layout(&glyph('a'), &FixedMetrics::new(0.5, 0.8), &config()).unwrap();
        assert_eq!(result.glyphs.len(), 1);
        let a = &result.glyphs[0];
        assert_eq!(a.glyph_index, 97);
        assert_eq!(a.size, 10.0);
        assert_eq!(a.offset, Point::ORIGIN);
        assert_eq!(a.advance_width, 5.0);
        assert_eq!(a.advance_height, 8.0);
        assert_eq!(result.width, 5.0);
        assert_eq!(result.height, 8.0);
    }

    #[test]
    fn test_own_transform_composes_with_parent() {
        // The inner glyph's offset is measured in the (already halved) group frame.
        let tree = Segment::group(vec![
            glyph('a').with_scale(0.5).with_offset(Point::new(1.0, 1.0)),
        ])
        .with_scale(0.5)
        .with_offset(Point::new(2.0, 0.0));

        let result = layout(&tree, &FixedMetrics::default(), &config()).unwrap();
        let a = &result.glyphs[0];
        assert_eq!(a.size, 2.5);
        // (2 + 1 * 0.5, 0 + 1 * 0.5) * 10
        assert_eq!(a.offset, Point::new(25.0, 5.0));
    }

    #[test]
    fn test_siblings_keep_their_own_scale() {
        let tree = Segment::group(vec![glyph('a').with_scale(2.0), glyph('b')]);
        let result = layout(&tree, &FixedMetrics::new(0.5, 1.0), &config()).unwrap();
        assert_eq!(result.glyphs[0].size, 20.0);
        assert_eq!(result.glyphs[1].size, 10.0);
        // b starts after a's doubled advance.
        assert_eq!(result.glyphs[1].offset.x, 10.0);
    }

    #[test]
    fn test_group_width_is_widest_line() {
        let tree = Segment::group(vec![
            glyph('a'),
            glyph('b'),
            glyph('c'),
            Segment::line_break(),
            glyph('d'),
        ]);
        let result = layout(&tree, &FixedMetrics::new(0.5, 1.0), &config()).unwrap();
        assert_eq!(result.width, 15.0);
        assert_eq!(result.glyphs[3].offset, Point::new(0.0, -10.0));
    }

    #[test]
    fn test_line_break_in_scaled_group() {
        let tree = Segment::group(vec![glyph('a'), Segment::line_break(), glyph('b')])
            .with_scale(0.5);
        let result = layout(&tree, &FixedMetrics::default(), &config()).unwrap();
        assert_eq!(result.glyphs[1].offset, Point::new(0.0, -5.0));
    }

    #[test]
    fn test_negative_space_pulls_back() {
        let tree = Segment::group(vec![glyph('a'), Segment::space(-0.25), glyph('b')]);
        let result = layout(&tree, &FixedMetrics::new(0.5, 1.0), &config()).unwrap();
        assert_eq!(result.glyphs[1].offset.x, 2.5);
    }

    #[test]
    fn test_sup_sub_extent() {
        let tree = Segment::sup_sub(
            Segment::group(vec![glyph('a'), glyph('b')]),
            glyph('c'),
        );
        let result = layout(&tree, &FixedMetrics::new(0.5, 1.0), &config()).unwrap();
        assert_eq!(result.glyphs.len(), 3);
        // Superscript branch first.
        assert_eq!(result.glyphs[0].ch, 'a');
        assert_eq!(result.glyphs[2].ch, 'c');
        assert!((result.width - 7.0).abs() < 1e-9);
        assert!((result.height - (7.0 + 7.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_glyph_is_reported() {
        let table = TableMetrics::new().with(
            LogicalFont::BodyItalic,
            'a',
            GlyphMetrics {
                glyph_index: 1,
                advance_width: 0.5,
                advance_height: 1.0,
            },
        );
        let tree = Segment::group(vec![glyph('a'), glyph('b')]);
        assert_eq!(
            layout(&tree, &table, &config()),
            Err(LayoutError::Metrics(MetricsError::MissingGlyph {
                font: LogicalFont::BodyItalic,
                ch: 'b'
            }))
        );
    }

    #[test]
    fn test_invalid_root_size() {
        for size in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = LayoutConfig::default().with_root_size(size);
            assert!(matches!(
                layout(&glyph('a'), &FixedMetrics::default(), &config),
                Err(LayoutError::InvalidRootSize(_))
            ));
        }
    }

    #[test]
    fn test_layout_does_not_touch_tree() {
        let tree = Segment::group(vec![glyph('a'), Segment::sup_sub(glyph('b'), glyph('c'))]);
        let before = tree.clone();
        let first = layout(&tree, &FixedMetrics::default(), &config()).unwrap();
        let second = layout(&tree, &FixedMetrics::default(), &config()).unwrap();
        assert_eq!(tree, before);
        assert_eq!(first, second);
    }
}
