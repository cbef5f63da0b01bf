use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// A named style role, resolved to a concrete face by a metrics provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalFont {
    /// Letters, Greek letters and raw command text.
    BodyItalic,
    /// Digits and escaped literals.
    Upright,
}

impl LogicalFont {
    pub const ALL: [LogicalFont; 2] = [LogicalFont::BodyItalic, LogicalFont::Upright];

    pub fn name(self) -> &'static str {
        match self {
            LogicalFont::BodyItalic => "body-italic",
            LogicalFont::Upright => "upright",
        }
    }
}

impl fmt::Display for LogicalFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point relative to the baseline origin, y pointing up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A node of the parsed markup tree.
///
/// Every node carries its own `scale` and `offset`. Both apply to the node's
/// content and compose with those of its ancestors during layout; the parser
/// always produces the identity transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    #[serde(flatten)]
    pub kind: SegmentKind,
    pub scale: f64,
    pub offset: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    /// Nothing to draw and zero extent.
    Empty,
    Glyph {
        font: LogicalFont,
        ch: char,
    },
    /// Advances the cursor without drawing. Width and height are in em.
    Space {
        width: f64,
        height: f64,
    },
    LineBreak,
    Group {
        children: Vec<Segment>,
    },
    /// Either branch may be [`SegmentKind::Empty`], never both absent.
    SupSub {
        superscript: Box<Segment>,
        subscript: Box<Segment>,
    },
}

impl Segment {
    fn from_kind(kind: SegmentKind) -> Self {
        Self {
            kind,
            scale: 1.0,
            offset: Point::ORIGIN,
        }
    }

    pub fn empty() -> Self {
        Self::from_kind(SegmentKind::Empty)
    }

    pub fn glyph(font: LogicalFont, ch: char) -> Self {
        Self::from_kind(SegmentKind::Glyph { font, ch })
    }

    pub fn space(width: f64) -> Self {
        Self::from_kind(SegmentKind::Space { width, height: 0.0 })
    }

    pub fn line_break() -> Self {
        Self::from_kind(SegmentKind::LineBreak)
    }

    pub fn group(children: Vec<Segment>) -> Self {
        Self::from_kind(SegmentKind::Group { children })
    }

    pub fn sup_sub(superscript: Segment, subscript: Segment) -> Self {
        Self::from_kind(SegmentKind::SupSub {
            superscript: Box::new(superscript),
            subscript: Box::new(subscript),
        })
    }

    /// Collapses a run: nothing becomes `Empty`, a single segment stays as is,
    /// anything longer becomes a `Group`.
    pub fn from_run(mut segments: Vec<Segment>) -> Self {
        match segments.len() {
            0 => Self::empty(),
            1 => segments.remove(0),
            _ => Self::group(segments),
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, SegmentKind::Empty)
    }

    fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == Point::ORIGIN
    }

    /// Number of glyph leaves in this tree.
    pub fn glyph_count(&self) -> usize {
        match &self.kind {
            SegmentKind::Glyph { .. } => 1,
            SegmentKind::Group { children } => children.iter().map(Segment::glyph_count).sum(),
            SegmentKind::SupSub {
                superscript,
                subscript,
            } => superscript.glyph_count() + subscript.glyph_count(),
            SegmentKind::Empty | SegmentKind::Space { .. } | SegmentKind::LineBreak => 0,
        }
    }
}

/// Renders the tree as a compact s-expression, e.g.
/// `(group (glyph body-italic 'a') (supsub (glyph upright '2') ()))`.
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_identity() {
            write!(
                f,
                "(transform {} ({}, {}) ",
                self.scale, self.offset.x, self.offset.y
            )?;
        }

        match &self.kind {
            SegmentKind::Empty => f.write_str("()")?,
            SegmentKind::Glyph { font, ch } => write!(f, "(glyph {font} {ch:?})")?,
            SegmentKind::Space { width, height } if *height == 0.0 => {
                write!(f, "(space {width})")?
            }
            SegmentKind::Space { width, height } => write!(f, "(space {width} {height})")?,
            SegmentKind::LineBreak => f.write_str("(break)")?,
            SegmentKind::Group { children } => {
                f.write_str("(group")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                f.write_str(")")?;
            }
            SegmentKind::SupSub {
                superscript,
                subscript,
            } => write!(f, "(supsub {superscript} {subscript})")?,
        }

        if !self.is_identity() {
            f.write_str(")")?;
        }
        Ok(())
    }
}
