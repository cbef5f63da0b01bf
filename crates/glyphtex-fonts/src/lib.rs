//! TrueType-backed [`FontMetrics`] for glyphtex.
//!
//! A [`FontDirectory`] maps each logical font to a family of `.ttf` files in
//! one directory, named `<stem><master>.ttf` where the master is an optical
//! size (`cmmi10.ttf`, `cmmi7.ttf`) or plain `<stem>.ttf` when the family has
//! a single face. Defaults are the Computer Modern Unicode faces.
//!
//! A `fonts.json` manifest in the directory overrides the defaults:
//!
//! ```json
//! {
//!   "body-italic": { "stem": "cmmi", "masters": [5, 7, 10] },
//!   "upright": { "stem": "cmr", "masters": [5, 7, 10, 12, 17] }
//! }
//! ```

use dashmap::DashMap;
use glyphtex_layout::{nearest_master, FontMetrics, GlyphMetrics, MetricsError};
use glyphtex_syntax::LogicalFont;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MANIFEST_FILE: &str = "fonts.json";

/// Size used to pick a master when metrics are requested without one.
pub const NOMINAL_SIZE: f64 = 10.0;

/// One logical font's family of files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSource {
    pub stem: String,
    /// Nominal sizes with a dedicated file, in preference order on ties.
    #[serde(default)]
    pub masters: Vec<u32>,
}

impl FontSource {
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            masters: Vec::new(),
        }
    }

    pub fn with_masters(mut self, masters: Vec<u32>) -> Self {
        self.masters = masters;
        self
    }

    /// The face drawn at `size`: the stem followed by the nearest master.
    pub fn face_name(&self, size: f64) -> String {
        match nearest_master(&self.masters, size) {
            Some(master) => format!("{}{}", self.stem, master),
            None => self.stem.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Manifest {
    body_italic: Option<FontSource>,
    upright: Option<FontSource>,
}

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse font file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ttf_parser::FaceParsingError,
    },
    #[error("face {face} has no glyph for {ch:?}")]
    MissingGlyph { face: String, ch: char },
    #[error("face {face} has no horizontal advance for {ch:?}")]
    MissingAdvance { face: String, ch: char },
    #[error("invalid font manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Metrics read from font files in a directory.
///
/// File contents are loaded on first use and kept for the lifetime of the
/// instance. Each lookup re-reads the face's tables from those bytes, so
/// layouts that resolve the same characters repeatedly should wrap the
/// directory in [`CachedMetrics`](glyphtex_layout::CachedMetrics).
///
/// [`resolve`](FontMetrics::resolve) has no size to go by and always reads
/// the master nearest [`NOMINAL_SIZE`], while
/// [`pick_variant`](FontMetrics::pick_variant) names the master for the
/// size actually drawn. With several masters a script glyph is therefore
/// measured in the 10pt face and drawn from a smaller one; optical masters
/// share glyph indices and normalized advances only approximately.
pub struct FontDirectory {
    root: PathBuf,
    body_italic: FontSource,
    upright: FontSource,
    faces: DashMap<String, Arc<[u8]>>,
}

impl FontDirectory {
    /// A directory using the default Computer Modern Unicode faces.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            body_italic: FontSource::new("cmunti"),
            upright: FontSource::new("cmunrm"),
            faces: DashMap::new(),
        }
    }

    /// Like [`FontDirectory::new`], then applies the directory's manifest if
    /// it has one.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FontError> {
        let mut directory = Self::new(root);
        let path = directory.root.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(directory);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| FontError::Read {
            path: path.clone(),
            source,
        })?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        if let Some(source) = manifest.body_italic {
            directory.body_italic = source;
        }
        if let Some(source) = manifest.upright {
            directory.upright = source;
        }
        log::info!("Loaded font manifest from {:?}", path);
        Ok(directory)
    }

    pub fn with_source(mut self, font: LogicalFont, source: FontSource) -> Self {
        match font {
            LogicalFont::BodyItalic => self.body_italic = source,
            LogicalFont::Upright => self.upright = source,
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self, font: LogicalFont) -> &FontSource {
        match font {
            LogicalFont::BodyItalic => &self.body_italic,
            LogicalFont::Upright => &self.upright,
        }
    }

    pub fn face_path(&self, face: &str) -> PathBuf {
        self.root.join(format!("{face}.ttf"))
    }

    /// Number of faces read so far.
    pub fn loaded_len(&self) -> usize {
        self.faces.len()
    }

    /// Parses `face`, reading its file on first use, and hands the parsed
    /// tables to `f`. Bytes are cached only once they parse.
    fn with_face<T>(
        &self,
        face: &str,
        f: impl FnOnce(&ttf_parser::Face<'_>) -> Result<T, FontError>,
    ) -> Result<T, FontError> {
        let cached = self.faces.get(face).map(|bytes| Arc::clone(&bytes));
        let fresh = cached.is_none();
        let bytes = match cached {
            Some(bytes) => bytes,
            None => {
                let path = self.face_path(face);
                let data = std::fs::read(&path).map_err(|source| FontError::Read { path, source })?;
                Arc::<[u8]>::from(data)
            }
        };

        let parsed = ttf_parser::Face::parse(&bytes, 0).map_err(|source| FontError::Parse {
            path: self.face_path(face),
            source,
        })?;
        if fresh {
            log::info!("Loaded face {} from {:?}", face, self.face_path(face));
            self.faces.insert(face.to_string(), Arc::clone(&bytes));
        }
        f(&parsed)
    }

    /// Metrics of `ch` in `face`, normalized to one em.
    pub fn glyph_metrics(&self, face: &str, ch: char) -> Result<GlyphMetrics, FontError> {
        self.with_face(face, |parsed| {
            let units_per_em = f64::from(parsed.units_per_em());

            let glyph = parsed
                .glyph_index(ch)
                .ok_or_else(|| FontError::MissingGlyph {
                    face: face.to_string(),
                    ch,
                })?;
            let advance = parsed
                .glyph_hor_advance(glyph)
                .ok_or_else(|| FontError::MissingAdvance {
                    face: face.to_string(),
                    ch,
                })?;
            // Horizontal fonts rarely carry vertical advances; fall back to the line extent.
            let height = match parsed.glyph_ver_advance(glyph) {
                Some(height) => f64::from(height),
                None => f64::from(parsed.ascender()) - f64::from(parsed.descender()),
            };

            Ok(GlyphMetrics {
                glyph_index: glyph.0,
                advance_width: f64::from(advance) / units_per_em,
                advance_height: height / units_per_em,
            })
        })
    }
}

impl FontMetrics for FontDirectory {
    fn resolve(&self, font: LogicalFont, ch: char) -> Result<GlyphMetrics, MetricsError> {
        let face = self.source(font).face_name(NOMINAL_SIZE);
        self.glyph_metrics(&face, ch).map_err(|err| match err {
            FontError::MissingGlyph { .. } => MetricsError::MissingGlyph { font, ch },
            other => MetricsError::Unavailable {
                font,
                reason: other.to_string(),
            },
        })
    }

    fn pick_variant(&self, font: LogicalFont, size: f64) -> String {
        self.source(font).face_name(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A two-glyph TrueType face (`.notdef` and `a`) with 1000 units per em,
    /// an 800/-200 line extent and advances of 500 and 600 units.
    fn tiny_face() -> Vec<u8> {
        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());

        let mut hhea = vec![0u8; 36];
        hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
        hhea[6..8].copy_from_slice(&(-200i16).to_be_bytes());
        hhea[34..36].copy_from_slice(&2u16.to_be_bytes());

        let mut maxp = Vec::new();
        maxp.extend(0x0000_5000u32.to_be_bytes());
        maxp.extend(2u16.to_be_bytes());

        let mut hmtx = Vec::new();
        for advance in [500u16, 600] {
            hmtx.extend(advance.to_be_bytes());
            hmtx.extend(0i16.to_be_bytes());
        }

        // One Unicode encoding record pointing at a format 12 subtable
        // mapping 'a' to glyph 1.
        let mut cmap = Vec::new();
        cmap.extend(0u16.to_be_bytes());
        cmap.extend(1u16.to_be_bytes());
        cmap.extend(0u16.to_be_bytes());
        cmap.extend(4u16.to_be_bytes());
        cmap.extend(12u32.to_be_bytes());
        cmap.extend(12u16.to_be_bytes());
        cmap.extend(0u16.to_be_bytes());
        cmap.extend(28u32.to_be_bytes());
        cmap.extend(0u32.to_be_bytes());
        cmap.extend(1u32.to_be_bytes());
        cmap.extend(u32::from('a').to_be_bytes());
        cmap.extend(u32::from('a').to_be_bytes());
        cmap.extend(1u32.to_be_bytes());

        // Records must be sorted by tag.
        let tables: [(&[u8; 4], Vec<u8>); 5] = [
            (b"cmap", cmap),
            (b"head", head),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
            (b"maxp", maxp),
        ];

        let header_len = 12 + 16 * tables.len();
        let mut font = Vec::new();
        font.extend(0x0001_0000u32.to_be_bytes());
        font.extend((tables.len() as u16).to_be_bytes());
        font.extend([0u8; 6]);

        let mut body: Vec<u8> = Vec::new();
        for (tag, data) in &tables {
            let offset = header_len + body.len();
            font.extend(tag.iter());
            font.extend(0u32.to_be_bytes());
            font.extend((offset as u32).to_be_bytes());
            font.extend((data.len() as u32).to_be_bytes());
            body.extend(data.iter());
            while body.len() % 4 != 0 {
                body.push(0);
            }
        }
        font.extend(body);
        font
    }

    fn directory_with(faces: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for face in faces {
            std::fs::write(dir.path().join(format!("{face}.ttf")), tiny_face()).unwrap();
        }
        dir
    }

    #[test]
    fn test_resolves_metrics_from_a_face() {
        let dir = directory_with(&["cmunti"]);
        let fonts = FontDirectory::new(dir.path());

        let a = fonts.resolve(LogicalFont::BodyItalic, 'a').unwrap();
        assert_eq!(a.glyph_index, 1);
        assert!((a.advance_width - 0.6).abs() < 1e-9);
        // No vertical metrics in the face: ascender minus descender.
        assert!((a.advance_height - 1.0).abs() < 1e-9);
        assert_eq!(fonts.loaded_len(), 1);

        assert_eq!(
            fonts.resolve(LogicalFont::BodyItalic, 'z'),
            Err(MetricsError::MissingGlyph {
                font: LogicalFont::BodyItalic,
                ch: 'z'
            })
        );
    }

    #[test]
    fn test_face_bytes_are_read_once() {
        let dir = directory_with(&["cmunti"]);
        let fonts = FontDirectory::new(dir.path());
        let first = fonts.resolve(LogicalFont::BodyItalic, 'a').unwrap();

        // Served from memory once loaded.
        std::fs::remove_file(dir.path().join("cmunti.ttf")).unwrap();
        let second = fonts.resolve(LogicalFont::BodyItalic, 'a').unwrap();
        assert_eq!(first, second);
        assert_eq!(fonts.loaded_len(), 1);
    }

    #[test]
    fn test_resolve_reads_the_nominal_master() {
        // Only the 10pt master exists; drawing at 7pt still names cmmi7.
        let dir = directory_with(&["cmmi10"]);
        let fonts = FontDirectory::new(dir.path()).with_source(
            LogicalFont::BodyItalic,
            FontSource::new("cmmi").with_masters(vec![7, 10]),
        );

        assert_eq!(fonts.resolve(LogicalFont::BodyItalic, 'a').unwrap().glyph_index, 1);
        assert_eq!(fonts.pick_variant(LogicalFont::BodyItalic, 7.0), "cmmi7");
        assert_eq!(fonts.pick_variant(LogicalFont::BodyItalic, 14.0), "cmmi10");
    }

    #[test]
    fn test_face_name_picks_nearest_master() {
        let source = FontSource::new("cmr").with_masters(vec![5, 7, 10, 12, 17]);
        assert_eq!(source.face_name(14.0), "cmr12");
        assert_eq!(source.face_name(20.0), "cmr17");
        assert_eq!(source.face_name(1.0), "cmr5");
        // 8.5 is as close to 7 as to 10; the earlier master wins.
        assert_eq!(source.face_name(8.5), "cmr7");
        assert_eq!(FontSource::new("cmunti").face_name(14.0), "cmunti");
    }

    #[test]
    fn test_defaults_and_paths() {
        let fonts = FontDirectory::new("/usr/share/fonts/cmu");
        assert_eq!(fonts.pick_variant(LogicalFont::BodyItalic, 20.0), "cmunti");
        assert_eq!(fonts.pick_variant(LogicalFont::Upright, 14.0), "cmunrm");
        assert_eq!(
            fonts.face_path("cmunrm"),
            PathBuf::from("/usr/share/fonts/cmu/cmunrm.ttf")
        );
    }

    #[test]
    fn test_with_source() {
        let fonts = FontDirectory::new(".").with_source(
            LogicalFont::Upright,
            FontSource::new("cmr").with_masters(vec![7, 10]),
        );
        assert_eq!(fonts.pick_variant(LogicalFont::Upright, 14.0), "cmr10");
        assert_eq!(fonts.pick_variant(LogicalFont::Upright, 7.0), "cmr7");
        assert_eq!(fonts.source(LogicalFont::BodyItalic).stem, "cmunti");
    }

    #[test]
    fn test_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{ "body-italic": { "stem": "cmmi", "masters": [5, 7, 10] } }"#,
        )
        .unwrap();

        let fonts = FontDirectory::open(dir.path()).unwrap();
        assert_eq!(fonts.pick_variant(LogicalFont::BodyItalic, 6.9), "cmmi7");
        assert_eq!(fonts.source(LogicalFont::Upright).stem, "cmunrm");

        std::fs::write(dir.path().join(MANIFEST_FILE), r#"{ "bold": {} }"#).unwrap();
        assert!(matches!(
            FontDirectory::open(dir.path()),
            Err(FontError::Manifest(_))
        ));
    }

    #[test]
    fn test_open_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontDirectory::open(dir.path()).unwrap();
        assert_eq!(fonts.root(), dir.path());
        assert_eq!(fonts.source(LogicalFont::BodyItalic).stem, "cmunti");
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontDirectory::new(dir.path());

        match fonts.resolve(LogicalFont::BodyItalic, 'x') {
            Err(MetricsError::Unavailable { font, reason }) => {
                assert_eq!(font, LogicalFont::BodyItalic);
                assert!(reason.contains("cmunti.ttf"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fonts.loaded_len(), 0);
    }

    #[test]
    fn test_garbage_file_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cmunrm.ttf"), b"not a font").unwrap();
        let fonts = FontDirectory::new(dir.path());

        assert!(matches!(
            fonts.glyph_metrics("cmunrm", '1'),
            Err(FontError::Parse { .. })
        ));
        assert!(matches!(
            fonts.resolve(LogicalFont::Upright, '1'),
            Err(MetricsError::Unavailable { .. })
        ));
        assert_eq!(fonts.loaded_len(), 0);
    }
}
