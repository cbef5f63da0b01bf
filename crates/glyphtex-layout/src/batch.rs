use crate::layout::GlyphDescriptor;
use crate::metrics::FontMetrics;
use glyphtex_syntax::Point;
use serde::Serialize;
use std::collections::HashMap;

/// Glyphs sharing one concrete face and size, drawable in a single call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBatch {
    pub face: String,
    pub size: f64,
    pub glyph_indices: Vec<u16>,
    /// Absolute baseline positions, parallel to `glyph_indices`.
    pub offsets: Vec<Point>,
}

impl RenderBatch {
    pub fn len(&self) -> usize {
        self.glyph_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_indices.is_empty()
    }
}

/// Groups laid out glyphs by (concrete face, size) for batched drawing.
///
/// Batches appear in the order their first glyph appears, and glyphs keep
/// document order within a batch. Positions are copied unchanged.
pub fn batch<M: FontMetrics + ?Sized>(glyphs: &[GlyphDescriptor], metrics: &M) -> Vec<RenderBatch> {
    let mut batches: Vec<RenderBatch> = Vec::new();
    let mut index: HashMap<(String, u64), usize> = HashMap::new();

    for glyph in glyphs {
        let face = metrics.pick_variant(glyph.font, glyph.size);
        let key = (face.clone(), glyph.size.to_bits());
        let slot = *index.entry(key).or_insert_with(|| {
            batches.push(RenderBatch {
                face,
                size: glyph.size,
                glyph_indices: Vec::new(),
                offsets: Vec::new(),
            });
            batches.len() - 1
        });

        let batch = &mut batches[slot];
        batch.glyph_indices.push(glyph.glyph_index);
        batch.offsets.push(glyph.offset);
    }

    log::debug!("grouped {} glyphs into {} batches", glyphs.len(), batches.len());
    batches
}
