use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::render::{VertexFormat, VertexLayout};

use super::FontId;

/// Index pattern of one glyph quad.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// One corner of a glyph quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    /// NDC position in `xy`, corner UV (0 or 1) in `zw`.
    pub pos_uv: [f32; 4],
    /// Atlas crop `(x, y, w, h)`.
    pub crop: [f32; 4],
    pub color: [f32; 4],
}

impl GlyphVertex {
    pub fn layout() -> VertexLayout {
        VertexLayout::packed(&[VertexFormat::Float32x4; 3])
    }
}

/// Run of consecutive quads drawn with the same font atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub font: FontId,
    pub indices: Range<u32>,
}

/// Vertex and index buffers accumulated over a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    vertices: Vec<GlyphVertex>,
    indices: Vec<u32>,
    batches: Vec<DrawBatch>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.batches.clear();
    }

    /// Appends a quad given as bottom-left, top-left, top-right, bottom-right.
    pub fn push_quad(&mut self, font: FontId, quad: [GlyphVertex; 4]) {
        let base = self.vertices.len() as u32;
        let first_index = self.indices.len() as u32;
        self.vertices.extend_from_slice(&quad);
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));

        let end = self.indices.len() as u32;
        match self.batches.last_mut() {
            Some(batch) if batch.font == font => batch.indices.end = end,
            _ => self.batches.push(DrawBatch {
                font,
                indices: first_index..end,
            }),
        }
    }

    pub fn vertices(&self) -> &[GlyphVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> [GlyphVertex; 4] {
        [GlyphVertex::zeroed(); 4]
    }

    #[test]
    fn vertex_is_three_vec4s() {
        assert_eq!(std::mem::size_of::<GlyphVertex>(), 48);
        assert_eq!(GlyphVertex::layout().stride, 48);
    }

    #[test]
    fn indices_follow_quad_pattern() {
        let mut geom = Geometry::new();
        geom.push_quad(FontId::FIRST, quad());
        geom.push_quad(FontId::FIRST, quad());
        assert_eq!(geom.indices(), &[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
        assert_eq!(geom.indices().len(), 6 * geom.quad_count());
        assert_eq!(geom.vertex_bytes().len(), 2 * 4 * 48);
    }

    #[test]
    fn font_changes_split_batches() {
        let a = FontId::FIRST;
        let b = FontId(2);
        let mut geom = Geometry::new();
        geom.push_quad(a, quad());
        geom.push_quad(a, quad());
        geom.push_quad(b, quad());
        geom.push_quad(a, quad());
        assert_eq!(
            geom.batches(),
            &[
                DrawBatch { font: a, indices: 0..12 },
                DrawBatch { font: b, indices: 12..18 },
                DrawBatch { font: a, indices: 18..24 },
            ]
        );
    }

    #[test]
    fn clear_drops_everything() {
        let mut geom = Geometry::new();
        geom.push_quad(FontId::FIRST, quad());
        geom.clear();
        assert!(geom.is_empty());
        assert!(geom.batches().is_empty());
    }
}
