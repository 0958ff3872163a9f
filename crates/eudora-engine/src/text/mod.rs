//! Glyph text engine.
//!
//! Fonts are rasterized once per size into a [`FontAtlas`]. A [`TextEngine`]
//! document lays glyph quads out with a cursor in NDC, accumulating one
//! [`Geometry`] that is uploaded on `end_document` and drawn per font batch.

mod atlas;
mod geometry;
mod layout;
mod raster;
mod settings;

pub use atlas::{sharpen, FontAtlas, GlyphMetrics, SHARPEN_MIN_SIZE};
pub use geometry::{DrawBatch, Geometry, GlyphVertex, QUAD_INDICES};
pub use layout::{TextEngine, GLYPH_CODES};
pub use raster::{FontRasterizer, FontdueRasterizer, GlyphFace, RasterizedGlyph};
pub use settings::{Alignment, DocSettings, ParaSettings, TextSettings};

/// Font submitted to a [`TextEngine`]; ids count up from 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FontId(pub(crate) u32);

impl FontId {
    pub const FIRST: FontId = FontId(1);

    pub const fn raw(self) -> u32 {
        self.0
    }
}
