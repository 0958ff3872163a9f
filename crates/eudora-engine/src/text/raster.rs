use std::path::Path;

use crate::error::{EngineError, Result};

/// One rasterized glyph as produced by a [`GlyphFace`].
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    pub code: u8,
    pub width: u32,
    pub height: u32,
    /// Row-major 8-bit coverage, `width * height` bytes.
    pub bitmap: Vec<u8>,
    /// Offset from the pen position to the bitmap's left edge and from the
    /// baseline up to its top edge, in pixels.
    pub bearing: (i32, i32),
    /// Horizontal advance in 1/64 pixel.
    pub advance: u32,
}

impl RasterizedGlyph {
    /// Glyph with no coverage, only an advance (space and control codes).
    pub fn empty(code: u8, advance: u32) -> Self {
        Self {
            code,
            width: 0,
            height: 0,
            bitmap: Vec::new(),
            bearing: (0, 0),
            advance,
        }
    }
}

/// A font opened at a fixed pixel size.
pub trait GlyphFace {
    fn rasterize(&self, code: u8) -> Result<RasterizedGlyph>;
}

/// Font-file collaborator of the text engine.
pub trait FontRasterizer {
    fn load(&self, path: &Path, pixel_size: u32) -> Result<Box<dyn GlyphFace>>;
}

/// [`FontRasterizer`] backed by `fontdue`.
#[derive(Debug, Default, Copy, Clone)]
pub struct FontdueRasterizer;

impl FontRasterizer for FontdueRasterizer {
    fn load(&self, path: &Path, pixel_size: u32) -> Result<Box<dyn GlyphFace>> {
        let bytes = std::fs::read(path).map_err(|e| EngineError::FontLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings = fontdue::FontSettings {
            scale: pixel_size as f32,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(bytes, settings).map_err(|e| EngineError::FontLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Box::new(FontdueFace {
            font,
            px: pixel_size as f32,
        }))
    }
}

struct FontdueFace {
    font: fontdue::Font,
    px: f32,
}

impl GlyphFace for FontdueFace {
    fn rasterize(&self, code: u8) -> Result<RasterizedGlyph> {
        let (metrics, bitmap) = self.font.rasterize(char::from(code), self.px);
        if bitmap.len() != metrics.width * metrics.height {
            return Err(EngineError::GlyphRaster {
                code,
                message: format!(
                    "bitmap holds {} bytes for a {}x{} glyph",
                    bitmap.len(),
                    metrics.width,
                    metrics.height
                ),
            });
        }
        if !metrics.advance_width.is_finite() || metrics.advance_width < 0.0 {
            return Err(EngineError::GlyphRaster {
                code,
                message: format!("invalid advance {}", metrics.advance_width),
            });
        }
        Ok(RasterizedGlyph {
            code,
            width: metrics.width as u32,
            height: metrics.height as u32,
            bitmap,
            bearing: (metrics.xmin, metrics.ymin + metrics.height as i32),
            advance: (metrics.advance_width * 64.0).round() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_file_is_a_load_error() {
        let err = FontdueRasterizer
            .load(Path::new("/nonexistent/eudora/font.ttf"), 32)
            .err()
            .unwrap();
        match err {
            EngineError::FontLoad { path, .. } => assert!(path.ends_with("font.ttf")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let path = std::env::temp_dir().join(format!("eudora-raster-{}.ttf", std::process::id()));
        std::fs::write(&path, b"not a font").unwrap();
        let result = FontdueRasterizer.load(&path, 32);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(EngineError::FontLoad { .. })));
    }
}
