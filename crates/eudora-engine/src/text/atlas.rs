use std::collections::HashMap;

use crate::coords::Rect;
use crate::render::TextureHandle;

use super::raster::RasterizedGlyph;

/// Glyphs strictly larger than this on both axes are sharpened before packing.
pub const SHARPEN_MIN_SIZE: u32 = 10;

const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
const KERNEL_WIDTH: usize = 3;

/// Applies the 3x3 sharpening kernel to a single-channel bitmap.
///
/// Only interior pixels are written; the kernel reads the untouched input so
/// results do not bleed into each other.
pub fn sharpen(bitmap: &mut [u8], width: usize, height: usize) {
    if bitmap.len() < width * height || width < KERNEL_WIDTH || height < KERNEL_WIDTH {
        return;
    }
    let src = bitmap.to_vec();
    let offset = (KERNEL_WIDTH - 1) / 2;
    for y in 0..=height - KERNEL_WIDTH {
        for x in 0..=width - KERNEL_WIDTH {
            let mut total = 0.0f32;
            for fy in 0..KERNEL_WIDTH {
                for fx in 0..KERNEL_WIDTH {
                    let px = src[(y + fy) * width + x + fx] as f32;
                    total += px * SHARPEN_KERNEL[fy * KERNEL_WIDTH + fx];
                }
            }
            bitmap[(y + offset) * width + x + offset] = total.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Placement and metrics of one glyph inside a [`FontAtlas`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphMetrics {
    /// Normalized `(x, y, w, h)` of the glyph's bitmap in the atlas.
    pub crop: Rect,
    pub width: u32,
    pub height: u32,
    pub bearing: (i32, i32),
    /// 1/64 pixel.
    pub advance: u32,
}

impl GlyphMetrics {
    /// Whole-pixel advance.
    #[inline]
    pub fn advance_px(&self) -> u32 {
        self.advance >> 6
    }
}

/// All glyphs of one font packed into a square grid of equal cells.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    pixel_size: u32,
    grid: u32,
    cell_width: u32,
    cell_height: u32,
    pixels: Vec<u8>,
    glyphs: HashMap<u8, GlyphMetrics>,
    texture: Option<TextureHandle>,
}

impl FontAtlas {
    /// Packs glyphs row by row in input order.
    ///
    /// The grid has `ceil(sqrt(n)) + 1` cells per side and every cell is as large
    /// as the widest and tallest glyph.
    pub fn pack(pixel_size: u32, glyphs: &[RasterizedGlyph]) -> Self {
        let grid = (glyphs.len() as f64).sqrt().ceil() as u32 + 1;
        let cell_width = glyphs.iter().map(|g| g.width).max().unwrap_or(0).max(1);
        let cell_height = glyphs.iter().map(|g| g.height).max().unwrap_or(0).max(1);
        let sheet_width = (grid * cell_width) as usize;
        let sheet_height = (grid * cell_height) as usize;

        let mut pixels = vec![0u8; sheet_width * sheet_height];
        let mut placed = HashMap::with_capacity(glyphs.len());

        for (i, glyph) in glyphs.iter().enumerate() {
            let row = i as u32 / grid;
            let col = i as u32 % grid;
            let crop = Rect::new(
                col as f32 / grid as f32,
                row as f32 / grid as f32,
                glyph.width as f32 / (grid * cell_width) as f32,
                glyph.height as f32 / (grid * cell_height) as f32,
            );

            let w = glyph.width as usize;
            let x0 = (col * cell_width) as usize;
            let y0 = (row * cell_height) as usize;
            for (gy, line) in glyph.bitmap.chunks_exact(w.max(1)).take(glyph.height as usize).enumerate() {
                let start = (y0 + gy) * sheet_width + x0;
                pixels[start..start + w].copy_from_slice(&line[..w]);
            }

            placed.insert(
                glyph.code,
                GlyphMetrics {
                    crop,
                    width: glyph.width,
                    height: glyph.height,
                    bearing: glyph.bearing,
                    advance: glyph.advance,
                },
            );
        }

        Self {
            pixel_size,
            grid,
            cell_width,
            cell_height,
            pixels,
            glyphs: placed,
            texture: None,
        }
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Cells per side.
    pub fn grid(&self) -> u32 {
        self.grid
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    pub fn width(&self) -> u32 {
        self.grid * self.cell_width
    }

    pub fn height(&self) -> u32 {
        self.grid * self.cell_height
    }

    /// R8 coverage of the whole sheet, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn glyph(&self, code: u8) -> Option<&GlyphMetrics> {
        self.glyphs.get(&code)
    }

    /// Metrics for `code`, falling back to `'?'` for unmapped codes.
    pub fn glyph_or_fallback(&self, code: u8) -> Option<&GlyphMetrics> {
        self.glyph(code).or_else(|| self.glyph(b'?'))
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub(crate) fn set_texture(&mut self, texture: TextureHandle) {
        self.texture = Some(texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(code: u8, width: u32, height: u32, value: u8) -> RasterizedGlyph {
        RasterizedGlyph {
            code,
            width,
            height,
            bitmap: vec![value; (width * height) as usize],
            bearing: (1, height as i32),
            advance: (width + 2) << 6,
        }
    }

    // ── sharpen ──

    #[test]
    fn flat_bitmap_is_unchanged_by_sharpen() {
        let mut bmp = vec![100u8; 12 * 12];
        sharpen(&mut bmp, 12, 12);
        assert!(bmp.iter().all(|&p| p == 100));
    }

    #[test]
    fn sharpen_boosts_isolated_peak_and_clamps() {
        let (w, h) = (12, 12);
        let mut bmp = vec![0u8; w * h];
        bmp[5 * w + 5] = 200;
        sharpen(&mut bmp, w, h);
        // 5 * 200 clamps to 255; direct neighbours go negative and clamp to 0.
        assert_eq!(bmp[5 * w + 5], 255);
        assert_eq!(bmp[4 * w + 5], 0);
        assert_eq!(bmp[5 * w + 6], 0);
    }

    #[test]
    fn sharpen_reaches_the_last_interior_row_and_column() {
        let (w, h) = (12, 12);
        let mut bmp = vec![0u8; w * h];
        bmp[(h - 2) * w + (w - 2)] = 40;
        sharpen(&mut bmp, w, h);
        assert_eq!(bmp[(h - 2) * w + (w - 2)], 200);
        assert_eq!(bmp[(h - 3) * w + (w - 2)], 0);
        // the outer ring is never written
        assert_eq!(bmp[(h - 1) * w + (w - 2)], 0);
    }

    #[test]
    fn sharpen_leaves_border_rows_untouched() {
        let (w, h) = (12, 12);
        let mut bmp: Vec<u8> = (0..w * h).map(|i| (i % 7 * 30) as u8).collect();
        let before = bmp.clone();
        sharpen(&mut bmp, w, h);
        assert_eq!(&bmp[..w], &before[..w]);
        assert_eq!(&bmp[(h - 1) * w..], &before[(h - 1) * w..]);
    }

    // ── packing ──

    #[test]
    fn grid_is_ceil_sqrt_plus_one() {
        let glyphs: Vec<_> = (0..10).map(|c| solid(c, 2, 3, 255)).collect();
        let atlas = FontAtlas::pack(16, &glyphs);
        assert_eq!(atlas.grid(), 5);
        assert_eq!((atlas.cell_width(), atlas.cell_height()), (2, 3));
        assert_eq!((atlas.width(), atlas.height()), (10, 15));
        assert_eq!(atlas.pixels().len(), 150);
    }

    #[test]
    fn crops_are_normalized_cell_positions() {
        let glyphs = vec![solid(b'a', 4, 4, 255), solid(b'b', 2, 4, 255), solid(b'c', 4, 2, 255)];
        let atlas = FontAtlas::pack(16, &glyphs);
        assert_eq!(atlas.grid(), 3);

        let a = atlas.glyph(b'a').unwrap();
        assert_eq!(a.crop, Rect::new(0.0, 0.0, 4.0 / 12.0, 4.0 / 12.0));

        let b = atlas.glyph(b'b').unwrap();
        assert_eq!(b.crop, Rect::new(1.0 / 3.0, 0.0, 2.0 / 12.0, 4.0 / 12.0));
        assert_eq!(b.advance_px(), 4);
    }

    #[test]
    fn bitmaps_land_in_their_cells() {
        let glyphs = vec![solid(b'a', 2, 2, 9), solid(b'b', 2, 2, 7)];
        let atlas = FontAtlas::pack(16, &glyphs);
        let w = atlas.width() as usize;
        assert_eq!(atlas.pixels()[0], 9);
        assert_eq!(atlas.pixels()[w + 1], 9);
        assert_eq!(atlas.pixels()[2], 7);
        assert_eq!(atlas.pixels()[w + 3], 7);
        assert_eq!(atlas.pixels()[4], 0);
    }

    #[test]
    fn unmapped_codes_fall_back_to_question_mark() {
        let atlas = FontAtlas::pack(16, &[solid(b'?', 2, 2, 1)]);
        assert_eq!(atlas.glyph_or_fallback(b'z'), atlas.glyph(b'?'));
        assert!(atlas.glyph(b'z').is_none());
    }

    #[test]
    fn empty_glyphs_pack_without_pixels() {
        let atlas = FontAtlas::pack(16, &[RasterizedGlyph::empty(b' ', 4 << 6)]);
        let space = atlas.glyph(b' ').unwrap();
        assert_eq!((space.width, space.height), (0, 0));
        assert_eq!(space.crop.size.x, 0.0);
    }
}
