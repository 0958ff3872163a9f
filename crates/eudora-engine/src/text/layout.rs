use std::ops::Range;
use std::path::Path;

use crate::camera::Camera;
use crate::coords::{Vec2, Viewport};
use crate::error::{EngineError, Result};
use crate::render::{
    BlendMode, BufferHandle, DrawCall, GpuDevice, ShaderHandle, ShaderSource, ShaderStage,
    TextureDesc, Uniform,
};

use super::atlas::{sharpen, FontAtlas, GlyphMetrics, SHARPEN_MIN_SIZE};
use super::geometry::{DrawBatch, Geometry, GlyphVertex};
use super::raster::{FontRasterizer, FontdueRasterizer};
use super::settings::{Alignment, DocSettings, ParaSettings, TextSettings};
use super::FontId;

/// Character codes rasterized for every submitted font.
pub const GLYPH_CODES: Range<u8> = 0..127;

const TAB_SPACES: f32 = 4.0;
/// Horizontal shear of italic glyphs, in font pixels.
const ITALIC_SHEAR: f32 = 14.0;
const TEXT_SHADER: &str = include_str!("../render/shaders/text.wgsl");

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    Idle,
    Open,
    Closed,
}

/// Cursor-driven glyph layout over one document at a time.
///
/// `begin_document` → (`paragraph` | `text_block`)* → `end_document` →
/// `draw_document` (any number of times). Layout happens in NDC with the origin
/// at the center; the cursor starts at the top-left inset by the margins.
pub struct TextEngine {
    rasterizer: Box<dyn FontRasterizer>,
    fonts: Vec<FontAtlas>,
    camera: Camera,
    shader: Option<ShaderHandle>,
    buffer: Option<BufferHandle>,

    phase: Phase,
    cursor: Vec2,
    inverse_aspect: f32,
    block_width: f32,
    doc_width: f32,
    doc_left: f32,
    last_height: f32,
    para: ParaSettings,
    text: TextSettings,
    inner_text: String,
    geometry: Geometry,
}

impl TextEngine {
    pub fn new() -> Self {
        Self::with_rasterizer(FontdueRasterizer)
    }

    pub fn with_rasterizer(rasterizer: impl FontRasterizer + 'static) -> Self {
        Self {
            rasterizer: Box::new(rasterizer),
            fonts: Vec::new(),
            camera: Camera::orthographic(2.0, 2.0, true),
            shader: None,
            buffer: None,
            phase: Phase::Idle,
            cursor: Vec2::new(-1.0, 1.0),
            inverse_aspect: 1.0,
            block_width: 0.0,
            doc_width: 0.0,
            doc_left: 0.0,
            last_height: 0.0,
            para: ParaSettings::default(),
            text: TextSettings::default(),
            inner_text: String::new(),
            geometry: Geometry::new(),
        }
    }

    // ── fonts ──────────────────────────────────────────────────────────────

    /// Rasterizes [`GLYPH_CODES`] from `path`, packs them and uploads the atlas.
    ///
    /// Glyphs the rasterizer rejects are logged and left out of the atlas.
    pub fn submit_font(
        &mut self,
        device: &mut dyn GpuDevice,
        path: impl AsRef<Path>,
        pixel_size: u32,
    ) -> Result<FontId> {
        let path = path.as_ref();
        let face = self.rasterizer.load(path, pixel_size)?;

        let mut glyphs = Vec::with_capacity(GLYPH_CODES.len());
        for code in GLYPH_CODES {
            match face.rasterize(code) {
                Ok(mut glyph) => {
                    if glyph.width > SHARPEN_MIN_SIZE && glyph.height > SHARPEN_MIN_SIZE {
                        sharpen(&mut glyph.bitmap, glyph.width as usize, glyph.height as usize);
                    }
                    glyphs.push(glyph);
                }
                Err(err) => log::warn!("{}: skipping glyph {code}: {err}", path.display()),
            }
        }

        let mut atlas = FontAtlas::pack(pixel_size, &glyphs);
        let id = FontId(self.fonts.len() as u32 + 1);
        let texture = device.create_texture(
            &format!("eudora font atlas {}", id.raw()),
            TextureDesc::r8(atlas.width(), atlas.height()),
            atlas.pixels(),
        )?;
        atlas.set_texture(texture);

        log::info!(
            "font {} submitted from {}: {} glyphs, {}x{} atlas",
            id.raw(),
            path.display(),
            atlas.glyph_count(),
            atlas.width(),
            atlas.height()
        );
        self.fonts.push(atlas);
        Ok(id)
    }

    pub fn font_atlas(&self, id: FontId) -> Option<&FontAtlas> {
        font_slot(&self.fonts, id)
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    // ── document lifecycle ─────────────────────────────────────────────────

    /// Opens a new document, discarding any previous geometry.
    pub fn begin_document(&mut self, settings: &DocSettings, viewport: Viewport) -> Result<()> {
        let default_font = settings.default_para.text.font_id;
        font_in(&self.fonts, default_font)?;

        self.inner_text.clear();
        self.geometry.clear();
        self.inverse_aspect = viewport.inverse_aspect();
        self.block_width = settings.default_para.width;
        self.doc_width = settings.width;
        self.doc_left = settings.margin_left;
        self.cursor = Vec2::new(-1.0 + self.doc_left, 1.0 - settings.margin_top);
        self.last_height = 0.0;
        self.para = settings.default_para.clone();
        self.text = settings.default_para.text.clone();
        self.phase = Phase::Open;
        Ok(())
    }

    pub fn paragraph(&mut self, text: &str) -> Result<()> {
        let settings = self.para.clone();
        self.paragraph_with(text, &settings)
    }

    /// Lays out `text` as a block: one output line per `\n`-separated line,
    /// aligned inside the block and wrapped at its right edge.
    pub fn paragraph_with(&mut self, text: &str, settings: &ParaSettings) -> Result<()> {
        self.require(Phase::Open, "paragraph")?;
        let line_gap = {
            let atlas = font_in(&self.fonts, settings.text.font_id)?;
            let metrics = RunMetrics::new(atlas, self.inverse_aspect, settings.text.font_size);
            metrics.cell_height.max(settings.text.line_height)
        };

        self.doc_left += settings.padding_left;
        self.inner_text.push('\n');
        self.cursor.y -= settings.padding_top + self.last_height;
        let line_start = -1.0 + self.doc_left + settings.start_indent;
        self.cursor.x = line_start;
        self.block_width = settings
            .width
            .min(self.doc_width - settings.padding_right - self.doc_left);

        for line in split_lines(text) {
            let slack = self.block_width - settings.start_indent - self.measure(line, &settings.text)?;
            if slack > 0.0 {
                match settings.alignment {
                    Alignment::Center => self.cursor.x += slack / 2.0,
                    Alignment::Right => self.cursor.x += slack,
                    Alignment::Left => {}
                }
            }
            self.layout_run(line, &settings.text)?;
            self.inner_text.push('\n');
            self.cursor.y -= line_gap;
            self.cursor.x = line_start;
        }

        self.cursor.y -= settings.padding_bottom;
        self.doc_left -= settings.padding_left;
        self.cursor.x = -1.0 + self.doc_left;
        self.block_width = self.doc_width;
        self.last_height = settings.text.line_height;
        Ok(())
    }

    pub fn text_block(&mut self, text: &str) -> Result<()> {
        let settings = self.text.clone();
        self.text_block_with(text, &settings)
    }

    /// Lays out `text` from the current cursor without paragraph padding.
    pub fn text_block_with(&mut self, text: &str, settings: &TextSettings) -> Result<()> {
        self.require(Phase::Open, "text_block")?;
        self.layout_run(text, settings)?;
        let atlas = font_in(&self.fonts, settings.font_id)?;
        let metrics = RunMetrics::new(atlas, self.inverse_aspect, settings.font_size);
        self.last_height = metrics.cell_height.max(settings.line_height);
        Ok(())
    }

    /// Uploads the accumulated geometry and closes the document.
    pub fn end_document(&mut self, device: &mut dyn GpuDevice) -> Result<()> {
        self.require(Phase::Open, "end_document")?;
        let buffer = match self.buffer {
            Some(buffer) => buffer,
            None => {
                let buffer = device.create_buffer("eudora text document")?;
                self.buffer = Some(buffer);
                buffer
            }
        };
        device.upload_geometry(
            buffer,
            self.geometry.vertex_bytes(),
            self.geometry.indices(),
            &GlyphVertex::layout(),
        )?;
        self.phase = Phase::Closed;
        log::debug!(
            "text document closed: {} quads in {} batches",
            self.geometry.quad_count(),
            self.geometry.batches().len()
        );
        Ok(())
    }

    /// Issues one alpha-blended draw per font batch of the closed document.
    pub fn draw_document(&mut self, device: &mut dyn GpuDevice) -> Result<()> {
        self.require(Phase::Closed, "draw_document")?;
        let buffer = self.buffer.ok_or(EngineError::UnknownResource("buffer"))?;
        let shader = self.shader(device)?;
        let projection = Uniform::Mat4(self.camera.view_projection());

        for batch in self.geometry.batches() {
            let atlas = font_in(&self.fonts, batch.font)?;
            let texture = atlas.texture().ok_or(EngineError::UnknownResource("texture"))?;
            device.draw(&DrawCall {
                shader,
                buffer,
                textures: vec![(0, texture)],
                uniforms: vec![("projection", projection)],
                indices: batch.indices.clone(),
                blend: BlendMode::Alpha,
            })?;
        }
        Ok(())
    }

    // ── cursor and settings ────────────────────────────────────────────────

    /// Moves the cursor down by `dy`.
    pub fn move_cursor_vertical(&mut self, dy: f32) {
        self.cursor.y -= dy;
    }

    pub fn move_cursor_horizontal(&mut self, dx: f32) {
        self.cursor.x += dx;
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Vec2) {
        self.cursor = cursor;
    }

    pub fn current_para_settings(&self) -> &ParaSettings {
        &self.para
    }

    pub fn current_text_settings(&self) -> &TextSettings {
        &self.text
    }

    pub fn set_current_para_settings(&mut self, settings: ParaSettings) {
        self.para = settings;
    }

    pub fn set_current_text_settings(&mut self, settings: TextSettings) {
        self.text = settings;
    }

    /// Plain text of the document, one `\n` around every paragraph line.
    pub fn inner_text(&self) -> &str {
        &self.inner_text
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn batches(&self) -> &[DrawBatch] {
        self.geometry.batches()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    // ── internals ──────────────────────────────────────────────────────────

    fn require(&self, phase: Phase, operation: &'static str) -> Result<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(EngineError::NoActiveDocument { operation })
        }
    }

    fn shader(&mut self, device: &mut dyn GpuDevice) -> Result<ShaderHandle> {
        if let Some(shader) = self.shader {
            return Ok(shader);
        }
        let shader = device.compile_shader(
            "eudora text",
            &[ShaderSource::new(ShaderStage::Wgsl, TEXT_SHADER)],
        )?;
        self.shader = Some(shader);
        Ok(shader)
    }

    /// Width `layout_run` would advance over `line`, without emitting anything.
    fn measure(&self, line: &str, settings: &TextSettings) -> Result<f32> {
        let atlas = font_in(&self.fonts, settings.font_id)?;
        let metrics = RunMetrics::new(atlas, self.inverse_aspect, settings.font_size);
        Ok(line
            .chars()
            .map(glyph_code)
            .map(|code| match code {
                b'\n' => 0.0,
                b'\t' => metrics.tab(atlas),
                _ => {
                    let word = if code == b' ' { settings.word_space } else { 0.0 };
                    let glyph = atlas
                        .glyph_or_fallback(code)
                        .map_or(0.0, |g| metrics.advance(Some(g)) + settings.letter_space);
                    word + glyph
                }
            })
            .sum())
    }

    /// Emits one quad per glyph of `text`, wrapping greedily per character
    /// when the next glyph would cross the block or document edge.
    fn layout_run(&mut self, text: &str, settings: &TextSettings) -> Result<()> {
        let atlas = font_in(&self.fonts, settings.font_id)?;
        let metrics = RunMetrics::new(atlas, self.inverse_aspect, settings.font_size);
        let color = settings.vertex_color().to_array();
        let line_start = self.cursor.x;
        let doc_right = -1.0 + self.doc_left + self.doc_width;
        self.inner_text.push_str(text);

        let mut codes = text.chars().map(glyph_code).peekable();
        while let Some(code) = codes.next() {
            match code {
                b'\n' => {
                    self.cursor.y -= metrics.cell_height.max(settings.line_height);
                    self.cursor.x = line_start;
                    continue;
                }
                b'\t' => {
                    self.cursor.x += metrics.tab(atlas);
                    continue;
                }
                b' ' => self.cursor.x += settings.word_space,
                _ => {}
            }
            let Some(glyph) = atlas.glyph_or_fallback(code) else {
                continue;
            };

            let quad = metrics.quad(glyph, self.cursor, settings.italic, color);
            self.geometry.push_quad(settings.font_id, quad);
            self.cursor.x += metrics.advance(Some(glyph)) + settings.letter_space;

            if codes.peek().is_none() {
                break;
            }
            let next = self.cursor.x + metrics.cell_width;
            if next >= line_start + self.block_width {
                self.cursor.x = line_start;
                self.cursor.y -= metrics.cell_height;
            } else if next >= doc_right {
                self.cursor.x = -1.0 + self.doc_left;
                self.cursor.y -= metrics.cell_height;
            }
        }
        Ok(())
    }
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Font pixels to NDC for one run.
struct RunMetrics {
    scale: Vec2,
    cell_width: f32,
    cell_height: f32,
}

impl RunMetrics {
    fn new(atlas: &FontAtlas, inverse_aspect: f32, font_size: f32) -> Self {
        let px = atlas.pixel_size().max(1) as f32;
        let scale = Vec2::new(2.0 * inverse_aspect / px * font_size, 2.0 / px * font_size);
        Self {
            scale,
            cell_width: atlas.cell_width() as f32 * scale.x,
            cell_height: atlas.cell_height() as f32 * scale.y,
        }
    }

    fn advance(&self, glyph: Option<&GlyphMetrics>) -> f32 {
        glyph.map_or(0.0, |g| g.advance_px() as f32 * self.scale.x)
    }

    fn tab(&self, atlas: &FontAtlas) -> f32 {
        TAB_SPACES * self.advance(atlas.glyph_or_fallback(b' '))
    }

    /// Bottom-left, top-left, top-right, bottom-right in texture space, which is
    /// top-left, bottom-left, bottom-right, top-right on screen.
    fn quad(&self, glyph: &GlyphMetrics, cursor: Vec2, italic: bool, color: [f32; 4]) -> [GlyphVertex; 4] {
        let Vec2 { x: sx, y: sy } = self.scale;
        let xpos = cursor.x + glyph.bearing.0 as f32 * sx;
        let ypos = cursor.y - self.cell_height - (glyph.height as i32 - glyph.bearing.1) as f32 * sy;
        let w = glyph.width as f32 * sx;
        let h = glyph.height as f32 * sy;
        let shear = if italic { ITALIC_SHEAR * sy } else { 0.0 };
        let crop = glyph.crop.to_array();

        let vertex = |x: f32, y: f32, u: f32, v: f32| GlyphVertex {
            pos_uv: [x, y, u, v],
            crop,
            color,
        };
        [
            vertex(xpos, ypos + h, 0.0, 0.0),
            vertex(xpos - shear, ypos, 0.0, 1.0),
            vertex(xpos + w - shear, ypos, 1.0, 1.0),
            vertex(xpos + w, ypos + h, 1.0, 0.0),
        ]
    }
}

fn font_slot(fonts: &[FontAtlas], id: FontId) -> Option<&FontAtlas> {
    (id.0 as usize).checked_sub(1).and_then(|i| fonts.get(i))
}

fn font_in(fonts: &[FontAtlas], id: FontId) -> Result<&FontAtlas> {
    font_slot(fonts, id).ok_or(EngineError::UnknownFont(id))
}

/// Non-ASCII characters render as `'?'`.
fn glyph_code(ch: char) -> u8 {
    u8::try_from(ch).ok().filter(u8::is_ascii).unwrap_or(b'?')
}

/// `\n`-separated lines; runs of separators collapse, but a leading or
/// trailing empty line survives.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let last = text.matches('\n').count();
    text.split('\n')
        .enumerate()
        .filter(move |(i, line)| !line.is_empty() || *i == 0 || *i == last)
        .map(|(_, line)| line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DeviceCall, RecordingDevice};
    use crate::text::{GlyphFace, RasterizedGlyph};

    const GLYPH_W: u32 = 8;
    const GLYPH_H: u32 = 12;
    const ADVANCE_PX: u32 = 10;

    /// Every printable code is an 8x12 block; controls and space are empty.
    struct BlockFace {
        reject: Option<u8>,
    }

    impl GlyphFace for BlockFace {
        fn rasterize(&self, code: u8) -> Result<RasterizedGlyph> {
            if Some(code) == self.reject {
                return Err(EngineError::GlyphRaster {
                    code,
                    message: "rejected".into(),
                });
            }
            Ok(match code {
                0..=31 => RasterizedGlyph::empty(code, 0),
                b' ' => RasterizedGlyph::empty(code, 6 << 6),
                _ => RasterizedGlyph {
                    code,
                    width: GLYPH_W,
                    height: GLYPH_H,
                    bitmap: vec![255; (GLYPH_W * GLYPH_H) as usize],
                    bearing: (1, 10),
                    advance: ADVANCE_PX << 6,
                },
            })
        }
    }

    #[derive(Default)]
    struct BlockRasterizer {
        reject: Option<u8>,
    }

    impl FontRasterizer for BlockRasterizer {
        fn load(&self, _path: &Path, _pixel_size: u32) -> Result<Box<dyn GlyphFace>> {
            Ok(Box::new(BlockFace {
                reject: self.reject,
            }))
        }
    }

    const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

    fn engine() -> (TextEngine, RecordingDevice) {
        let mut dev = RecordingDevice::new();
        let mut engine = TextEngine::with_rasterizer(BlockRasterizer::default());
        engine.submit_font(&mut dev, "block.ttf", 16).unwrap();
        (engine, dev)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    /// NDC units per font pixel horizontally at the default size.
    fn sx() -> f32 {
        2.0 * 0.75 / 16.0 * 0.03
    }

    fn sy() -> f32 {
        2.0 / 16.0 * 0.03
    }

    // ── fonts ──

    #[test]
    fn font_ids_count_from_one() {
        let mut dev = RecordingDevice::new();
        let mut engine = TextEngine::with_rasterizer(BlockRasterizer::default());
        let a = engine.submit_font(&mut dev, "a.ttf", 16).unwrap();
        let b = engine.submit_font(&mut dev, "b.ttf", 32).unwrap();
        assert_eq!((a.raw(), b.raw()), (1, 2));
        assert_eq!(engine.font_atlas(b).map(FontAtlas::pixel_size), Some(32));
        assert!(engine.font_atlas(FontId(3)).is_none());
        assert!(engine.font_atlas(FontId(0)).is_none());
    }

    #[test]
    fn submitted_atlas_is_uploaded_as_r8() {
        let (engine, dev) = engine();
        let atlas = engine.font_atlas(FontId::FIRST).unwrap();
        assert_eq!(atlas.glyph_count(), GLYPH_CODES.len());
        let tex = dev.texture(atlas.texture().unwrap()).unwrap();
        assert_eq!(tex.desc, TextureDesc::r8(atlas.width(), atlas.height()));
        assert_eq!(tex.pixels, atlas.pixels());
    }

    #[test]
    fn rejected_glyphs_are_skipped() {
        let mut dev = RecordingDevice::new();
        let mut engine = TextEngine::with_rasterizer(BlockRasterizer { reject: Some(b'~') });
        let id = engine.submit_font(&mut dev, "block.ttf", 16).unwrap();
        let atlas = engine.font_atlas(id).unwrap();
        assert_eq!(atlas.glyph_count(), GLYPH_CODES.len() - 1);
        assert!(atlas.glyph(b'~').is_none());
    }

    // ── lifecycle ──

    #[test]
    fn begin_without_font_is_unknown_font() {
        let mut engine = TextEngine::with_rasterizer(BlockRasterizer::default());
        let err = engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap_err();
        assert!(matches!(err, EngineError::UnknownFont(FontId::FIRST)));
    }

    #[test]
    fn operations_outside_a_document_fail() {
        let (mut engine, mut dev) = engine();
        assert!(matches!(
            engine.paragraph("hi"),
            Err(EngineError::NoActiveDocument { operation: "paragraph" })
        ));
        assert!(matches!(
            engine.text_block("hi"),
            Err(EngineError::NoActiveDocument { operation: "text_block" })
        ));
        assert!(matches!(
            engine.end_document(&mut dev),
            Err(EngineError::NoActiveDocument { operation: "end_document" })
        ));

        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        assert!(matches!(
            engine.draw_document(&mut dev),
            Err(EngineError::NoActiveDocument { operation: "draw_document" })
        ));

        engine.end_document(&mut dev).unwrap();
        assert!(engine.paragraph("late").is_err());
        assert!(engine.end_document(&mut dev).is_err());
    }

    #[test]
    fn begin_places_cursor_inside_margins() {
        let (mut engine, _dev) = engine();
        engine.set_cursor(Vec2::new(0.5, 0.5));
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        assert_eq!(engine.cursor(), Vec2::new(-0.99, 0.99));
    }

    #[test]
    fn layout_is_idempotent_across_documents() {
        let (mut engine, _dev) = engine();
        let doc = DocSettings::default();
        let run = |engine: &mut TextEngine| {
            engine.begin_document(&doc, VIEWPORT).unwrap();
            engine.paragraph("The quick brown fox\njumps").unwrap();
            engine.paragraph("over the lazy dog").unwrap();
            (engine.geometry().clone(), engine.inner_text().to_string(), engine.cursor())
        };
        let first = run(&mut engine);
        let second = run(&mut engine);
        assert!(!first.0.is_empty());
        assert_eq!(first, second);
        assert_eq!(first.0.vertex_bytes(), second.0.vertex_bytes());
    }

    #[test]
    fn repeated_draws_issue_identical_calls() {
        let (mut engine, mut dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph("hello").unwrap();
        engine.end_document(&mut dev).unwrap();
        let geometry = engine.geometry().clone();

        dev.clear_calls();
        engine.draw_document(&mut dev).unwrap();
        let first: Vec<DrawCall> = dev.draws().cloned().collect();
        dev.clear_calls();
        engine.draw_document(&mut dev).unwrap();
        let second: Vec<DrawCall> = dev.draws().cloned().collect();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(engine.geometry(), &geometry);
        assert_eq!(first[0].indices, 0..30);
        assert_eq!(first[0].blend, BlendMode::Alpha);
        assert_eq!(first[0].uniforms[0].0, "projection");
    }

    #[test]
    fn two_documents_in_one_frame_draw_their_own_geometry() {
        let (mut engine, mut dev) = engine();
        for text in ["hello", "a"] {
            engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
            engine.paragraph(text).unwrap();
            engine.end_document(&mut dev).unwrap();
            engine.draw_document(&mut dev).unwrap();
        }

        let drawn = dev.drawn_geometry();
        let draws: Vec<&DrawCall> = dev.draws().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].buffer, draws[1].buffer);
        assert_eq!((draws[0].indices.clone(), drawn[0].indices.len()), (0..30, 30));
        assert_eq!((draws[1].indices.clone(), drawn[1].indices.len()), (0..6, 6));
        assert_ne!(drawn[0].vertices, drawn[1].vertices);
    }

    #[test]
    fn shader_compiles_once() {
        let (mut engine, mut dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph("a").unwrap();
        engine.end_document(&mut dev).unwrap();
        engine.draw_document(&mut dev).unwrap();
        engine.draw_document(&mut dev).unwrap();
        let compiles = dev
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::CompileShader { .. }))
            .count();
        assert_eq!(compiles, 1);
    }

    #[test]
    fn end_document_uploads_geometry() {
        let (mut engine, mut dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph("abc").unwrap();
        engine.end_document(&mut dev).unwrap();
        let uploaded = dev
            .calls()
            .iter()
            .find_map(|c| match c {
                DeviceCall::UploadGeometry { buffer, .. } => dev.buffer(*buffer),
                _ => None,
            })
            .unwrap();
        assert_eq!(uploaded.vertices, engine.geometry().vertex_bytes());
        assert_eq!(uploaded.indices, engine.geometry().indices());
        assert_eq!(uploaded.layout, Some(GlyphVertex::layout()));
    }

    // ── layout ──

    #[test]
    fn control_characters_emit_no_quads() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        let text = "ab\tc d\ne";
        engine.paragraph(text).unwrap();
        let expected = text.chars().filter(|c| *c != '\t' && *c != '\n').count();
        assert_eq!(engine.geometry().quad_count(), expected);
        assert_eq!(engine.geometry().indices().len(), 6 * expected);
    }

    #[test]
    fn long_line_wraps_inside_block() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        let para = ParaSettings {
            width: 1.0,
            ..ParaSettings::default()
        };
        let text = "abcdefghij".repeat(4);
        engine.paragraph_with(&text, &para).unwrap();

        let geom = engine.geometry();
        assert_eq!(geom.quad_count(), 40);
        let mut tops: Vec<f32> = geom.vertices().chunks(4).map(|q| q[0].pos_uv[1]).collect();
        tops.dedup();
        assert!(tops.len() >= 2, "expected at least two lines, got {tops:?}");

        let left = geom.vertices()[0].pos_uv[0];
        for quad in geom.vertices().chunks(4) {
            assert!(quad[3].pos_uv[0] < left + 1.0);
        }
    }

    #[test]
    fn empty_lines_collapse_between_text() {
        assert_eq!(split_lines("a\n\n\nb").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(split_lines("\na").collect::<Vec<_>>(), vec!["", "a"]);
        assert_eq!(split_lines("a\n").collect::<Vec<_>>(), vec!["a", ""]);
        assert_eq!(split_lines("").collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn paragraph_advances_cursor_by_padding_and_line_gap() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph("ab").unwrap();
        let cell = GLYPH_H as f32 * sy();
        // padding_top + line gap + padding_bottom
        assert!(close(engine.cursor().y, 0.99 - 0.01 - cell - 0.01));
        assert!(close(engine.cursor().x, -0.99));
        assert_eq!(engine.inner_text(), "\nab\n");

        engine.paragraph("cd").unwrap();
        // the previous line height joins the top padding
        assert!(close(engine.cursor().y, 0.99 - 2.0 * (0.02 + cell) - 0.04));
    }

    #[test]
    fn glyph_quad_corners() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.set_cursor(Vec2::new(0.0, 0.0));
        engine.text_block("A").unwrap();

        let q = &engine.geometry().vertices()[..4];
        let cell = GLYPH_H as f32 * sy();
        let xpos = sx();
        let ypos = -cell - 2.0 * sy();
        let (w, h) = (GLYPH_W as f32 * sx(), GLYPH_H as f32 * sy());
        assert!(close(q[0].pos_uv[0], xpos) && close(q[0].pos_uv[1], ypos + h));
        assert!(close(q[1].pos_uv[0], xpos) && close(q[1].pos_uv[1], ypos));
        assert!(close(q[2].pos_uv[0], xpos + w) && close(q[2].pos_uv[1], ypos));
        assert!(close(q[3].pos_uv[0], xpos + w) && close(q[3].pos_uv[1], ypos + h));
        assert_eq!([q[0].pos_uv[2], q[0].pos_uv[3]], [0.0, 0.0]);
        assert_eq!([q[2].pos_uv[2], q[2].pos_uv[3]], [1.0, 1.0]);
        assert_eq!(q[0].color, [0.2, 0.2, 0.2, 1.0]);

        let crop = engine.font_atlas(FontId::FIRST).unwrap().glyph(b'A').unwrap().crop;
        assert_eq!(q[1].crop, crop.to_array());
    }

    #[test]
    fn italic_shears_the_bottom_edge() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        let italic = TextSettings {
            italic: true,
            ..TextSettings::default()
        };
        engine.text_block_with("A", &italic).unwrap();
        let q = &engine.geometry().vertices()[..4];
        let shear = 14.0 * sy();
        assert!(close(q[0].pos_uv[0] - q[1].pos_uv[0], shear));
        assert!(close(q[3].pos_uv[0] - q[2].pos_uv[0], shear));
    }

    #[test]
    fn alignment_shifts_by_slack() {
        let first_x = |alignment: Alignment| {
            let (mut engine, _dev) = engine();
            let mut doc = DocSettings::default();
            doc.default_para.alignment = alignment;
            engine.begin_document(&doc, VIEWPORT).unwrap();
            engine.paragraph("ab").unwrap();
            engine.geometry().vertices()[0].pos_uv[0]
        };
        let width = 2.0 * (ADVANCE_PX as f32 * sx() + 0.001);
        let slack = (2.0 - 0.01 - 0.02) - 0.01 - width;

        let left = first_x(Alignment::Left);
        assert!(close(first_x(Alignment::Right) - left, slack));
        assert!(close(first_x(Alignment::Center) - left, slack / 2.0));
    }

    #[test]
    fn right_aligned_tab_line_ends_at_the_block_edge() {
        let quads = |text: &str| {
            let (mut engine, _dev) = engine();
            let mut doc = DocSettings::default();
            doc.default_para.alignment = Alignment::Right;
            engine.begin_document(&doc, VIEWPORT).unwrap();
            engine.paragraph(text).unwrap();
            engine.geometry().vertices().to_vec()
        };
        let plain = quads("ab");
        let tabbed = quads("a\tb");

        let right_edge = |v: &[GlyphVertex]| v[v.len() - 1].pos_uv[0];
        assert!(close(right_edge(&tabbed), right_edge(&plain)));
        assert!(right_edge(&tabbed) < 1.0);
        let tab = 4.0 * 6.0 * sx();
        assert!(close(plain[0].pos_uv[0] - tabbed[0].pos_uv[0], tab));
    }

    #[test]
    fn last_glyph_near_the_edge_does_not_break_the_line() {
        let cell = GLYPH_H as f32 * sy();
        let narrow = ParaSettings {
            width: 0.05,
            ..ParaSettings::default()
        };

        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph_with("a", &narrow).unwrap();
        assert!(close(engine.cursor().y, 0.99 - 0.01 - cell - 0.01));

        // Only one glyph fits per line at this width, so "ab" wraps once.
        let (mut engine, _dev) = self::engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph_with("ab", &narrow).unwrap();
        let v = engine.geometry().vertices();
        assert!(close(v[0].pos_uv[1] - v[4].pos_uv[1], cell));
        assert!(close(engine.cursor().y, 0.99 - 0.01 - 2.0 * cell - 0.01));
    }

    #[test]
    fn space_adds_word_spacing_and_tab_four_spaces() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.set_cursor(Vec2::new(0.0, 0.0));
        engine.text_block(" ").unwrap();
        let space = 6.0 * sx();
        assert!(close(engine.cursor().x, 0.02 + space + 0.001));

        engine.set_cursor(Vec2::new(0.0, 0.0));
        engine.text_block("\t").unwrap();
        assert!(close(engine.cursor().x, 4.0 * space));
    }

    #[test]
    fn non_ascii_renders_as_question_mark() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.text_block("é").unwrap();
        let crop = engine.font_atlas(FontId::FIRST).unwrap().glyph(b'?').unwrap().crop;
        assert_eq!(engine.geometry().quad_count(), 1);
        assert_eq!(engine.geometry().vertices()[0].crop, crop.to_array());
    }

    #[test]
    fn cursor_moves() {
        let (mut engine, _dev) = engine();
        engine.set_cursor(Vec2::new(0.0, 0.0));
        engine.move_cursor_vertical(0.25);
        engine.move_cursor_horizontal(0.5);
        assert_eq!(engine.cursor(), Vec2::new(0.5, -0.25));
    }

    // ── multiple fonts ──

    #[test]
    fn each_font_run_draws_with_its_own_atlas() {
        let (mut engine, mut dev) = engine();
        let second = engine.submit_font(&mut dev, "block-large.ttf", 32).unwrap();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        engine.paragraph("ab").unwrap();
        let other = TextSettings {
            font_id: second,
            ..TextSettings::default()
        };
        engine.text_block_with("cde", &other).unwrap();
        engine.text_block("f").unwrap();
        engine.end_document(&mut dev).unwrap();

        dev.clear_calls();
        engine.draw_document(&mut dev).unwrap();
        let draws: Vec<&DrawCall> = dev.draws().collect();
        assert_eq!(draws.len(), 3);

        let first_tex = engine.font_atlas(FontId::FIRST).unwrap().texture().unwrap();
        let second_tex = engine.font_atlas(second).unwrap().texture().unwrap();
        assert_eq!(draws[0].textures, vec![(0, first_tex)]);
        assert_eq!(draws[1].textures, vec![(0, second_tex)]);
        assert_eq!(draws[2].textures, vec![(0, first_tex)]);
        assert_eq!(draws[1].indices, 12..30);
    }

    #[test]
    fn unknown_font_in_settings_is_reported() {
        let (mut engine, _dev) = engine();
        engine.begin_document(&DocSettings::default(), VIEWPORT).unwrap();
        let missing = TextSettings {
            font_id: FontId(7),
            ..TextSettings::default()
        };
        let err = engine.text_block_with("x", &missing).unwrap_err();
        assert!(matches!(err, EngineError::UnknownFont(FontId(7))));
        assert!(engine.geometry().is_empty());
    }
}
