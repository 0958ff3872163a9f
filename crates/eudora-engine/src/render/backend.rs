//! GPU collaborator contract.
//!
//! Engine subsystems name resources through opaque handles and describe work as
//! [`DrawCall`]s; they never touch backend objects directly.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::coords::Mat4;
use crate::error::{EngineError, Result};

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
            pub struct $name(pub(crate) u32);

            impl $name {
                pub const fn raw(self) -> u32 {
                    self.0
                }
            }
        )*
    };
}

handle! {
    /// Texture created by [`GpuDevice::create_texture`].
    TextureHandle,
    /// Vertex + index buffer pair created by [`GpuDevice::create_buffer`].
    BufferHandle,
    /// Linked shader program created by [`GpuDevice::compile_shader`].
    ShaderHandle,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    /// Single 8-bit channel (glyph coverage).
    R8,
    Rgba8,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub const fn r8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::R8,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub const fn size(self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// Interleaved vertex layout of one buffer.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Packs `formats` back to back at locations `0..n`.
    pub fn packed(formats: &[VertexFormat]) -> Self {
        let mut offset = 0;
        let attributes = formats
            .iter()
            .enumerate()
            .map(|(i, &format)| {
                let attr = VertexAttribute {
                    location: i as u32,
                    format,
                    offset,
                };
                offset += format.size();
                attr
            })
            .collect();
        Self {
            stride: offset,
            attributes,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    /// WGSL module holding every stage.
    Wgsl,
}

impl ShaderStage {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "vert" => Some(ShaderStage::Vertex),
            "frag" => Some(ShaderStage::Fragment),
            "geom" => Some(ShaderStage::Geometry),
            "wgsl" => Some(ShaderStage::Wgsl),
            _ => None,
        }
    }
}

/// Shader source text plus the stage it compiles to.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub source: String,
    pub path: Option<PathBuf>,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, source: impl Into<String>) -> Self {
        Self {
            stage,
            source: source.into(),
            path: None,
        }
    }

    /// Reads a shader file, picking the stage from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stage = Self::stage_for(path)?;
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            stage,
            source,
            path: Some(path.to_path_buf()),
        })
    }

    fn stage_for(path: &Path) -> Result<ShaderStage> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ShaderStage::from_extension(ext).ok_or_else(|| EngineError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext.to_string(),
        })
    }
}

/// Value of a named shader uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Uniform {
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4(Mat4),
    Float(f32),
    Int(i32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Straight alpha: `src * a + dst * (1 - a)`.
    Alpha,
}

/// One indexed draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub shader: ShaderHandle,
    pub buffer: BufferHandle,
    /// `(unit, texture)` bindings.
    pub textures: Vec<(u32, TextureHandle)>,
    /// Uniforms in declaration order of the shader's uniform block.
    pub uniforms: Vec<(&'static str, Uniform)>,
    pub indices: Range<u32>,
    pub blend: BlendMode,
}

/// GPU resource collaborator.
pub trait GpuDevice {
    fn create_texture(&mut self, label: &str, desc: TextureDesc, pixels: &[u8]) -> Result<TextureHandle>;

    fn create_buffer(&mut self, label: &str) -> Result<BufferHandle>;

    /// Replaces the contents of `buffer`.
    fn upload_geometry(
        &mut self,
        buffer: BufferHandle,
        vertices: &[u8],
        indices: &[u32],
        layout: &VertexLayout,
    ) -> Result<()>;

    fn compile_shader(&mut self, label: &str, sources: &[ShaderSource]) -> Result<ShaderHandle>;

    /// Queues or issues one draw against the geometry `call.buffer` holds now.
    ///
    /// A later `upload_geometry` into the same buffer does not change what this
    /// draw renders. `call.indices` must lie within the uploaded indices.
    fn draw(&mut self, call: &DrawCall) -> Result<()>;
}

/// Fails with [`EngineError::InvalidDrawRange`] unless `range` fits in `available` indices.
pub(crate) fn check_index_range(range: &Range<u32>, available: usize) -> Result<()> {
    if range.start > range.end || range.end as usize > available {
        return Err(EngineError::InvalidDrawRange {
            range: range.clone(),
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── shader sources ──

    #[test]
    fn known_extensions_map_to_stages() {
        assert_eq!(ShaderStage::from_extension("vert"), Some(ShaderStage::Vertex));
        assert_eq!(ShaderStage::from_extension("frag"), Some(ShaderStage::Fragment));
        assert_eq!(ShaderStage::from_extension("geom"), Some(ShaderStage::Geometry));
        assert_eq!(ShaderStage::from_extension("wgsl"), Some(ShaderStage::Wgsl));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = ShaderSource::from_path("shaders/text.glsl").unwrap_err();
        match err {
            EngineError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "glsl"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_reports_io_with_path() {
        let err = ShaderSource::from_path("/nonexistent/eudora/text.frag").unwrap_err();
        match err {
            EngineError::Io { path, .. } => assert!(path.ends_with("text.frag")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_source_from_disk() {
        let path = std::env::temp_dir().join(format!("eudora-backend-{}.vert", std::process::id()));
        std::fs::write(&path, "void main() {}").unwrap();
        let src = ShaderSource::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(src.stage, ShaderStage::Vertex);
        assert_eq!(src.source, "void main() {}");
    }

    // ── layouts ──

    #[test]
    fn packed_layout_offsets() {
        let layout = VertexLayout::packed(&[
            VertexFormat::Float32x4,
            VertexFormat::Float32x2,
            VertexFormat::Float32x4,
        ]);
        assert_eq!(layout.stride, 40);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 16, 24]);
        assert_eq!(layout.attributes[2].location, 2);
    }

    #[test]
    fn texture_byte_len() {
        assert_eq!(TextureDesc::r8(4, 3).byte_len(), 12);
    }

    // ── draw ranges ──

    #[test]
    fn index_ranges_must_fit_the_upload() {
        assert!(check_index_range(&(0..6), 6).is_ok());
        assert!(check_index_range(&(6..6), 6).is_ok());
        let err = check_index_range(&(0..12), 6).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDrawRange { available: 6, .. }));
    }
}
