use super::backend::check_index_range;
use crate::error::{EngineError, Result};
use crate::render::{
    BufferHandle, DrawCall, GpuDevice, ShaderHandle, ShaderSource, TextureDesc, TextureHandle,
    VertexLayout,
};

/// One call made against a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture { handle: TextureHandle, label: String, desc: TextureDesc },
    CreateBuffer { handle: BufferHandle, label: String },
    UploadGeometry { buffer: BufferHandle, vertex_bytes: usize, index_count: usize },
    CompileShader { handle: ShaderHandle, label: String },
    Draw(DrawCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTexture {
    pub label: String,
    pub desc: TextureDesc,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedBuffer {
    pub label: String,
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
    pub layout: Option<VertexLayout>,
}

/// Headless [`GpuDevice`] that keeps every resource and call in memory.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    textures: Vec<RecordedTexture>,
    buffers: Vec<RecordedBuffer>,
    shaders: Vec<Vec<ShaderSource>>,
    shader_error: Option<String>,
    /// Geometry each draw read, captured at draw time.
    drawn: Vec<RecordedBuffer>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `compile_shader` fail with `message`.
    pub fn fail_shaders_with(mut self, message: impl Into<String>) -> Self {
        self.shader_error = Some(message.into());
        self
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter_map(|c| match c {
            DeviceCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Geometry each recorded draw read, in draw order.
    pub fn drawn_geometry(&self) -> &[RecordedBuffer] {
        &self.drawn
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.drawn.clear();
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&RecordedTexture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&RecordedBuffer> {
        self.buffers.get(handle.0 as usize)
    }

    pub fn shader_sources(&self, handle: ShaderHandle) -> Option<&[ShaderSource]> {
        self.shaders.get(handle.0 as usize).map(Vec::as_slice)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl GpuDevice for RecordingDevice {
    fn create_texture(&mut self, label: &str, desc: TextureDesc, pixels: &[u8]) -> Result<TextureHandle> {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(RecordedTexture {
            label: label.to_string(),
            desc,
            pixels: pixels.to_vec(),
        });
        self.calls.push(DeviceCall::CreateTexture {
            handle,
            label: label.to_string(),
            desc,
        });
        Ok(handle)
    }

    fn create_buffer(&mut self, label: &str) -> Result<BufferHandle> {
        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(RecordedBuffer {
            label: label.to_string(),
            ..RecordedBuffer::default()
        });
        self.calls.push(DeviceCall::CreateBuffer {
            handle,
            label: label.to_string(),
        });
        Ok(handle)
    }

    fn upload_geometry(
        &mut self,
        buffer: BufferHandle,
        vertices: &[u8],
        indices: &[u32],
        layout: &VertexLayout,
    ) -> Result<()> {
        let slot = self
            .buffers
            .get_mut(buffer.0 as usize)
            .ok_or(EngineError::UnknownResource("buffer"))?;
        slot.vertices = vertices.to_vec();
        slot.indices = indices.to_vec();
        slot.layout = Some(layout.clone());
        self.calls.push(DeviceCall::UploadGeometry {
            buffer,
            vertex_bytes: vertices.len(),
            index_count: indices.len(),
        });
        Ok(())
    }

    fn compile_shader(&mut self, label: &str, sources: &[ShaderSource]) -> Result<ShaderHandle> {
        if let Some(message) = &self.shader_error {
            return Err(EngineError::ShaderCompile {
                message: format!("{label}: {message}"),
            });
        }
        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(sources.to_vec());
        self.calls.push(DeviceCall::CompileShader {
            handle,
            label: label.to_string(),
        });
        Ok(handle)
    }

    fn draw(&mut self, call: &DrawCall) -> Result<()> {
        let geometry = self
            .buffers
            .get(call.buffer.0 as usize)
            .ok_or(EngineError::UnknownResource("buffer"))?;
        if call.shader.0 as usize >= self.shaders.len() {
            return Err(EngineError::UnknownResource("shader"));
        }
        if call.textures.iter().any(|(_, t)| t.0 as usize >= self.textures.len()) {
            return Err(EngineError::UnknownResource("texture"));
        }
        check_index_range(&call.indices, geometry.indices.len())?;
        self.drawn.push(geometry.clone());
        self.calls.push(DeviceCall::Draw(call.clone()));
        Ok(())
    }
}
