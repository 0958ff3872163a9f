//! GPU rendering subsystem.
//!
//! `backend` defines the collaborator contract ([`GpuDevice`]) the engine core talks
//! to. `RecordingDevice` implements it headlessly; `WgpuDevice` implements it on wgpu
//! and is flushed into each frame by the window runtime.

mod backend;
mod ctx;
mod recording;
mod wgpu_device;

pub use backend::{
    BlendMode, BufferHandle, DrawCall, GpuDevice, ShaderHandle, ShaderSource, ShaderStage,
    TextureDesc, TextureFormat, TextureHandle, Uniform, VertexAttribute, VertexFormat,
    VertexLayout,
};
pub use ctx::RenderTarget;
pub use recording::{DeviceCall, RecordedBuffer, RecordedTexture, RecordingDevice};
pub use wgpu_device::WgpuDevice;
