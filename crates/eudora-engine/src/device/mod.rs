//! wgpu device and window surface.
//!
//! [`Gpu`] owns the surface and hands out frames; the engine-side
//! [`WgpuDevice`](crate::render::WgpuDevice) shares its device and queue.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
