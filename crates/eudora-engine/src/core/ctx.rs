use crate::coords::Viewport;
use crate::input::EventSystem;
use crate::render::{GpuDevice, RenderTarget};
use crate::time::FrameTime;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// Events are already polled and resolved. Draws issued on `device` are encoded
/// into `target` after the callback returns.
pub struct FrameCtx<'a> {
    pub events: &'a mut EventSystem,
    pub device: &'a mut dyn GpuDevice,
    pub target: RenderTarget<'a>,
    pub time: FrameTime,
    /// Drawable size in physical pixels.
    pub viewport: Viewport,
}

impl FrameCtx<'_> {
    /// Clears the frame to an opaque color.
    pub fn clear(&mut self, r: f64, g: f64, b: f64) {
        self.target.clear(wgpu::Color { r, g, b, a: 1.0 });
    }

    /// Asks the runtime to close the window after this frame.
    pub fn request_quit(&mut self) {
        self.events.request_quit();
    }
}
