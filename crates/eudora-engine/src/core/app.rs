use crate::input::EventSystem;
use crate::render::GpuDevice;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Messages posted from the fast-update thread.
    type Message: Send + 'static;

    /// Called once the window and GPU exist, before the first frame.
    ///
    /// Register listeners and submit fonts here.
    fn on_start(&mut self, events: &mut EventSystem, device: &mut dyn GpuDevice) -> anyhow::Result<()> {
        let _ = (events, device);
        Ok(())
    }

    /// Called on the main thread for every drained fast-update message, after
    /// event resolution and before `on_frame`.
    fn on_message(&mut self, msg: Self::Message) {
        let _ = msg;
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
