//! Contracts between the window runtime and the application.
//!
//! The runtime owns the event system, the GPU device and the frame clock and lends
//! them to the [`App`] once per frame through [`FrameCtx`]. Work running on the
//! fast-update thread reaches the app only as messages drained on the main thread.

mod app;
mod ctx;
mod fast_update;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use fast_update::{FastLoop, FastSender, FastUpdate};
