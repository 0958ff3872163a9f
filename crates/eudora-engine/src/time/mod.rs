//! Frame timing.
//!
//! One `FrameClock` per loop: the render loop and the fast-update thread each own one.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
