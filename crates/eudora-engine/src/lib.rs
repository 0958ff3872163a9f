//! Eudora engine crate.
//!
//! The core is the input event system (`input`) and the glyph text engine
//! (`text`). Window, GPU and timing pieces drive them from the application loop.

pub mod camera;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod input;
pub mod logging;
pub mod render;
pub mod text;
pub mod time;
pub mod window;

pub use error::{EngineError, Result};
