//! Window runtime: the main loop driving input, the app and presentation.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
