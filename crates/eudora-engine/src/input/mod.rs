//! Input subsystem.
//!
//! Raw platform events are normalized by [`EventQueue`] into key lists, a mouse
//! snapshot and a per-frame [`ControlWord`]. [`EventSystem::resolve`] then dispatches
//! to listeners whose [`EventType`] bits are all raised, in priority order.
//!
//! Public API is platform-agnostic; `platform` holds the winit translation.

mod event_type;
mod info;
mod keycode;
mod listener;
mod queue;
mod system;

pub mod platform;

pub use event_type::{ControlWord, EventType, FRAME_TICK};
pub use info::{EventInfo, KeyEventInfo, KeyState, MouseEventInfo};
pub use keycode::KeyCode;
pub use listener::{Handler, ListenerId, ListenerInfo, ListenerOptions, ListenerRegistry};
pub use queue::{EventQueue, MouseButton, PollStatus, RawEvent, WindowSize};
pub use system::EventSystem;
