use std::time::Duration;

use crate::input::{EventType, KeyCode};

/// Phase of a key reported to keyboard listeners.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyState {
    Pressed = 1,
    Released = 2,
    Holding = 3,
}

impl KeyState {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Keyboard snapshot handed to keyboard listeners, one per dispatched key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEventInfo {
    /// Time since the event system was created.
    pub timestamp: Duration,
    pub event_type: EventType,
    /// The key that triggered this dispatch.
    pub key: KeyCode,
    pub state: KeyState,
    /// Keys held at the time of dispatch.
    pub held: Vec<KeyCode>,
}

impl KeyEventInfo {
    /// True when `code` is currently held.
    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    pub fn key_char(&self) -> Option<char> {
        self.key.to_char()
    }
}

impl Default for KeyEventInfo {
    fn default() -> Self {
        Self {
            timestamp: Duration::ZERO,
            event_type: EventType::None,
            key: KeyCode::UNKNOWN,
            state: KeyState::Pressed,
            held: Vec::new(),
        }
    }
}

/// Latest mouse snapshot.
///
/// `x`/`y` are normalized to `[-1, 1]` with +Y up; `screen_*` are window pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseEventInfo {
    pub timestamp: Duration,
    /// Listener type that matched for the current dispatch.
    pub event_type: EventType,
    pub x: f32,
    pub y: f32,
    /// Relative motion of the last movement, in pixels.
    pub dx: f32,
    pub dy: f32,
    pub screen_x: i32,
    pub screen_y: i32,
    /// Wheel deltas accumulated this frame.
    pub wheel_x: f32,
    pub wheel_y: f32,
}

impl Default for MouseEventInfo {
    fn default() -> Self {
        Self {
            timestamp: Duration::ZERO,
            event_type: EventType::None,
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 0.0,
            screen_x: 0,
            screen_y: 0,
            wheel_x: 0.0,
            wheel_y: 0.0,
        }
    }
}

/// Payload passed to listener handlers.
#[derive(Debug, Copy, Clone)]
pub enum EventInfo<'a> {
    Key(&'a KeyEventInfo),
    Mouse(&'a MouseEventInfo),
}

impl<'a> EventInfo<'a> {
    pub fn event_type(&self) -> EventType {
        match self {
            EventInfo::Key(k) => k.event_type,
            EventInfo::Mouse(m) => m.event_type,
        }
    }

    pub fn timestamp(&self) -> Duration {
        match self {
            EventInfo::Key(k) => k.timestamp,
            EventInfo::Mouse(m) => m.timestamp,
        }
    }

    pub fn as_key(&self) -> Option<&'a KeyEventInfo> {
        match *self {
            EventInfo::Key(k) => Some(k),
            EventInfo::Mouse(_) => None,
        }
    }

    pub fn as_mouse(&self) -> Option<&'a MouseEventInfo> {
        match *self {
            EventInfo::Mouse(m) => Some(m),
            EventInfo::Key(_) => None,
        }
    }

    /// Triggering key, for keyboard payloads.
    pub fn key(&self) -> Option<KeyCode> {
        self.as_key().map(|k| k.key)
    }
}
