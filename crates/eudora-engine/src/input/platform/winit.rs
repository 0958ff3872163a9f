use ::winit::dpi::PhysicalPosition;
use ::winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use ::winit::keyboard::{KeyCode as WinitKey, PhysicalKey};

use crate::input::{KeyCode, MouseButton, RawEvent};

/// Wheel pixels treated as one line when a platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// Translates winit window events into [`RawEvent`]s.
///
/// Tracks the last cursor position to derive relative motion, which winit does not
/// report for window events.
#[derive(Debug, Default)]
pub struct WinitTranslator {
    last_cursor: Option<(i32, i32)>,
}

impl WinitTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for events the input subsystem does not represent.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<RawEvent> {
        match event {
            WindowEvent::CloseRequested => Some(RawEvent::Quit),

            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(*position)),

            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                None
            }

            WindowEvent::MouseInput { state, button, .. } => {
                Some(button_event(*state, map_mouse_button(*button)))
            }

            WindowEvent::MouseWheel { delta, .. } => Some(wheel_event(*delta)),

            WindowEvent::KeyboardInput { event, .. } => {
                key_event(event.physical_key, event.state, event.repeat)
            }

            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> RawEvent {
        let x = position.x.round() as i32;
        let y = position.y.round() as i32;
        let (xrel, yrel) = match self.last_cursor {
            Some((lx, ly)) => (x - lx, y - ly),
            None => (0, 0),
        };
        self.last_cursor = Some((x, y));
        RawEvent::MouseMotion { x, y, xrel, yrel }
    }
}

/// Key repeats are dropped; the event system reports held keys itself. Keys
/// without a table code are dropped too, so they never alias one another.
pub fn key_event(key: PhysicalKey, state: ElementState, repeat: bool) -> Option<RawEvent> {
    let code = map_key(key)?;
    match state {
        ElementState::Pressed if repeat => None,
        ElementState::Pressed => Some(RawEvent::KeyDown(code)),
        ElementState::Released => Some(RawEvent::KeyUp(code)),
    }
}

fn button_event(state: ElementState, button: MouseButton) -> RawEvent {
    match state {
        ElementState::Pressed => RawEvent::MouseButtonDown(button),
        ElementState::Released => RawEvent::MouseButtonUp(button),
    }
}

fn wheel_event(delta: MouseScrollDelta) -> RawEvent {
    let (dx, dy) = match delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(p) => (
            p.x as f32 / PIXELS_PER_LINE,
            p.y as f32 / PIXELS_PER_LINE,
        ),
    };
    RawEvent::MouseWheel { dx, dy }
}

pub fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

/// Maps a physical key onto the SDL-style keycode table; `None` outside it.
pub fn map_key(pk: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = pk else {
        return None;
    };

    let key = match code {
        WinitKey::Escape => KeyCode::ESCAPE,
        WinitKey::Enter => KeyCode::RETURN,
        WinitKey::Tab => KeyCode::TAB,
        WinitKey::Backspace => KeyCode::BACKSPACE,
        WinitKey::Space => KeyCode::SPACE,
        WinitKey::Quote => KeyCode::QUOTE,
        WinitKey::Comma => KeyCode::COMMA,
        WinitKey::Minus => KeyCode::MINUS,
        WinitKey::Period => KeyCode::PERIOD,
        WinitKey::Slash => KeyCode::SLASH,
        WinitKey::Semicolon => KeyCode::SEMICOLON,
        WinitKey::Equal => KeyCode::EQUALS,
        WinitKey::BracketLeft => KeyCode::LEFTBRACKET,
        WinitKey::Backslash => KeyCode::BACKSLASH,
        WinitKey::BracketRight => KeyCode::RIGHTBRACKET,
        WinitKey::Backquote => KeyCode::BACKQUOTE,
        WinitKey::Delete => KeyCode::DELETE,

        WinitKey::Digit0 => KeyCode::N0,
        WinitKey::Digit1 => KeyCode::N1,
        WinitKey::Digit2 => KeyCode::N2,
        WinitKey::Digit3 => KeyCode::N3,
        WinitKey::Digit4 => KeyCode::N4,
        WinitKey::Digit5 => KeyCode::N5,
        WinitKey::Digit6 => KeyCode::N6,
        WinitKey::Digit7 => KeyCode::N7,
        WinitKey::Digit8 => KeyCode::N8,
        WinitKey::Digit9 => KeyCode::N9,

        WinitKey::KeyA => KeyCode::A,
        WinitKey::KeyB => KeyCode::B,
        WinitKey::KeyC => KeyCode::C,
        WinitKey::KeyD => KeyCode::D,
        WinitKey::KeyE => KeyCode::E,
        WinitKey::KeyF => KeyCode::F,
        WinitKey::KeyG => KeyCode::G,
        WinitKey::KeyH => KeyCode::H,
        WinitKey::KeyI => KeyCode::I,
        WinitKey::KeyJ => KeyCode::J,
        WinitKey::KeyK => KeyCode::K,
        WinitKey::KeyL => KeyCode::L,
        WinitKey::KeyM => KeyCode::M,
        WinitKey::KeyN => KeyCode::N,
        WinitKey::KeyO => KeyCode::O,
        WinitKey::KeyP => KeyCode::P,
        WinitKey::KeyQ => KeyCode::Q,
        WinitKey::KeyR => KeyCode::R,
        WinitKey::KeyS => KeyCode::S,
        WinitKey::KeyT => KeyCode::T,
        WinitKey::KeyU => KeyCode::U,
        WinitKey::KeyV => KeyCode::V,
        WinitKey::KeyW => KeyCode::W,
        WinitKey::KeyX => KeyCode::X,
        WinitKey::KeyY => KeyCode::Y,
        WinitKey::KeyZ => KeyCode::Z,

        WinitKey::CapsLock => KeyCode::CAPSLOCK,
        WinitKey::F1 => KeyCode::F1,
        WinitKey::F2 => KeyCode::F2,
        WinitKey::F3 => KeyCode::F3,
        WinitKey::F4 => KeyCode::F4,
        WinitKey::F5 => KeyCode::F5,
        WinitKey::F6 => KeyCode::F6,
        WinitKey::F7 => KeyCode::F7,
        WinitKey::F8 => KeyCode::F8,
        WinitKey::F9 => KeyCode::F9,
        WinitKey::F10 => KeyCode::F10,
        WinitKey::F11 => KeyCode::F11,
        WinitKey::F12 => KeyCode::F12,
        WinitKey::PrintScreen => KeyCode::PRINTSCREEN,
        WinitKey::ScrollLock => KeyCode::SCROLLLOCK,
        WinitKey::Pause => KeyCode::PAUSE,
        WinitKey::Insert => KeyCode::INSERT,
        WinitKey::Home => KeyCode::HOME,
        WinitKey::PageUp => KeyCode::PAGEUP,
        WinitKey::End => KeyCode::END,
        WinitKey::PageDown => KeyCode::PAGEDOWN,
        WinitKey::ArrowRight => KeyCode::RIGHT,
        WinitKey::ArrowLeft => KeyCode::LEFT,
        WinitKey::ArrowDown => KeyCode::DOWN,
        WinitKey::ArrowUp => KeyCode::UP,

        WinitKey::NumLock => KeyCode::NUMLOCKCLEAR,
        WinitKey::NumpadDivide => KeyCode::KP_DIVIDE,
        WinitKey::NumpadMultiply => KeyCode::KP_MULTIPLY,
        WinitKey::NumpadSubtract => KeyCode::KP_MINUS,
        WinitKey::NumpadAdd => KeyCode::KP_PLUS,
        WinitKey::NumpadEnter => KeyCode::KP_ENTER,
        WinitKey::Numpad0 => KeyCode::KP_0,
        WinitKey::Numpad1 => KeyCode::KP_1,
        WinitKey::Numpad2 => KeyCode::KP_2,
        WinitKey::Numpad3 => KeyCode::KP_3,
        WinitKey::Numpad4 => KeyCode::KP_4,
        WinitKey::Numpad5 => KeyCode::KP_5,
        WinitKey::Numpad6 => KeyCode::KP_6,
        WinitKey::Numpad7 => KeyCode::KP_7,
        WinitKey::Numpad8 => KeyCode::KP_8,
        WinitKey::Numpad9 => KeyCode::KP_9,
        WinitKey::NumpadDecimal => KeyCode::KP_PERIOD,
        WinitKey::NumpadEqual => KeyCode::KP_EQUALS,
        WinitKey::ContextMenu => KeyCode::APPLICATION,
        WinitKey::Power => KeyCode::POWER,

        WinitKey::ControlLeft => KeyCode::CTRL_LEFT,
        WinitKey::ShiftLeft => KeyCode::SHIFT_LEFT,
        WinitKey::AltLeft => KeyCode::ALT_LEFT,
        WinitKey::ControlRight => KeyCode::CTRL_RIGHT,
        WinitKey::ShiftRight => KeyCode::SHIFT_RIGHT,
        WinitKey::AltRight => KeyCode::ALT_RIGHT,

        _ => return None,
    };
    Some(key)
}
