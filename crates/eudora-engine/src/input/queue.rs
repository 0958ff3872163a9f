use crate::input::{ControlWord, EventType, KeyCode, MouseEventInfo};

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Buttons without an event type of their own.
    Other(u16),
}

/// Platform-agnostic input record consumed by [`EventQueue::poll`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RawEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Absolute window position plus relative motion, all in pixels.
    MouseMotion { x: i32, y: i32, xrel: i32, yrel: i32 },
    MouseButtonDown(MouseButton),
    MouseButtonUp(MouseButton),
    MouseWheel { dx: f32, dy: f32 },
    /// Window close request.
    Quit,
}

/// Drawable size of the window being polled, in pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PollStatus {
    /// `events` raw records were consumed.
    Polled { events: usize },
    /// No window was supplied; nothing changed.
    NoWindow,
}

/// Normalizes one frame of raw input into key lists, a mouse snapshot and a control word.
///
/// `pressed` and `released` are rebuilt by every poll; `held` persists across frames.
#[derive(Debug, Default)]
pub struct EventQueue {
    pub(super) control: ControlWord,
    pub(super) pressed: Vec<KeyCode>,
    pub(super) released: Vec<KeyCode>,
    pub(super) held: Vec<KeyCode>,
    pub(super) mouse: MouseEventInfo,
    should_quit: bool,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the control word to the frame-tick bit. Run once per frame before polling.
    pub fn reset_control_word(&mut self) {
        self.control = ControlWord::new();
    }

    pub fn control_word(&self) -> ControlWord {
        self.control
    }

    pub fn control_word_mut(&mut self) -> &mut ControlWord {
        &mut self.control
    }

    /// Consumes one frame of raw input.
    ///
    /// Without a window there is nothing to normalize mouse coordinates against, so the
    /// call is a reported no-op.
    pub fn poll<I>(&mut self, window: Option<WindowSize>, events: I) -> PollStatus
    where
        I: IntoIterator<Item = RawEvent>,
    {
        let Some(size) = window else {
            log::warn!("input poll without a window; skipping");
            return PollStatus::NoWindow;
        };

        self.pressed.clear();
        self.released.clear();
        self.mouse.wheel_x = 0.0;
        self.mouse.wheel_y = 0.0;

        let mut count = 0;
        for ev in events {
            self.apply(size, ev);
            count += 1;
        }
        PollStatus::Polled { events: count }
    }

    fn apply(&mut self, size: WindowSize, ev: RawEvent) {
        match ev {
            RawEvent::KeyDown(key) => {
                if !self.held.contains(&key) {
                    self.pressed.push(key);
                    self.held.push(key);
                    self.control.raise(EventType::KeyDown);
                }
            }

            RawEvent::KeyUp(key) => {
                // Only keys seen going down are reported as released.
                if let Some(pos) = self.held.iter().position(|k| *k == key) {
                    self.held.remove(pos);
                    self.released.push(key);
                    self.control.raise(EventType::KeyUp);
                }
            }

            RawEvent::MouseMotion { x, y, xrel, yrel } => {
                let w = size.width.max(1) as f32;
                let h = size.height.max(1) as f32;
                self.mouse.x = x as f32 * 2.0 / w - 1.0;
                self.mouse.y = 1.0 - y as f32 * 2.0 / h;
                self.mouse.dx = xrel as f32;
                self.mouse.dy = yrel as f32;
                self.mouse.screen_x = x;
                self.mouse.screen_y = y;
                self.control.raise(EventType::MouseMove);
            }

            RawEvent::MouseButtonDown(button) => {
                if let Some(ev) = button_event(button, true) {
                    self.control.raise(ev);
                }
            }

            RawEvent::MouseButtonUp(button) => {
                if let Some(ev) = button_event(button, false) {
                    self.control.raise(ev);
                }
            }

            RawEvent::MouseWheel { dx, dy } => {
                self.mouse.wheel_x += dx;
                self.mouse.wheel_y += dy;
                self.control.raise(EventType::MouseWheel);
            }

            RawEvent::Quit => {
                self.should_quit = true;
            }
        }
    }

    pub fn pressed(&self) -> &[KeyCode] {
        &self.pressed
    }

    pub fn released(&self) -> &[KeyCode] {
        &self.released
    }

    pub fn held(&self) -> &[KeyCode] {
        &self.held
    }

    pub fn mouse(&self) -> &MouseEventInfo {
        &self.mouse
    }

    pub fn is_holding_key(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn is_pressed_key(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn is_released_key(&self, key: KeyCode) -> bool {
        self.released.contains(&key)
    }

    /// Terminal once set; checked by the driving loop between frames.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }
}

/// Only the specific left/right/middle bits are raised; generic
/// `MouseDown`/`MouseUp` listeners match through the bit-subset relation.
fn button_event(button: MouseButton, down: bool) -> Option<EventType> {
    let ev = match (button, down) {
        (MouseButton::Left, true) => EventType::MouseDownLeft,
        (MouseButton::Right, true) => EventType::MouseDownRight,
        (MouseButton::Middle, true) => EventType::MouseDownMiddle,
        (MouseButton::Left, false) => EventType::MouseUpLeft,
        (MouseButton::Right, false) => EventType::MouseUpRight,
        (MouseButton::Middle, false) => EventType::MouseUpMiddle,
        (MouseButton::Other(_), _) => return None,
    };
    Some(ev)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIN: Option<WindowSize> = Some(WindowSize::new(800, 600));

    fn has_duplicates(keys: &[KeyCode]) -> bool {
        keys.iter()
            .enumerate()
            .any(|(i, k)| keys[i + 1..].contains(k))
    }

    // ── keys ──

    #[test]
    fn repeated_key_down_is_held_once() {
        let mut q = EventQueue::new();
        q.poll(WIN, [RawEvent::KeyDown(KeyCode::A), RawEvent::KeyDown(KeyCode::A)]);
        assert_eq!(q.pressed(), &[KeyCode::A]);
        assert_eq!(q.held(), &[KeyCode::A]);

        q.reset_control_word();
        q.poll(WIN, [RawEvent::KeyDown(KeyCode::A)]);
        assert!(q.pressed().is_empty());
        assert_eq!(q.held(), &[KeyCode::A]);
        assert!(!q.control_word().contains(EventType::KeyDown));
    }

    #[test]
    fn held_never_duplicates_and_released_were_held() {
        use RawEvent::*;
        let events = [
            KeyDown(KeyCode::A),
            KeyDown(KeyCode::B),
            KeyDown(KeyCode::A),
            KeyUp(KeyCode::C),
            KeyDown(KeyCode::B),
            KeyUp(KeyCode::A),
            KeyDown(KeyCode::A),
            KeyUp(KeyCode::A),
            KeyDown(KeyCode::A),
            KeyUp(KeyCode::B),
            KeyUp(KeyCode::B),
            KeyUp(KeyCode::A),
            KeyDown(KeyCode::C),
        ];

        let mut q = EventQueue::new();
        for ev in events {
            let before = q.held().to_vec();
            q.reset_control_word();
            q.poll(WIN, [ev]);
            assert!(!has_duplicates(q.held()), "{:?}", q.held());
            for k in q.released() {
                assert!(before.contains(k), "{k:?} released without being held");
            }
        }
        assert_eq!(q.held(), &[KeyCode::C]);

        q.poll(WIN, events);
        assert!(!has_duplicates(q.held()), "{:?}", q.held());
    }

    #[test]
    fn key_up_without_down_is_ignored() {
        let mut q = EventQueue::new();
        q.poll(WIN, [RawEvent::KeyUp(KeyCode::Q)]);
        assert!(q.released().is_empty());
        assert!(!q.control_word().contains(EventType::KeyUp));
    }

    #[test]
    fn pressed_and_released_are_rebuilt_each_poll() {
        let mut q = EventQueue::new();
        q.poll(WIN, [RawEvent::KeyDown(KeyCode::A)]);
        q.poll(WIN, [RawEvent::KeyUp(KeyCode::A)]);
        assert!(q.pressed().is_empty());
        assert!(q.is_released_key(KeyCode::A));
        q.poll(WIN, []);
        assert!(q.released().is_empty());
        assert!(!q.is_holding_key(KeyCode::A));
    }

    // ── mouse ──

    #[test]
    fn motion_is_normalized_with_y_up() {
        let mut q = EventQueue::new();
        q.poll(
            WIN,
            [RawEvent::MouseMotion { x: 200, y: 150, xrel: 3, yrel: -2 }],
        );
        let m = q.mouse();
        assert!((m.x + 0.5).abs() < 1e-6);
        assert!((m.y - 0.5).abs() < 1e-6);
        assert_eq!((m.dx, m.dy), (3.0, -2.0));
        assert_eq!((m.screen_x, m.screen_y), (200, 150));
        assert!(q.control_word().contains(EventType::MouseMove));
    }

    #[test]
    fn buttons_raise_specific_bits_only() {
        let mut q = EventQueue::new();
        q.poll(WIN, [RawEvent::MouseButtonDown(MouseButton::Middle)]);
        let cw = q.control_word();
        assert!(cw.contains(EventType::MouseDownMiddle));
        assert!(cw.contains(EventType::MouseDown));
        assert!(!cw.contains(EventType::MouseDownLeft));
        assert_eq!(cw.bits(), EventType::MouseDownMiddle.bits());
    }

    #[test]
    fn other_buttons_raise_nothing() {
        let mut q = EventQueue::new();
        q.poll(WIN, [RawEvent::MouseButtonUp(MouseButton::Other(4))]);
        assert_eq!(q.control_word(), ControlWord::new());
    }

    #[test]
    fn wheel_accumulates_within_a_frame() {
        let mut q = EventQueue::new();
        q.poll(
            WIN,
            [
                RawEvent::MouseWheel { dx: 0.0, dy: 1.0 },
                RawEvent::MouseWheel { dx: 0.5, dy: 2.0 },
            ],
        );
        assert_eq!((q.mouse().wheel_x, q.mouse().wheel_y), (0.5, 3.0));
        assert!(q.control_word().contains(EventType::MouseWheel));
        q.poll(WIN, []);
        assert_eq!(q.mouse().wheel_y, 0.0);
    }

    // ── lifecycle ──

    #[test]
    fn polling_without_window_changes_nothing() {
        let mut q = EventQueue::new();
        q.poll(WIN, [RawEvent::KeyDown(KeyCode::A)]);
        let status = q.poll(None, [RawEvent::Quit, RawEvent::KeyUp(KeyCode::A)]);
        assert_eq!(status, PollStatus::NoWindow);
        assert!(!q.should_quit());
        assert_eq!(q.pressed(), &[KeyCode::A]);
    }

    #[test]
    fn quit_is_terminal() {
        let mut q = EventQueue::new();
        assert_eq!(q.poll(WIN, [RawEvent::Quit]), PollStatus::Polled { events: 1 });
        q.reset_control_word();
        q.poll(WIN, []);
        assert!(q.should_quit());
    }
}
