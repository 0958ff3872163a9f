use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::input::listener::Handler;
use crate::input::{
    ControlWord, EventInfo, EventQueue, EventType, KeyCode, KeyEventInfo, KeyState,
    ListenerId, ListenerInfo, ListenerOptions, ListenerRegistry, MouseEventInfo, PollStatus,
    RawEvent, WindowSize,
};

/// Event queue, listener registry and the latest keyboard/mouse snapshots.
///
/// Owned by the application driver and passed explicitly; nothing here is global.
#[derive(Debug)]
pub struct EventSystem {
    queue: EventQueue,
    registry: ListenerRegistry,
    keyboard: KeyEventInfo,
    epoch: Instant,
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSystem {
    pub fn new() -> Self {
        Self {
            queue: EventQueue::new(),
            registry: ListenerRegistry::new(),
            keyboard: KeyEventInfo::default(),
            epoch: Instant::now(),
        }
    }

    // ── frame ──

    pub fn reset_control_word(&mut self) {
        self.queue.reset_control_word();
    }

    /// ORs raw bits into this frame's control word.
    pub fn add_control_word(&mut self, bits: u32) {
        self.queue.control_word_mut().raise_bits(bits);
    }

    pub fn control_word(&self) -> ControlWord {
        self.queue.control_word()
    }

    pub fn poll<I>(&mut self, window: Option<WindowSize>, events: I) -> PollStatus
    where
        I: IntoIterator<Item = RawEvent>,
    {
        self.queue.poll(window, events)
    }

    /// Dispatches this frame's events to matching listeners in priority order.
    ///
    /// A masking listener that fires suppresses every later listener of the same type
    /// whose priority is lower or equal.
    pub fn resolve(&mut self) {
        if !self.queue.held.is_empty() {
            self.queue.control.raise(EventType::KeyHold);
        }

        let control = self.queue.control;
        let now = self.epoch.elapsed();
        let mut masked_at: HashMap<EventType, u8> = HashMap::new();

        for listener in self.registry.listeners.iter_mut() {
            let info = listener.info;
            if masked_at.get(&info.event_type).is_some_and(|p| *p >= info.priority) {
                continue;
            }
            if !info.event_type.matches(control) {
                continue;
            }

            let handler = &mut listener.handler;
            match info.event_type {
                EventType::KeyDown => dispatch_keys(
                    &mut self.keyboard,
                    handler,
                    KeyDispatch {
                        event_type: EventType::KeyDown,
                        state: KeyState::Pressed,
                        keys: &self.queue.pressed,
                        held: &self.queue.held,
                        now,
                    },
                ),
                EventType::KeyUp => dispatch_keys(
                    &mut self.keyboard,
                    handler,
                    KeyDispatch {
                        event_type: EventType::KeyUp,
                        state: KeyState::Released,
                        keys: &self.queue.released,
                        held: &self.queue.held,
                        now,
                    },
                ),
                EventType::KeyHold => dispatch_keys(
                    &mut self.keyboard,
                    handler,
                    KeyDispatch {
                        event_type: EventType::KeyHold,
                        state: KeyState::Holding,
                        keys: &self.queue.held,
                        held: &self.queue.held,
                        now,
                    },
                ),
                ty if ty.is_mouse() => {
                    let mouse = &mut self.queue.mouse;
                    mouse.event_type = ty;
                    mouse.timestamp = now;
                    handler(&EventInfo::Mouse(&*mouse));
                }
                // Frame-tick and click listeners carry no payload.
                _ => {}
            }

            if info.mask {
                masked_at.insert(info.event_type, info.priority);
            }
        }
    }

    // ── listeners ──

    pub fn add_event_listener<F>(
        &mut self,
        event_type: EventType,
        handler: F,
        opts: ListenerOptions,
    ) -> ListenerInfo
    where
        F: FnMut(&EventInfo<'_>) + 'static,
    {
        self.registry.add(event_type, handler, opts)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> Option<ListenerInfo> {
        self.registry.remove(id)
    }

    pub fn listener_priority(&self, id: ListenerId) -> u8 {
        self.registry.priority(id)
    }

    pub fn listener_mask(&self, id: ListenerId) -> bool {
        self.registry.mask(id)
    }

    pub fn set_listener_priority(&mut self, id: ListenerId, priority: u8) {
        self.registry.set_priority(id, priority);
    }

    pub fn set_listener_mask(&mut self, id: ListenerId, mask: bool) {
        self.registry.set_mask(id, mask);
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.registry
    }

    // ── state ──

    pub fn mouse(&self) -> &MouseEventInfo {
        self.queue.mouse()
    }

    /// Keyboard snapshot from the most recent keyboard dispatch.
    pub fn keyboard(&self) -> &KeyEventInfo {
        &self.keyboard
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn is_holding_key(&self, key: KeyCode) -> bool {
        self.queue.is_holding_key(key)
    }

    pub fn is_pressed_key(&self, key: KeyCode) -> bool {
        self.queue.is_pressed_key(key)
    }

    pub fn is_released_key(&self, key: KeyCode) -> bool {
        self.queue.is_released_key(key)
    }

    pub fn should_quit(&self) -> bool {
        self.queue.should_quit()
    }

    pub fn request_quit(&mut self) {
        self.queue.request_quit();
    }
}

struct KeyDispatch<'a> {
    event_type: EventType,
    state: KeyState,
    keys: &'a [KeyCode],
    held: &'a [KeyCode],
    now: Duration,
}

/// Calls `handler` once per key, refreshing the shared snapshot before each call.
fn dispatch_keys(snapshot: &mut KeyEventInfo, handler: &mut Handler, d: KeyDispatch<'_>) {
    for &key in d.keys {
        snapshot.timestamp = d.now;
        snapshot.event_type = d.event_type;
        snapshot.key = key;
        snapshot.state = d.state;
        snapshot.held.clear();
        snapshot.held.extend_from_slice(d.held);
        handler(&EventInfo::Key(&*snapshot));
    }
}
