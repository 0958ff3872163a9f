use std::fmt;

use crate::input::{EventInfo, EventType};

/// Listener handler. Captures its own state.
pub type Handler = Box<dyn FnMut(&EventInfo<'_>)>;

/// Listener identifier. `0` is reserved for "assign one for me".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(u32);

impl ListenerId {
    pub const AUTO: ListenerId = ListenerId(0);

    pub const fn new(raw: u32) -> Self {
        ListenerId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Registration options for [`ListenerRegistry::add`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ListenerOptions {
    /// Suppress later listeners of the same type with lower or equal priority.
    pub mask: bool,
    pub id: ListenerId,
    /// Higher runs first.
    pub priority: u8,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            mask: true,
            id: ListenerId::AUTO,
            priority: 10,
        }
    }
}

impl ListenerOptions {
    pub fn with_mask(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = ListenerId(id);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

/// Public view of a registration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ListenerInfo {
    pub id: ListenerId,
    pub event_type: EventType,
    pub priority: u8,
    pub mask: bool,
}

pub(super) struct Listener {
    pub(super) info: ListenerInfo,
    seq: u64,
    pub(super) handler: Handler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("info", &self.info)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Listeners kept in dispatch order: descending priority, then registration order.
#[derive(Debug)]
pub struct ListenerRegistry {
    pub(super) listeners: Vec<Listener>,
    next_seq: u64,
    rng: XorShift32,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_seq: 0,
            rng: XorShift32::new(0x9E37_79B9),
        }
    }

    /// Registers `handler` for `event_type`.
    ///
    /// An id of `0`, or one already in use, is replaced by a fresh random id.
    pub fn add<F>(&mut self, event_type: EventType, handler: F, opts: ListenerOptions) -> ListenerInfo
    where
        F: FnMut(&EventInfo<'_>) + 'static,
    {
        let id = self.valid_id(opts.id);
        let info = ListenerInfo {
            id,
            event_type,
            priority: opts.priority,
            mask: opts.mask,
        };

        self.listeners.push(Listener {
            info,
            seq: self.next_seq,
            handler: Box::new(handler),
        });
        self.next_seq += 1;
        self.sort();

        log::debug!(
            "listener {} added: {:?} priority={} mask={}",
            id.raw(),
            event_type,
            info.priority,
            info.mask
        );
        info
    }

    /// Removes the listener with `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: ListenerId) -> Option<ListenerInfo> {
        let pos = self.position(id)?;
        let removed = self.listeners.swap_remove(pos);
        self.sort();
        log::debug!("listener {} removed", id.raw());
        Some(removed.info)
    }

    /// Priority of `id`, or `0` when unknown.
    pub fn priority(&self, id: ListenerId) -> u8 {
        self.get(id).map_or(0, |l| l.priority)
    }

    /// Mask flag of `id`, or `false` when unknown.
    pub fn mask(&self, id: ListenerId) -> bool {
        self.get(id).is_some_and(|l| l.mask)
    }

    /// Changes the priority of `id` and restores dispatch order.
    pub fn set_priority(&mut self, id: ListenerId, priority: u8) {
        if let Some(pos) = self.position(id) {
            self.listeners[pos].info.priority = priority;
            self.sort();
        }
    }

    pub fn set_mask(&mut self, id: ListenerId, mask: bool) {
        if let Some(pos) = self.position(id) {
            self.listeners[pos].info.mask = mask;
        }
    }

    pub fn get(&self, id: ListenerId) -> Option<ListenerInfo> {
        self.listeners.iter().find(|l| l.info.id == id).map(|l| l.info)
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Registrations in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = ListenerInfo> + '_ {
        self.listeners.iter().map(|l| l.info)
    }

    fn position(&self, id: ListenerId) -> Option<usize> {
        if id == ListenerId::AUTO {
            return None;
        }
        self.listeners.iter().position(|l| l.info.id == id)
    }

    fn valid_id(&mut self, mut id: ListenerId) -> ListenerId {
        while id == ListenerId::AUTO || self.position(id).is_some() {
            id = ListenerId(self.rng.next());
        }
        id
    }

    // Registration sequence breaks priority ties, so swap_remove cannot reorder equals.
    fn sort(&mut self) {
        self.listeners
            .sort_by(|a, b| b.info.priority.cmp(&a.info.priority).then(a.seq.cmp(&b.seq)));
    }
}

/// Small deterministic generator for listener ids.
#[derive(Debug)]
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        XorShift32(seed.max(1))
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}
