/// Bit pattern raised by every frame tick.
pub const FRAME_TICK: u32 = 0x0001_0000;

/// Event classification with category-encoded bit patterns.
///
/// A generic event (e.g. [`EventType::MouseDown`]) is a bit-subset of every specific
/// variant of it (e.g. [`EventType::MouseDownLeft`]), so a listener on the generic type
/// fires whenever any specific variant is raised.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventType {
    None = 0x0001_0000,
    KeyDown = 0x0001_0001,
    KeyUp = 0x0001_0002,
    MouseMove = 0x0001_0004,
    MouseDown = 0x0001_0008,
    MouseUp = 0x0001_0010,
    MouseWheel = 0x0001_0020,
    MouseDownLeft = 0x0001_0108,
    MouseUpLeft = 0x0001_0210,
    MouseDownRight = 0x0001_0408,
    MouseUpRight = 0x0001_0810,
    MouseDownMiddle = 0x0001_1008,
    MouseUpMiddle = 0x0001_2010,
    KeyHold = 0x0011_0001,
    Click = 0x0002_0001,
}

impl EventType {
    pub const ALL: [EventType; 15] = [
        EventType::None,
        EventType::KeyDown,
        EventType::KeyUp,
        EventType::MouseMove,
        EventType::MouseDown,
        EventType::MouseUp,
        EventType::MouseWheel,
        EventType::MouseDownLeft,
        EventType::MouseUpLeft,
        EventType::MouseDownRight,
        EventType::MouseUpRight,
        EventType::MouseDownMiddle,
        EventType::MouseUpMiddle,
        EventType::KeyHold,
        EventType::Click,
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// True when every bit of this event is raised in `control`.
    #[inline]
    pub const fn matches(self, control: ControlWord) -> bool {
        self.bits() & !control.bits() == 0
    }

    /// Generic events that fire whenever `self` is raised.
    pub const fn generalizations(self) -> &'static [EventType] {
        use EventType::*;
        match self {
            None | Click => &[],
            KeyDown | KeyUp | MouseMove | MouseDown | MouseUp | MouseWheel => &[None],
            KeyHold => &[KeyDown, None],
            MouseDownLeft | MouseDownRight | MouseDownMiddle => &[MouseDown, None],
            MouseUpLeft | MouseUpRight | MouseUpMiddle => &[MouseUp, None],
        }
    }

    pub const fn is_keyboard(self) -> bool {
        matches!(self, EventType::KeyDown | EventType::KeyUp | EventType::KeyHold)
    }

    pub const fn is_mouse(self) -> bool {
        use EventType::*;
        matches!(
            self,
            MouseMove
                | MouseDown
                | MouseUp
                | MouseWheel
                | MouseDownLeft
                | MouseUpLeft
                | MouseDownRight
                | MouseUpRight
                | MouseDownMiddle
                | MouseUpMiddle
        )
    }
}

/// Per-frame accumulator of raised event bits.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ControlWord(u32);

impl ControlWord {
    /// Fresh word holding only the frame-tick bit.
    #[inline]
    pub const fn new() -> Self {
        ControlWord(FRAME_TICK)
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        ControlWord(bits)
    }

    #[inline]
    pub fn raise(&mut self, event: EventType) {
        self.0 |= event.bits();
    }

    #[inline]
    pub fn raise_bits(&mut self, bits: u32) {
        self.0 |= bits;
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, event: EventType) -> bool {
        event.matches(self)
    }
}

impl Default for ControlWord {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ControlWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ControlWord({:#010x})", self.0)
    }
}
