use std::fmt;

/// Keyboard key identifier.
///
/// Values follow the SDL keycode table: printable keys use their ASCII code,
/// everything else lives above `0x4000_0000`. Codes are lookup keys only and are
/// never combined arithmetically.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct KeyCode(u32);

macro_rules! keycodes {
    ($($name:ident = $value:expr),* $(,)?) => {
        impl KeyCode {
            $(pub const $name: KeyCode = KeyCode($value);)*

            /// Table name of a known key (`"ESCAPE"`, `"A"`, ...).
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

keycodes! {
    UNKNOWN = 0x00,
    BACKSPACE = 0x08,
    TAB = 0x09,
    RETURN = 0x0D,
    ESCAPE = 0x1B,
    SPACE = 0x20,
    EXCLAIM = 0x21,
    QUOTEDBL = 0x22,
    HASH = 0x23,
    DOLLAR = 0x24,
    PERCENT = 0x25,
    AMPERSAND = 0x26,
    QUOTE = 0x27,
    LEFTPAREN = 0x28,
    RIGHTPAREN = 0x29,
    ASTERISK = 0x2A,
    PLUS = 0x2B,
    COMMA = 0x2C,
    MINUS = 0x2D,
    PERIOD = 0x2E,
    SLASH = 0x2F,
    N0 = 0x30,
    N1 = 0x31,
    N2 = 0x32,
    N3 = 0x33,
    N4 = 0x34,
    N5 = 0x35,
    N6 = 0x36,
    N7 = 0x37,
    N8 = 0x38,
    N9 = 0x39,
    COLON = 0x3A,
    SEMICOLON = 0x3B,
    LESS = 0x3C,
    EQUALS = 0x3D,
    GREATER = 0x3E,
    QUESTION = 0x3F,
    AT = 0x40,
    LEFTBRACKET = 0x5B,
    BACKSLASH = 0x5C,
    RIGHTBRACKET = 0x5D,
    CARET = 0x5E,
    UNDERSCORE = 0x5F,
    BACKQUOTE = 0x60,
    A = 0x61,
    B = 0x62,
    C = 0x63,
    D = 0x64,
    E = 0x65,
    F = 0x66,
    G = 0x67,
    H = 0x68,
    I = 0x69,
    J = 0x6A,
    K = 0x6B,
    L = 0x6C,
    M = 0x6D,
    N = 0x6E,
    O = 0x6F,
    P = 0x70,
    Q = 0x71,
    R = 0x72,
    S = 0x73,
    T = 0x74,
    U = 0x75,
    V = 0x76,
    W = 0x77,
    X = 0x78,
    Y = 0x79,
    Z = 0x7A,
    DELETE = 0x7F,
    CAPSLOCK = 0x4000_0039,
    F1 = 0x4000_003A,
    F2 = 0x4000_003B,
    F3 = 0x4000_003C,
    F4 = 0x4000_003D,
    F5 = 0x4000_003E,
    F6 = 0x4000_003F,
    F7 = 0x4000_0040,
    F8 = 0x4000_0041,
    F9 = 0x4000_0042,
    F10 = 0x4000_0043,
    F11 = 0x4000_0044,
    F12 = 0x4000_0045,
    PRINTSCREEN = 0x4000_0046,
    SCROLLLOCK = 0x4000_0047,
    PAUSE = 0x4000_0048,
    INSERT = 0x4000_0049,
    HOME = 0x4000_004A,
    PAGEUP = 0x4000_004B,
    END = 0x4000_004D,
    PAGEDOWN = 0x4000_004E,
    RIGHT = 0x4000_004F,
    LEFT = 0x4000_0050,
    DOWN = 0x4000_0051,
    UP = 0x4000_0052,
    NUMLOCKCLEAR = 0x4000_0053,
    KP_DIVIDE = 0x4000_0054,
    KP_MULTIPLY = 0x4000_0055,
    KP_MINUS = 0x4000_0056,
    KP_PLUS = 0x4000_0057,
    KP_ENTER = 0x4000_0058,
    KP_1 = 0x4000_0059,
    KP_2 = 0x4000_005A,
    KP_3 = 0x4000_005B,
    KP_4 = 0x4000_005C,
    KP_5 = 0x4000_005D,
    KP_6 = 0x4000_005E,
    KP_7 = 0x4000_005F,
    KP_8 = 0x4000_0060,
    KP_9 = 0x4000_0061,
    KP_0 = 0x4000_0062,
    KP_PERIOD = 0x4000_0063,
    APPLICATION = 0x4000_0065,
    POWER = 0x4000_0066,
    KP_EQUALS = 0x4000_0067,
    CTRL_LEFT = 0x4000_00E0,
    SHIFT_LEFT = 0x4000_00E1,
    ALT_LEFT = 0x4000_00E2,
    CTRL_RIGHT = 0x4000_00E4,
    SHIFT_RIGHT = 0x4000_00E5,
    ALT_RIGHT = 0x4000_00E6,
}

impl KeyCode {
    /// Wraps a raw platform code. Codes outside the table are kept as-is.
    #[inline]
    pub const fn from_raw(code: u32) -> Self {
        KeyCode(code)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Character for printable ASCII keys.
    pub fn to_char(self) -> Option<char> {
        u8::try_from(self.0)
            .ok()
            .filter(|b| b.is_ascii_graphic() || *b == b' ')
            .map(char::from)
    }
}

impl fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "KeyCode::{name}"),
            None => write!(f, "KeyCode({:#x})", self.0),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_use_ascii_codes() {
        assert_eq!(KeyCode::A.raw(), b'a' as u32);
        assert_eq!(KeyCode::Z.to_char(), Some('z'));
        assert_eq!(KeyCode::SPACE.to_char(), Some(' '));
    }

    #[test]
    fn control_keys_have_no_char() {
        assert_eq!(KeyCode::ESCAPE.to_char(), None);
        assert_eq!(KeyCode::F1.to_char(), None);
    }

    #[test]
    fn names_resolve_for_table_entries_only() {
        assert_eq!(KeyCode::ESCAPE.name(), Some("ESCAPE"));
        assert_eq!(KeyCode::from_raw(0x4000_0120).name(), None);
        assert_eq!(format!("{:?}", KeyCode::UP), "KeyCode::UP");
    }
}
