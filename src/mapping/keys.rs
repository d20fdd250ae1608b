//! Virtuelle Tastencodes und die Modifier-Klassifizierung
//!
//! Profile speichern Tasten als Windows-Virtual-Key-Codes (z.B. `0x10` für Shift,
//! `0x41` für 'A'). Dieses Modul kapselt den Code und entscheidet, welche Tasten
//! als Modifier gelten.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ein virtueller Tastencode aus einer Profildatei
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const SHIFT: KeyCode = KeyCode(0x10);
    pub const CONTROL: KeyCode = KeyCode(0x11);
    pub const ALT: KeyCode = KeyCode(0x12);
    pub const LEFT_SUPER: KeyCode = KeyCode(0x5B);
    pub const RIGHT_SUPER: KeyCode = KeyCode(0x5C);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0xA0);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0xA1);
    pub const LEFT_CONTROL: KeyCode = KeyCode(0xA2);
    pub const RIGHT_CONTROL: KeyCode = KeyCode(0xA3);
    pub const LEFT_ALT: KeyCode = KeyCode(0xA4);
    pub const RIGHT_ALT: KeyCode = KeyCode(0xA5);

    /// Prüft, ob die Taste mit einer folgenden Taste kombiniert wird (Shift, Ctrl, Alt, Super)
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyCode::SHIFT
                | KeyCode::CONTROL
                | KeyCode::ALT
                | KeyCode::LEFT_SUPER
                | KeyCode::RIGHT_SUPER
                | KeyCode::LEFT_SHIFT
                | KeyCode::RIGHT_SHIFT
                | KeyCode::LEFT_CONTROL
                | KeyCode::RIGHT_CONTROL
                | KeyCode::LEFT_ALT
                | KeyCode::RIGHT_ALT
        )
    }

    /// Lesbarer Name für Logausgaben, falls bekannt
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0x08 => "Backspace",
            0x09 => "Tab",
            0x0D => "Enter",
            0x10 => "Shift",
            0x11 => "Ctrl",
            0x12 => "Alt",
            0x1B => "Escape",
            0x20 => "Space",
            0x25 => "Left",
            0x26 => "Up",
            0x27 => "Right",
            0x28 => "Down",
            0x5B => "LSuper",
            0x5C => "RSuper",
            0xA0 => "LShift",
            0xA1 => "RShift",
            0xA2 => "LCtrl",
            0xA3 => "RCtrl",
            0xA4 => "LAlt",
            0xA5 => "RAlt",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self.0) {
            (Some(name), _) => write!(f, "{}", name),
            (None, code @ (b'0'..=b'9' | b'A'..=b'Z')) => write!(f, "{}", code as char),
            (None, code) => write!(f, "0x{:02X}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_are_classified() {
        for code in [0x10, 0x11, 0x12, 0x5B, 0x5C, 0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5] {
            assert!(KeyCode(code).is_modifier(), "0x{code:02X} should be a modifier");
        }
        for code in [0x41, 0x20, 0x0D, 0x70, 0x5D, 0x13] {
            assert!(!KeyCode(code).is_modifier(), "0x{code:02X} is not a modifier");
        }
    }

    #[test]
    fn display_prefers_names_then_characters() {
        assert_eq!(KeyCode::SHIFT.to_string(), "Shift");
        assert_eq!(KeyCode(0x41).to_string(), "A");
        assert_eq!(KeyCode(0x37).to_string(), "7");
        assert_eq!(KeyCode(0x70).to_string(), "0x70");
    }

    #[test]
    fn deserializes_from_plain_integer() {
        let keys: Vec<KeyCode> = serde_json::from_str("[16, 65]").unwrap();
        assert_eq!(keys, vec![KeyCode::SHIFT, KeyCode(0x41)]);
        assert!(serde_json::from_str::<Vec<KeyCode>>("[300]").is_err());
    }
}
