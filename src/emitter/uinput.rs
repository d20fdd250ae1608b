//! Linux backend: a uinput virtual keyboard driven through evdev

use super::{EmitterError, KeyEmitter};
use crate::mapping::keys::KeyCode;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use tracing::{debug, info};

const KEY_DOWN: i32 = 1;
const KEY_UP: i32 = 0;

const LETTERS: [Key; 26] = [
    Key::KEY_A,
    Key::KEY_B,
    Key::KEY_C,
    Key::KEY_D,
    Key::KEY_E,
    Key::KEY_F,
    Key::KEY_G,
    Key::KEY_H,
    Key::KEY_I,
    Key::KEY_J,
    Key::KEY_K,
    Key::KEY_L,
    Key::KEY_M,
    Key::KEY_N,
    Key::KEY_O,
    Key::KEY_P,
    Key::KEY_Q,
    Key::KEY_R,
    Key::KEY_S,
    Key::KEY_T,
    Key::KEY_U,
    Key::KEY_V,
    Key::KEY_W,
    Key::KEY_X,
    Key::KEY_Y,
    Key::KEY_Z,
];

const DIGITS: [Key; 10] = [
    Key::KEY_0,
    Key::KEY_1,
    Key::KEY_2,
    Key::KEY_3,
    Key::KEY_4,
    Key::KEY_5,
    Key::KEY_6,
    Key::KEY_7,
    Key::KEY_8,
    Key::KEY_9,
];

const KEYPAD: [Key; 10] = [
    Key::KEY_KP0,
    Key::KEY_KP1,
    Key::KEY_KP2,
    Key::KEY_KP3,
    Key::KEY_KP4,
    Key::KEY_KP5,
    Key::KEY_KP6,
    Key::KEY_KP7,
    Key::KEY_KP8,
    Key::KEY_KP9,
];

const FUNCTION_KEYS: [Key; 12] = [
    Key::KEY_F1,
    Key::KEY_F2,
    Key::KEY_F3,
    Key::KEY_F4,
    Key::KEY_F5,
    Key::KEY_F6,
    Key::KEY_F7,
    Key::KEY_F8,
    Key::KEY_F9,
    Key::KEY_F10,
    Key::KEY_F11,
    Key::KEY_F12,
];

/// Translates a Windows virtual-key code into the matching Linux input key
pub fn translate(code: KeyCode) -> Option<Key> {
    let key = match code.0 {
        vk @ 0x41..=0x5A => LETTERS[(vk - 0x41) as usize],
        vk @ 0x30..=0x39 => DIGITS[(vk - 0x30) as usize],
        vk @ 0x60..=0x69 => KEYPAD[(vk - 0x60) as usize],
        vk @ 0x70..=0x7B => FUNCTION_KEYS[(vk - 0x70) as usize],
        0x08 => Key::KEY_BACKSPACE,
        0x09 => Key::KEY_TAB,
        0x0D => Key::KEY_ENTER,
        0x10 | 0xA0 => Key::KEY_LEFTSHIFT,
        0xA1 => Key::KEY_RIGHTSHIFT,
        0x11 | 0xA2 => Key::KEY_LEFTCTRL,
        0xA3 => Key::KEY_RIGHTCTRL,
        0x12 | 0xA4 => Key::KEY_LEFTALT,
        0xA5 => Key::KEY_RIGHTALT,
        0x13 => Key::KEY_PAUSE,
        0x14 => Key::KEY_CAPSLOCK,
        0x1B => Key::KEY_ESC,
        0x20 => Key::KEY_SPACE,
        0x21 => Key::KEY_PAGEUP,
        0x22 => Key::KEY_PAGEDOWN,
        0x23 => Key::KEY_END,
        0x24 => Key::KEY_HOME,
        0x25 => Key::KEY_LEFT,
        0x26 => Key::KEY_UP,
        0x27 => Key::KEY_RIGHT,
        0x28 => Key::KEY_DOWN,
        0x2C => Key::KEY_SYSRQ,
        0x2D => Key::KEY_INSERT,
        0x2E => Key::KEY_DELETE,
        0x5B => Key::KEY_LEFTMETA,
        0x5C => Key::KEY_RIGHTMETA,
        0x5D => Key::KEY_COMPOSE,
        0x6A => Key::KEY_KPASTERISK,
        0x6B => Key::KEY_KPPLUS,
        0x6D => Key::KEY_KPMINUS,
        0x6E => Key::KEY_KPDOT,
        0x6F => Key::KEY_KPSLASH,
        0x90 => Key::KEY_NUMLOCK,
        0x91 => Key::KEY_SCROLLLOCK,
        0xAD => Key::KEY_MUTE,
        0xAE => Key::KEY_VOLUMEDOWN,
        0xAF => Key::KEY_VOLUMEUP,
        0xB0 => Key::KEY_NEXTSONG,
        0xB1 => Key::KEY_PREVIOUSSONG,
        0xB3 => Key::KEY_PLAYPAUSE,
        0xBA => Key::KEY_SEMICOLON,
        0xBB => Key::KEY_EQUAL,
        0xBC => Key::KEY_COMMA,
        0xBD => Key::KEY_MINUS,
        0xBE => Key::KEY_DOT,
        0xBF => Key::KEY_SLASH,
        0xC0 => Key::KEY_GRAVE,
        0xDB => Key::KEY_LEFTBRACE,
        0xDC => Key::KEY_BACKSLASH,
        0xDD => Key::KEY_RIGHTBRACE,
        0xDE => Key::KEY_APOSTROPHE,
        _ => return None,
    };
    Some(key)
}

/// uinput keyboard that accepts every translatable key
pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    pub fn create(name: &str) -> Result<Self, EmitterError> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 0..=u8::MAX {
            if let Some(key) = translate(KeyCode(code)) {
                keys.insert(key);
            }
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| EmitterError::Unavailable(format!("cannot open /dev/uinput: {}", e)))?
            .name(name)
            .with_keys(&keys)?
            .build()?;

        info!("Created virtual keyboard '{}'", name);
        Ok(Self { device })
    }

    fn emit(&mut self, code: KeyCode, value: i32) -> Result<(), EmitterError> {
        let key = translate(code).ok_or(EmitterError::UnmappedKey(code))?;
        debug!("uinput {:?} = {}", key, value);
        self.device
            .emit(&[InputEvent::new(EventType::KEY, key.code(), value)])?;
        Ok(())
    }
}

impl KeyEmitter for VirtualKeyboard {
    fn press_key(&mut self, code: KeyCode) -> Result<(), EmitterError> {
        self.emit(code, KEY_DOWN)
    }

    fn release_key(&mut self, code: KeyCode) -> Result<(), EmitterError> {
        self.emit(code, KEY_UP)
    }
}
