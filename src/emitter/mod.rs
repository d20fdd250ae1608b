//! Key injection backends
//!
//! Everything above this module talks to [`KeyEmitter`]; the platform backend is
//! picked once at startup by [`system_emitter`].

#[cfg(target_os = "linux")]
pub mod uinput;

use crate::mapping::keys::KeyCode;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    #[error("Key injection unavailable: {0}")]
    Unavailable(String),

    #[error("Key injection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key {0} has no mapping on this platform")]
    UnmappedKey(KeyCode),
}

/// Sink for raw key-down/key-up events
pub trait KeyEmitter {
    fn press_key(&mut self, code: KeyCode) -> Result<(), EmitterError>;

    fn release_key(&mut self, code: KeyCode) -> Result<(), EmitterError>;
}

/// Emitter that only logs, used with `--dry-run`
#[derive(Debug, Default)]
pub struct DryRunEmitter;

impl KeyEmitter for DryRunEmitter {
    fn press_key(&mut self, code: KeyCode) -> Result<(), EmitterError> {
        info!("[dry-run] key down: {} ({})", code, code.0);
        Ok(())
    }

    fn release_key(&mut self, code: KeyCode) -> Result<(), EmitterError> {
        info!("[dry-run] key up: {} ({})", code, code.0);
        Ok(())
    }
}

/// Creates the key emitter for the running platform
#[cfg(target_os = "linux")]
pub fn system_emitter() -> Result<Box<dyn KeyEmitter>, EmitterError> {
    Ok(Box::new(uinput::VirtualKeyboard::create(
        "Gamepad Key Mapper Virtual Keyboard",
    )?))
}

#[cfg(not(target_os = "linux"))]
pub fn system_emitter() -> Result<Box<dyn KeyEmitter>, EmitterError> {
    Err(EmitterError::Unavailable(format!(
        "no key injection backend for {}, use --dry-run",
        std::env::consts::OS
    )))
}
