//! Fakes for the device and key injection seams

use crate::controller::{Capabilities, DeviceError, DeviceState, InputSource};
use crate::emitter::{EmitterError, KeyEmitter};
use crate::mapping::composer::KeyAction;
use crate::mapping::keys::KeyCode;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Records every action; clones share one log so a boxed copy can be inspected
#[derive(Clone, Debug, Default)]
pub struct RecordingEmitter {
    log: Rc<RefCell<Vec<KeyAction>>>,
    fail_on: Option<KeyAction>,
}

impl RecordingEmitter {
    pub fn failing_on(action: KeyAction) -> Self {
        Self {
            log: Rc::default(),
            fail_on: Some(action),
        }
    }

    pub fn actions(&self) -> Vec<KeyAction> {
        self.log.borrow().clone()
    }

    fn record(&mut self, action: KeyAction, code: KeyCode) -> Result<(), EmitterError> {
        if self.fail_on == Some(action) {
            return Err(EmitterError::UnmappedKey(code));
        }
        self.log.borrow_mut().push(action);
        Ok(())
    }
}

impl KeyEmitter for RecordingEmitter {
    fn press_key(&mut self, code: KeyCode) -> Result<(), EmitterError> {
        self.record(KeyAction::Press(code), code)
    }

    fn release_key(&mut self, code: KeyCode) -> Result<(), EmitterError> {
        self.record(KeyAction::Release(code), code)
    }
}

/// Replays a fixed list of snapshots, then reports a disconnect
#[derive(Debug, Default)]
pub struct ScriptedSource {
    snapshots: VecDeque<DeviceState>,
    capabilities: Capabilities,
    polls: Rc<RefCell<usize>>,
}

impl ScriptedSource {
    pub fn new(snapshots: impl IntoIterator<Item = DeviceState>) -> Self {
        Self {
            snapshots: snapshots.into_iter().collect(),
            capabilities: Capabilities {
                name: "Scripted Pad".to_string(),
                button_count: 4,
                axis_count: 2,
                supported_buttons: (0..4).collect(),
                supported_axes: (0..2).collect(),
            },
            polls: Rc::default(),
        }
    }

    pub fn poll_counter(&self) -> Rc<RefCell<usize>> {
        Rc::clone(&self.polls)
    }
}

impl InputSource for ScriptedSource {
    fn poll(&mut self) -> Result<DeviceState, DeviceError> {
        *self.polls.borrow_mut() += 1;
        self.snapshots
            .pop_front()
            .ok_or_else(|| DeviceError::Disconnected {
                name: self.capabilities.name.clone(),
            })
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }
}

/// Snapshot with the given buttons held and axes at the given raw values
pub fn snapshot(buttons: &[bool], axes: &[i32]) -> DeviceState {
    DeviceState {
        buttons: buttons.to_vec(),
        axes: axes.to_vec(),
    }
}
