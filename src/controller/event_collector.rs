use super::{Capabilities, DeviceError, DeviceState, InputSource, AXIS_MAX, AXIS_REST};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

// Button indices follow the usual XInput/DirectInput numbering
pub const BUTTON_LAYOUT: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
    Button::LeftTrigger2,
    Button::RightTrigger2,
];

pub const AXIS_LAYOUT: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
];

/// Polls the first connected gamepad through gilrs
pub struct EventCollector {
    // Gilrs context
    gilrs: Gilrs,

    // Active gamepad
    active_gamepad: GamepadId,

    // Name kept for disconnect reports
    name: String,
}

impl EventCollector {
    /// Initializes gilrs and picks the first connected gamepad
    pub fn acquire() -> Result<Self, DeviceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(DeviceError::AcquisitionFailed(e.to_string()));
            }
        };

        let gamepads: Vec<(GamepadId, String)> = gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected");
            return Err(DeviceError::NotFound);
        }

        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, name)) in gamepads.iter().enumerate() {
            info!("  [{}] ID: {}, Name: {}", idx, id, name);
        }

        let (active_gamepad, name) = gamepads[0].clone();
        info!("Selected gamepad: {} ({})", name, active_gamepad);

        Ok(Self {
            gilrs,
            active_gamepad,
            name,
        })
    }

    // Drains pending gilrs events so the cached gamepad state is current
    fn pump_events(&mut self) -> Result<(), DeviceError> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if id != self.active_gamepad {
                debug!("Skipping event from non-active gamepad: {:?}", id);
                continue;
            }
            if let EventType::Disconnected = event {
                warn!("Controller disconnected event detected");
                return Err(DeviceError::Disconnected {
                    name: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn gamepad(&self) -> Option<Gamepad<'_>> {
        self.gilrs.connected_gamepad(self.active_gamepad)
    }
}

impl InputSource for EventCollector {
    fn poll(&mut self) -> Result<DeviceState, DeviceError> {
        self.pump_events()?;

        let gamepad = self.gamepad().ok_or_else(|| DeviceError::Disconnected {
            name: self.name.clone(),
        })?;

        Ok(DeviceState {
            buttons: BUTTON_LAYOUT
                .iter()
                .map(|button| gamepad.is_pressed(*button))
                .collect(),
            axes: AXIS_LAYOUT
                .iter()
                .map(|axis| to_raw(gamepad.value(*axis)))
                .collect(),
        })
    }

    fn capabilities(&self) -> Capabilities {
        let (supported_buttons, supported_axes) = match self.gamepad() {
            Some(gamepad) => (
                BUTTON_LAYOUT
                    .iter()
                    .enumerate()
                    .filter(|(_, button)| gamepad.button_code(**button).is_some())
                    .map(|(index, _)| index)
                    .collect(),
                AXIS_LAYOUT
                    .iter()
                    .enumerate()
                    .filter(|(_, axis)| gamepad.axis_code(**axis).is_some())
                    .map(|(index, _)| index)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Capabilities {
            name: self.name.clone(),
            button_count: BUTTON_LAYOUT.len(),
            axis_count: AXIS_LAYOUT.len(),
            supported_buttons,
            supported_axes,
        }
    }
}

// gilrs reports axes in -1.0..=1.0, the profile thresholds expect 0..=65535
fn to_raw(value: f32) -> i32 {
    let value = value.clamp(-1.0, 1.0);
    let raw = AXIS_REST as f32 + value * (AXIS_REST as f32);
    (raw.round() as i32).clamp(0, AXIS_MAX)
}
