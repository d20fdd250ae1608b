//! Controller subsystem for gamepad input handling
//!
//! Splits device access from signal interpretation:
//!
//! 1. [`event_collector`] - gilrs-backed [`InputSource`] producing [`DeviceState`] snapshots
//! 2. [`edge_detector`] - debounced button transitions and quantized axis levels
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Collector ──► DeviceState ──► EdgeDetector ──► transitions / axis levels
//!             (poll)        (per tick)
//! ```

pub mod edge_detector;
pub mod event_collector;

pub use edge_detector::{AxisLevel, AxisScaling, ButtonState, ButtonTransition, EdgeDetector};
pub use event_collector::EventCollector;

/// Raw axis reading of a centered stick
pub const AXIS_REST: i32 = 32768;
/// Largest raw axis reading
pub const AXIS_MAX: i32 = 65535;

/// One polled view of the active device
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub buttons: Vec<bool>,
    pub axes: Vec<i32>,
}

/// What the acquired device reports about itself
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub name: String,
    pub button_count: usize,
    pub axis_count: usize,
    // Indices of the layout the device actually has a physical code for
    pub supported_buttons: Vec<usize>,
    pub supported_axes: Vec<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to acquire input device: {0}")]
    AcquisitionFailed(String),

    #[error("No gamepad found")]
    NotFound,

    #[error("Gamepad '{name}' disconnected")]
    Disconnected { name: String },
}

/// Source of periodic device snapshots
pub trait InputSource {
    /// Returns the current button and axis levels of the device
    fn poll(&mut self) -> Result<DeviceState, DeviceError>;

    fn capabilities(&self) -> Capabilities;
}
