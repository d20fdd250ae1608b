//! Edge detection for polled button and axis levels
//!
//! Buttons run a two-state machine per index so a held button produces a single
//! activation. Axes are quantized: the raw reading is divided down to a coarse
//! level and only a *changed* level is reported back for evaluation.

use crate::config::Direction;
use std::collections::HashMap;
use tracing::debug;

/// Default divisor applied to raw axis readings (`0..=65535` becomes `0..=15`)
pub const AXIS_DIVISOR: i32 = 4096;
/// Scaled rest position of a centered stick (`32768 / 4096`)
pub const AXIS_CENTER: i32 = 8;
/// Distance from center, in scaled levels, an axis has to exceed to fire
pub const AXIS_THRESHOLD: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    Pressed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonTransition {
    Activated,
    Deactivated,
}

/// Quantization constants for analog axes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisScaling {
    pub divisor: i32,
    pub center: i32,
    pub threshold: i32,
}

impl Default for AxisScaling {
    fn default() -> Self {
        Self {
            divisor: AXIS_DIVISOR,
            center: AXIS_CENTER,
            threshold: AXIS_THRESHOLD,
        }
    }
}

impl AxisScaling {
    pub fn scale(&self, raw: i32) -> i32 {
        raw / self.divisor
    }

    pub fn relative(&self, scaled: i32) -> i32 {
        scaled.saturating_sub(self.center)
    }

    /// True when `relative` lies beyond the threshold on the side of `direction`
    pub fn fires(&self, relative: i32, direction: Direction) -> bool {
        match direction {
            Direction::Positive => relative > self.threshold,
            Direction::Negative => relative < -self.threshold,
        }
    }
}

/// Scaled axis reading that differed from the previous tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisLevel {
    pub scaled: i32,
    pub relative: i32,
}

/// Per-index memory of the last observed button and axis levels
#[derive(Debug, Default)]
pub struct EdgeDetector {
    scaling: AxisScaling,
    buttons: HashMap<usize, ButtonState>,
    axes: HashMap<usize, i32>,
}

impl EdgeDetector {
    pub fn new(scaling: AxisScaling) -> Self {
        Self {
            scaling,
            buttons: HashMap::new(),
            axes: HashMap::new(),
        }
    }

    pub fn scaling(&self) -> &AxisScaling {
        &self.scaling
    }

    /// Feeds one raw button level and returns the transition it caused, if any.
    /// Unseen indices start released.
    pub fn update_button(&mut self, index: usize, pressed: bool) -> Option<ButtonTransition> {
        let state = self.buttons.entry(index).or_default();
        match (*state, pressed) {
            (ButtonState::Released, true) => {
                *state = ButtonState::Pressed;
                Some(ButtonTransition::Activated)
            }
            (ButtonState::Pressed, false) => {
                *state = ButtonState::Released;
                Some(ButtonTransition::Deactivated)
            }
            // repeat suppression
            _ => None,
        }
    }

    pub fn button_state(&self, index: usize) -> ButtonState {
        self.buttons.get(&index).copied().unwrap_or_default()
    }

    /// Feeds one raw axis reading. Returns the new level only when the scaled
    /// value differs from the last one seen for this axis.
    pub fn update_axis(&mut self, index: usize, raw: i32) -> Option<AxisLevel> {
        let scaled = self.scaling.scale(raw);
        if self.axes.insert(index, scaled) == Some(scaled) {
            return None;
        }

        let relative = self.scaling.relative(scaled);
        debug!(
            "Axis {} level changed: raw {} -> scaled {} (relative {})",
            index, raw, scaled, relative
        );
        Some(AxisLevel { scaled, relative })
    }
}
