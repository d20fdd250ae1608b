//! Poll loop with statum state machine
//!
//! Each tick pulls one [`DeviceState`](crate::controller::DeviceState) from the
//! input source, runs edge detection, resolves the mapped keys and plays them
//! through the key emitter.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Active ──► Stopped
//!                    │
//!                 (tick loop until shutdown or error)
//! ```
//!
//! # Architecture
//!
//! ```text
//! InputSource ──► EdgeDetector ──► MappingTable ──► composer ──► KeyEmitter
//! ```

use crate::config::{join_keys, ButtonMode};
use crate::controller::{AxisScaling, ButtonTransition, EdgeDetector, InputSource};
use crate::emitter::KeyEmitter;
use crate::mapping::composer::{self, HeldKeys};
use crate::mapping::keys::KeyCode;
use crate::mapping::{MappingError, MappingTable};
use chrono::Local;
use statum::{machine, state};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runtime settings of the poll loop
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub tick_interval: Duration,
    pub axis_scaling: AxisScaling,
    pub verbose: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            axis_scaling: AxisScaling::default(),
            verbose: false,
        }
    }
}

/// Lifecycle states of the poll loop
#[state]
#[derive(Debug, Clone)]
pub enum EngineState {
    Initializing, // Collaborators wired, device not yet inspected
    Active,       // Ticking
    Stopped,      // Loop left, held keys released
}

#[machine]
pub struct MappingEngine<S: EngineState> {
    source: Box<dyn InputSource>,
    emitter: Box<dyn KeyEmitter>,
    table: MappingTable,
    settings: EngineSettings,
    detector: EdgeDetector,
    // Hold-mode buttons currently down, with the keys they pressed
    held_buttons: BTreeMap<usize, Vec<KeyCode>>,
    // How many hold-mode buttons keep each key down
    held_keys: HeldKeys,
    ticks: u64,
}

impl<S: EngineState> MappingEngine<S> {
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn held_buttons(&self) -> impl Iterator<Item = usize> + '_ {
        self.held_buttons.keys().copied()
    }

    fn release_held_keys(&mut self) -> Result<(), MappingError> {
        let mut first_error = None;
        for (button, keys) in std::mem::take(&mut self.held_buttons) {
            debug!("Releasing keys held by button {}", button);
            if let Err(e) =
                composer::release_held(&keys, &mut self.held_keys, self.emitter.as_mut())
            {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl MappingEngine<Initializing> {
    pub fn create(
        source: Box<dyn InputSource>,
        emitter: Box<dyn KeyEmitter>,
        table: MappingTable,
        settings: EngineSettings,
    ) -> Self {
        debug!("Creating mapping engine with settings: {:?}", settings);
        let detector = EdgeDetector::new(settings.axis_scaling);

        Self::new(
            source,
            emitter,
            table,
            settings,
            detector,
            BTreeMap::new(),     // held_buttons
            HeldKeys::default(), // held_keys
            0,                   // ticks
        )
    }

    /// Reports the device and warns about mappings it cannot produce
    pub fn initialize(self) -> MappingEngine<Active> {
        let capabilities = self.source.capabilities();
        info!(
            "Input device: {} ({} buttons, {} axes)",
            capabilities.name, capabilities.button_count, capabilities.axis_count
        );

        let mut buttons: Vec<usize> = self.table.mapped_buttons().collect();
        buttons.sort_unstable();
        for button in buttons {
            if !capabilities.supported_buttons.contains(&button) {
                warn!("Mapped button {} is not reported by the device", button);
            }
        }
        for axis in self.table.tracked_axes() {
            if !capabilities.supported_axes.contains(&axis) {
                warn!("Mapped axis {} is not reported by the device", axis);
            }
        }

        info!("Mapping engine initialized, transitioning to Active state");
        self.transition()
    }
}

impl MappingEngine<Active> {
    /// Runs one poll, detect, dispatch cycle
    pub fn tick(&mut self) -> Result<(), MappingError> {
        let snapshot = self.source.poll()?;
        self.ticks += 1;

        for (index, &pressed) in snapshot.buttons.iter().enumerate() {
            let Some(transition) = self.detector.update_button(index, pressed) else {
                continue;
            };
            let Some(binding) = self.table.lookup_button(index) else {
                debug!("Unmapped button {}: {:?}", index, transition);
                continue;
            };

            match (transition, binding.mode) {
                (ButtonTransition::Activated, ButtonMode::Chord) => {
                    report(
                        self.settings.verbose,
                        format_args!("Gamepad button {} pressed", index),
                        &binding.keys,
                    );
                    composer::emit_chord(&binding.keys, &self.held_keys, self.emitter.as_mut())?;
                }
                (ButtonTransition::Activated, ButtonMode::Hold) => {
                    report(
                        self.settings.verbose,
                        format_args!("Gamepad button {} pressed (hold)", index),
                        &binding.keys,
                    );
                    composer::press_held(
                        &binding.keys,
                        &mut self.held_keys,
                        self.emitter.as_mut(),
                    )?;
                    self.held_buttons.insert(index, binding.keys.clone());
                }
                (ButtonTransition::Deactivated, ButtonMode::Hold) => {
                    if let Some(keys) = self.held_buttons.remove(&index) {
                        debug!("Gamepad button {} released, releasing held keys", index);
                        composer::release_held(
                            &keys,
                            &mut self.held_keys,
                            self.emitter.as_mut(),
                        )?;
                    }
                }
                (ButtonTransition::Deactivated, ButtonMode::Chord) => {
                    debug!("Gamepad button {} released", index);
                }
            }
        }

        for axis in self.table.tracked_axes() {
            let Some(&raw) = snapshot.axes.get(axis) else {
                continue;
            };
            // unchanged scaled level: nothing to evaluate this tick
            let Some(level) = self.detector.update_axis(axis, raw) else {
                continue;
            };

            for mapping in self.table.lookup_axis(axis) {
                if !self
                    .detector
                    .scaling()
                    .fires(level.relative, mapping.direction)
                {
                    continue;
                }
                report(
                    self.settings.verbose,
                    format_args!(
                        "Axis {} {:?} at relative position {}",
                        axis, mapping.direction, level.relative
                    ),
                    &mapping.keys,
                );
                composer::emit_chord(&mapping.keys, &self.held_keys, self.emitter.as_mut())?;
            }
        }

        Ok(())
    }

    /// Ticks until `shutdown` resolves or a tick fails.
    ///
    /// Keys held by hold-mode buttons are released on the way out in both cases.
    pub async fn run_until_shutdown<F>(
        mut self,
        shutdown: F,
    ) -> Result<MappingEngine<Stopped>, MappingError>
    where
        F: Future,
    {
        info!(
            "Starting poll loop with {}ms tick interval",
            self.settings.tick_interval.as_millis()
        );
        tokio::pin!(shutdown);

        let outcome = loop {
            if let Err(e) = self.tick() {
                debug!("Poll loop stopped after {} ticks", self.ticks);
                break Err(e);
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
                _ = tokio::time::sleep(self.settings.tick_interval) => {}
            }
        };

        let released = self.release_held_keys();
        match outcome {
            Ok(()) => {
                released?;
                info!("Transitioning to Stopped state after {} ticks", self.ticks);
                Ok(self.transition())
            }
            Err(e) => {
                if let Err(release_error) = released {
                    warn!("Failed to release held keys: {}", release_error);
                }
                Err(e)
            }
        }
    }
}

impl MappingEngine<Stopped> {
    pub fn finish(self) -> u64 {
        info!("Mapping engine stopped");
        self.ticks
    }
}

fn report(verbose: bool, what: std::fmt::Arguments<'_>, keys: &[KeyCode]) {
    if verbose {
        info!(
            "[{}] {}. Sending keys: {}",
            Local::now().format("%H:%M:%S.%3f"),
            what,
            join_keys(keys)
        );
    } else {
        debug!("{}. Sending keys: {}", what, join_keys(keys));
    }
}
