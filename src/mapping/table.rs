//! Unveränderliche Zuordnungstabelle, aus einem Profil aufgebaut

use crate::config::{AxisMapping, ButtonMode, ConfigError, Profile};
use crate::mapping::keys::KeyCode;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Tastenfolge und Modus eines Buttons
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonBinding {
    pub keys: Vec<KeyCode>,
    pub mode: ButtonMode,
}

/// Nachschlagetabelle von Controller-Eingaben zu Tastenfolgen
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    buttons: HashMap<usize, ButtonBinding>,
    axes: BTreeMap<usize, Vec<AxisMapping>>,
}

impl MappingTable {
    /// Baut die Tabelle aus einem Profil; doppelte Buttons: der letzte Eintrag gewinnt
    pub fn build(name: &str, profile: &Profile) -> Result<Self, ConfigError> {
        if profile.is_empty() {
            return Err(ConfigError::EmptyProfile {
                name: name.to_string(),
            });
        }

        let mut buttons = HashMap::new();
        for mapping in &profile.button_mappings {
            let binding = ButtonBinding {
                keys: mapping.keys.clone(),
                mode: mapping.mode,
            };
            if buttons.insert(mapping.gamepad_button, binding).is_some() {
                warn!(
                    "Button {} is mapped more than once in profile '{}', keeping the last entry",
                    mapping.gamepad_button, name
                );
            }
        }

        let mut axes: BTreeMap<usize, Vec<AxisMapping>> = BTreeMap::new();
        for mapping in &profile.axis_mappings {
            axes.entry(mapping.axis).or_default().push(mapping.clone());
        }

        debug!(
            "Built mapping table for '{}': {} buttons, {} axes",
            name,
            buttons.len(),
            axes.len()
        );
        Ok(Self { buttons, axes })
    }

    pub fn lookup_button(&self, index: usize) -> Option<&ButtonBinding> {
        self.buttons.get(&index)
    }

    /// Alle Richtungs-Zuordnungen einer Achse (auch keine)
    pub fn lookup_axis(&self, index: usize) -> &[AxisMapping] {
        self.axes.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Achsen mit mindestens einer Zuordnung, aufsteigend sortiert
    pub fn tracked_axes(&self) -> impl Iterator<Item = usize> + '_ {
        self.axes.keys().copied()
    }

    pub fn mapped_buttons(&self) -> impl Iterator<Item = usize> + '_ {
        self.buttons.keys().copied()
    }
}
