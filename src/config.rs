//! Profile file loading
//!
//! The mapping file is a JSON document with a `Profiles` object keyed by profile
//! name. Each profile lists `ButtonMappings` and `AxisMappings`; an optional
//! top-level `AxisSettings` object tunes axis quantization.
//!
//! ```json
//! {
//!   "Profiles": {
//!     "default": {
//!       "ButtonMappings": [
//!         { "_comment": "Shift+A", "GamepadButton": 0, "KeyboardKeys": [16, 65] }
//!       ],
//!       "AxisMappings": [
//!         { "Axis": 0, "Direction": "positive", "KeyboardKeys": [68] }
//!       ]
//!     }
//!   }
//! }
//! ```

use crate::controller::edge_detector::AxisScaling;
use crate::controller::AXIS_MAX;
use crate::mapping::keys::KeyCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse configuration file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration file '{}' is invalid or empty: {reason}", path.display())]
    EmptyOrInvalid { path: PathBuf, reason: String },

    #[error("Profile '{name}' has no button or axis mappings")]
    EmptyProfile { name: String },

    #[error("Profile '{name}' not found. Available profiles: {}", available.join(", "))]
    ProfileNotFound { name: String, available: Vec<String> },
}

/// Direction an axis has to be pushed for a mapping to fire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

/// How a button mapping drives its keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    /// Whole key list is played once per press, modifiers scoped to the list
    #[default]
    Chord,
    /// Keys go down with the button and come up with it
    Hold,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ButtonMapping {
    #[serde(rename = "_comment", default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    #[serde(rename = "GamepadButton")]
    pub gamepad_button: usize,

    #[serde(rename = "KeyboardKeys", default)]
    pub keys: Vec<KeyCode>,

    #[serde(rename = "Mode", default)]
    pub mode: ButtonMode,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AxisMapping {
    #[serde(rename = "_comment", default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    #[serde(rename = "Axis")]
    pub axis: usize,

    #[serde(rename = "Direction")]
    pub direction: Direction,

    #[serde(rename = "KeyboardKeys", default)]
    pub keys: Vec<KeyCode>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Profile {
    #[serde(rename = "ButtonMappings", default)]
    pub button_mappings: Vec<ButtonMapping>,

    #[serde(rename = "AxisMappings", default)]
    pub axis_mappings: Vec<AxisMapping>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.button_mappings.is_empty() && self.axis_mappings.is_empty()
    }
}

/// Overrides for the axis quantization constants
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct AxisSettings {
    #[serde(rename = "Divisor")]
    pub divisor: i32,

    #[serde(rename = "Center")]
    pub center: i32,

    #[serde(rename = "Threshold")]
    pub threshold: i32,
}

impl Default for AxisSettings {
    fn default() -> Self {
        let scaling = AxisScaling::default();
        Self {
            divisor: scaling.divisor,
            center: scaling.center,
            threshold: scaling.threshold,
        }
    }
}

/// Contents of a mapping file
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct MappingFile {
    #[serde(rename = "Profiles", default)]
    pub profiles: BTreeMap<String, Profile>,

    #[serde(rename = "AxisSettings", default, skip_serializing_if = "Option::is_none")]
    pub axis_settings: Option<AxisSettings>,
}

impl MappingFile {
    /// Reads and validates a mapping file. Fails if the file is missing,
    /// malformed or holds no profiles.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading mapping file from {}", path.display());

        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let file = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.validate(path)?;

        info!(
            "Loaded {} profile(s) from {}",
            file.profiles.len(),
            path.display()
        );
        Ok(file)
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::EmptyOrInvalid {
                path: path.to_path_buf(),
                reason: "no profiles defined".to_string(),
            });
        }

        if let Some(settings) = &self.axis_settings {
            if settings.divisor <= 0 {
                return Err(ConfigError::EmptyOrInvalid {
                    path: path.to_path_buf(),
                    reason: format!("axis divisor must be positive, got {}", settings.divisor),
                });
            }
            if settings.threshold < 0 {
                return Err(ConfigError::EmptyOrInvalid {
                    path: path.to_path_buf(),
                    reason: format!(
                        "axis threshold must not be negative, got {}",
                        settings.threshold
                    ),
                });
            }
            let max_center = AXIS_MAX / settings.divisor;
            if !(0..=max_center).contains(&settings.center) {
                return Err(ConfigError::EmptyOrInvalid {
                    path: path.to_path_buf(),
                    reason: format!(
                        "axis center must lie in 0..={}, got {}",
                        max_center, settings.center
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Looks up a profile by name, reporting the known names on a miss
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
                available: self.profile_names().map(str::to_string).collect(),
            })
    }

    pub fn axis_scaling(&self) -> AxisScaling {
        match self.axis_settings {
            Some(settings) => AxisScaling {
                divisor: settings.divisor,
                center: settings.center,
                threshold: settings.threshold,
            },
            None => AxisScaling::default(),
        }
    }

    /// Writes the `--list` report
    pub fn write_profile_list(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Available profiles:")?;
        for name in self.profile_names() {
            writeln!(out, "- {}", name)?;
        }
        Ok(())
    }
}

/// Writes the startup report of a selected profile
pub fn write_profile_summary(name: &str, profile: &Profile, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Using profile: {}", name)?;
    writeln!(out, "Loaded button mappings:")?;
    for mapping in &profile.button_mappings {
        writeln!(
            out,
            "{} - Gamepad button: {}, Keyboard keys: {}{}",
            mapping.comment,
            mapping.gamepad_button,
            join_keys(&mapping.keys),
            match mapping.mode {
                ButtonMode::Chord => "",
                ButtonMode::Hold => " (hold)",
            }
        )?;
    }
    if !profile.axis_mappings.is_empty() {
        writeln!(out, "Loaded axis mappings:")?;
        for mapping in &profile.axis_mappings {
            writeln!(
                out,
                "{} - Axis: {} ({:?}), Keyboard keys: {}",
                mapping.comment,
                mapping.axis,
                mapping.direction,
                join_keys(&mapping.keys)
            )?;
        }
    }
    Ok(())
}

pub(crate) fn join_keys(keys: &[KeyCode]) -> String {
    keys.iter()
        .map(|key| key.0.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
