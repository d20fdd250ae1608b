//! Fehlerdefinitionen für das Mapping-Modul

use crate::config::ConfigError;
use crate::controller::DeviceError;
use crate::emitter::EmitterError;
use thiserror::Error;

/// Exit-Codes des Programms, einer pro Fehlerart
pub mod exit_code {
    pub const CONFIG_NOT_FOUND: u8 = 2;
    pub const CONFIG_PARSE: u8 = 3;
    pub const CONFIG_EMPTY_OR_INVALID: u8 = 4;
    pub const PROFILE_NOT_FOUND: u8 = 5;
    pub const DEVICE_NOT_FOUND: u8 = 6;
    pub const DEVICE_ACQUISITION_FAILED: u8 = 7;
    pub const RUNTIME_FAILURE: u8 = 8;
}

/// Fehlertypen für die Mapping-Engine
#[derive(Debug, Error)]
pub enum MappingError {
    /// Fehler beim Laden der Profildatei
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fehler des Eingabegeräts
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Fehler bei der Tastenausgabe
    #[error(transparent)]
    Emitter(#[from] EmitterError),

    /// Konsolenausgabe fehlgeschlagen
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl MappingError {
    /// Liefert den Exit-Code für diese Fehlerart
    pub fn exit_code(&self) -> u8 {
        match self {
            MappingError::Config(ConfigError::NotFound { .. }) => exit_code::CONFIG_NOT_FOUND,
            MappingError::Config(ConfigError::Parse { .. } | ConfigError::Io { .. }) => {
                exit_code::CONFIG_PARSE
            }
            MappingError::Config(
                ConfigError::EmptyOrInvalid { .. } | ConfigError::EmptyProfile { .. },
            ) => exit_code::CONFIG_EMPTY_OR_INVALID,
            MappingError::Config(ConfigError::ProfileNotFound { .. }) => {
                exit_code::PROFILE_NOT_FOUND
            }
            MappingError::Device(DeviceError::NotFound) => exit_code::DEVICE_NOT_FOUND,
            MappingError::Device(DeviceError::AcquisitionFailed(_))
            | MappingError::Emitter(EmitterError::Unavailable(_)) => {
                exit_code::DEVICE_ACQUISITION_FAILED
            }
            MappingError::Device(DeviceError::Disconnected { .. })
            | MappingError::Emitter(_)
            | MappingError::Output(_) => exit_code::RUNTIME_FAILURE,
        }
    }
}
