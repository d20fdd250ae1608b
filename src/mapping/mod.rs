//! Modul für die Umwandlung von Controller-Eingaben in Tastaturereignisse.
//!
//! Dieses Modul enthält die Zuordnungstabelle aus dem Profil, das Zusammensetzen
//! von Tastenfolgen mit Modifier-Semantik und die Poll-Schleife, die beides mit
//! Eingabegerät und Key-Emitter verbindet.

pub mod composer;
pub mod engine;
pub mod error;
pub mod keys;
pub mod table;

// Re-exports für einfacheren Zugriff
pub use composer::KeyAction;
pub use engine::{EngineSettings, MappingEngine};
pub use error::MappingError;
pub use keys::KeyCode;
pub use table::{ButtonBinding, MappingTable};
