//! Gamepad Key Mapper - map gamepad buttons and axes to keyboard events.

pub mod config;
pub mod controller;
pub mod emitter;
pub mod mapping;

#[cfg(test)]
pub(crate) mod testing;
