//! Synapse-Simulation: synthetic EEG device for tests and demos
//!
//! Generates plausible single-channel EEG as 7-bit amplitude bytes and
//! serves them over a loopback TCP socket the way the real acquisition
//! hardware does.

pub mod device;
pub mod generator;

pub use device::{DeviceOptions, SimulatedDevice};
pub use generator::{SignalModel, ToneComponent};
