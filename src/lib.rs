//! Keyboard teleop for legged robots.
//!
//! Keys edit a velocity intent and a body pose; a background thread publishes
//! both over zenoh at a fixed rate (or on every change) and always finishes
//! with a zero-velocity command.

pub mod bindings;
pub mod cadence;
pub mod config;
pub mod error;
pub mod keyboard;
pub mod messages;
pub mod publisher;
pub mod runtime;
pub mod shutdown;
pub mod sink;
pub mod state;
pub mod teleop;

pub use error::{Result, TeleopError};
