//! GponSim Core Library
//!
//! This crate provides the fundamental types, the device directory and the
//! error handling shared by the GPON attack-simulation workspace.

pub mod device;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use device::{Device, DeviceDirectory, DeviceStatus};
pub use error::{Error, Result};
pub use types::{DeviceType, MacAddr};
