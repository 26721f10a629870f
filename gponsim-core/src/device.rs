//! Device records and the in-memory device directory
//!
//! The directory owns device storage; the protocol and scenario engines
//! mutate device fields through it (`with_device_mut` and the `set_*`
//! helpers) rather than copying records out of sync.

use crate::{DeviceType, MacAddr, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::debug;

/// Device operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Error,
}

/// A device in the simulated access network
///
/// Only the fields the simulation core reads or writes are modeled here;
/// the full per-type configuration (PON profiles, firewall rules, ...)
/// belongs to the excluded persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub device_type: DeviceType,
    pub name: String,
    pub status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<MacAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub infected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Create a new device with an auto-generated id
    pub fn new(device_type: DeviceType, name: impl Into<String>) -> Self {
        Self {
            id: generate_device_id(device_type),
            device_type,
            name: name.into(),
            status: DeviceStatus::Offline,
            mac_address: None,
            ip_address: None,
            hostname: None,
            infected: false,
            firmware_version: None,
            vlan: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac_address = Some(mac);
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_firmware(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }
}

/// Generate a unique device id, e.g. `ont-0192abcd`
pub fn generate_device_id(device_type: DeviceType) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    format!("{}-{}", device_type.as_str().to_lowercase(), &uuid[..8])
}

/// Insertion-ordered in-memory device store
///
/// `list_by_type` and first-N selections are defined in terms of insertion
/// order, so the directory keeps an explicit order vector beside the map.
#[derive(Default)]
pub struct DeviceDirectory {
    inner: RwLock<DirectoryInner>,
}

#[derive(Default)]
struct DirectoryInner {
    devices: HashMap<String, Device>,
    order: Vec<String>,
}

impl DeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, returning its id
    pub fn add(&self, device: Device) -> String {
        let id = device.id.clone();
        let mut inner = self.inner.write();
        if !inner.devices.contains_key(&id) {
            inner.order.push(id.clone());
        }
        debug!(id = %id, device_type = %device.device_type, "Device added");
        inner.devices.insert(id.clone(), device);
        id
    }

    /// Get a device by id
    pub fn get(&self, id: &str) -> Option<Device> {
        self.inner.read().devices.get(id).cloned()
    }

    /// List devices of a given type, in insertion order
    pub fn list_by_type(&self, device_type: DeviceType) -> Vec<Device> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.devices.get(id))
            .filter(|d| d.device_type == device_type)
            .cloned()
            .collect()
    }

    /// List every device, in insertion order
    pub fn list_all(&self) -> Vec<Device> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.devices.get(id))
            .cloned()
            .collect()
    }

    /// Mutate a device in place; returns `NotFound` for unknown ids
    pub fn with_device_mut<F>(&self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Device),
    {
        let mut inner = self.inner.write();
        match inner.devices.get_mut(id) {
            Some(device) => {
                f(device);
                Ok(())
            }
            None => Err(crate::Error::not_found(format!("Device {id} not found"))),
        }
    }

    /// Set a device's status
    pub fn set_status(&self, id: &str, status: DeviceStatus) -> Result<()> {
        self.with_device_mut(id, |d| d.status = status)
    }

    /// Set a device's infected flag
    pub fn set_infected(&self, id: &str, infected: bool) -> Result<()> {
        self.with_device_mut(id, |d| d.infected = infected)
    }

    pub fn count(&self) -> usize {
        self.inner.read().devices.len()
    }

    /// Remove all devices
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.devices.clear();
        inner.order.clear();
        debug!("Device directory reset");
    }
}
