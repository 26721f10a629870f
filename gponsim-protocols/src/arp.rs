//! Simulated ARP resolution table
//!
//! Spoofing is a supported, non-exceptional write: `set` overwrites
//! whatever mapping exists for the address.

use gponsim_core::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// IP-to-MAC resolution table
#[derive(Debug, Default)]
pub struct ArpTable {
    entries: HashMap<Ipv4Addr, MacAddr>,
}

impl ArpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an address to its mapped MAC
    pub fn resolve(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.get(&ip).copied()
    }

    /// Insert or overwrite a mapping (spoofing included)
    pub fn set(&mut self, ip: Ipv4Addr, mac: MacAddr) {
        self.entries.insert(ip, mac);
    }

    /// Remove the mapping for an address
    pub fn remove(&mut self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.remove(&ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
