//! Simulated DHCP pool and lease state
//!
//! Allocation is deterministic given pool state: the first free address by
//! increasing numeric suffix is handed out, so exhaustion and lowest-first
//! reuse are observable by the starvation scenarios.

use chrono::{DateTime, Duration, Utc};
use gponsim_core::MacAddr;
use serde::Serialize;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// DHCP server configuration
#[derive(Debug, Clone)]
pub struct DhcpConfig {
    /// Address the simulated server answers from; leases are carved out of
    /// the same /24, starting one past the server address
    pub server_ip: Ipv4Addr,
    /// Number of leasable addresses
    pub range_size: u32,
    /// Lease time granted to clients, in seconds
    pub lease_seconds: i64,
}

impl Default for DhcpConfig {
    fn default() -> Self {
        // 192.168.1.2 - 192.168.1.51, one hour leases
        Self {
            server_ip: Ipv4Addr::new(192, 168, 1, 1),
            range_size: 50,
            lease_seconds: 3600,
        }
    }
}

impl DhcpConfig {
    /// Iterate the leasable addresses in allocation order
    fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        let base = u32::from(self.server_ip);
        (1..=self.range_size).map(move |offset| Ipv4Addr::from(base + offset))
    }
}

/// A granted DHCP lease
#[derive(Debug, Clone, Serialize)]
pub struct DhcpLease {
    pub mac_address: MacAddr,
    pub ip_address: Ipv4Addr,
    pub lease_seconds: i64,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Outcome of a DHCP discover
///
/// Exhaustion is a domain outcome, not an error; starvation scenarios
/// detect it to confirm the pool is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpOutcome {
    /// Lease granted for this address
    Leased(Ipv4Addr),
    /// No free addresses remain in the pool
    Exhausted,
}

/// Derived DHCP pool statistics
#[derive(Debug, Clone, Serialize)]
pub struct DhcpStats {
    pub total_addresses: u32,
    pub used: u32,
    pub available: u32,
    pub utilization_percent: f64,
}

/// DHCP pool and lease table
///
/// Invariants: at most one lease per MAC, at most one MAC per address.
/// Re-discovering with an already-leased MAC releases the old binding
/// before granting a new one.
#[derive(Default)]
pub struct DhcpPool {
    bindings: HashMap<MacAddr, Ipv4Addr>,
    leases: HashMap<MacAddr, DhcpLease>,
}

impl DhcpPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a discover: grant the first free address, or report exhaustion
    ///
    /// Returns the released address of a previous binding for the same MAC
    /// alongside the outcome, so the caller can retire the stale ARP entry.
    pub fn discover(
        &mut self,
        config: &DhcpConfig,
        mac: MacAddr,
        hostname: Option<String>,
    ) -> (DhcpOutcome, Option<Ipv4Addr>) {
        let previous = self.release(mac);

        let in_use: std::collections::HashSet<Ipv4Addr> =
            self.bindings.values().copied().collect();
        let Some(ip) = config.addresses().find(|ip| !in_use.contains(ip)) else {
            // Pool drained; restore nothing - the previous binding (if any)
            // was legitimately released above and stays released.
            return (DhcpOutcome::Exhausted, previous);
        };

        self.bindings.insert(mac, ip);
        self.leases.insert(
            mac,
            DhcpLease {
                mac_address: mac,
                ip_address: ip,
                lease_seconds: config.lease_seconds,
                expires_at: Utc::now() + Duration::seconds(config.lease_seconds),
                hostname,
            },
        );

        (DhcpOutcome::Leased(ip), previous)
    }

    /// Release the lease held by `mac`, returning the freed address
    ///
    /// No-op for MACs without a lease.
    pub fn release(&mut self, mac: MacAddr) -> Option<Ipv4Addr> {
        self.leases.remove(&mac);
        self.bindings.remove(&mac)
    }

    pub fn lease_for(&self, mac: MacAddr) -> Option<&DhcpLease> {
        self.leases.get(&mac)
    }

    pub fn lease_count(&self) -> usize {
        self.leases.len()
    }

    /// Derived pool statistics
    pub fn stats(&self, config: &DhcpConfig) -> DhcpStats {
        let total = config.range_size;
        let used = self.bindings.len() as u32;
        let available = total.saturating_sub(used);

        DhcpStats {
            total_addresses: total,
            used,
            available,
            utilization_percent: if total == 0 {
                0.0
            } else {
                f64::from(used) / f64::from(total) * 100.0
            },
        }
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.leases.clear();
    }
}
