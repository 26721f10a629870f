//! The protocol-state engine
//!
//! [`ProtocolEngine`] owns the DHCP pool, the ARP table and the OMCI log,
//! and is shared by every concurrently executing scenario run. Each method
//! takes its locks for the duration of one call, so a handler invocation
//! never observes a half-updated table; no transaction spans calls.

use crate::arp::ArpTable;
use crate::chance::{RandomSuccessModel, SuccessModel};
use crate::dhcp::{DhcpConfig, DhcpLease, DhcpOutcome, DhcpPool, DhcpStats};
use crate::omci::{OmciCommandType, OmciLogEntry, OmciResult};
use chrono::Utc;
use gponsim_core::{DeviceDirectory, DeviceStatus, DeviceType, MacAddr};
use serde::Serialize;
use serde_json::{Map, Value};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Summary metrics across all protocol tables
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetrics {
    pub dhcp: DhcpStats,
    pub omci_commands_total: usize,
    pub arp_entries: usize,
    pub active_leases: usize,
}

/// Simulated protocol engine shared by all scenario runs
pub struct ProtocolEngine {
    directory: Arc<DeviceDirectory>,
    config: DhcpConfig,
    dhcp: RwLock<DhcpPool>,
    arp: RwLock<ArpTable>,
    omci_log: RwLock<Vec<OmciLogEntry>>,
    success_model: Arc<dyn SuccessModel>,
}

impl ProtocolEngine {
    /// Create an engine with default DHCP configuration and random outcomes
    pub fn new(directory: Arc<DeviceDirectory>) -> Self {
        Self::with_config(directory, DhcpConfig::default(), Arc::new(RandomSuccessModel))
    }

    /// Create an engine with explicit configuration and success model
    pub fn with_config(
        directory: Arc<DeviceDirectory>,
        config: DhcpConfig,
        success_model: Arc<dyn SuccessModel>,
    ) -> Self {
        info!(
            server_ip = %config.server_ip,
            range_size = config.range_size,
            lease_seconds = config.lease_seconds,
            "Creating protocol engine"
        );
        Self {
            directory,
            config,
            dhcp: RwLock::new(DhcpPool::new()),
            arp: RwLock::new(ArpTable::new()),
            omci_log: RwLock::new(Vec::new()),
            success_model,
        }
    }

    pub fn directory(&self) -> &Arc<DeviceDirectory> {
        &self.directory
    }

    pub fn dhcp_config(&self) -> &DhcpConfig {
        &self.config
    }

    /// Handle a DHCP discover for `mac`
    ///
    /// Grants the first free address, records the lease and inserts the
    /// matching ARP entry in the same call. A full pool yields
    /// [`DhcpOutcome::Exhausted`], the signal starvation scenarios wait for.
    pub async fn dhcp_discover(&self, mac: MacAddr, hostname: Option<String>) -> DhcpOutcome {
        let mut dhcp = self.dhcp.write().await;
        let mut arp = self.arp.write().await;

        let (outcome, released) = dhcp.discover(&self.config, mac, hostname);
        if let Some(old_ip) = released {
            arp.remove(old_ip);
        }

        match outcome {
            DhcpOutcome::Leased(ip) => {
                arp.set(ip, mac);
                debug!(mac = %mac, ip = %ip, "DHCP lease granted");
            }
            DhcpOutcome::Exhausted => {
                debug!(mac = %mac, "DHCP pool exhausted");
            }
        }

        outcome
    }

    /// Release the lease held by `mac`; no-op when it holds none
    pub async fn dhcp_release(&self, mac: MacAddr) {
        let mut dhcp = self.dhcp.write().await;
        let mut arp = self.arp.write().await;

        if let Some(ip) = dhcp.release(mac) {
            arp.remove(ip);
            debug!(mac = %mac, ip = %ip, "DHCP lease released");
        }
    }

    /// Get the lease currently held by `mac`, if any
    pub async fn dhcp_lease(&self, mac: MacAddr) -> Option<DhcpLease> {
        self.dhcp.read().await.lease_for(mac).cloned()
    }

    /// Derived DHCP pool statistics
    pub async fn dhcp_stats(&self) -> DhcpStats {
        self.dhcp.read().await.stats(&self.config)
    }

    pub async fn active_lease_count(&self) -> usize {
        self.dhcp.read().await.lease_count()
    }

    /// Resolve an IP through the ARP table
    pub async fn arp_resolve(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.arp.read().await.resolve(ip)
    }

    /// Forge an ARP mapping; overwrite is unconditional
    pub async fn set_arp(&self, ip: Ipv4Addr, mac: MacAddr) {
        self.arp.write().await.set(ip, mac);
        info!(ip = %ip, mac = %mac, "ARP entry set");
    }

    pub async fn arp_entry_count(&self) -> usize {
        self.arp.read().await.len()
    }

    /// Send a simulated OMCI command to an ONT
    ///
    /// The target must be a device of type ONT; anything else is a
    /// domain-level failure, not an engine error. A successful reboot
    /// additionally drives the target offline through the directory.
    pub async fn send_omci_command(
        &self,
        ont_id: &str,
        command: OmciCommandType,
        params: Map<String, Value>,
    ) -> OmciResult {
        let target = self.directory.get(ont_id);
        if !target.is_some_and(|d| d.device_type == DeviceType::Ont) {
            warn!(ont_id = %ont_id, command = command.name(), "OMCI target is not a known ONT");
            return OmciResult::not_found();
        }

        let success = self.success_model.trial(command.success_probability());

        let mut entry = OmciLogEntry {
            timestamp: Utc::now(),
            ont_id: ont_id.to_string(),
            command: command.name().to_string(),
            parameters: params,
            success,
            new_vlan: None,
            new_firmware: None,
        };

        match &command {
            OmciCommandType::SetVlan => {
                entry.new_vlan = entry
                    .parameters
                    .get("vlan")
                    .and_then(Value::as_u64)
                    .and_then(|v| u16::try_from(v).ok());
                if success {
                    let vlan = entry.new_vlan;
                    // Directory still owns the device; it only changes if present.
                    let _ = self.directory.with_device_mut(ont_id, |d| d.vlan = vlan);
                }
            }
            OmciCommandType::Reboot => {
                if success {
                    let _ = self.directory.set_status(ont_id, DeviceStatus::Offline);
                }
            }
            OmciCommandType::FirmwareUpdate => {
                entry.new_firmware = entry
                    .parameters
                    .get("version")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if success {
                    let version = entry.new_firmware.clone();
                    let _ = self
                        .directory
                        .with_device_mut(ont_id, |d| d.firmware_version = version);
                }
            }
            OmciCommandType::Other(_) => {}
        }

        info!(
            ont_id = %ont_id,
            command = command.name(),
            success = success,
            "OMCI command executed"
        );

        self.omci_log.write().await.push(entry.clone());
        OmciResult::executed(entry)
    }

    /// Last `limit` OMCI log entries, optionally filtered by ONT id
    pub async fn omci_logs(&self, ont_id: Option<&str>, limit: usize) -> Vec<OmciLogEntry> {
        let log = self.omci_log.read().await;
        let filtered: Vec<OmciLogEntry> = log
            .iter()
            .filter(|e| ont_id.is_none_or(|id| e.ont_id == id))
            .cloned()
            .collect();

        let skip = filtered.len().saturating_sub(limit);
        filtered.into_iter().skip(skip).collect()
    }

    pub async fn omci_command_count(&self) -> usize {
        self.omci_log.read().await.len()
    }

    /// Summary metrics across all protocol tables
    pub async fn summary_metrics(&self) -> SummaryMetrics {
        SummaryMetrics {
            dhcp: self.dhcp_stats().await,
            omci_commands_total: self.omci_command_count().await,
            arp_entries: self.arp_entry_count().await,
            active_leases: self.active_lease_count().await,
        }
    }

    /// Clear pool, leases, ARP table and OMCI log between simulation runs
    pub async fn reset(&self) {
        self.dhcp.write().await.clear();
        self.arp.write().await.clear();
        self.omci_log.write().await.clear();
        info!("Protocol engine reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chance::FixedSuccessModel;
    use gponsim_core::Device;
    use serde_json::json;

    fn mac(last: u8) -> MacAddr {
        MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, last])
    }

    fn engine_with(model: Arc<dyn SuccessModel>, range_size: u32) -> (ProtocolEngine, String) {
        let directory = Arc::new(DeviceDirectory::new());
        let ont_id = directory.add(
            Device::new(DeviceType::Ont, "ont-1").with_status(DeviceStatus::Online),
        );
        let config = DhcpConfig {
            range_size,
            ..Default::default()
        };
        (
            ProtocolEngine::with_config(directory, config, model),
            ont_id,
        )
    }

    #[tokio::test]
    async fn discover_inserts_matching_arp_entry() {
        let (engine, _) = engine_with(Arc::new(FixedSuccessModel(true)), 10);

        let DhcpOutcome::Leased(ip) = engine.dhcp_discover(mac(1), None).await else {
            panic!("expected lease");
        };

        assert_eq!(engine.arp_resolve(ip).await, Some(mac(1)));
        assert_eq!(engine.active_lease_count().await, 1);
        assert_eq!(engine.arp_entry_count().await, 1);
    }

    #[tokio::test]
    async fn release_removes_lease_and_arp() {
        let (engine, _) = engine_with(Arc::new(FixedSuccessModel(true)), 10);

        let DhcpOutcome::Leased(ip) = engine.dhcp_discover(mac(1), None).await else {
            panic!("expected lease");
        };
        engine.dhcp_release(mac(1)).await;

        assert_eq!(engine.active_lease_count().await, 0);
        assert!(engine.arp_resolve(ip).await.is_none());

        // Releasing again is a no-op, not an error.
        engine.dhcp_release(mac(1)).await;
    }

    #[tokio::test]
    async fn exhausted_pool_then_release_recovers() {
        let (engine, _) = engine_with(Arc::new(FixedSuccessModel(true)), 2);

        engine.dhcp_discover(mac(1), None).await;
        engine.dhcp_discover(mac(2), None).await;
        assert_eq!(engine.dhcp_discover(mac(3), None).await, DhcpOutcome::Exhausted);

        engine.dhcp_release(mac(1)).await;
        assert!(matches!(
            engine.dhcp_discover(mac(3), None).await,
            DhcpOutcome::Leased(_)
        ));
    }

    #[tokio::test]
    async fn omci_reboot_success_sets_offline_and_logs() {
        let (engine, ont_id) = engine_with(Arc::new(FixedSuccessModel(true)), 10);

        let result = engine
            .send_omci_command(&ont_id, OmciCommandType::Reboot, Map::new())
            .await;

        assert!(result.success);
        assert_eq!(
            engine.directory().get(&ont_id).unwrap().status,
            DeviceStatus::Offline
        );
        assert_eq!(engine.omci_command_count().await, 1);
    }

    #[tokio::test]
    async fn omci_reboot_failure_logs_but_leaves_status() {
        let (engine, ont_id) = engine_with(Arc::new(FixedSuccessModel(false)), 10);

        let result = engine
            .send_omci_command(&ont_id, OmciCommandType::Reboot, Map::new())
            .await;

        assert!(!result.success);
        assert_eq!(
            engine.directory().get(&ont_id).unwrap().status,
            DeviceStatus::Online
        );
        // Failures still append a log entry.
        assert_eq!(engine.omci_command_count().await, 1);
    }

    #[tokio::test]
    async fn omci_set_vlan_records_new_vlan() {
        let (engine, ont_id) = engine_with(Arc::new(FixedSuccessModel(true)), 10);

        let params: Map<String, Value> =
            json!({ "vlan": 999 }).as_object().unwrap().clone();
        let result = engine
            .send_omci_command(&ont_id, OmciCommandType::SetVlan, params)
            .await;

        assert_eq!(result.log.unwrap().new_vlan, Some(999));
        assert_eq!(engine.directory().get(&ont_id).unwrap().vlan, Some(999));
    }

    #[tokio::test]
    async fn omci_unknown_target_is_domain_failure() {
        let (engine, _) = engine_with(Arc::new(FixedSuccessModel(true)), 10);

        // Unknown id and non-ONT device both fail without a log entry.
        let result = engine
            .send_omci_command("nope", OmciCommandType::Reboot, Map::new())
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("ONT not found"));

        let client_id = engine
            .directory()
            .add(Device::new(DeviceType::Client, "pc-1"));
        let result = engine
            .send_omci_command(&client_id, OmciCommandType::Reboot, Map::new())
            .await;
        assert!(!result.success);
        assert_eq!(engine.omci_command_count().await, 0);
    }

    #[tokio::test]
    async fn omci_logs_filter_and_limit() {
        let (engine, ont_id) = engine_with(Arc::new(FixedSuccessModel(true)), 10);
        let other_id = engine
            .directory()
            .add(Device::new(DeviceType::Ont, "ont-2").with_status(DeviceStatus::Online));

        for _ in 0..3 {
            engine
                .send_omci_command(&ont_id, OmciCommandType::Reboot, Map::new())
                .await;
        }
        engine
            .send_omci_command(&other_id, OmciCommandType::Reboot, Map::new())
            .await;

        assert_eq!(engine.omci_logs(Some(&ont_id), 100).await.len(), 3);
        assert_eq!(engine.omci_logs(None, 2).await.len(), 2);
        assert_eq!(engine.omci_logs(Some(&other_id), 100).await.len(), 1);
    }

    #[tokio::test]
    async fn summary_metrics_and_reset() {
        let (engine, ont_id) = engine_with(Arc::new(FixedSuccessModel(true)), 10);

        engine.dhcp_discover(mac(1), None).await;
        engine
            .send_omci_command(&ont_id, OmciCommandType::Reboot, Map::new())
            .await;

        let metrics = engine.summary_metrics().await;
        assert_eq!(metrics.dhcp.used, 1);
        assert_eq!(metrics.omci_commands_total, 1);
        assert_eq!(metrics.arp_entries, 1);
        assert_eq!(metrics.active_leases, 1);

        engine.reset().await;
        let metrics = engine.summary_metrics().await;
        assert_eq!(metrics.dhcp.used, 0);
        assert_eq!(metrics.omci_commands_total, 0);
        assert_eq!(metrics.arp_entries, 0);
        assert_eq!(metrics.active_leases, 0);
    }
}
