//! Scenario actions and their handlers
//!
//! The action set is a closed enum so the dispatch table is checked at
//! compile time; a step naming anything else is reported as an
//! unknown-action result by the runner and the run proceeds.

use gponsim_core::{DeviceDirectory, DeviceType, MacAddr};
use gponsim_protocols::{DhcpOutcome, OmciCommandType, ProtocolEngine};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// MAC the simulated attacker forges into ARP entries
pub const ATTACKER_MAC: MacAddr = MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

/// DHCP discovers issued per infected client during a starvation burst
pub const STARVATION_BURST: u32 = 100;

/// The closed set of scenario actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CompromiseCpe,
    DhcpStarvation,
    DhcpSpoof,
    OmciModify,
    ArpSpoof,
    IgmpFlood,
    DdosUplink,
    InfectBotnet,
}

impl Action {
    /// Resolve a step's symbolic action name; `None` means unknown action
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "compromise_cpe" => Some(Action::CompromiseCpe),
            "dhcp_starvation" => Some(Action::DhcpStarvation),
            "dhcp_spoof" => Some(Action::DhcpSpoof),
            "omci_modify" => Some(Action::OmciModify),
            "arp_spoof" => Some(Action::ArpSpoof),
            "igmp_flood" => Some(Action::IgmpFlood),
            "ddos_uplink" => Some(Action::DdosUplink),
            "infect_botnet" => Some(Action::InfectBotnet),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::CompromiseCpe => "compromise_cpe",
            Action::DhcpStarvation => "dhcp_starvation",
            Action::DhcpSpoof => "dhcp_spoof",
            Action::OmciModify => "omci_modify",
            Action::ArpSpoof => "arp_spoof",
            Action::IgmpFlood => "igmp_flood",
            Action::DdosUplink => "ddos_uplink",
            Action::InfectBotnet => "infect_botnet",
        }
    }
}

/// Executes scenario actions against the protocol engine and the directory
///
/// Handlers run to completion once started; the runner only cancels
/// between steps. Every handler returns a result map for the run record,
/// with domain failures reported as `success: false` values.
pub struct ActionDispatcher {
    engine: Arc<ProtocolEngine>,
    directory: Arc<DeviceDirectory>,
}

impl ActionDispatcher {
    pub fn new(engine: Arc<ProtocolEngine>, directory: Arc<DeviceDirectory>) -> Self {
        Self { engine, directory }
    }

    pub fn engine(&self) -> &Arc<ProtocolEngine> {
        &self.engine
    }

    /// Run one action to completion and produce its result map
    pub async fn dispatch(&self, action: Action, params: &Map<String, Value>) -> Value {
        debug!(action = action.name(), "Dispatching scenario action");
        match action {
            Action::CompromiseCpe => self.compromise_cpe(params),
            Action::DhcpStarvation => self.dhcp_starvation(params).await,
            Action::DhcpSpoof => Self::dhcp_spoof(params),
            Action::OmciModify => self.omci_modify(params).await,
            Action::ArpSpoof => self.arp_spoof(params).await,
            // Placeholders: fixed acknowledgements until these protocols
            // get real state models.
            Action::IgmpFlood => json!({ "success": true, "flood_sent": true }),
            Action::DdosUplink => json!({ "success": true, "traffic_generated": "high" }),
            Action::InfectBotnet => json!({ "success": true, "infection_started": true }),
        }
    }

    /// Mark the first `count` client devices as infected
    fn compromise_cpe(&self, params: &Map<String, Value>) -> Value {
        let count = params
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(1) as usize;

        let mut compromised = Vec::new();
        for device in self
            .directory
            .list_by_type(DeviceType::Client)
            .into_iter()
            .take(count)
        {
            if self.directory.set_infected(&device.id, true).is_ok() {
                compromised.push(device.id);
            }
        }

        json!({
            "success": true,
            "count": compromised.len(),
            "compromised": compromised,
        })
    }

    /// Burst of discovers from every infected client
    ///
    /// The wall-clock `duration_s` is not enforced here; the scenario's
    /// step delays realize it.
    async fn dhcp_starvation(&self, params: &Map<String, Value>) -> Value {
        let duration = params.get("duration_s").and_then(Value::as_u64).unwrap_or(60);

        let mut requests: u64 = 0;
        for device in self.directory.list_by_type(DeviceType::Client) {
            if !device.infected {
                continue;
            }
            let base = device.mac_address.unwrap_or(MacAddr::zero());
            for i in 0..STARVATION_BURST {
                // Vary the low octets so every discover looks like a fresh
                // client, the way a starvation tool randomizes MACs.
                let mut forged = base.octets();
                forged[4] = forged[4].wrapping_add((i >> 8) as u8);
                forged[5] = forged[5].wrapping_add(i as u8);
                self.engine.dhcp_discover(MacAddr(forged), None).await;
                requests += 1;
            }
        }

        json!({
            "success": true,
            "requests_sent": requests,
            "duration": duration,
        })
    }

    /// Record the spoofed gateway; no protocol mutation beyond reporting
    fn dhcp_spoof(params: &Map<String, Value>) -> Value {
        let gateway = params
            .get("gateway")
            .and_then(Value::as_str)
            .unwrap_or("192.0.2.1");

        json!({ "success": true, "spoofed_gateway": gateway })
    }

    /// Forward an OMCI command, resolving the `"auto"` target sentinel
    async fn omci_modify(&self, params: &Map<String, Value>) -> Value {
        let requested = params.get("ont_id").and_then(Value::as_str).unwrap_or("auto");
        let ont_id = if requested == "auto" {
            match self.directory.list_by_type(DeviceType::Ont).into_iter().next() {
                Some(ont) => ont.id,
                None => {
                    warn!("omci_modify: no ONT available for auto target");
                    return json!({ "success": false, "error": "ONT not found" });
                }
            }
        } else {
            requested.to_string()
        };

        let command = params
            .get("command")
            .and_then(Value::as_str)
            .map(OmciCommandType::from_name);
        let Some(command) = command else {
            return json!({ "success": false, "error": "missing command parameter" });
        };

        let command_params: Map<String, Value> = params
            .iter()
            .filter(|(k, _)| k.as_str() != "ont_id" && k.as_str() != "command")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let result = self
            .engine
            .send_omci_command(&ont_id, command, command_params)
            .await;
        serde_json::to_value(&result).unwrap_or_else(|_| json!({ "success": false }))
    }

    /// Poison the ARP entry for the target with the attacker MAC
    async fn arp_spoof(&self, params: &Map<String, Value>) -> Value {
        let target_ip = params
            .get("target_ip")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        let Some(target_ip) = target_ip else {
            return json!({ "success": false, "error": "missing or invalid target_ip" });
        };

        self.engine.set_arp(target_ip, ATTACKER_MAC).await;
        json!({
            "success": true,
            "target_ip": target_ip.to_string(),
            "spoofed_mac": ATTACKER_MAC.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gponsim_core::{Device, DeviceStatus};
    use gponsim_protocols::{DhcpConfig, FixedSuccessModel};
    use std::net::Ipv4Addr;

    fn setup(clients: u8, pool_size: u32) -> (ActionDispatcher, Arc<DeviceDirectory>) {
        let directory = Arc::new(DeviceDirectory::new());
        for i in 0..clients {
            directory.add(
                Device::new(DeviceType::Client, format!("pc-{i}"))
                    .with_mac(MacAddr([0x02, 0x00, 0x00, 0x00, i, 0x00]))
                    .with_status(DeviceStatus::Online),
            );
        }
        let engine = Arc::new(ProtocolEngine::with_config(
            directory.clone(),
            DhcpConfig {
                range_size: pool_size,
                ..Default::default()
            },
            Arc::new(FixedSuccessModel(true)),
        ));
        (ActionDispatcher::new(engine, directory.clone()), directory)
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn action_names_roundtrip() {
        for action in [
            Action::CompromiseCpe,
            Action::DhcpStarvation,
            Action::DhcpSpoof,
            Action::OmciModify,
            Action::ArpSpoof,
            Action::IgmpFlood,
            Action::DdosUplink,
            Action::InfectBotnet,
        ] {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("quantum_entangle"), None);
    }

    #[tokio::test]
    async fn compromise_cpe_marks_first_n_clients() {
        let (dispatcher, directory) = setup(5, 50);

        let result = dispatcher
            .dispatch(Action::CompromiseCpe, &params(json!({ "count": 3 })))
            .await;

        assert_eq!(result["success"], true);
        assert_eq!(result["count"], 3);

        let clients = directory.list_by_type(DeviceType::Client);
        let infected: Vec<bool> = clients.iter().map(|c| c.infected).collect();
        assert_eq!(infected, vec![true, true, true, false, false]);
    }

    #[tokio::test]
    async fn compromise_cpe_defaults_to_one() {
        let (dispatcher, directory) = setup(2, 50);

        dispatcher
            .dispatch(Action::CompromiseCpe, &Map::new())
            .await;

        let infected = directory
            .list_by_type(DeviceType::Client)
            .iter()
            .filter(|c| c.infected)
            .count();
        assert_eq!(infected, 1);
    }

    #[tokio::test]
    async fn starvation_with_enough_clients_exhausts_the_pool() {
        // The dhcp_starvation_001 shape: 30 infected clients against a
        // 50-address pool.
        let (dispatcher, _) = setup(30, 50);

        dispatcher
            .dispatch(Action::CompromiseCpe, &params(json!({ "count": 30 })))
            .await;
        let result = dispatcher
            .dispatch(Action::DhcpStarvation, &params(json!({ "duration_s": 60 })))
            .await;

        assert_eq!(result["success"], true);
        assert_eq!(result["requests_sent"], 3000);

        let stats = dispatcher.engine.dhcp_stats().await;
        assert_eq!(stats.utilization_percent, 100.0);
        assert_eq!(stats.available, 0);

        // Legitimate clients are starved out now.
        let fresh = MacAddr([0x02, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(
            dispatcher.engine.dhcp_discover(fresh, None).await,
            DhcpOutcome::Exhausted
        );
    }

    #[tokio::test]
    async fn starvation_skips_clean_clients() {
        let (dispatcher, _) = setup(4, 50);

        let result = dispatcher
            .dispatch(Action::DhcpStarvation, &Map::new())
            .await;

        assert_eq!(result["requests_sent"], 0);
        assert_eq!(dispatcher.engine.dhcp_stats().await.used, 0);
    }

    #[tokio::test]
    async fn dhcp_spoof_reports_gateway() {
        let (dispatcher, _) = setup(0, 50);

        let result = dispatcher
            .dispatch(Action::DhcpSpoof, &params(json!({ "gateway": "10.0.0.254" })))
            .await;
        assert_eq!(result["spoofed_gateway"], "10.0.0.254");

        let result = dispatcher.dispatch(Action::DhcpSpoof, &Map::new()).await;
        assert_eq!(result["spoofed_gateway"], "192.0.2.1");
    }

    #[tokio::test]
    async fn omci_modify_resolves_auto_target() {
        let (dispatcher, directory) = setup(0, 50);
        let ont_id = directory.add(
            Device::new(DeviceType::Ont, "ont-1").with_status(DeviceStatus::Online),
        );

        let result = dispatcher
            .dispatch(
                Action::OmciModify,
                &params(json!({ "ont_id": "auto", "command": "set_vlan", "vlan": 999 })),
            )
            .await;

        assert_eq!(result["success"], true);
        assert_eq!(result["log"]["ont_id"], ont_id);
        assert_eq!(result["log"]["new_vlan"], 999);
        // ont_id/command are stripped before forwarding.
        assert!(result["log"]["parameters"]["command"].is_null());
    }

    #[tokio::test]
    async fn omci_modify_without_onts_fails_cleanly() {
        let (dispatcher, _) = setup(0, 50);

        let result = dispatcher
            .dispatch(
                Action::OmciModify,
                &params(json!({ "ont_id": "auto", "command": "reboot" })),
            )
            .await;
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "ONT not found");
    }

    #[tokio::test]
    async fn arp_spoof_uses_attacker_mac() {
        let (dispatcher, _) = setup(0, 50);
        let gateway: Ipv4Addr = "192.168.1.1".parse().unwrap();

        let result = dispatcher
            .dispatch(Action::ArpSpoof, &params(json!({ "target_ip": "192.168.1.1" })))
            .await;

        assert_eq!(result["success"], true);
        assert_eq!(result["spoofed_mac"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(dispatcher.engine.arp_resolve(gateway).await, Some(ATTACKER_MAC));
    }

    #[tokio::test]
    async fn arp_spoof_rejects_missing_target() {
        let (dispatcher, _) = setup(0, 50);

        let result = dispatcher.dispatch(Action::ArpSpoof, &Map::new()).await;
        assert_eq!(result["success"], false);
    }

    #[tokio::test]
    async fn stub_actions_acknowledge() {
        let (dispatcher, _) = setup(0, 50);

        for action in [Action::IgmpFlood, Action::DdosUplink, Action::InfectBotnet] {
            let result = dispatcher.dispatch(action, &Map::new()).await;
            assert_eq!(result["success"], true, "{}", action.name());
        }
    }
}
