//! Scenario templates and the built-in catalog

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::info;

/// Single step in an attack scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// 1-based, strictly increasing within a scenario
    pub step_number: u32,
    /// Symbolic action name, resolved by the runner's dispatch table
    pub action: String,
    /// Action-specific key-value parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Cooperative wait before the action fires
    #[serde(default)]
    pub delay_seconds: u64,
}

impl ScenarioStep {
    pub fn new(step_number: u32, action: impl Into<String>) -> Self {
        Self {
            step_number,
            action: action.into(),
            parameters: Map::new(),
            delay_seconds: 0,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        if let Value::Object(map) = parameters {
            self.parameters = map;
        }
        self
    }

    pub fn with_delay(mut self, delay_seconds: u64) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }
}

/// Attack scenario template; immutable once loaded into the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackScenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub steps: Vec<ScenarioStep>,
    pub expected_outcome: Vec<String>,
    /// Observability hints: log streams and metrics worth watching
    #[serde(default)]
    pub observability: HashMap<String, Vec<String>>,
}

/// Immutable set of named scenario templates
///
/// Populated once at startup with the built-in scenarios; embedders and
/// tests may insert additional templates before handing the catalog to a
/// runner.
pub struct ScenarioCatalog {
    scenarios: HashMap<String, AttackScenario>,
}

impl ScenarioCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            scenarios: HashMap::new(),
        }
    }

    /// Create a catalog holding the built-in scenario templates
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for scenario in builtin_scenarios() {
            catalog.insert(scenario);
        }
        info!(count = catalog.len(), "Loaded built-in scenario catalog");
        catalog
    }

    /// Insert a template, replacing any previous one with the same id
    pub fn insert(&mut self, scenario: AttackScenario) {
        self.scenarios.insert(scenario.id.clone(), scenario);
    }

    /// Get a scenario by id
    pub fn get(&self, id: &str) -> Option<&AttackScenario> {
        self.scenarios.get(id)
    }

    /// List all scenarios
    pub fn list(&self) -> Vec<AttackScenario> {
        self.scenarios.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn observability(logs: &[&str], metrics: &[&str]) -> HashMap<String, Vec<String>> {
    HashMap::from([
        (
            "logs".to_string(),
            logs.iter().map(|s| s.to_string()).collect(),
        ),
        (
            "metrics".to_string(),
            metrics.iter().map(|s| s.to_string()).collect(),
        ),
    ])
}

/// The fixed set of scenarios every deployment ships with
fn builtin_scenarios() -> Vec<AttackScenario> {
    vec![
        AttackScenario {
            id: "dhcp_starvation_001".to_string(),
            name: "DHCP Starvation and Spoofing".to_string(),
            description: "Flood DHCP server to exhaust pool and perform spoofing".to_string(),
            category: "dhcp".to_string(),
            steps: vec![
                ScenarioStep::new(1, "compromise_cpe").with_parameters(json!({ "count": 30 })),
                ScenarioStep::new(2, "dhcp_starvation")
                    .with_parameters(json!({ "duration_s": 60 }))
                    .with_delay(5),
                ScenarioStep::new(3, "dhcp_spoof")
                    .with_parameters(json!({ "gateway": "192.0.2.1" }))
                    .with_delay(2),
            ],
            expected_outcome: vec![
                "legitimate_clients_fail_to_get_ip".to_string(),
                "some_clients_receive_spoofed_dns".to_string(),
            ],
            observability: observability(&["dhcp"], &["dhcp_leases_free", "uplink_utilization"]),
        },
        AttackScenario {
            id: "omci_unauth_001".to_string(),
            name: "OMCI Unauthorized Modification".to_string(),
            description: "Unauthorized OMCI operations against ONT".to_string(),
            category: "omci".to_string(),
            steps: vec![
                ScenarioStep::new(1, "omci_modify").with_parameters(
                    json!({ "ont_id": "auto", "command": "set_vlan", "vlan": 999 }),
                ),
                ScenarioStep::new(2, "omci_modify")
                    .with_parameters(json!({ "ont_id": "auto", "command": "reboot" }))
                    .with_delay(3),
            ],
            expected_outcome: vec![
                "ont_lost_connectivity".to_string(),
                "traffic_moved_to_vlan_999".to_string(),
            ],
            observability: observability(&["omci", "ssh"], &["ont_status", "vlan_changes"]),
        },
        AttackScenario {
            id: "arp_mitm_001".to_string(),
            name: "ARP Spoofing and MITM".to_string(),
            description: "ARP poisoning to perform man-in-the-middle attack".to_string(),
            category: "arp".to_string(),
            steps: vec![
                ScenarioStep::new(1, "compromise_cpe").with_parameters(json!({ "count": 1 })),
                ScenarioStep::new(2, "arp_spoof")
                    .with_parameters(json!({ "target_ip": "192.168.1.1" }))
                    .with_delay(2),
            ],
            expected_outcome: vec![
                "traffic_intercepted".to_string(),
                "mitm_established".to_string(),
            ],
            observability: observability(&["arp"], &["arp_table_changes"]),
        },
    ]
}
