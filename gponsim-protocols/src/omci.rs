//! Simulated OMCI management-command channel
//!
//! Commands are never put on a wire; each one is a single probabilistic
//! trial recorded in an append-only log, with type-specific side effects
//! applied through the device directory by the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// OMCI command types with their simulated success probabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OmciCommandType {
    SetVlan,
    Reboot,
    FirmwareUpdate,
    /// Any other command name; carried through to the log verbatim
    Other(String),
}

impl OmciCommandType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "set_vlan" => OmciCommandType::SetVlan,
            "reboot" => OmciCommandType::Reboot,
            "firmware_update" => OmciCommandType::FirmwareUpdate,
            other => OmciCommandType::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            OmciCommandType::SetVlan => "set_vlan",
            OmciCommandType::Reboot => "reboot",
            OmciCommandType::FirmwareUpdate => "firmware_update",
            OmciCommandType::Other(name) => name,
        }
    }

    /// Probability that one simulated execution of this command succeeds
    pub fn success_probability(&self) -> f64 {
        match self {
            OmciCommandType::SetVlan => 0.8,
            OmciCommandType::Reboot => 0.95,
            OmciCommandType::FirmwareUpdate => 0.6,
            OmciCommandType::Other(_) => 0.9,
        }
    }
}

/// One entry in the append-only OMCI command log
#[derive(Debug, Clone, Serialize)]
pub struct OmciLogEntry {
    pub timestamp: DateTime<Utc>,
    pub ont_id: String,
    pub command: String,
    pub parameters: Map<String, Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_vlan: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_firmware: Option<String>,
}

/// Result of sending an OMCI command
///
/// An unknown or non-ONT target is a domain-level failure with no log
/// entry, mirroring how a real OLT would drop the command unanswered.
#[derive(Debug, Clone, Serialize)]
pub struct OmciResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<OmciLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OmciResult {
    pub fn not_found() -> Self {
        Self {
            success: false,
            log: None,
            error: Some("ONT not found".to_string()),
        }
    }

    pub fn executed(log: OmciLogEntry) -> Self {
        Self {
            success: log.success,
            log: Some(log),
            error: None,
        }
    }
}
