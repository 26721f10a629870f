//! Protocol-state engine for GponSim
//!
//! This crate simulates the access-network protocols the attack scenarios
//! exercise. No packets are built or sent; every protocol is modeled as
//! state transitions on in-memory tables owned by [`ProtocolEngine`]:
//!
//! - **DHCP**: address pool, leases and derived utilization stats
//! - **ARP**: IP-to-MAC resolution table, overwritable by spoofing
//! - **OMCI**: management-command log with probabilistic outcomes
//!
//! OMCI outcomes are drawn through the pluggable [`SuccessModel`] so tests
//! can run fully deterministic.

pub mod arp;
pub mod chance;
pub mod dhcp;
pub mod engine;
pub mod omci;

pub use arp::ArpTable;
pub use chance::{FixedSuccessModel, RandomSuccessModel, SeededSuccessModel, SuccessModel};
pub use dhcp::{DhcpConfig, DhcpLease, DhcpOutcome, DhcpPool, DhcpStats};
pub use engine::{ProtocolEngine, SummaryMetrics};
pub use omci::{OmciCommandType, OmciLogEntry, OmciResult};
