//! Scenario catalog and execution engine for GponSim
//!
//! This crate turns the protocol engine into scripted, multi-step attack
//! scenarios:
//!
//! - `ScenarioCatalog`: immutable set of named scenario templates
//! - `Action`: closed set of scenario actions with typed handlers
//! - `ScenarioRunner`: launches one background task per run, with
//!   per-step delays, progress tracking and cooperative cancellation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gponsim_core::DeviceDirectory;
//! use gponsim_protocols::ProtocolEngine;
//! use gponsim_scenario::ScenarioRunner;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = Arc::new(DeviceDirectory::new());
//!     let engine = Arc::new(ProtocolEngine::new(directory.clone()));
//!     let runner = ScenarioRunner::new(engine, directory);
//!
//!     let handle = runner.start("dhcp_starvation_001")?;
//!     println!("run {} started", handle.run_id);
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod catalog;
pub mod runner;

pub use action::{Action, ActionDispatcher, ATTACKER_MAC, STARVATION_BURST};
pub use catalog::{AttackScenario, ScenarioCatalog, ScenarioStep};
pub use runner::{RunHandle, RunState, RunningScenario, ScenarioRunner, StepResult};
