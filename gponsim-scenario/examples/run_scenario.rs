//! Run a built-in attack scenario against a small simulated topology
//!
//! ```sh
//! cargo run --example run_scenario
//! ```

use gponsim_core::{Device, DeviceDirectory, DeviceStatus, DeviceType, MacAddr};
use gponsim_protocols::ProtocolEngine;
use gponsim_scenario::{RunState, ScenarioRunner};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // A minimal topology: one OLT, one ONT, a handful of clients.
    let directory = Arc::new(DeviceDirectory::new());
    directory.add(Device::new(DeviceType::Olt, "olt-1").with_status(DeviceStatus::Online));
    directory.add(Device::new(DeviceType::Ont, "ont-1").with_status(DeviceStatus::Online));
    for i in 0..5u8 {
        directory.add(
            Device::new(DeviceType::Client, format!("pc-{i}"))
                .with_mac(MacAddr([0x02, 0x00, 0x00, 0x00, i, 0x00]))
                .with_status(DeviceStatus::Online),
        );
    }

    let engine = Arc::new(ProtocolEngine::new(directory.clone()));
    let runner = ScenarioRunner::new(engine.clone(), directory);

    println!("Available scenarios:");
    for scenario in runner.list_scenarios() {
        println!("  {} - {} ({})", scenario.id, scenario.name, scenario.category);
    }

    let handle = runner.start("arp_mitm_001")?;
    println!("\nStarted run {} for arp_mitm_001", handle.run_id);

    loop {
        let status = runner.status("arp_mitm_001").expect("run exists");
        if status.state != RunState::Running {
            println!("Run finished: {:?}", status.state);
            for result in &status.results {
                println!("  step {} [{}]: {}", result.step, result.action, result.result);
            }
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let metrics = engine.summary_metrics().await;
    println!("\nSummary: {}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}
