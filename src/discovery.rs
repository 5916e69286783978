//! Device discovery
//!
//! Resolves configured device names against the ports the transport currently
//! enumerates. Matching is case-insensitive: an exact match wins, otherwise
//! the first port whose name starts with the configured name is taken. The
//! prefix rule tolerates suffixes such as " 2" that Windows appends after a
//! controller has been unplugged and reconnected.

use colored::*;
use tracing::debug;

use crate::error::{DeduperError, PortDirection, Result};
use crate::transport::MidiTransport;

/// Input devices tried when none is configured
pub const DEFAULT_INPUTS: &[&str] = &["Finger Drum Pad"];

/// Output devices tried when none is configured
pub const DEFAULT_OUTPUTS: &[&str] = &["loop1", "loopMIDI Port"];

/// A configured device name and the port it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub configured_name: String,
    pub resolved_name: String,
}

pub fn default_inputs() -> Vec<String> {
    DEFAULT_INPUTS.iter().map(|s| s.to_string()).collect()
}

pub fn default_outputs() -> Vec<String> {
    DEFAULT_OUTPUTS.iter().map(|s| s.to_string()).collect()
}

/// Find the port matching `name`: exact (case-insensitive) first, then prefix
pub fn resolve_port(available: &[String], name: &str) -> Option<String> {
    let exact = name.to_lowercase();
    if let Some(port) = available.iter().find(|port| port.to_lowercase() == exact) {
        return Some(port.clone());
    }

    let wanted = name.trim().to_lowercase();
    available
        .iter()
        .find(|port| port.trim().to_lowercase().starts_with(&wanted))
        .cloned()
}

/// Resolve the first candidate that matches any available port
pub fn resolve(
    available: &[String],
    candidates: &[String],
    direction: PortDirection,
) -> Result<DeviceIdentity> {
    for candidate in candidates.iter().filter(|c| !c.trim().is_empty()) {
        if let Some(resolved) = resolve_port(available, candidate) {
            debug!("Found {} port '{}' for '{}'", direction, resolved, candidate);
            return Ok(DeviceIdentity {
                configured_name: candidate.clone(),
                resolved_name: resolved,
            });
        }
    }

    Err(DeduperError::DeviceNotFound {
        direction,
        candidates: candidates.to_vec(),
    })
}

/// Resolve both ends of the bridge against the transport's current ports
pub fn resolve_devices(
    transport: &dyn MidiTransport,
    inputs: &[String],
    outputs: &[String],
) -> Result<(DeviceIdentity, DeviceIdentity)> {
    let input = resolve(&transport.input_ports()?, inputs, PortDirection::Input)?;
    let output = resolve(&transport.output_ports()?, outputs, PortDirection::Output)?;
    Ok((input, output))
}

/// Print available ports for `--list`
pub fn list_devices(transport: &dyn MidiTransport) -> Result<()> {
    print_ports("MIDI Input Devices", &transport.input_ports()?);
    println!();
    print_ports("MIDI Output Devices", &transport.output_ports()?);
    Ok(())
}

fn print_ports(title: &str, ports: &[String]) {
    println!("{}", format!("=== {} ===", title).bold().cyan());
    if ports.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (i, name) in ports.iter().enumerate() {
        println!("  {}: {}", i, name.green());
    }
}
