//! MIDI input port discovery.
use anyhow::Result;
use midir::{MidiInput, MidiInputPort};

const SCAN_CLIENT: &str = "midi-trigger-scan";

/// Names of every input port currently visible.
pub fn list_input_ports() -> Result<Vec<String>> {
    let inp = MidiInput::new(SCAN_CLIENT)?;
    Ok(inp
        .ports()
        .iter()
        .filter_map(|port| inp.port_name(port).ok())
        .collect())
}

/// First input port whose name contains `filter` (case-insensitive), or the
/// first port at all without a filter.
pub fn find_input_port(filter: Option<&str>) -> Result<Option<(MidiInputPort, String)>> {
    // New MidiInput each call so the port list is up-to-date
    let inp = MidiInput::new(SCAN_CLIENT)?;
    let needle = filter.map(str::to_lowercase);

    for port in inp.ports() {
        let Ok(name) = inp.port_name(&port) else {
            continue;
        };
        if matches_filter(&name, needle.as_deref()) {
            return Ok(Some((port, name)));
        }
    }
    Ok(None)
}

fn matches_filter(name: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => name.to_lowercase().contains(needle),
        None => true,
    }
}
