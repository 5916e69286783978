//! `midir`-backed transport

use midir::{Ignore, MidiInput, MidiOutput, MidiOutputConnection};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::debug;

use super::{InputStream, MidiSink, MidiTransport, RawMessage};
use crate::error::{DeduperError, PortDirection, Result};
use crate::midi::format_hex;

const CLIENT_NAME: &str = "MIDI-Deduper";

/// Transport over the platform MIDI API
#[derive(Debug, Default, Clone, Copy)]
pub struct MidirTransport;

impl MidirTransport {
    pub fn new() -> Self {
        Self
    }
}

fn port_names<T: midir::MidiIO>(io: &T) -> Vec<String> {
    io.ports()
        .iter()
        .filter_map(|port| io.port_name(port).ok())
        .collect()
}

fn find_port<T: midir::MidiIO>(io: &T, name: &str) -> Option<T::Port> {
    io.ports()
        .into_iter()
        .find(|port| io.port_name(port).map(|n| n == name).unwrap_or(false))
}

impl MidiTransport for MidirTransport {
    fn input_ports(&self) -> Result<Vec<String>> {
        let midi_in = MidiInput::new(&format!("{}-Scanner", CLIENT_NAME))?;
        Ok(port_names(&midi_in))
    }

    fn output_ports(&self) -> Result<Vec<String>> {
        let midi_out = MidiOutput::new(&format!("{}-Scanner", CLIENT_NAME))?;
        Ok(port_names(&midi_out))
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn MidiSink>> {
        let open_error = |reason: String| DeduperError::TransportOpen {
            direction: PortDirection::Output,
            name: name.to_string(),
            reason,
        };

        let midi_out = MidiOutput::new(&format!("{}-Out", CLIENT_NAME))?;
        let port = find_port(&midi_out, name)
            .ok_or_else(|| open_error("port not enumerated".to_string()))?;

        let connection = midi_out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| open_error(e.to_string()))?;

        debug!("MIDI OUT opened: '{}'", name);
        Ok(Box::new(MidirSink { connection }))
    }

    fn open_input(&self, name: &str) -> Result<InputStream> {
        let open_error = |reason: String| DeduperError::TransportOpen {
            direction: PortDirection::Input,
            name: name.to_string(),
            reason,
        };

        let mut midi_in = MidiInput::new(&format!("{}-In", CLIENT_NAME))?;
        // Forward SysEx, clock and active sensing as well
        midi_in.ignore(Ignore::None);

        let port = find_port(&midi_in, name)
            .ok_or_else(|| open_error("port not enumerated".to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let connection = midi_in
            .connect(
                &port,
                CLIENT_NAME,
                move |_stamp, data, _| {
                    let message = RawMessage {
                        timestamp: Instant::now(),
                        bytes: data.to_vec(),
                    };
                    if tx.send(message).is_err() {
                        debug!("Dropped MIDI after session end: {}", format_hex(data));
                    }
                },
                (),
            )
            .map_err(|e| open_error(e.to_string()))?;

        debug!("MIDI IN opened: '{}'", name);
        Ok(InputStream::new(rx, Some(Box::new(connection))))
    }
}

struct MidirSink {
    connection: MidiOutputConnection,
}

impl MidiSink for MidirSink {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.connection.send(bytes)?;
        Ok(())
    }
}
