//! MIDI transport capability
//!
//! Port enumeration, opening and byte-level I/O live behind [`MidiTransport`]
//! so the session and supervisor can run against real hardware (`midir`) or
//! an in-memory transport in tests.

pub mod midir_backend;

#[cfg(test)]
pub mod mock;

use std::any::Any;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::error::Result;

pub use midir_backend::MidirTransport;

/// One inbound MIDI message, timestamped on delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub timestamp: Instant,
    pub bytes: Vec<u8>,
}

/// Opened output port
pub trait MidiSink {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Everything the deduper needs from a MIDI driver layer
pub trait MidiTransport: Send + Sync {
    /// Names of the currently enumerated input ports
    fn input_ports(&self) -> Result<Vec<String>>;

    /// Names of the currently enumerated output ports
    fn output_ports(&self) -> Result<Vec<String>>;

    /// Open the output port with exactly this name
    fn open_output(&self, name: &str) -> Result<Box<dyn MidiSink>>;

    /// Open the input port with exactly this name and start listening
    fn open_input(&self, name: &str) -> Result<InputStream>;
}

/// Inbound messages from an opened input port
///
/// Holds the underlying connection open until dropped. The stream cannot be
/// restarted; open the port again for a new one.
pub struct InputStream {
    rx: mpsc::UnboundedReceiver<RawMessage>,
    _connection: Option<Box<dyn Any>>,
}

impl InputStream {
    pub fn new(rx: mpsc::UnboundedReceiver<RawMessage>, connection: Option<Box<dyn Any>>) -> Self {
        Self {
            rx,
            _connection: connection,
        }
    }

    /// Next message, or `None` once the transport has closed the stream
    pub async fn recv(&mut self) -> Option<RawMessage> {
        self.rx.recv().await
    }
}
