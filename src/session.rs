//! Device session
//!
//! Binds one input and one output port, runs every inbound message through
//! the deduper and forwards what survives. A watchdog re-enumerates ports on a
//! fixed interval and ends the session as soon as either device disappears.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::deduper::{Deduper, NoteEvent};
use crate::discovery::DeviceIdentity;
use crate::error::{DeduperError, PortDirection, Result};
use crate::midi::{format_hex, MidiMessage};
use crate::shutdown::Shutdown;
use crate::transport::{MidiSink, MidiTransport, RawMessage};

/// Default interval between device presence checks
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(2);

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opening,
    Running,
    GracefulStop,
    DeviceLost,
    TransportError,
}

/// What to do with one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Send these bytes to the output
    Forward(Vec<u8>),
    /// Duplicate, drop it
    Filtered,
    /// Nothing to send (empty delivery)
    Ignore,
}

/// Decide how to handle one inbound message
///
/// Only Note-On with non-zero velocity reaches the deduper. Note-On with
/// velocity 0 is sent on as a real Note-Off; everything else passes verbatim.
pub fn dispatch(message: &RawMessage, deduper: &Deduper) -> Dispatch {
    let Some(parsed) = MidiMessage::parse(&message.bytes) else {
        return Dispatch::Ignore;
    };

    match parsed {
        MidiMessage::NoteOn {
            channel,
            note,
            velocity: 0,
        } => {
            let off = MidiMessage::NoteOff {
                channel,
                note,
                velocity: 0,
            };
            debug!("Note OFF: ch={} note={} (from velocity 0)", channel + 1, note);
            Dispatch::Forward(off.encode())
        }
        MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        } => {
            let event = NoteEvent {
                timestamp: message.timestamp,
                number: note,
                velocity,
            };
            if deduper.should_filter(event) {
                debug!("FILTERED: ch={} note={} vel={}", channel + 1, note, velocity);
                Dispatch::Filtered
            } else {
                debug!("Note ON:  ch={} note={} vel={}", channel + 1, note, velocity);
                Dispatch::Forward(parsed.encode())
            }
        }
        MidiMessage::NoteOff { channel, note, .. } => {
            debug!("Note OFF: ch={} note={}", channel + 1, note);
            Dispatch::Forward(message.bytes.clone())
        }
        MidiMessage::Other(_) => {
            trace!("Passthrough: {}", format_hex(&message.bytes));
            Dispatch::Forward(message.bytes.clone())
        }
    }
}

/// One connected input/output pair
pub struct DeviceSession {
    transport: Arc<dyn MidiTransport>,
    input: DeviceIdentity,
    output: DeviceIdentity,
    deduper: Arc<Deduper>,
    watchdog_interval: Duration,
    state: SessionState,
}

impl DeviceSession {
    pub fn new(
        transport: Arc<dyn MidiTransport>,
        input: DeviceIdentity,
        output: DeviceIdentity,
        deduper: Arc<Deduper>,
        watchdog_interval: Duration,
    ) -> Self {
        Self {
            transport,
            input,
            output,
            deduper,
            watchdog_interval,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run until shutdown (`Ok`) or until the devices fail (`Err`)
    ///
    /// Ports are released when this returns.
    pub async fn run(&mut self, shutdown: &mut Shutdown) -> Result<()> {
        self.transition(SessionState::Opening);

        let mut sink = match self.transport.open_output(&self.output.resolved_name) {
            Ok(sink) => sink,
            Err(e) => {
                self.transition(SessionState::TransportError);
                return Err(e);
            }
        };
        let mut inbound = match self.transport.open_input(&self.input.resolved_name) {
            Ok(stream) => stream,
            Err(e) => {
                self.transition(SessionState::TransportError);
                return Err(e);
            }
        };

        info!("Connected to input: {}", self.input.resolved_name);
        info!("Connected to output: {}", self.output.resolved_name);
        self.transition(SessionState::Running);

        let mut watchdog = tokio::time::interval(self.watchdog_interval);
        watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    self.transition(SessionState::GracefulStop);
                    return Ok(());
                }

                message = inbound.recv() => match message {
                    Some(message) => self.forward(&message, sink.as_mut()),
                    None => {
                        self.transition(SessionState::DeviceLost);
                        return Err(DeduperError::DeviceLost {
                            direction: PortDirection::Input,
                            name: self.input.resolved_name.clone(),
                        });
                    }
                },

                _ = watchdog.tick() => {
                    if let Err(e) = self.check_presence() {
                        let next = if e.is_device_lost() {
                            SessionState::DeviceLost
                        } else {
                            SessionState::TransportError
                        };
                        self.transition(next);
                        return Err(e);
                    }
                }
            }
        }
    }

    fn forward(&self, message: &RawMessage, sink: &mut dyn MidiSink) {
        if let Dispatch::Forward(bytes) = dispatch(message, &self.deduper) {
            if let Err(e) = sink.send(&bytes) {
                warn!("Failed to forward {}: {}", format_hex(&bytes), e);
            }
        }
    }

    /// Both bound ports must still be enumerated
    fn check_presence(&self) -> Result<()> {
        if !self
            .transport
            .input_ports()?
            .contains(&self.input.resolved_name)
        {
            return Err(DeduperError::DeviceLost {
                direction: PortDirection::Input,
                name: self.input.resolved_name.clone(),
            });
        }
        if !self
            .transport
            .output_ports()?
            .contains(&self.output.resolved_name)
        {
            return Err(DeduperError::DeviceLost {
                direction: PortDirection::Output,
                name: self.output.resolved_name.clone(),
            });
        }
        trace!("Watchdog: devices present");
        Ok(())
    }
}
