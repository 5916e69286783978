//! In-memory transport for tests

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use super::{InputStream, MidiSink, MidiTransport, RawMessage};
use crate::error::{DeduperError, PortDirection, Result};

/// Scripted ports with message injection and capture of sent bytes
#[derive(Default)]
pub struct MockTransport {
    inputs: Mutex<Vec<String>>,
    outputs: Mutex<Vec<String>>,
    injector: Mutex<Option<mpsc::UnboundedSender<RawMessage>>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_sends: Arc<AtomicBool>,
    fail_open_output: AtomicBool,
    inputs_opened: AtomicUsize,
}

impl MockTransport {
    pub fn new(inputs: &[&str], outputs: &[&str]) -> Arc<Self> {
        let transport = Self::default();
        transport.set_inputs(inputs);
        transport.set_outputs(outputs);
        Arc::new(transport)
    }

    pub fn set_inputs(&self, names: &[&str]) {
        *self.inputs.lock() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn set_outputs(&self, names: &[&str]) {
        *self.outputs.lock() = names.iter().map(|n| n.to_string()).collect();
    }

    /// Deliver a message on the currently open input, if any
    pub fn inject(&self, bytes: &[u8]) -> bool {
        self.inject_at(Instant::now(), bytes)
    }

    pub fn inject_at(&self, timestamp: Instant, bytes: &[u8]) -> bool {
        match self.injector.lock().as_ref() {
            Some(tx) => tx
                .send(RawMessage {
                    timestamp,
                    bytes: bytes.to_vec(),
                })
                .is_ok(),
            None => false,
        }
    }

    /// Close the open input stream from the transport side
    pub fn close_input(&self) {
        self.injector.lock().take();
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_open_output(&self, fail: bool) {
        self.fail_open_output.store(fail, Ordering::SeqCst);
    }

    /// How many times an input port has been opened
    pub fn inputs_opened(&self) -> usize {
        self.inputs_opened.load(Ordering::SeqCst)
    }

    pub fn has_open_input(&self) -> bool {
        self.injector.lock().is_some()
    }
}

impl MidiTransport for MockTransport {
    fn input_ports(&self) -> Result<Vec<String>> {
        Ok(self.inputs.lock().clone())
    }

    fn output_ports(&self) -> Result<Vec<String>> {
        Ok(self.outputs.lock().clone())
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn MidiSink>> {
        if self.fail_open_output.load(Ordering::SeqCst) || !self.outputs.lock().iter().any(|n| n == name) {
            return Err(DeduperError::TransportOpen {
                direction: PortDirection::Output,
                name: name.to_string(),
                reason: "mock refused".to_string(),
            });
        }
        Ok(Box::new(MockSink {
            sent: Arc::clone(&self.sent),
            fail: Arc::clone(&self.fail_sends),
        }))
    }

    fn open_input(&self, name: &str) -> Result<InputStream> {
        if !self.inputs.lock().iter().any(|n| n == name) {
            return Err(DeduperError::TransportOpen {
                direction: PortDirection::Input,
                name: name.to_string(),
                reason: "mock refused".to_string(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.injector.lock() = Some(tx);
        self.inputs_opened.fetch_add(1, Ordering::SeqCst);
        Ok(InputStream::new(rx, None))
    }
}

struct MockSink {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: Arc<AtomicBool>,
}

impl MidiSink for MockSink {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeduperError::TransportSend("mock send failure".to_string()));
        }
        self.sent.lock().push(bytes.to_vec());
        Ok(())
    }
}
