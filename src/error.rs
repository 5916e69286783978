//! Error types for discovery, sessions and configuration

use std::fmt;
use thiserror::Error;

/// Which side of the bridge a port belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeduperError {
    #[error("no MIDI {direction} device found matching {candidates:?}")]
    DeviceNotFound {
        direction: PortDirection,
        candidates: Vec<String>,
    },

    #[error("MIDI {direction} device '{name}' disappeared")]
    DeviceLost { direction: PortDirection, name: String },

    #[error("failed to open MIDI {direction} port '{name}': {reason}")]
    TransportOpen {
        direction: PortDirection,
        name: String,
        reason: String,
    },

    #[error("MIDI send failed: {0}")]
    TransportSend(String),

    #[error("MIDI transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DeduperError {
    /// True when a previously bound device went away mid-session
    pub fn is_device_lost(&self) -> bool {
        matches!(self, DeduperError::DeviceLost { .. })
    }
}

impl From<midir::InitError> for DeduperError {
    fn from(e: midir::InitError) -> Self {
        DeduperError::Transport(e.to_string())
    }
}

impl From<midir::SendError> for DeduperError {
    fn from(e: midir::SendError) -> Self {
        DeduperError::TransportSend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeduperError>;
