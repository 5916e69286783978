//! MIDI Deduper
//!
//! Sits between a MIDI controller and a DAW or virtual port, drops the
//! spurious repeated Note-On messages that drum pads produce when a pad
//! double-triggers, and forwards everything else untouched.

pub mod cli;
pub mod config;
pub mod deduper;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod midi;
pub mod session;
pub mod shutdown;
pub mod supervisor;
pub mod transport;

pub use config::AppConfig;
pub use deduper::{Deduper, DeduperConfig, NoteEvent, Stats};
pub use error::{DeduperError, PortDirection};
