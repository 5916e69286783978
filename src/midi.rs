//! MIDI message classification
//!
//! The deduper only cares about notes. Everything else is carried as raw
//! bytes and forwarded unchanged.

use std::fmt;

/// MIDI message as seen by the deduper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    ///
    /// Velocity 0 is kept as-is here; callers decide how to treat it.
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Note Off: channel (0-15), note (0-127), release velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Any other message (CC, pitch bend, SysEx, clock...), raw bytes
    Other(Vec<u8>),
}

impl MidiMessage {
    /// Classify a MIDI message from raw bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        match status & 0xF0 {
            0x80 if rest.len() >= 2 => Some(MidiMessage::NoteOff {
                channel: status & 0x0F,
                note: rest[0] & 0x7F,
                velocity: rest[1] & 0x7F,
            }),
            0x90 if rest.len() >= 2 => Some(MidiMessage::NoteOn {
                channel: status & 0x0F,
                note: rest[0] & 0x7F,
                velocity: rest[1] & 0x7F,
            }),
            _ => Some(MidiMessage::Other(data.to_vec())),
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::Other(ref data) => data.clone(),
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::Other(ref data) => write!(f, "Other [{}]", format_hex(data)),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_parsing() {
        let data = vec![0x90, 60, 100]; // Note On, ch 1, Middle C, velocity 100
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 0,
                note: 60,
                velocity: 100,
            }
        );
    }

    #[test]
    fn test_note_on_velocity_zero_stays_note_on() {
        let msg = MidiMessage::parse(&[0x99, 36, 0]).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 9,
                note: 36,
                velocity: 0,
            }
        );
    }

    #[test]
    fn test_note_off_parsing() {
        let msg = MidiMessage::parse(&[0x83, 61, 64]).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 3,
                note: 61,
                velocity: 64,
            }
        );
    }

    #[test]
    fn test_other_messages_keep_raw_bytes() {
        let cc = [0xB2, 7, 100];
        assert_eq!(MidiMessage::parse(&cc), Some(MidiMessage::Other(cc.to_vec())));

        let sysex = [0xF0, 0x00, 0x20, 0x32, 0xF7];
        let msg = MidiMessage::parse(&sysex).unwrap();
        assert_eq!(msg.encode(), sysex.to_vec());

        assert_eq!(MidiMessage::parse(&[0xF8]), Some(MidiMessage::Other(vec![0xF8])));
    }

    #[test]
    fn test_truncated_note_is_other() {
        assert_eq!(
            MidiMessage::parse(&[0x90, 60]),
            Some(MidiMessage::Other(vec![0x90, 60]))
        );
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(MidiMessage::parse(&[]), None);
    }

    #[test]
    fn test_encode_note_messages() {
        let on = MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        };
        assert_eq!(on.encode(), vec![0x90, 60, 100]);

        let off = MidiMessage::NoteOff {
            channel: 9,
            note: 36,
            velocity: 0,
        };
        assert_eq!(off.encode(), vec![0x89, 36, 0]);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x90, 0x3C, 0x7F]), "90 3C 7F");
        assert_eq!(format_hex(&[]), "");
    }
}
