//! Note events as they travel through the relay.
//!
//! Raw MIDI bytes from the input callback are decoded into [`NoteEvent`]s.
//! Only Note On (0x9n) and Note Off (0x8n) are understood; everything else
//! decodes to `None` and is dropped by the caller.

use std::fmt;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteKind {
    NoteOn,
    NoteOff,
}

impl NoteKind {
    /// Message type name used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            NoteKind::NoteOn => "noteon",
            NoteKind::NoteOff => "noteoff",
        }
    }
}

/// Identity used to correlate a release with its press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteKey {
    pub channel: u8,
    pub note: u8,
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.channel, self.note)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteEvent {
    pub kind: NoteKind,
    /// 0..=15
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self { kind: NoteKind::NoteOn, channel: channel & 0x0F, note: note & 0x7F, velocity: velocity & 0x7F }
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self { kind: NoteKind::NoteOff, channel: channel & 0x0F, note: note & 0x7F, velocity: velocity & 0x7F }
    }

    pub fn key(&self) -> NoteKey {
        NoteKey { channel: self.channel, note: self.note }
    }

    /// Decode a raw MIDI message. Returns `None` for anything that is not a
    /// complete note on/off message.
    pub fn from_bytes(msg: &[u8]) -> Option<Self> {
        if msg.len() < 3 {
            return None;
        }
        let channel = msg[0] & 0x0F;
        match msg[0] & 0xF0 {
            NOTE_ON => Some(Self::note_on(channel, msg[1], msg[2])),
            NOTE_OFF => Some(Self::note_off(channel, msg[1], msg[2])),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        let status = match self.kind {
            NoteKind::NoteOn => NOTE_ON,
            NoteKind::NoteOff => NOTE_OFF,
        };
        [status | self.channel, self.note, self.velocity]
    }

    pub fn classify(&self) -> Classified {
        match self.kind {
            NoteKind::NoteOn if self.velocity > 0 => Classified::NoteOn,
            NoteKind::NoteOn => Classified::FakeNoteOff,
            NoteKind::NoteOff => Classified::NoteOff,
        }
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{ channel: {}, note: {}, velocity: {} }}",
            self.kind.as_str(),
            self.channel,
            self.note,
            self.velocity
        )
    }
}

/// Result of running an event through the classifier.
///
/// A `FakeNoteOff` (note on with velocity 0) must be handled exactly like a
/// `NoteOff` downstream; see [`Classified::is_release`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classified {
    NoteOn,
    FakeNoteOff,
    NoteOff,
}

impl Classified {
    pub fn is_release(self) -> bool {
        !matches!(self, Classified::NoteOn)
    }
}
