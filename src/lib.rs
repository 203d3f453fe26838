//! Relay MIDI notes from an input device to a virtual output, holding each
//! note-off back for a fixed delay and optionally debouncing retriggers.

pub mod clock;
pub mod config;
pub mod connect;
pub mod driver;
pub mod error;
pub mod event;
pub mod io;
pub mod logging;
pub mod relay;
pub mod status;
pub mod stdin_handler;
pub mod timers;

pub use error::{RelayError, Result};
pub use event::{Classified, NoteEvent, NoteKey, NoteKind};
pub use io::output::NoteSink;
pub use relay::{Relay, RelayConfig};

/// Client name registered with the MIDI backend.
pub const CLIENT_NAME: &str = "midi-note-delay";
