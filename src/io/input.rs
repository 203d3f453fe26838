use std::sync::mpsc::Sender;

use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{debug, info};

use crate::error::{RelayError, Result};

/// Names of all MIDI input ports currently visible.
pub fn list_input_names(client_name: &str) -> Result<Vec<String>> {
    let midi_in = MidiInput::new(client_name)?;
    let names = midi_in
        .ports()
        .iter()
        .map(|p| midi_in.port_name(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// An open input port. Incoming messages are forwarded as raw bytes over the
/// channel given to [`open_input`]; dropping this closes the port and, with
/// it, the sending half of that channel.
pub struct InputConnection {
    _conn: MidiInputConnection<()>,
    name: String,
}

impl InputConnection {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Connect to the input port called `name` (exact match preferred, substring
/// match as fallback). Fails with [`RelayError::DeviceNotFound`] when no
/// port matches.
pub fn open_input(client_name: &str, name: &str, tx: Sender<Vec<u8>>) -> Result<InputConnection> {
    let mut midi_in = MidiInput::new(client_name)?;
    // Only notes are relayed; keep sysex, clock and active sensing out of the callback.
    midi_in.ignore(Ignore::All);

    let ports = midi_in.ports();
    let names = ports
        .iter()
        .map(|p| midi_in.port_name(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let idx = super::find_port(&names, name).ok_or_else(|| RelayError::DeviceNotFound { name: name.to_string() })?;
    let port_name = names[idx].clone();
    debug!(requested = %name, port = %port_name, "input port matched");

    let conn = midi_in
        .connect(
            &ports[idx],
            "midi-note-delay-input",
            move |_stamp, message, _| {
                // The receiver is gone only while shutting down.
                let _ = tx.send(message.to_vec());
            },
            (),
        )
        .map_err(|err| RelayError::Connect(err.to_string()))?;
    info!(port = %port_name, "input connected");
    Ok(InputConnection { _conn: conn, name: port_name })
}
