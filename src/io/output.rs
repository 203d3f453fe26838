use midir::{MidiOutput, MidiOutputConnection};
use tracing::{error, info};

use crate::error::{RelayError, Result};
use crate::event::NoteEvent;

/// Where relayed notes go. Sending is fire-and-forget: failures are the
/// sink's business and never reach the relay.
pub trait NoteSink {
    fn send(&mut self, event: &NoteEvent);
}

impl NoteSink for Vec<NoteEvent> {
    fn send(&mut self, event: &NoteEvent) {
        self.push(*event);
    }
}

impl<S: NoteSink + ?Sized> NoteSink for Box<S> {
    fn send(&mut self, event: &NoteEvent) {
        (**self).send(event);
    }
}

impl<S: NoteSink + ?Sized> NoteSink for &mut S {
    fn send(&mut self, event: &NoteEvent) {
        (**self).send(event);
    }
}

/// A connected midir output port.
pub struct MidiOutputSink {
    conn: MidiOutputConnection,
    name: String,
}

impl MidiOutputSink {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NoteSink for MidiOutputSink {
    fn send(&mut self, event: &NoteEvent) {
        if let Err(err) = self.conn.send(&event.to_bytes()) {
            error!(port = %self.name, "error sending MIDI message to output: {}", err);
        }
    }
}

/// Open the output the relay writes to.
///
/// With `create_virtual` on a unix host a new virtual port called `name` is
/// created for other software to read from. Otherwise an existing port whose
/// name matches `name` (exactly, or failing that by substring) is connected.
pub fn open_output(client_name: &str, name: &str, create_virtual: bool) -> Result<MidiOutputSink> {
    let midi_out = MidiOutput::new(client_name)?;
    if create_virtual {
        return create_virtual_output(midi_out, name);
    }
    connect_named_output(midi_out, name)
}

#[cfg(unix)]
fn create_virtual_output(midi_out: MidiOutput, name: &str) -> Result<MidiOutputSink> {
    use midir::os::unix::VirtualOutput;

    let conn = midi_out
        .create_virtual(name)
        .map_err(|err| RelayError::Connect(err.to_string()))?;
    info!(port = %name, "virtual output created");
    Ok(MidiOutputSink { conn, name: name.to_string() })
}

#[cfg(not(unix))]
fn create_virtual_output(midi_out: MidiOutput, name: &str) -> Result<MidiOutputSink> {
    tracing::warn!("virtual ports are not supported on this platform, looking for an existing '{}'", name);
    connect_named_output(midi_out, name)
}

fn connect_named_output(midi_out: MidiOutput, name: &str) -> Result<MidiOutputSink> {
    let ports = midi_out.ports();
    let names = ports
        .iter()
        .map(|p| midi_out.port_name(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let idx = super::find_port(&names, name).ok_or_else(|| RelayError::DeviceNotFound { name: name.to_string() })?;
    let port_name = names[idx].clone();
    let conn = midi_out
        .connect(&ports[idx], "midi-note-delay-output")
        .map_err(|err| RelayError::Connect(err.to_string()))?;
    info!(port = %port_name, "output connected");
    Ok(MidiOutputSink { conn, name: port_name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_records_in_order() {
        let mut v: Vec<NoteEvent> = Vec::new();
        {
            let mut boxed: Box<&mut Vec<NoteEvent>> = Box::new(&mut v);
            boxed.send(&NoteEvent::note_on(0, 1, 2));
        }
        v.send(&NoteEvent::note_off(0, 1, 0));
        assert_eq!(v, vec![NoteEvent::note_on(0, 1, 2), NoteEvent::note_off(0, 1, 0)]);
    }
}
