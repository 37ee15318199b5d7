use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tokio::sync::mpsc;

use crate::midi::message::MidiMessage;

/// midir client name shown to the MIDI subsystem.
const CLIENT_NAME: &str = "ampctl";

/// Names of the available MIDI input ports, in port order.
pub fn list_ports() -> Result<Vec<String>> {
    let midi_in = new_input()?;
    midi_in
        .ports()
        .iter()
        .map(|port| {
            midi_in
                .port_name(port)
                .map_err(|e| anyhow!("failed to read port name: {}", e))
        })
        .collect()
}

/// An open MIDI input port feeding parsed messages into a channel.
///
/// The midir callback classifies each raw message and forwards the ones we
/// act on over `tx`; messages of other kinds never leave the callback. The
/// port closes when the connection is dropped or `close` is called.
pub struct InputConnection {
    connection: Option<MidiInputConnection<()>>,
    port_name: String,
}

impl InputConnection {
    /// Open the port selected by `selector` (a port name, a case-insensitive
    /// name fragment, or a numeric index) and start delivering messages.
    pub fn open(selector: &str, tx: mpsc::Sender<MidiMessage>) -> Result<Self> {
        let midi_in = new_input()?;
        let port = find_port(&midi_in, selector)?;
        let port_name = midi_in
            .port_name(&port)
            .map_err(|e| anyhow!("failed to read port name: {}", e))?;

        let connection = midi_in
            .connect(
                &port,
                "ampctl-input",
                move |_timestamp, raw, _| {
                    if let Some(message) = MidiMessage::parse(raw) {
                        // Callback context, so try_send rather than blocking
                        // on a full queue.
                        if let Err(e) = tx.try_send(message) {
                            log::warn!("Dropping MIDI message: {}", e);
                        }
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("failed to open MIDI port \"{}\": {}", port_name, e))?;

        log::info!("MIDI input open on \"{}\"", port_name);
        Ok(Self {
            connection: Some(connection),
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Close the port. Equivalent to dropping the connection.
    pub fn close(mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            log::info!("MIDI input closed on \"{}\"", self.port_name);
        }
    }
}

fn new_input() -> Result<MidiInput> {
    let mut midi_in =
        MidiInput::new(CLIENT_NAME).map_err(|e| anyhow!("MIDI init failed: {}", e))?;
    midi_in.ignore(Ignore::None);
    Ok(midi_in)
}

/// Resolve a port selector: exact name first, then case-insensitive
/// substring, then numeric index.
fn find_port(midi_in: &MidiInput, selector: &str) -> Result<MidiInputPort> {
    let ports = midi_in.ports();

    if let Some(port) = ports.iter().find(|port| {
        midi_in
            .port_name(port)
            .map(|name| name == selector)
            .unwrap_or(false)
    }) {
        return Ok(port.clone());
    }

    let fragment = selector.to_ascii_lowercase();
    if let Some(port) = ports.iter().find(|port| {
        midi_in
            .port_name(port)
            .map(|name| name.to_ascii_lowercase().contains(&fragment))
            .unwrap_or(false)
    }) {
        return Ok(port.clone());
    }

    if let Ok(index) = selector.parse::<usize>() {
        if let Some(port) = ports.get(index) {
            return Ok(port.clone());
        }
    }

    Err(anyhow!("MIDI bus \"{}\" not found", selector))
}
