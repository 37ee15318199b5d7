use std::fmt;

use crate::device::ControlTable;
use crate::mapping::ControlMap;
use crate::midi::message::MidiMessage;

/// A device command produced from one MIDI message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmpCommand {
    /// Recall preset 1-128.
    SelectPreset(u8),
    /// Set the named control (lowercase) to a value within its limits.
    SetControl { name: String, value: i32 },
}

impl fmt::Display for AmpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmpCommand::SelectPreset(preset) => write!(f, "Preset change to {:3}", preset),
            AmpCommand::SetControl { name, value } => {
                write!(f, "{} change to {:3}", name, value)
            }
        }
    }
}

/// Turns incoming MIDI messages into amplifier commands.
///
/// Owns the active control map, the channel filter (0 matches every channel,
/// 1-16 match exactly) and the device's control table. All three are fixed
/// for the lifetime of the interpreter, which makes `interpret` a pure
/// function: the same message always yields the same command.
#[derive(Debug, Clone)]
pub struct EventInterpreter {
    map: ControlMap,
    channel: u8,
    controls: ControlTable,
}

impl EventInterpreter {
    pub fn new(map: ControlMap, channel: u8, controls: ControlTable) -> Self {
        Self {
            map,
            channel,
            controls,
        }
    }

    /// The channel filter this interpreter was built with.
    pub fn channel_filter(&self) -> u8 {
        self.channel
    }

    /// Decide what, if anything, to do about one message.
    ///
    /// Returns `None` for messages on a filtered-out channel, for CC numbers
    /// absent from the map, and never errors: unmapped or mismatched input is
    /// not a fault.
    pub fn interpret(&self, message: &MidiMessage) -> Option<AmpCommand> {
        if self.channel != 0 && message.channel() != self.channel {
            log::debug!("ignoring message on channel {}", message.channel());
            return None;
        }

        match *message {
            MidiMessage::ProgramChange { program, .. } => {
                // Wire value is 0-based, presets are numbered 1-128.
                Some(AmpCommand::SelectPreset(program + 1))
            }
            MidiMessage::ControlChange {
                controller, value, ..
            } => {
                let name = self.map.control_for(controller)?;
                let name = name.to_ascii_lowercase();
                let value = self.controls.scale(&name, value)?;
                Some(AmpCommand::SetControl { name, value })
            }
        }
    }
}
