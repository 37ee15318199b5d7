use anyhow::Result;

use crate::device::AmpDevice;
use crate::interpret::AmpCommand;

/// Applies interpreted commands to the device, one call per command.
///
/// There is no retry here: a failed device call propagates to the caller,
/// which for the listening loop means the run ends.
pub struct CommandDispatcher {
    quiet: bool,
}

impl CommandDispatcher {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn dispatch(&self, command: &AmpCommand, device: &mut dyn AmpDevice) -> Result<()> {
        if !self.quiet {
            println!("{}", command);
        }
        match command {
            AmpCommand::SelectPreset(preset) => device.select_preset(*preset),
            AmpCommand::SetControl { name, value } => device.set_control(name, *value),
        }
    }
}
