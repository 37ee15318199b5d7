use anyhow::Result;
use tokio::sync::mpsc;

use crate::device::AmpDevice;
use crate::dispatch::CommandDispatcher;
use crate::interpret::EventInterpreter;
use crate::midi::input::InputConnection;

/// Queue depth between the midir callback and the processing loop.
const MESSAGE_QUEUE_DEPTH: usize = 64;

/// The listening loop: connect the device, open the MIDI input and feed every
/// message through interpret → dispatch until shutdown is requested.
///
/// Messages are handled strictly one at a time; the loop blocks until the
/// next message or the shutdown signal arrives. On the way out the MIDI port
/// and the device connection are both released, regardless of which (if
/// either) failed first.
pub struct ListenSession {
    interpreter: EventInterpreter,
    dispatcher: CommandDispatcher,
    quiet: bool,
}

impl ListenSession {
    pub fn new(interpreter: EventInterpreter, dispatcher: CommandDispatcher, quiet: bool) -> Self {
        Self {
            interpreter,
            dispatcher,
            quiet,
        }
    }

    /// Run until `shutdown` fires or a device call fails.
    ///
    /// A send on `shutdown` (or dropping its sender) ends the loop after the
    /// in-flight message, if any, has been dispatched.
    pub async fn run(
        &self,
        device: &mut dyn AmpDevice,
        bus: &str,
        mut shutdown: mpsc::Receiver<()>,
    ) -> Result<()> {
        device.connect()?;
        log::info!("connected to {}", device.model());
        if !self.quiet {
            println!("Connected to {}", device.model());
        }

        let listened = self.listen(device, bus, &mut shutdown).await;

        // The device is released even when the loop failed; the loop error
        // takes precedence when both go wrong.
        match device.disconnect() {
            Ok(()) => listened,
            Err(e) if listened.is_ok() => Err(e),
            Err(e) => {
                log::warn!("device disconnect also failed: {}", e);
                listened
            }
        }
    }

    async fn listen(
        &self,
        device: &mut dyn AmpDevice,
        bus: &str,
        shutdown: &mut mpsc::Receiver<()>,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(MESSAGE_QUEUE_DEPTH);
        let input = InputConnection::open(bus, tx)?;

        if !self.quiet {
            println!(
                "Listening to {} on bus \"{}\"",
                channel_description(self.interpreter.channel_filter()),
                input.port_name()
            );
            println!("Press ctrl-C to exit");
        }

        let result = loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    log::info!("shutdown requested");
                    break Ok(());
                }
                received = rx.recv() => match received {
                    Some(message) => {
                        if let Some(command) = self.interpreter.interpret(&message) {
                            if let Err(e) = self.dispatcher.dispatch(&command, device) {
                                break Err(e);
                            }
                        }
                    }
                    // The sender lives in the midir callback; it only drops
                    // when the port itself is gone.
                    None => break Ok(()),
                },
            }
        };

        input.close();
        result
    }
}

fn channel_description(filter: u8) -> String {
    if filter == 0 {
        "all MIDI channels".to_string()
    } else {
        format!("MIDI channel {}", filter)
    }
}
