pub use device::{AmpDevice, ControlTable};
pub use dispatch::CommandDispatcher;
pub use interpret::{AmpCommand, EventInterpreter};
pub use mapping::{ControlMap, MapError};
pub use midi::input::{list_ports, InputConnection};
pub use midi::message::MidiMessage;
pub use session::ListenSession;

mod device;
mod dispatch;
mod interpret;
mod mapping;
mod midi;
mod session;
