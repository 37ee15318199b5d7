pub use amp::{BlackstarAmp, BlackstarError};
pub use controls::control_table;

mod amp;
mod controls;
mod protocol;
