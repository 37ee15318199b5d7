pub mod input;
pub mod message;
