pub mod config;
pub mod event_bus;
pub mod generation;

pub use config::*;
pub use event_bus::*;
pub use generation::*;
