//! CLI commands module.

mod config;
mod speakers;
mod speech;
mod util;

pub use config::ConfigCommand;
pub use speakers::{BackendsCommand, SpeakersCommand};
pub use speech::{SayCommand, StreamCommand};

pub(crate) use util::*;
