//! Configuration, dependency initialization and startup wiring.

mod dependencies;
mod setup;

pub use dependencies::{ConnectionMode, Dependencies, Settings};
pub use setup::{setup, Components, SetupOptions};
