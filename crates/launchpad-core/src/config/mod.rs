//! Configuration system for Launchpad

pub mod defaults;
mod loader;
mod types;
pub mod validation;
mod writer;

pub use defaults::*;
pub use loader::*;
pub use types::*;
pub use validation::*;
pub use writer::update_config_version;
