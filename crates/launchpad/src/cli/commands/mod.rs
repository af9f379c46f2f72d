//! CLI commands

mod build;
mod changelog;
mod deploy;
mod info;
mod version;

pub use build::BuildCommand;
pub use changelog::ChangelogCommand;
pub use deploy::DeployCommand;
pub use info::InfoCommand;
pub use version::VersionCommand;
