#[cfg(feature = "cli")]
pub mod cli;
pub mod job;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use job::JobConfig;
