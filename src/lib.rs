pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::LocalStorage;
pub use config::JobConfig;
pub use crate::core::{etl::EtlEngine, pipeline::StockPipeline};
pub use utils::error::{EtlError, Result};
