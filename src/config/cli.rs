use crate::config::JobConfig;
use crate::core::FailurePolicy;
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "stock-etl.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "stock-etl")]
#[command(about = "Builds the per-store live stock snapshot from the upstream stock API")]
pub struct CliArgs {
    /// Path to TOML job configuration (defaults to ./stock-etl.toml when present)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Base URL of the stock API; the store code is appended
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub store_list: Option<String>,

    #[arg(long)]
    pub product_list: Option<String>,

    /// Snapshot output file
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// What to do with a store whose fetch failed: zero_fill or omit
    #[arg(long)]
    pub on_fetch_failure: Option<FailurePolicy>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log CPU / memory per phase
    #[arg(long)]
    pub monitor: bool,

    /// Show the batch plan without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Loads the config file (explicit, default, or none) and applies flags on top.
    pub fn load_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                JobConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => JobConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut JobConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.source.endpoint = endpoint.clone();
        }
        if let Some(path) = &self.store_list {
            config.input.store_list = path.clone();
        }
        if let Some(path) = &self.product_list {
            config.input.product_list = path.clone();
        }
        if let Some(path) = &self.output {
            config.output.snapshot = path.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.rate_limit.batch_size = batch_size;
        }
        if let Some(policy) = self.on_fetch_failure {
            config.error_handling.on_fetch_failure = policy;
        }
    }
}
