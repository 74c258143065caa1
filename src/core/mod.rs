pub mod etl;
pub mod fetcher;
pub mod loader;
pub mod pipeline;
pub mod reconcile;
pub mod scheduler;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    ApiProductEntry, BatchReport, FailurePolicy, FetchOutcome, MasterProduct, RateLimitPolicy,
    ReconciledProduct, RunSummary, Snapshot, SourceLists, StoreRecord,
};
pub use crate::domain::ports::{
    ConfigProvider, Delay, Pipeline, SourceResponse, StockSource, Storage,
};
pub use crate::utils::error::Result;
