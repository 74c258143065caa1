use crate::domain::model::{BatchReport, FailurePolicy, RateLimitPolicy, SourceLists};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn request_headers(&self) -> &BTreeMap<String, String>;
    fn request_timeout(&self) -> Option<Duration>;
    fn store_list_path(&self) -> &str;
    fn product_list_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn status_path(&self) -> Option<&str>;
    fn rate_limit(&self) -> RateLimitPolicy;
    fn failure_policy(&self) -> FailurePolicy;
}

/// Raw answer from the upstream API before any interpretation.
#[derive(Debug, Clone)]
pub struct SourceResponse {
    pub status: u16,
    pub body: String,
}

/// Transport to the per-store stock endpoint. An `Err` means the request
/// never produced a status (connection refused, timeout, ...).
#[async_trait]
pub trait StockSource: Send + Sync {
    async fn get_store(&self, store_code: &str) -> Result<SourceResponse>;
}

#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceLists>;
    async fn transform(&self, lists: SourceLists) -> Result<BatchReport>;
    async fn load(&self, report: &BatchReport) -> Result<String>;
}
