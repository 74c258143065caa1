use crate::adapters::{HttpStockSource, TokioDelay};
use crate::core::fetcher::StockFetcher;
use crate::core::loader::ListLoader;
use crate::core::scheduler::BatchScheduler;
use crate::core::snapshot::SnapshotWriter;
use crate::core::{
    BatchReport, ConfigProvider, Delay, Pipeline, SourceLists, StockSource, Storage,
};
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

/// Store list + product list -> per-store stock -> `live_stock.json`.
pub struct StockPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    scheduler: BatchScheduler,
}

impl<S: Storage, C: ConfigProvider> StockPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let source = HttpStockSource::new(
            config.api_endpoint(),
            config.request_headers().clone(),
            config.request_timeout(),
        );
        Self::with_ports(storage, config, Arc::new(source), Arc::new(TokioDelay))
    }

    /// Same pipeline with the transport and clock swapped out.
    pub fn with_ports(
        storage: S,
        config: C,
        source: Arc<dyn StockSource>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        let policy = config.rate_limit();
        let fetcher = Arc::new(StockFetcher::new(source, Arc::clone(&delay), &policy));
        let scheduler = BatchScheduler::new(fetcher, delay, policy, config.failure_policy());
        Self {
            storage,
            config,
            scheduler,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StockPipeline<S, C> {
    async fn extract(&self) -> Result<SourceLists> {
        let loader = ListLoader::new(&self.storage);
        let (stores, products) = tokio::try_join!(
            loader.load_stores(self.config.store_list_path()),
            loader.load_products(self.config.product_list_path()),
        )?;

        if stores.is_empty() {
            tracing::error!(
                "No store codes found in {}. Aborting.",
                self.config.store_list_path()
            );
            return Err(EtlError::EmptyStoreList {
                path: self.config.store_list_path().to_string(),
            });
        }

        tracing::info!(
            "Found {} stores and {} master products.",
            stores.len(),
            products.len()
        );
        Ok(SourceLists { stores, products })
    }

    async fn transform(&self, lists: SourceLists) -> Result<BatchReport> {
        let store_codes: Vec<String> = lists.stores.into_iter().map(|s| s.code).collect();
        let products = Arc::new(lists.products);
        Ok(self.scheduler.run(&store_codes, products).await)
    }

    async fn load(&self, report: &BatchReport) -> Result<String> {
        let writer = SnapshotWriter::new(&self.storage);
        let output_path = self.config.output_path();
        writer.write(output_path, &report.snapshot).await?;

        if let Some(status_path) = self.config.status_path() {
            // 狀態檔失敗不影響快照
            if let Err(e) = writer.write_status(status_path, chrono::Local::now()).await {
                tracing::warn!("⚠️ Could not write update status: {}", e);
            }
        }

        Ok(output_path.to_string())
    }
}
