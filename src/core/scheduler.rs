use crate::core::fetcher::StockFetcher;
use crate::core::reconcile::reconcile;
use crate::core::{
    BatchReport, Delay, FailurePolicy, MasterProduct, RateLimitPolicy, ReconciledProduct, Snapshot,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Consecutive slices of at most `batch_size` codes, in input order.
pub fn plan_batches(store_codes: &[String], batch_size: usize) -> Vec<&[String]> {
    store_codes.chunks(batch_size.max(1)).collect()
}

/// Drives the fetcher over all stores in staggered, sequential batches.
pub struct BatchScheduler {
    fetcher: Arc<StockFetcher>,
    delay: Arc<dyn Delay>,
    policy: RateLimitPolicy,
    on_failure: FailurePolicy,
}

impl BatchScheduler {
    pub fn new(
        fetcher: Arc<StockFetcher>,
        delay: Arc<dyn Delay>,
        policy: RateLimitPolicy,
        on_failure: FailurePolicy,
    ) -> Self {
        Self {
            fetcher,
            delay,
            policy,
            on_failure,
        }
    }

    pub async fn run(
        &self,
        store_codes: &[String],
        products: Arc<Vec<MasterProduct>>,
    ) -> BatchReport {
        let batches = plan_batches(store_codes, self.policy.batch_size);
        let batch_count = batches.len();
        let cool_down = Duration::from_millis(self.policy.inter_batch_delay_ms);

        tracing::info!(
            "Starting fetch of {} stores in {} batches (batch size {})",
            store_codes.len(),
            batch_count,
            self.policy.batch_size
        );

        let mut snapshot = Snapshot::default();
        let mut stores_processed = 0;
        let mut dispatched = 0;

        for (index, batch) in batches.into_iter().enumerate() {
            dispatched += batch.len();
            tracing::info!(
                "--> Processing batch {}: {} stores ({}/{})",
                index + 1,
                batch.len(),
                dispatched,
                store_codes.len()
            );

            let settled = self.run_batch(batch, &products).await;
            stores_processed += settled.len();
            snapshot = snapshot.absorb(settled);

            if index + 1 < batch_count && !cool_down.is_zero() {
                tracing::debug!("Cooling down for {:?} before next batch", cool_down);
                self.delay.sleep(cool_down).await;
            }
        }

        BatchReport {
            snapshot,
            stores_total: store_codes.len(),
            stores_processed,
            batches: batch_count,
        }
    }

    /// Returns only the stores that contribute to the snapshot.
    async fn run_batch(
        &self,
        batch: &[String],
        products: &Arc<Vec<MasterProduct>>,
    ) -> Vec<(String, Vec<ReconciledProduct>)> {
        let handles = batch.iter().enumerate().map(|(k, store_code)| {
            let fetcher = Arc::clone(&self.fetcher);
            let delay = Arc::clone(&self.delay);
            let products = Arc::clone(products);
            let store_code = store_code.clone();
            let stagger = Duration::from_millis(self.policy.stagger_ms.saturating_mul(k as u64));
            let on_failure = self.on_failure;

            tokio::spawn(async move {
                if !stagger.is_zero() {
                    delay.sleep(stagger).await;
                }
                let outcome = fetcher.fetch_store(&store_code).await;
                let entries = match outcome.result {
                    Ok(entries) => entries,
                    Err(failure) => match on_failure {
                        FailurePolicy::ZeroFill => {
                            tracing::warn!(
                                "  -> [{}] No data after {} attempt(s) ({}), using zero stock",
                                store_code,
                                outcome.attempts,
                                failure
                            );
                            Vec::new()
                        }
                        FailurePolicy::Omit => {
                            tracing::warn!(
                                "  -> [{}] No data after {} attempt(s) ({}), leaving store out",
                                store_code,
                                outcome.attempts,
                                failure
                            );
                            return None;
                        }
                    },
                };
                Some(reconcile(&products, &entries))
            })
        });

        let results = join_all(handles).await;

        batch
            .iter()
            .zip(results)
            .filter_map(|(store_code, joined)| match joined {
                Ok(Some(products)) => Some((store_code.clone(), products)),
                Ok(None) => None,
                Err(e) => {
                    tracing::error!("  -> [{}] Error processing store: {}", store_code, e);
                    None
                }
            })
            .collect()
    }
}
