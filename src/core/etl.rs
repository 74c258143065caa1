use crate::core::{Pipeline, RunSummary};
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    /// Extract and transform errors abort the run. A failed load is logged
    /// and reported as `output_path: None`.
    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting stock fetching process...");

        let lists = self.pipeline.extract().await?;
        self.monitor.log_phase("Lists loaded");

        let report = self.pipeline.transform(lists).await?;
        self.monitor.log_phase("Stores fetched");

        let output_path = match self.pipeline.load(&report).await {
            Ok(path) => {
                tracing::info!(
                    "✅ Successfully generated {} with data for {} stores.",
                    path,
                    report.stores_processed
                );
                Some(path)
            }
            Err(e) => {
                tracing::error!("❌ Error writing final JSON file: {}", e);
                None
            }
        };

        tracing::info!(
            "Stock fetching process finished: {}/{} stores processed.",
            report.stores_processed,
            report.stores_total
        );
        self.monitor.log_final_stats();

        Ok(RunSummary {
            stores_total: report.stores_total,
            stores_processed: report.stores_processed,
            output_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BatchReport, ReconciledProduct, Snapshot, SourceLists, StoreRecord};
    use crate::utils::error::EtlError;
    use async_trait::async_trait;

    struct FakePipeline {
        fail_extract: bool,
        fail_load: bool,
    }

    #[async_trait]
    impl Pipeline for FakePipeline {
        async fn extract(&self) -> Result<SourceLists> {
            if self.fail_extract {
                return Err(EtlError::SourceUnavailable {
                    path: "listtoko.txt".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(SourceLists {
                stores: vec![StoreRecord {
                    code: "A1".to_string(),
                    name: "Toko A".to_string(),
                }],
                products: vec![],
            })
        }

        async fn transform(&self, lists: SourceLists) -> Result<BatchReport> {
            let snapshot = Snapshot::default().absorb(
                lists
                    .stores
                    .into_iter()
                    .map(|s| (s.code, vec![ReconciledProduct::new("P1", "Produk 1", 0)])),
            );
            Ok(BatchReport {
                stores_total: 1,
                stores_processed: snapshot.len(),
                batches: 1,
                snapshot,
            })
        }

        async fn load(&self, _report: &BatchReport) -> Result<String> {
            if self.fail_load {
                return Err(EtlError::PersistError {
                    path: "live_stock.json".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok("live_stock.json".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_reports_counts_and_output() {
        let engine = EtlEngine::new(FakePipeline {
            fail_extract: false,
            fail_load: false,
        });

        let summary = engine.run().await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                stores_total: 1,
                stores_processed: 1,
                output_path: Some("live_stock.json".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_persist_failure_still_completes() {
        let engine = EtlEngine::new(FakePipeline {
            fail_extract: false,
            fail_load: true,
        });

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.stores_processed, 1);
        assert_eq!(summary.output_path, None);
    }

    #[tokio::test]
    async fn test_extract_failure_aborts_run() {
        let engine = EtlEngine::new(FakePipeline {
            fail_extract: true,
            fail_load: false,
        });

        assert!(matches!(
            engine.run().await,
            Err(EtlError::SourceUnavailable { .. })
        ));
    }
}
