use crate::core::{ApiProductEntry, Delay, FetchOutcome, RateLimitPolicy, StockSource};
use crate::utils::error::FetchFailure;
use std::sync::Arc;
use std::time::Duration;

enum Attempt {
    Success(Vec<ApiProductEntry>),
    Terminal(FetchFailure),
    Retry(String),
}

/// Per-store GET with bounded retries.
pub struct StockFetcher {
    source: Arc<dyn StockSource>,
    delay: Arc<dyn Delay>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl StockFetcher {
    pub fn new(
        source: Arc<dyn StockSource>,
        delay: Arc<dyn Delay>,
        policy: &RateLimitPolicy,
    ) -> Self {
        Self {
            source,
            delay,
            max_attempts: policy.max_retries.max(1),
            retry_delay: Duration::from_millis(policy.retry_delay_ms),
        }
    }

    /// Never fails: any failure is reported as "no data".
    pub async fn fetch_store_stock(&self, store_code: &str) -> Vec<ApiProductEntry> {
        self.fetch_store(store_code).await.result.unwrap_or_default()
    }

    pub async fn fetch_store(&self, store_code: &str) -> FetchOutcome {
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            match self.attempt(store_code, attempt).await {
                Attempt::Success(entries) => {
                    return FetchOutcome {
                        attempts: attempt,
                        result: Ok(entries),
                    };
                }
                Attempt::Terminal(failure) => {
                    return FetchOutcome {
                        attempts: attempt,
                        result: Err(failure),
                    };
                }
                Attempt::Retry(reason) => last_reason = reason,
            }

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                self.delay.sleep(self.retry_delay).await;
            }
        }

        tracing::error!(
            "  -> [{}] All {} attempts failed, last error: {}",
            store_code,
            self.max_attempts,
            last_reason
        );
        FetchOutcome {
            attempts: self.max_attempts,
            result: Err(FetchFailure::TransientFetchFailure {
                attempts: self.max_attempts,
                reason: last_reason,
            }),
        }
    }

    async fn attempt(&self, store_code: &str, attempt: u32) -> Attempt {
        let response = match self.source.get_store(store_code).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "  -> [{}] [Attempt {}] Network error: {}",
                    store_code,
                    attempt,
                    e
                );
                return Attempt::Retry(e.to_string());
            }
        };

        match response.status {
            200..=299 => match serde_json::from_str::<serde_json::Value>(&response.body) {
                Ok(value) => decode_entries(store_code, value),
                // 2xx 但內容不是 JSON（例如代理插入的警告頁）視為暫時性錯誤
                Err(e) => {
                    tracing::warn!(
                        "  -> [{}] [Attempt {}] Response body is not JSON: {}",
                        store_code,
                        attempt,
                        e
                    );
                    Attempt::Retry(format!("invalid JSON body: {}", e))
                }
            },
            // 429 是上游在限流，等一下再試
            status @ 400..=499 if status != 429 => {
                tracing::error!(
                    "  -> [{}] [Attempt {}] API request failed with status: {} (not retrying)",
                    store_code,
                    attempt,
                    status
                );
                Attempt::Terminal(FetchFailure::ClientFetchFailure { status })
            }
            status => {
                tracing::warn!(
                    "  -> [{}] [Attempt {}] API request failed with status: {}",
                    store_code,
                    attempt,
                    status
                );
                Attempt::Retry(format!("status {}", status))
            }
        }
    }
}

fn decode_entries(store_code: &str, value: serde_json::Value) -> Attempt {
    let serde_json::Value::Array(items) = value else {
        tracing::warn!(
            "  -> [{}] Warning: API response was not an array. Treating as empty.",
            store_code
        );
        return Attempt::Terminal(FetchFailure::MalformedResponse {
            reason: "expected a JSON array".to_string(),
        });
    };

    let total = items.len();
    let entries: Vec<ApiProductEntry> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if entries.len() < total {
        tracing::warn!(
            "  -> [{}] Skipped {} of {} malformed product entries",
            store_code,
            total - entries.len(),
            total
        );
    }
    Attempt::Success(entries)
}
