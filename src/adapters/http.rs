use crate::domain::ports::{SourceResponse, StockSource};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// `GET <endpoint>/<storeCode>` against the upstream stock API.
pub struct HttpStockSource {
    client: Client,
    endpoint: String,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpStockSource {
    pub fn new(
        endpoint: &str,
        headers: BTreeMap<String, String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            headers,
            timeout,
        }
    }

    /// The store code is appended as a single, percent-encoded path segment.
    pub fn store_url(&self, store_code: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| EtlError::ConfigError {
            message: format!("Invalid stock API endpoint '{}': {}", self.endpoint, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| EtlError::ConfigError {
                message: format!("Stock API endpoint '{}' cannot take a path", self.endpoint),
            })?
            .pop_if_empty()
            .push(store_code);
        Ok(url)
    }
}

#[async_trait]
impl StockSource for HttpStockSource {
    async fn get_store(&self, store_code: &str) -> Result<SourceResponse> {
        let url = self.store_url(store_code)?;
        tracing::debug!("Making API request to: {}", url);
        let mut request = self.client.get(url);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        tracing::debug!("API response status for {}: {}", store_code, status);

        let body = response.text().await?;
        Ok(SourceResponse { status, body })
    }
}
