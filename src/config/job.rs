use crate::core::{ConfigProvider, FailurePolicy, RateLimitPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://retractile-asha-guiltlessly.ngrok-free.dev/api/stok";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub source: SourceConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub rate_limit: RateLimitPolicy,
    pub error_handling: ErrorHandlingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub headers: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: None,
            // 通道代理會插一頁警告，要帶這個 header 才會直接回 JSON
            headers: BTreeMap::from([(
                "ngrok-skip-browser-warning".to_string(),
                "true".to_string(),
            )]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub store_list: String,
    pub product_list: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            store_list: "listtoko.txt".to_string(),
            product_list: "listproduk.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub snapshot: String,
    pub status: String,
    pub write_status: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot: "live_stock.json".to_string(),
            status: "update_status.json".to_string(),
            write_status: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingConfig {
    pub on_fetch_failure: FailurePolicy,
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STOCK_API_URL})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        for name in self.source.headers.keys() {
            validation::validate_non_empty_string("source.headers", name)?;
        }

        validation::validate_path("input.store_list", &self.input.store_list)?;
        validation::validate_path("input.product_list", &self.input.product_list)?;
        validation::validate_path("output.snapshot", &self.output.snapshot)?;
        if self.output.write_status {
            validation::validate_path("output.status", &self.output.status)?;
        }

        validation::validate_positive_number(
            "rate_limit.batch_size",
            self.rate_limit.batch_size,
            1,
        )?;
        validation::validate_range(
            "rate_limit.max_retries",
            self.rate_limit.max_retries,
            1,
            10,
        )?;

        Ok(())
    }
}

impl ConfigProvider for JobConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn request_headers(&self) -> &BTreeMap<String, String> {
        &self.source.headers
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    fn store_list_path(&self) -> &str {
        &self.input.store_list
    }

    fn product_list_path(&self) -> &str {
        &self.input.product_list
    }

    fn output_path(&self) -> &str {
        &self.output.snapshot
    }

    fn status_path(&self) -> Option<&str> {
        self.output
            .write_status
            .then_some(self.output.status.as_str())
    }

    fn rate_limit(&self) -> RateLimitPolicy {
        self.rate_limit
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.error_handling.on_fetch_failure
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
