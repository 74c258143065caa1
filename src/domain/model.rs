use crate::utils::error::FetchFailure;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterProduct {
    pub code: String,
    pub name: String,
}

/// 上游 API 針對單一門市回傳的一筆商品庫存
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiProductEntry {
    #[serde(rename = "kodeproduk")]
    pub code: String,
    #[serde(rename = "namaproduk", default, deserialize_with = "lenient_name")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_stock")]
    pub stock: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledProduct {
    #[serde(rename = "kodeproduk")]
    pub code: String,
    #[serde(rename = "namaproduk")]
    pub name: String,
    pub stock: u64,
}

impl ReconciledProduct {
    pub fn new(code: impl Into<String>, name: impl Into<String>, stock: u64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            stock,
        }
    }
}

/// Store code -> reconciled product list. Rebuilt from scratch on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    stores: BTreeMap<String, Vec<ReconciledProduct>>,
}

impl Snapshot {
    /// Consumes the accumulator and returns it with the batch folded in.
    pub fn absorb<I>(mut self, stores: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<ReconciledProduct>)>,
    {
        for (code, products) in stores {
            self.stores.insert(code, products);
        }
        self
    }

    pub fn get(&self, store_code: &str) -> Option<&[ReconciledProduct]> {
        self.stores.get(store_code).map(Vec::as_slice)
    }

    pub fn store_codes(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// What happens to a store whose fetch did not produce data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the store, every master product at stock 0.
    #[default]
    ZeroFill,
    /// Leave the store out of the snapshot.
    Omit,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "zero_fill" | "zero-fill" => Ok(FailurePolicy::ZeroFill),
            "omit" => Ok(FailurePolicy::Omit),
            other => Err(format!(
                "unknown fetch failure policy '{}', expected zero_fill or omit",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    pub batch_size: usize,
    pub stagger_ms: u64,
    pub inter_batch_delay_ms: u64,
    /// Total attempts per store, the first request included.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            stagger_ms: 1000,
            inter_batch_delay_ms: 2000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl RateLimitPolicy {
    /// 不等待，測試用
    pub fn immediate() -> Self {
        Self {
            stagger_ms: 0,
            inter_batch_delay_ms: 0,
            retry_delay_ms: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub attempts: u32,
    pub result: std::result::Result<Vec<ApiProductEntry>, FetchFailure>,
}

/// Output of the extract stage.
#[derive(Debug, Clone, Default)]
pub struct SourceLists {
    pub stores: Vec<StoreRecord>,
    pub products: Vec<MasterProduct>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub snapshot: Snapshot,
    pub stores_total: usize,
    pub stores_processed: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stores_total: usize,
    pub stores_processed: usize,
    /// `None` when the snapshot could not be written.
    pub output_path: Option<String>,
}

/// Anything but a string counts as "no name", the master name is used instead.
fn lenient_name<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(name) => Ok(Some(name)),
        _ => Ok(None),
    }
}

/// Accepts `5`, `5.0`, `"5"`; everything else becomes 0.
fn lenient_stock<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let stock = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(stock)
}
