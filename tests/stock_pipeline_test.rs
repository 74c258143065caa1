use anyhow::Result;
use httpmock::prelude::*;
use stock_etl::{EtlEngine, EtlError, JobConfig, LocalStorage, StockPipeline};
use tempfile::TempDir;

const STORES: &str = "kodetoko,namatoko\nA1,Toko A\nB2,Toko B\n";
const PRODUCTS: &str = "kodeproduk,namaproduk\nP1,Produk 1\nP2,Produk 2\n";

fn workspace(stores: &str, products: &str) -> Result<TempDir> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("listtoko.txt"), stores)?;
    std::fs::write(dir.path().join("listproduk.txt"), products)?;
    Ok(dir)
}

/// Job config pointed at the mock server with every delay switched off.
fn job_config(endpoint: &str, extra: &str) -> Result<JobConfig> {
    let toml_content = format!(
        r#"
[source]
endpoint = "{}"

[rate_limit]
stagger_ms = 0
inter_batch_delay_ms = 0
retry_delay_ms = 0
{}
"#,
        endpoint, extra
    );
    Ok(JobConfig::from_toml_str(&toml_content)?)
}

fn read_snapshot(dir: &TempDir) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(dir.path().join("live_stock.json"))?;
    Ok(serde_json::from_str(&content)?)
}

#[tokio::test]
async fn test_end_to_end_one_store_down() -> Result<()> {
    let dir = workspace(STORES, PRODUCTS)?;
    let server = MockServer::start();

    let a1_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/stok/A1")
            .header("ngrok-skip-browser-warning", "true");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"kodeproduk": "P1", "namaproduk": "Produk 1", "stock": 5}
            ]));
    });
    let b2_mock = server.mock(|when, then| {
        when.method(GET).path("/api/stok/B2");
        then.status(502);
    });

    let config = job_config(&server.url("/api/stok"), "")?;
    let pipeline = StockPipeline::new(LocalStorage::new(dir.path()), config);
    let summary = EtlEngine::new(pipeline).run().await?;

    a1_mock.assert_hits(1);
    b2_mock.assert_hits(3);
    assert_eq!(summary.stores_total, 2);
    assert_eq!(summary.stores_processed, 2);
    assert_eq!(summary.output_path.as_deref(), Some("live_stock.json"));

    let snapshot = read_snapshot(&dir)?;
    assert_eq!(
        snapshot,
        serde_json::json!({
            "A1": [
                {"kodeproduk": "P1", "namaproduk": "Produk 1", "stock": 5},
                {"kodeproduk": "P2", "namaproduk": "Produk 2", "stock": 0}
            ],
            "B2": [
                {"kodeproduk": "P1", "namaproduk": "Produk 1", "stock": 0},
                {"kodeproduk": "P2", "namaproduk": "Produk 2", "stock": 0}
            ]
        })
    );

    let status: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(
        dir.path().join("update_status.json"),
    )?)?;
    assert!(status["lastUpdated"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_client_error_is_not_retried() -> Result<()> {
    let dir = workspace("kodetoko,namatoko\nZZ,Toko Hilang\n", PRODUCTS)?;
    let server = MockServer::start();

    let not_found = server.mock(|when, then| {
        when.method(GET).path("/api/stok/ZZ");
        then.status(404);
    });

    let config = job_config(&server.url("/api/stok"), "")?;
    let pipeline = StockPipeline::new(LocalStorage::new(dir.path()), config);
    let summary = EtlEngine::new(pipeline).run().await?;

    not_found.assert_hits(1);
    assert_eq!(summary.stores_processed, 1);
    assert_eq!(read_snapshot(&dir)?["ZZ"][0]["stock"], 0);
    Ok(())
}

#[tokio::test]
async fn test_omit_policy_leaves_failed_store_out() -> Result<()> {
    let dir = workspace(STORES, PRODUCTS)?;
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/stok/A1");
        then.status(200).json_body(serde_json::json!([]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/stok/B2");
        then.status(500);
    });

    let config = job_config(
        &server.url("/api/stok"),
        "\n[error_handling]\non_fetch_failure = \"omit\"\n",
    )?;
    let pipeline = StockPipeline::new(LocalStorage::new(dir.path()), config);
    let summary = EtlEngine::new(pipeline).run().await?;

    assert_eq!(summary.stores_processed, 1);
    let snapshot = read_snapshot(&dir)?;
    assert!(snapshot.get("A1").is_some());
    assert!(snapshot.get("B2").is_none());
    Ok(())
}

#[tokio::test]
async fn test_batches_cover_every_store_once() -> Result<()> {
    let mut stores = String::from("kodetoko,namatoko\n");
    for i in 1..=23 {
        stores.push_str(&format!("T{:02},Toko {}\n", i, i));
    }
    let dir = workspace(&stores, PRODUCTS)?;
    let server = MockServer::start();

    let any_store = server.mock(|when, then| {
        when.method(GET).path_contains("/api/stok/T");
        then.status(200).json_body(serde_json::json!([
            {"kodeproduk": "P2", "namaproduk": "Produk 2", "stock": "3"}
        ]));
    });

    let config = job_config(&server.url("/api/stok"), "batch_size = 10")?;
    let pipeline = StockPipeline::new(LocalStorage::new(dir.path()), config);
    let summary = EtlEngine::new(pipeline).run().await?;

    any_store.assert_hits(23);
    assert_eq!(summary.stores_processed, 23);
    let snapshot = read_snapshot(&dir)?;
    assert_eq!(snapshot.as_object().map(|m| m.len()), Some(23));
    assert_eq!(snapshot["T23"][1]["stock"], 3);
    Ok(())
}

#[tokio::test]
async fn test_missing_store_list_aborts_before_any_request() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("listproduk.txt"), PRODUCTS)?;
    let server = MockServer::start();

    let api = server.mock(|when, then| {
        when.method(GET);
        then.status(200).json_body(serde_json::json!([]));
    });

    let config = job_config(&server.url("/api/stok"), "")?;
    let pipeline = StockPipeline::new(LocalStorage::new(dir.path()), config);
    let result = EtlEngine::new(pipeline).run().await;

    assert!(matches!(result, Err(EtlError::SourceUnavailable { .. })));
    api.assert_hits(0);
    assert!(!dir.path().join("live_stock.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_previous_snapshot_is_replaced_not_merged() -> Result<()> {
    let dir = workspace("kodetoko,namatoko\nA1,Toko A\n", PRODUCTS)?;
    std::fs::write(
        dir.path().join("live_stock.json"),
        r#"{"OLD": [{"kodeproduk": "P1", "namaproduk": "Produk 1", "stock": 9}]}"#,
    )?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/stok/A1");
        then.status(200).json_body(serde_json::json!([]));
    });

    let config = job_config(&server.url("/api/stok"), "")?;
    let pipeline = StockPipeline::new(LocalStorage::new(dir.path()), config);
    EtlEngine::new(pipeline).run().await?;

    let snapshot = read_snapshot(&dir)?;
    assert!(snapshot.get("OLD").is_none());
    assert!(snapshot.get("A1").is_some());
    Ok(())
}
