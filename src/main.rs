use clap::Parser;
use stock_etl::core::loader::ListLoader;
use stock_etl::core::scheduler::plan_batches;
use stock_etl::core::ConfigProvider;
use stock_etl::utils::{logger, validation::Validate};
use stock_etl::{CliArgs, EtlEngine, JobConfig, LocalStorage, StockPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting stock-etl");

    let config = match args.load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };
    tracing::debug!("Job config: {:?}", config);

    let storage = LocalStorage::new(".");

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests will be sent");
        return dry_run(&storage, &config).await;
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = StockPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(summary) => {
            match &summary.output_path {
                Some(path) => println!("✅ Snapshot saved to: {}", path),
                None => println!("⚠️ Snapshot was not saved, see log for details"),
            }
            println!(
                "📦 Stores processed: {}/{}",
                summary.stores_processed, summary.stores_total
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Stock fetching failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn dry_run(storage: &LocalStorage, config: &JobConfig) -> anyhow::Result<()> {
    let loader = ListLoader::new(storage);
    let stores = loader.load_stores(config.store_list_path()).await?;
    let products = loader.load_products(config.product_list_path()).await?;
    let codes: Vec<String> = stores.into_iter().map(|s| s.code).collect();
    let policy = config.rate_limit();

    println!("📋 Job Summary:");
    println!("  Endpoint: {}", config.api_endpoint());
    println!("  Stores: {} ({})", codes.len(), config.store_list_path());
    println!("  Master products: {} ({})", products.len(), config.product_list_path());
    println!("  Output: {}", config.output_path());
    println!("  On fetch failure: {:?}", config.failure_policy());
    println!(
        "  Rate limit: batch {} / stagger {}ms / cool down {}ms / {} attempts, {}ms apart",
        policy.batch_size,
        policy.stagger_ms,
        policy.inter_batch_delay_ms,
        policy.max_retries,
        policy.retry_delay_ms
    );

    for (index, batch) in plan_batches(&codes, policy.batch_size).iter().enumerate() {
        println!("  Batch {}: {}", index + 1, batch.join(", "));
    }

    Ok(())
}
