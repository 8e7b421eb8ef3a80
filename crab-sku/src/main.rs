use crab_sku::{BackfillEngine, Config, DbService, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (.env is optional)
    let _ = dotenv::dotenv();

    // 2. Configuration, before touching storage
    let config = Config::from_env()?;
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    tracing::info!(environment = %config.environment, "crab-sku backfill starting");

    // 3. Storage: the only fatal dependency
    let db = DbService::new(&config.database_url).await.inspect_err(|e| {
        tracing::error!("Cannot open database: {}", e);
    })?;

    // 4. Run; per-tenant and per-table failures are in the report
    let engine = BackfillEngine::new(db.pool.clone(), &config);
    let report = engine.run().await.inspect_err(|e| {
        tracing::error!("Backfill aborted: {}", e);
    })?;

    match serde_json::to_string(&report) {
        Ok(json) => tracing::info!(report = %json, "Run report"),
        Err(e) => tracing::warn!("Failed to serialize run report: {}", e),
    }

    db.pool.close().await;
    Ok(())
}
