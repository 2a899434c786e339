use clap::Parser;
use healthtrack::{Config, config::Args, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!("{:?}", args);

    let result = run(&config).await;

    telemetry::shutdown_telemetry();
    result
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let pool = healthtrack::setup_database(config).await?;

    let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
        .fetch_one(&pool)
        .await?;
    info!(
        schema_version = ?latest,
        known_migrations = healthtrack::migrator().iter().count(),
        page_size = config.pagination.default_size,
        "healthtrack database ready"
    );

    pool.close().await;
    Ok(())
}
