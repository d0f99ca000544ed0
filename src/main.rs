//! # Transaction Aggregator
//!
//! Main entry point for the transaction aggregation service.

use std::sync::Arc;
use tracing::info;
use txn_aggregator::api::rest::{AppState, create_router};
use txn_aggregator::application::services::source_client::SourceClient;
use txn_aggregator::application::use_cases::{
    AggregateTransactionsConfig, AggregateTransactionsUseCase, CollectTransactionsConfig,
    CollectTransactionsUseCase,
};
use txn_aggregator::config::{AppConfig, LogConfig, LogFormat};
use txn_aggregator::infrastructure::cache::ShardedCache;
use txn_aggregator::infrastructure::sources::SourceRegistry;

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(log.include_target);

    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn build_aggregator(config: &AppConfig) -> anyhow::Result<AggregateTransactionsUseCase> {
    let aggregation = &config.aggregation;

    let registry =
        SourceRegistry::from_descriptors(&aggregation.sources, aggregation.attempt_timeout_ms)?;
    let client = SourceClient::new(aggregation.retry_policy(), aggregation.attempt_timeout());
    let collector = CollectTransactionsUseCase::new(
        Arc::new(registry),
        Arc::new(client),
        CollectTransactionsConfig::with_deadline(aggregation.overall_deadline_ms),
    );
    let cache = ShardedCache::new(aggregation.cache_shards, aggregation.cache_ttl());

    Ok(AggregateTransactionsUseCase::new(
        Arc::new(collector),
        Arc::new(cache),
        AggregateTransactionsConfig {
            single_flight: aggregation.single_flight,
            cache_partial_results: aggregation.cache_partial_results,
        },
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down transaction aggregator");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.log);

    info!("Starting transaction aggregator v{}", env!("CARGO_PKG_VERSION"));

    let aggregator = build_aggregator(&config)?;
    for source in &config.aggregation.sources {
        info!(source = %source.id(), endpoint = source.endpoint(), "Registered source");
    }

    let state = Arc::new(AppState {
        aggregator: Arc::new(aggregator),
    });
    let router = create_router(state, config.rest.enable_cors);

    let addr = config.rest.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "REST server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
