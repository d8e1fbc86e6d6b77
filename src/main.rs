//! eshop order service - HTTP entry point

use anyhow::Result;
use eshop_orders::{http, publisher::NatsPublisher, store::PgStore, AppConfig, OrderService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env()?;

    let service = match &config.database_url {
        Some(url) => OrderService::with_store(PgStore::connect(url, config.db_max_connections, config.store_timeout).await?),
        None => {
            warn!("DATABASE_URL not set, orders are kept in memory only");
            OrderService::in_memory()
        }
    }
    .with_call_timeout(config.store_timeout);

    let service = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => service.with_events(Arc::new(NatsPublisher::new(client, "orders"))),
            Err(e) => {
                warn!(error = %e, "NATS unavailable, order events will not be published");
                service
            }
        },
        None => service,
    };

    let app = http::router(service, &config.api_url);
    let addr = format!("0.0.0.0:{}", config.port);
    info!("eshop orders listening on {addr}{}", config.api_url);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
