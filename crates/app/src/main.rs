use std::sync::Arc;

use pharmabill_app::{AppConfig, DashboardService, StoreBackend};
use pharmabill_events::{ChangeEvent, InMemoryEventBus};
use pharmabill_infra::{BillingStore, InMemoryStore, PublishingStore, SqliteStore};
use pharmabill_observability::{LogFormat, TracingConfig};

const LOG_FORMAT_VAR: &str = "PHARMABILL_LOG_FORMAT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = match std::env::var(LOG_FORMAT_VAR) {
        Ok(raw) => raw.parse::<LogFormat>().map_err(anyhow::Error::msg)?,
        Err(_) => LogFormat::default(),
    };
    pharmabill_observability::init_with(&TracingConfig {
        format,
        ..TracingConfig::default()
    });

    let config = AppConfig::from_env()?;
    let bus = Arc::new(InMemoryEventBus::<ChangeEvent>::new());

    match &config.store {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; nothing will be saved");
            run(PublishingStore::new(InMemoryStore::new(), bus), &config).await
        }
        StoreBackend::Sqlite(url) => {
            let store = SqliteStore::connect(url).await?;
            tracing::info!(url = %url, "database ready");
            run(PublishingStore::new(store, bus), &config).await
        }
    }
}

async fn run<S: BillingStore>(store: S, config: &AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(store);
    let summary = DashboardService::new(Arc::clone(&store))
        .summary(config.low_stock_threshold)
        .await?;

    tracing::info!(
        issuer = %config.issuer.name,
        items = summary.item_count,
        counterparties = summary.counterparty_count,
        invoices = summary.invoice_count,
        low_stock = summary.low_stock_count,
        revenue = %summary.total_revenue,
        "pharmabill ready"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
