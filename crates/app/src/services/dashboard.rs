use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use pharmabill_infra::BillingStore;

use crate::errors::ServiceResult;

/// Headline counts for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub item_count: u64,
    pub counterparty_count: u64,
    pub invoice_count: u64,
    pub low_stock_count: u64,
    /// Sum of grand totals over all invoices.
    pub total_revenue: Decimal,
}

#[derive(Debug)]
pub struct DashboardService<S> {
    store: Arc<S>,
}

impl<S> Clone for DashboardService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> DashboardService<S>
where
    S: BillingStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, low_stock_threshold: i64) -> ServiceResult<DashboardSummary> {
        Ok(DashboardSummary {
            item_count: self.store.count_items().await?,
            counterparty_count: self.store.count_counterparties().await?,
            invoice_count: self.store.count_invoices().await?,
            low_stock_count: self.store.count_low_stock(low_stock_threshold).await?,
            total_revenue: self.store.total_revenue().await?,
        })
    }
}
