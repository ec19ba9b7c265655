//! Persistence boundary.
//!
//! Repository traits per table plus an atomic [`FinalizationStore`], with an
//! in-memory and a SQLite implementation, and a decorator that publishes a
//! [`ChangeEvent`] after every successful write.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

use async_trait::async_trait;
use rust_decimal::Decimal;

use pharmabill_catalog::CatalogItem;
use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_events::{ChangeEvent, ChangeFilter, ChangeKind, Collection, EventBus, Subscription};
use pharmabill_invoicing::Invoice;
use pharmabill_parties::Counterparty;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use r#trait::{
    AppliedAdjustment, BillingStore, CatalogRepository, CounterpartyRepository,
    FinalizationReceipt, FinalizationStore, InvoiceRepository, StoreError, StoreResult,
};

pub(crate) const CATALOG_ITEMS: &str = "catalog_items";
pub(crate) const COUNTERPARTIES: &str = "counterparties";
pub(crate) const INVOICES: &str = "invoices";

/// Adapter that publishes a [`ChangeEvent`] to an `EventBus` after each
/// successful write.
///
/// This ensures the ordering invariant: **publish happens only after the write
/// succeeds**. A failed publish is logged and otherwise ignored; the write has
/// already been committed and readers re-query the store anyway.
pub struct PublishingStore<S, B> {
    store: S,
    bus: B,
}

impl<S, B> PublishingStore<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> PublishingStore<S, B>
where
    B: EventBus<ChangeEvent>,
{
    /// Receive the changes accepted by `filter`, in commit order.
    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription<ChangeEvent> {
        self.bus
            .subscribe_filtered(Box::new(move |change| filter.matches(change)))
    }

    fn notify(&self, change: ChangeEvent) {
        let event_type = change.event_type();
        if let Err(err) = self.bus.publish(change) {
            tracing::warn!(event_type = %event_type, error = ?err, "change notification failed");
        }
    }
}

#[async_trait]
impl<S, B> CatalogRepository for PublishingStore<S, B>
where
    S: CatalogRepository,
    B: EventBus<ChangeEvent>,
{
    async fn insert_item(&self, item: &CatalogItem) -> StoreResult<()> {
        self.store.insert_item(item).await?;
        self.notify(ChangeEvent::new(
            Collection::CatalogItems,
            item.id_typed(),
            ChangeKind::Created,
        ));
        Ok(())
    }

    async fn update_item(&self, item: &CatalogItem) -> StoreResult<()> {
        self.store.update_item(item).await?;
        self.notify(ChangeEvent::new(
            Collection::CatalogItems,
            item.id_typed(),
            ChangeKind::Updated,
        ));
        Ok(())
    }

    async fn delete_item(&self, id: CatalogItemId) -> StoreResult<()> {
        self.store.delete_item(id).await?;
        self.notify(ChangeEvent::new(
            Collection::CatalogItems,
            id,
            ChangeKind::Deleted,
        ));
        Ok(())
    }

    async fn get_item(&self, id: CatalogItemId) -> StoreResult<Option<CatalogItem>> {
        self.store.get_item(id).await
    }

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        self.store.list_items().await
    }

    async fn count_items(&self) -> StoreResult<u64> {
        self.store.count_items().await
    }

    async fn count_low_stock(&self, threshold: i64) -> StoreResult<u64> {
        self.store.count_low_stock(threshold).await
    }
}

#[async_trait]
impl<S, B> CounterpartyRepository for PublishingStore<S, B>
where
    S: CounterpartyRepository,
    B: EventBus<ChangeEvent>,
{
    async fn insert_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        self.store.insert_counterparty(counterparty).await?;
        self.notify(ChangeEvent::new(
            Collection::Counterparties,
            counterparty.id_typed(),
            ChangeKind::Created,
        ));
        Ok(())
    }

    async fn update_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        self.store.update_counterparty(counterparty).await?;
        self.notify(ChangeEvent::new(
            Collection::Counterparties,
            counterparty.id_typed(),
            ChangeKind::Updated,
        ));
        Ok(())
    }

    async fn delete_counterparty(&self, id: CounterpartyId) -> StoreResult<()> {
        self.store.delete_counterparty(id).await?;
        self.notify(ChangeEvent::new(
            Collection::Counterparties,
            id,
            ChangeKind::Deleted,
        ));
        Ok(())
    }

    async fn get_counterparty(&self, id: CounterpartyId) -> StoreResult<Option<Counterparty>> {
        self.store.get_counterparty(id).await
    }

    async fn list_counterparties(&self) -> StoreResult<Vec<Counterparty>> {
        self.store.list_counterparties().await
    }

    async fn count_counterparties(&self) -> StoreResult<u64> {
        self.store.count_counterparties().await
    }
}

#[async_trait]
impl<S, B> InvoiceRepository for PublishingStore<S, B>
where
    S: InvoiceRepository,
    B: EventBus<ChangeEvent>,
{
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.store.get_invoice(id).await
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.store.list_invoices().await
    }

    async fn count_invoices(&self) -> StoreResult<u64> {
        self.store.count_invoices().await
    }

    async fn invoice_no_exists(&self, invoice_no: &str) -> StoreResult<bool> {
        self.store.invoice_no_exists(invoice_no).await
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        self.store.total_revenue().await
    }
}

#[async_trait]
impl<S, B> FinalizationStore for PublishingStore<S, B>
where
    S: FinalizationStore,
    B: EventBus<ChangeEvent>,
{
    async fn commit_invoice(&self, invoice: &Invoice) -> StoreResult<FinalizationReceipt> {
        // 1) Commit (durable step)
        let receipt = self.store.commit_invoice(invoice).await?;

        // 2) Announce the invoice, then each touched item once per adjustment
        self.notify(ChangeEvent::new(
            Collection::Invoices,
            invoice.id_typed(),
            ChangeKind::Created,
        ));
        for applied in &receipt.applied {
            self.notify(ChangeEvent::new(
                Collection::CatalogItems,
                applied.item_id,
                ChangeKind::Updated,
            ));
        }

        Ok(receipt)
    }
}
