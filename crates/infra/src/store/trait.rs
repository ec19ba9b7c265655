use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use pharmabill_catalog::CatalogItem;
use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_invoicing::Invoice;
use pharmabill_parties::Counterparty;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// These are **infrastructure errors** (missing rows, backend failures, bad
/// payloads) as opposed to domain errors (validation, invariants). Domain
/// validation always happens before a record reaches the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: Uuid },

    #[error("{collection} record already exists: {id}")]
    AlreadyExists { collection: &'static str, id: Uuid },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn already_exists(collection: &'static str, id: impl Into<Uuid>) -> Self {
        Self::AlreadyExists {
            collection,
            id: id.into(),
        }
    }
}

/// Catalog items table.
///
/// Listings are ordered by name (case-insensitive). Search and picker
/// filtering have default implementations in terms of `list_items`, so every
/// backend applies the same matching rules as [`CatalogItem::matches_search`].
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fails with `AlreadyExists` if the id is taken.
    async fn insert_item(&self, item: &CatalogItem) -> StoreResult<()>;

    /// Replace a stored item. Fails with `NotFound` if it does not exist.
    async fn update_item(&self, item: &CatalogItem) -> StoreResult<()>;

    /// Fails with `NotFound` if it does not exist.
    async fn delete_item(&self, id: CatalogItemId) -> StoreResult<()>;

    async fn get_item(&self, id: CatalogItemId) -> StoreResult<Option<CatalogItem>>;

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>>;

    async fn count_items(&self) -> StoreResult<u64>;

    /// Items whose stock is strictly below `threshold`.
    async fn count_low_stock(&self, threshold: i64) -> StoreResult<u64> {
        let items = self.list_items().await?;
        Ok(items.iter().filter(|i| i.is_low_stock(threshold)).count() as u64)
    }

    async fn search_items(&self, query: &str) -> StoreResult<Vec<CatalogItem>> {
        let query = query.trim();
        let mut items = self.list_items().await?;
        items.retain(|item| item.matches_search(query));
        Ok(items)
    }

    /// Billing picker: name matches only, at most `limit`; empty query yields nothing.
    async fn pick_items(&self, query: &str, limit: usize) -> StoreResult<Vec<CatalogItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let items = self.list_items().await?;
        Ok(items
            .into_iter()
            .filter(|item| item.matches_picker(query))
            .take(limit)
            .collect())
    }
}

/// Counterparties table. Listings are ordered by name (case-insensitive).
#[async_trait]
pub trait CounterpartyRepository: Send + Sync {
    async fn insert_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()>;

    async fn update_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()>;

    async fn delete_counterparty(&self, id: CounterpartyId) -> StoreResult<()>;

    async fn get_counterparty(&self, id: CounterpartyId) -> StoreResult<Option<Counterparty>>;

    async fn list_counterparties(&self) -> StoreResult<Vec<Counterparty>>;

    async fn count_counterparties(&self) -> StoreResult<u64>;

    async fn search_counterparties(&self, query: &str) -> StoreResult<Vec<Counterparty>> {
        let query = query.trim();
        let mut parties = self.list_counterparties().await?;
        parties.retain(|p| p.matches_search(query));
        Ok(parties)
    }
}

/// Invoices table (read side). Invoices are only ever written through
/// [`FinalizationStore::commit_invoice`].
///
/// Listings are ordered newest first: invoice date descending, then creation
/// time descending.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>>;

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>>;

    async fn count_invoices(&self) -> StoreResult<u64>;

    /// Whether any stored invoice carries `invoice_no`.
    async fn invoice_no_exists(&self, invoice_no: &str) -> StoreResult<bool>;

    async fn search_invoices(&self, query: &str) -> StoreResult<Vec<Invoice>> {
        let query = query.trim();
        let mut invoices = self.list_invoices().await?;
        invoices.retain(|inv| inv.matches_search(query));
        Ok(invoices)
    }

    /// Σ grand totals over every invoice.
    async fn total_revenue(&self) -> StoreResult<Decimal> {
        let invoices = self.list_invoices().await?;
        Ok(invoices.iter().map(|inv| inv.totals().grand_total).sum())
    }
}

/// Stock change applied while finalizing an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedAdjustment {
    pub item_id: CatalogItemId,
    pub delta: i64,
    /// On-hand stock after the change. May be negative.
    pub stock_after: i64,
}

/// Outcome of a committed finalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizationReceipt {
    /// One entry per invoice line whose item still exists, in line order.
    pub applied: Vec<AppliedAdjustment>,
    /// Items on the invoice that no longer exist in the catalog.
    pub skipped: Vec<CatalogItemId>,
}

impl FinalizationReceipt {
    pub fn negative_stock(&self) -> impl Iterator<Item = &AppliedAdjustment> {
        self.applied.iter().filter(|a| a.stock_after < 0)
    }
}

/// Atomic invoice finalization.
///
/// Implementations must persist the invoice and apply every one of its
/// [`Invoice::stock_adjustments`] as a single unit: either the invoice is
/// stored and all adjustments for existing items are applied, or nothing
/// changes. Adjustments for items missing from the catalog are skipped and
/// reported in the receipt.
#[async_trait]
pub trait FinalizationStore: Send + Sync {
    async fn commit_invoice(&self, invoice: &Invoice) -> StoreResult<FinalizationReceipt>;
}

/// Everything the billing services need from storage.
pub trait BillingStore:
    CatalogRepository + CounterpartyRepository + InvoiceRepository + FinalizationStore
{
}

impl<S> BillingStore for S where
    S: CatalogRepository + CounterpartyRepository + InvoiceRepository + FinalizationStore
{
}

pub(crate) fn name_order(name: &str) -> String {
    name.to_lowercase()
}

pub(crate) fn sort_items(items: &mut [CatalogItem]) {
    items.sort_by_cached_key(|i| (name_order(i.name()), i.id_typed()));
}

pub(crate) fn sort_counterparties(parties: &mut [Counterparty]) {
    parties.sort_by_cached_key(|p| (name_order(p.name()), p.id_typed()));
}

pub(crate) fn sort_invoices(invoices: &mut [Invoice]) {
    invoices.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| b.created_at().cmp(&a.created_at()))
    });
}
