use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use pharmabill_catalog::CatalogItem;
use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_invoicing::Invoice;
use pharmabill_parties::Counterparty;

use super::r#trait::{
    AppliedAdjustment, CatalogRepository, CounterpartyRepository, FinalizationReceipt,
    FinalizationStore, InvoiceRepository, StoreError, StoreResult, sort_counterparties,
    sort_invoices, sort_items,
};
use super::{CATALOG_ITEMS, COUNTERPARTIES, INVOICES};

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<CatalogItemId, CatalogItem>,
    counterparties: HashMap<CounterpartyId, Counterparty>,
    invoices: HashMap<InvoiceId, Invoice>,
}

/// In-memory store.
///
/// Intended for tests/dev. All tables sit behind one lock, so a finalization
/// (invoice insert + stock decrements) is observed all at once or not at all.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn insert_item(&self, item: &CatalogItem) -> StoreResult<()> {
        let mut tables = self.write()?;
        let id = item.id_typed();
        if tables.items.contains_key(&id) {
            return Err(StoreError::already_exists(CATALOG_ITEMS, id));
        }
        tables.items.insert(id, item.clone());
        Ok(())
    }

    async fn update_item(&self, item: &CatalogItem) -> StoreResult<()> {
        let mut tables = self.write()?;
        let id = item.id_typed();
        let slot = tables
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(CATALOG_ITEMS, id))?;
        *slot = item.clone();
        Ok(())
    }

    async fn delete_item(&self, id: CatalogItemId) -> StoreResult<()> {
        self.write()?
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(CATALOG_ITEMS, id))
    }

    async fn get_item(&self, id: CatalogItemId) -> StoreResult<Option<CatalogItem>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        let mut items: Vec<CatalogItem> = self.read()?.items.values().cloned().collect();
        sort_items(&mut items);
        Ok(items)
    }

    async fn count_items(&self) -> StoreResult<u64> {
        Ok(self.read()?.items.len() as u64)
    }

    async fn count_low_stock(&self, threshold: i64) -> StoreResult<u64> {
        let tables = self.read()?;
        Ok(tables
            .items
            .values()
            .filter(|i| i.is_low_stock(threshold))
            .count() as u64)
    }
}

#[async_trait]
impl CounterpartyRepository for InMemoryStore {
    async fn insert_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        let mut tables = self.write()?;
        let id = counterparty.id_typed();
        if tables.counterparties.contains_key(&id) {
            return Err(StoreError::already_exists(COUNTERPARTIES, id));
        }
        tables.counterparties.insert(id, counterparty.clone());
        Ok(())
    }

    async fn update_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        let mut tables = self.write()?;
        let id = counterparty.id_typed();
        let slot = tables
            .counterparties
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(COUNTERPARTIES, id))?;
        *slot = counterparty.clone();
        Ok(())
    }

    async fn delete_counterparty(&self, id: CounterpartyId) -> StoreResult<()> {
        self.write()?
            .counterparties
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(COUNTERPARTIES, id))
    }

    async fn get_counterparty(&self, id: CounterpartyId) -> StoreResult<Option<Counterparty>> {
        Ok(self.read()?.counterparties.get(&id).cloned())
    }

    async fn list_counterparties(&self) -> StoreResult<Vec<Counterparty>> {
        let mut parties: Vec<Counterparty> =
            self.read()?.counterparties.values().cloned().collect();
        sort_counterparties(&mut parties);
        Ok(parties)
    }

    async fn count_counterparties(&self) -> StoreResult<u64> {
        Ok(self.read()?.counterparties.len() as u64)
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        Ok(self.read()?.invoices.get(&id).cloned())
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.read()?.invoices.values().cloned().collect();
        sort_invoices(&mut invoices);
        Ok(invoices)
    }

    async fn count_invoices(&self) -> StoreResult<u64> {
        Ok(self.read()?.invoices.len() as u64)
    }

    async fn invoice_no_exists(&self, invoice_no: &str) -> StoreResult<bool> {
        Ok(self
            .read()?
            .invoices
            .values()
            .any(|inv| inv.invoice_no() == invoice_no))
    }
}

#[async_trait]
impl FinalizationStore for InMemoryStore {
    async fn commit_invoice(&self, invoice: &Invoice) -> StoreResult<FinalizationReceipt> {
        let mut tables = self.write()?;

        let id = invoice.id_typed();
        if tables.invoices.contains_key(&id) {
            return Err(StoreError::already_exists(INVOICES, id));
        }

        // Nothing below can fail, so the write lock makes the whole unit atomic.
        let mut receipt = FinalizationReceipt::default();
        for adjustment in invoice.stock_adjustments() {
            match tables.items.get_mut(&adjustment.item_id) {
                Some(item) => receipt.applied.push(AppliedAdjustment {
                    item_id: adjustment.item_id,
                    delta: adjustment.delta,
                    stock_after: item.apply_stock_delta(adjustment.delta),
                }),
                None => receipt.skipped.push(adjustment.item_id),
            }
        }
        tables.invoices.insert(id, invoice.clone());

        Ok(receipt)
    }
}
