//! End-to-end billing flows through the application services.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pharmabill_app::{
    BillingService, CatalogService, CounterpartyService, DashboardService, ServiceError,
};
use pharmabill_catalog::{CatalogItem, CatalogItemDetails};
use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_events::{ChangeEvent, ChangeFilter, ChangeKind, Collection, InMemoryEventBus};
use pharmabill_infra::{
    CatalogRepository, CounterpartyRepository, FinalizationReceipt, FinalizationStore,
    InMemoryStore, InvoiceRepository, PublishingStore, StoreError, StoreResult,
};
use pharmabill_invoicing::{Invoice, LineEdit, generate_invoice_number};
use pharmabill_parties::{Counterparty, CounterpartyDetails};

type Store = PublishingStore<InMemoryStore, Arc<InMemoryEventBus<ChangeEvent>>>;

fn store() -> Arc<Store> {
    Arc::new(PublishingStore::new(
        InMemoryStore::new(),
        Arc::new(InMemoryEventBus::new()),
    ))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 3).unwrap()
}

fn medicine(name: &str, batch_no: &str, rate: Decimal, stock: i64) -> CatalogItemDetails {
    CatalogItemDetails {
        name: name.to_string(),
        packing: "10 Tabs".to_string(),
        batch_no: batch_no.to_string(),
        expiry: "12/26".to_string(),
        hsn: "3004".to_string(),
        manufacturer: "Micro Labs".to_string(),
        mrp: rate * dec!(1.25),
        rate,
        gst_percent: dec!(12),
        stock,
    }
}

fn chemist(name: &str) -> CounterpartyDetails {
    CounterpartyDetails {
        name: name.to_string(),
        address: "Shop 4, Station Road, Thane".to_string(),
        gstin: "27ABCDE1234F1Z5".to_string(),
        dl_no: "MH-TZ5-123456".to_string(),
        mobile: "9876543210".to_string(),
        ..CounterpartyDetails::default()
    }
}

#[tokio::test]
async fn finalizing_decrements_stock_by_billed_and_free_units() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let parties = CounterpartyService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());

    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(100), 10))
        .await
        .unwrap();
    let party = parties.create(chemist("Shree Medical")).await.unwrap();

    let mut draft = billing.new_draft(date()).await.unwrap();
    billing
        .select_counterparty(&mut draft, party.id_typed())
        .await
        .unwrap();
    let line = billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    draft.update_line(line, LineEdit::Qty(2)).unwrap();
    draft.update_line(line, LineEdit::FreeQty(1)).unwrap();

    let invoice = billing.finalize(&draft).await.unwrap();

    assert_eq!(invoice.totals().sub_total, dec!(200));
    assert_eq!(invoice.totals().total_gst, dec!(24));
    assert_eq!(invoice.totals().grand_total, dec!(224));
    assert_eq!(invoice.counterparty_name(), "Shree Medical");

    let after = catalog.require(dolo.id_typed()).await.unwrap();
    assert_eq!(after.stock(), 7);

    let history = billing.history("shree").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id_typed(), invoice.id_typed());
}

#[tokio::test]
async fn invalid_drafts_write_nothing() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());
    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(30), 10))
        .await
        .unwrap();

    let mut draft = billing.new_draft(date()).await.unwrap();
    billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();

    let err = billing.finalize(&draft).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(err.is_user_error());

    assert_eq!(store.count_invoices().await.unwrap(), 0);
    assert_eq!(catalog.require(dolo.id_typed()).await.unwrap().stock(), 10);
}

#[tokio::test]
async fn unknown_references_are_not_found() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());
    let mut draft = billing.new_draft(date()).await.unwrap();

    let err = billing
        .add_item_to_draft(&mut draft, CatalogItemId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = billing
        .select_counterparty(&mut draft, CounterpartyId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = catalog
        .update(CatalogItemId::new(), medicine("Crocin", "CR1", dec!(20), 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = billing.document(InvoiceId::new()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

/// Delegates everything to an in-memory store but refuses to finalize.
struct RejectingStore {
    inner: InMemoryStore,
}

#[async_trait]
impl CatalogRepository for RejectingStore {
    async fn insert_item(&self, item: &CatalogItem) -> StoreResult<()> {
        self.inner.insert_item(item).await
    }

    async fn update_item(&self, item: &CatalogItem) -> StoreResult<()> {
        self.inner.update_item(item).await
    }

    async fn delete_item(&self, id: CatalogItemId) -> StoreResult<()> {
        self.inner.delete_item(id).await
    }

    async fn get_item(&self, id: CatalogItemId) -> StoreResult<Option<CatalogItem>> {
        self.inner.get_item(id).await
    }

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        self.inner.list_items().await
    }

    async fn count_items(&self) -> StoreResult<u64> {
        self.inner.count_items().await
    }
}

#[async_trait]
impl CounterpartyRepository for RejectingStore {
    async fn insert_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        self.inner.insert_counterparty(counterparty).await
    }

    async fn update_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        self.inner.update_counterparty(counterparty).await
    }

    async fn delete_counterparty(&self, id: CounterpartyId) -> StoreResult<()> {
        self.inner.delete_counterparty(id).await
    }

    async fn get_counterparty(&self, id: CounterpartyId) -> StoreResult<Option<Counterparty>> {
        self.inner.get_counterparty(id).await
    }

    async fn list_counterparties(&self) -> StoreResult<Vec<Counterparty>> {
        self.inner.list_counterparties().await
    }

    async fn count_counterparties(&self) -> StoreResult<u64> {
        self.inner.count_counterparties().await
    }
}

#[async_trait]
impl InvoiceRepository for RejectingStore {
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.inner.get_invoice(id).await
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.inner.list_invoices().await
    }

    async fn count_invoices(&self) -> StoreResult<u64> {
        self.inner.count_invoices().await
    }

    async fn invoice_no_exists(&self, invoice_no: &str) -> StoreResult<bool> {
        self.inner.invoice_no_exists(invoice_no).await
    }
}

#[async_trait]
impl FinalizationStore for RejectingStore {
    async fn commit_invoice(&self, _invoice: &Invoice) -> StoreResult<FinalizationReceipt> {
        Err(StoreError::Backend("database is locked".to_string()))
    }
}

#[tokio::test]
async fn failed_save_leaves_stock_and_draft_untouched() {
    let store = Arc::new(RejectingStore {
        inner: InMemoryStore::new(),
    });
    let catalog = CatalogService::new(Arc::clone(&store));
    let parties = CounterpartyService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());

    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(30), 10))
        .await
        .unwrap();
    let party = parties.create(chemist("Shree Medical")).await.unwrap();

    let mut draft = billing.new_draft(date()).await.unwrap();
    billing
        .select_counterparty(&mut draft, party.id_typed())
        .await
        .unwrap();
    billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    let before = draft.clone();

    let err = billing.finalize(&draft).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));
    assert!(!err.is_user_error());

    assert_eq!(draft, before);
    assert_eq!(store.count_invoices().await.unwrap(), 0);
    assert_eq!(catalog.require(dolo.id_typed()).await.unwrap().stock(), 10);
}

#[tokio::test]
async fn subscribers_see_each_committed_change() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let parties = CounterpartyService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());

    let stock_changes = store.subscribe(
        ChangeFilter::collection(Collection::CatalogItems).with_kind(ChangeKind::Updated),
    );
    let invoices = store.subscribe(ChangeFilter::collection(Collection::Invoices));

    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(30), 10))
        .await
        .unwrap();
    let party = parties.create(chemist("Shree Medical")).await.unwrap();

    let mut draft = billing.new_draft(date()).await.unwrap();
    draft.select_counterparty(party);
    billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    let invoice = billing.finalize(&draft).await.unwrap();

    let stock_events = stock_changes.drain();
    assert_eq!(stock_events.len(), 2);
    assert!(
        stock_events
            .iter()
            .all(|e| e.record_id == *dolo.id_typed().as_uuid())
    );

    let invoice_events = invoices.drain();
    assert_eq!(invoice_events.len(), 1);
    assert_eq!(invoice_events[0].record_id, *invoice.id_typed().as_uuid());

    // The same item on two lines is decremented twice.
    assert_eq!(catalog.require(dolo.id_typed()).await.unwrap().stock(), 8);
}

#[tokio::test]
async fn searches_are_ordered_by_name_ignoring_case() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));

    for (name, batch) in [
        ("paracetamol 500", "PC01"),
        ("Azithral 500", "AZ77"),
        ("Dolo 650", "DL2301"),
        ("Pan 40", "PN40"),
    ] {
        catalog
            .create(medicine(name, batch, dec!(10), 5))
            .await
            .unwrap();
    }

    let names: Vec<String> = catalog
        .search("")
        .await
        .unwrap()
        .iter()
        .map(|i| i.name().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Azithral 500", "Dolo 650", "Pan 40", "paracetamol 500"]
    );

    let by_batch = catalog.search("dl23").await.unwrap();
    assert_eq!(by_batch.len(), 1);
    assert_eq!(by_batch[0].name(), "Dolo 650");

    let picked: Vec<String> = catalog
        .pick("pa")
        .await
        .unwrap()
        .iter()
        .map(|i| i.name().to_string())
        .collect();
    assert_eq!(picked, vec!["Pan 40", "paracetamol 500"]);
    assert!(catalog.pick("").await.unwrap().is_empty());
}

#[tokio::test]
async fn invoice_number_skips_numbers_already_used() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let parties = CounterpartyService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());

    let taken = generate_invoice_number(date(), &mut StdRng::seed_from_u64(7));

    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(30), 10))
        .await
        .unwrap();
    let party = parties.create(chemist("Shree Medical")).await.unwrap();
    let mut draft = billing.new_draft(date()).await.unwrap();
    draft.set_invoice_no(taken.clone());
    draft.select_counterparty(party);
    billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    billing.finalize(&draft).await.unwrap();

    let next = billing
        .next_invoice_number_with(date(), &mut StdRng::seed_from_u64(7))
        .await
        .unwrap();
    assert_ne!(next, taken);
    assert!(next.starts_with("INV-2509-"));
}

#[tokio::test]
async fn document_falls_back_to_stored_name_after_counterparty_is_deleted() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let parties = CounterpartyService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());

    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(30), 10))
        .await
        .unwrap();
    let party = parties.create(chemist("Shree Medical")).await.unwrap();

    let mut draft = billing.new_draft(date()).await.unwrap();
    draft.select_counterparty(party.clone());
    billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    let invoice = billing.finalize(&draft).await.unwrap();

    let live = billing.document(invoice.id_typed()).await.unwrap();
    assert_eq!(live.billed_to.gstin, "27ABCDE1234F1Z5");
    assert_eq!(live.date, "03/09/2025");

    parties.delete(party.id_typed()).await.unwrap();
    let orphaned = billing.document(invoice.id_typed()).await.unwrap();
    assert_eq!(orphaned.billed_to.name, "Shree Medical");
    assert!(orphaned.billed_to.gstin.is_empty());
}

#[tokio::test]
async fn dashboard_counts_everything() {
    let store = store();
    let catalog = CatalogService::new(Arc::clone(&store));
    let parties = CounterpartyService::new(Arc::clone(&store));
    let billing = BillingService::new(Arc::clone(&store), Default::default());
    let dashboard = DashboardService::new(Arc::clone(&store));

    let dolo = catalog
        .create(medicine("Dolo 650", "DL2301", dec!(100), 12))
        .await
        .unwrap();
    catalog
        .create(medicine("Pan 40", "PN40", dec!(50), 3))
        .await
        .unwrap();
    let party = parties.create(chemist("Shree Medical")).await.unwrap();

    let mut draft = billing.new_draft(date()).await.unwrap();
    draft.select_counterparty(party);
    let line = billing
        .add_item_to_draft(&mut draft, dolo.id_typed())
        .await
        .unwrap();
    draft.update_line(line, LineEdit::Qty(3)).unwrap();
    billing.finalize(&draft).await.unwrap();

    let summary = dashboard.summary(10).await.unwrap();
    assert_eq!(summary.item_count, 2);
    assert_eq!(summary.counterparty_count, 1);
    assert_eq!(summary.invoice_count, 1);
    // Dolo is down to 9 and Pan was already at 3.
    assert_eq!(summary.low_stock_count, 2);
    assert_eq!(summary.total_revenue, dec!(336));
}
