//! Infrastructure layer: record storage and change notification wiring.

pub mod store;

pub use store::{
    AppliedAdjustment, BillingStore, CatalogRepository, CounterpartyRepository,
    FinalizationReceipt, FinalizationStore, InMemoryStore, InvoiceRepository, PublishingStore,
    SqliteStore, StoreError, StoreResult,
};
