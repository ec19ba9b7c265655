//! Application services.
//!
//! Each service owns a shared handle to the store and turns form input into
//! validated domain records before anything is persisted. Services contain no
//! IO themselves; they compose the repository traits.

pub mod billing;
pub mod catalog;
pub mod counterparties;
pub mod dashboard;

pub use billing::BillingService;
pub use catalog::CatalogService;
pub use counterparties::CounterpartyService;
pub use dashboard::{DashboardService, DashboardSummary};
