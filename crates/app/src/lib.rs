//! Pharmacy wholesale billing application layer.
//!
//! Wires the domain crates to a store and exposes the services a front end
//! drives: catalog, counterparties, billing and the dashboard.

pub mod config;
pub mod errors;
pub mod services;

pub use config::{AppConfig, ConfigError, StoreBackend};
pub use errors::{ServiceError, ServiceResult};
pub use services::{
    BillingService, CatalogService, CounterpartyService, DashboardService, DashboardSummary,
};
