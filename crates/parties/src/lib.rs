//! Counterparty (party / customer) directory domain module.
//!
//! Business rules for the trade entities invoices are billed to, implemented
//! as deterministic domain logic (no IO, no storage).

pub mod counterparty;
pub mod region;

pub use counterparty::{Counterparty, CounterpartyDetails};
pub use region::Region;
