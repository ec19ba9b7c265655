//! Invoicing domain module.
//!
//! GST line arithmetic, invoice aggregation, the editable invoice draft and
//! the printable invoice document. Pure domain logic: no IO, no storage.

pub mod calculator;
pub mod document;
pub mod draft;
pub mod invoice;
pub mod line;
pub mod number;
pub mod totals;

pub use calculator::{LineTotals, calculate_item_totals};
pub use document::{BilledTo, DocumentLine, InvoiceDocument, IssuerProfile, TERMS_AND_CONDITIONS};
pub use draft::{InvoiceDraft, LineEdit};
pub use invoice::{Invoice, StockAdjustment};
pub use line::InvoiceLine;
pub use number::{INVOICE_NUMBER_PREFIX, generate_invoice_number, is_well_formed_invoice_number};
pub use totals::InvoiceTotals;
