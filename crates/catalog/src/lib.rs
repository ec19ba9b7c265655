//! Medicine catalog domain module.
//!
//! Business rules for catalog items (validation, search matching, stock
//! arithmetic), implemented as deterministic domain logic (no IO, no storage).

pub mod item;

pub use item::{
    CatalogItem, CatalogItemDetails, DEFAULT_GST_PERCENT, DEFAULT_LOW_STOCK_THRESHOLD,
    GST_RATE_SLABS, MAX_LINE_QTY, MAX_RATE, PICKER_RESULT_LIMIT,
};
