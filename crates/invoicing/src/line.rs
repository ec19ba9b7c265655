use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmabill_catalog::{CatalogItem, CatalogItemDetails, MAX_LINE_QTY, MAX_RATE};
use pharmabill_core::error::require_range;
use pharmabill_core::{CatalogItemId, DomainError, DomainResult};

use crate::calculator::{LineTotals, calculate_item_totals};

/// One line of an invoice: a snapshot of the catalog item at the time it was
/// billed, the billed quantities and the derived amounts.
///
/// Fields are private so the derived amounts can only change through the
/// setters, which recompute them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    item_id: CatalogItemId,
    item: CatalogItemDetails,
    qty: i64,
    free_qty: i64,
    discount_percent: Decimal,
    totals: LineTotals,
}

impl InvoiceLine {
    /// New line for `item`: qty 1, no free units, no discount.
    pub fn new(item: &CatalogItem) -> Self {
        let mut line = Self {
            item_id: item.id_typed(),
            item: item.details().clone(),
            qty: 1,
            free_qty: 0,
            discount_percent: Decimal::ZERO,
            totals: LineTotals::default(),
        };
        line.recompute();
        line
    }

    pub fn item_id(&self) -> CatalogItemId {
        self.item_id
    }

    /// Catalog fields as they were when the line was added.
    pub fn item(&self) -> &CatalogItemDetails {
        &self.item
    }

    pub fn qty(&self) -> i64 {
        self.qty
    }

    pub fn free_qty(&self) -> i64 {
        self.free_qty
    }

    pub fn rate(&self) -> Decimal {
        self.item.rate
    }

    pub fn gst_percent(&self) -> Decimal {
        self.item.gst_percent
    }

    pub fn discount_percent(&self) -> Decimal {
        self.discount_percent
    }

    pub fn totals(&self) -> &LineTotals {
        &self.totals
    }

    pub fn taxable_value(&self) -> Decimal {
        self.totals.taxable_value
    }

    pub fn gst_amount(&self) -> Decimal {
        self.totals.gst_amount
    }

    pub fn total_amount(&self) -> Decimal {
        self.totals.total_amount
    }

    /// Units leaving the shelf for this line (billed + free).
    pub fn units_out(&self) -> i64 {
        self.qty.saturating_add(self.free_qty)
    }

    pub fn set_qty(&mut self, qty: i64) -> DomainResult<()> {
        check_qty(qty)?;
        self.qty = qty;
        self.recompute();
        Ok(())
    }

    pub fn set_free_qty(&mut self, free_qty: i64) -> DomainResult<()> {
        check_free_qty(free_qty)?;
        self.free_qty = free_qty;
        self.recompute();
        Ok(())
    }

    pub fn set_rate(&mut self, rate: Decimal) -> DomainResult<()> {
        check_rate(rate)?;
        self.item.rate = rate;
        self.recompute();
        Ok(())
    }

    pub fn set_gst_percent(&mut self, gst_percent: Decimal) -> DomainResult<()> {
        check_percent("gst_percent", gst_percent)?;
        self.item.gst_percent = gst_percent;
        self.recompute();
        Ok(())
    }

    pub fn set_discount_percent(&mut self, discount_percent: Decimal) -> DomainResult<()> {
        check_percent("discount_percent", discount_percent)?;
        self.discount_percent = discount_percent;
        self.recompute();
        Ok(())
    }

    /// Check the line against the editing bounds (used for lines that were
    /// deserialized rather than edited through the setters).
    pub fn validate(&self) -> DomainResult<()> {
        check_qty(self.qty)?;
        check_free_qty(self.free_qty)?;
        check_rate(self.item.rate)?;
        check_percent("gst_percent", self.item.gst_percent)?;
        check_percent("discount_percent", self.discount_percent)?;
        if self.totals != self.expected_totals() {
            return Err(DomainError::invariant("line totals are stale"));
        }
        Ok(())
    }

    fn expected_totals(&self) -> LineTotals {
        calculate_item_totals(
            self.item.rate,
            self.qty,
            self.item.gst_percent,
            self.discount_percent,
        )
    }

    fn recompute(&mut self) {
        self.totals = self.expected_totals();
    }
}

fn check_qty(qty: i64) -> DomainResult<()> {
    require_range("qty", qty, 1, MAX_LINE_QTY)
}

fn check_free_qty(free_qty: i64) -> DomainResult<()> {
    require_range("free_qty", free_qty, 0, MAX_LINE_QTY)
}

fn check_rate(rate: Decimal) -> DomainResult<()> {
    require_range("rate", rate, Decimal::ZERO, MAX_RATE)
}

fn check_percent(field: &str, value: Decimal) -> DomainResult<()> {
    require_range(field, value, Decimal::ZERO, Decimal::ONE_HUNDRED)
}
