use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmabill_core::{CatalogItemId, CounterpartyId, Entity, InvoiceId};

use crate::line::InvoiceLine;
use crate::totals::InvoiceTotals;

/// Stock movement implied by a finalized invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub item_id: CatalogItemId,
    /// Signed change to on-hand stock (negative for a sale).
    pub delta: i64,
}

/// A finalized invoice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    invoice_no: String,
    date: NaiveDate,
    counterparty_id: CounterpartyId,
    /// Counterparty name at the time of billing.
    counterparty_name: String,
    lines: Vec<InvoiceLine>,
    totals: InvoiceTotals,
    created_at: DateTime<Utc>,
}

impl Invoice {
    pub(crate) fn new(
        id: InvoiceId,
        invoice_no: String,
        date: NaiveDate,
        counterparty_id: CounterpartyId,
        counterparty_name: String,
        lines: Vec<InvoiceLine>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let totals = InvoiceTotals::from_lines(&lines);
        Self {
            id,
            invoice_no,
            date,
            counterparty_id,
            counterparty_name,
            lines,
            totals,
            created_at,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_no(&self) -> &str {
        &self.invoice_no
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn counterparty_id(&self) -> CounterpartyId {
        self.counterparty_id
    }

    pub fn counterparty_name(&self) -> &str {
        &self.counterparty_name
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn totals(&self) -> &InvoiceTotals {
        &self.totals
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// One decrement of `qty + free_qty` per line, in line order.
    ///
    /// An item billed on two lines yields two adjustments.
    pub fn stock_adjustments(&self) -> Vec<StockAdjustment> {
        self.lines
            .iter()
            .map(|line| StockAdjustment {
                item_id: line.item_id(),
                delta: line.units_out().saturating_neg(),
            })
            .collect()
    }

    /// History search: invoice number or counterparty name, case-insensitive.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let lower = query.to_lowercase();
        self.invoice_no.to_lowercase().contains(&lower)
            || self.counterparty_name.to_lowercase().contains(&lower)
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
