use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmabill_catalog::CatalogItem;
use pharmabill_core::error::require_text;
use pharmabill_core::{DomainError, DomainResult, InvoiceId};
use pharmabill_parties::Counterparty;

use crate::invoice::Invoice;
use crate::line::InvoiceLine;
use crate::totals::InvoiceTotals;

/// A single field edit on a draft line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEdit {
    Qty(i64),
    FreeQty(i64),
    Rate(Decimal),
    GstPercent(Decimal),
    DiscountPercent(Decimal),
}

/// The invoice being composed on the billing screen.
///
/// Lines are edited in place; each edit recomputes that line's amounts, and
/// [`InvoiceDraft::totals`] always reflects the current lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    invoice_no: String,
    date: NaiveDate,
    counterparty: Option<Counterparty>,
    lines: Vec<InvoiceLine>,
}

impl InvoiceDraft {
    pub fn new(invoice_no: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            invoice_no: invoice_no.into(),
            date,
            counterparty: None,
            lines: Vec::new(),
        }
    }

    pub fn invoice_no(&self) -> &str {
        &self.invoice_no
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn counterparty(&self) -> Option<&Counterparty> {
        self.counterparty.as_ref()
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::from_lines(&self.lines)
    }

    pub fn set_invoice_no(&mut self, invoice_no: impl Into<String>) {
        self.invoice_no = invoice_no.into();
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn select_counterparty(&mut self, counterparty: Counterparty) {
        self.counterparty = Some(counterparty);
    }

    pub fn clear_counterparty(&mut self) {
        self.counterparty = None;
    }

    /// Append `item` as a new line (qty 1) and return its index.
    ///
    /// Adding an item that is already on the draft appends a second line.
    pub fn add_item(&mut self, item: &CatalogItem) -> usize {
        self.lines.push(InvoiceLine::new(item));
        self.lines.len() - 1
    }

    pub fn update_line(&mut self, index: usize, edit: LineEdit) -> DomainResult<()> {
        let line = self.line_mut(index)?;
        match edit {
            LineEdit::Qty(qty) => line.set_qty(qty),
            LineEdit::FreeQty(free_qty) => line.set_free_qty(free_qty),
            LineEdit::Rate(rate) => line.set_rate(rate),
            LineEdit::GstPercent(gst) => line.set_gst_percent(gst),
            LineEdit::DiscountPercent(discount) => line.set_discount_percent(discount),
        }
    }

    pub fn remove_line(&mut self, index: usize) -> DomainResult<InvoiceLine> {
        if index >= self.lines.len() {
            return Err(no_line(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Turn the draft into an invoice.
    ///
    /// Requires a selected counterparty, an invoice number and at least one
    /// line. The draft itself is not consumed so a failed save can be retried.
    pub fn finalize(&self, id: InvoiceId, created_at: DateTime<Utc>) -> DomainResult<Invoice> {
        let Some(counterparty) = &self.counterparty else {
            return Err(DomainError::validation("select a counterparty"));
        };
        if self.lines.is_empty() {
            return Err(DomainError::validation("add at least one item"));
        }
        require_text("invoice_no", &self.invoice_no)?;
        for line in &self.lines {
            line.validate()?;
        }

        Ok(Invoice::new(
            id,
            self.invoice_no.trim().to_string(),
            self.date,
            counterparty.id_typed(),
            counterparty.name().to_string(),
            self.lines.clone(),
            created_at,
        ))
    }

    fn line_mut(&mut self, index: usize) -> DomainResult<&mut InvoiceLine> {
        self.lines.get_mut(index).ok_or_else(|| no_line(index))
    }
}

fn no_line(index: usize) -> DomainError {
    DomainError::validation(format!("no line at index {index}"))
}
