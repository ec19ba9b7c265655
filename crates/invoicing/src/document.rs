//! Printable invoice document.
//!
//! [`InvoiceDocument`] is the fully formatted content of a printed invoice:
//! every amount is already a display string. Layout engines (HTML, PDF, a
//! terminal) consume it; [`InvoiceDocument::render_text`] is the plain-text
//! rendering.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmabill_core::money::{format_amount, format_inr};
use pharmabill_parties::{Counterparty, Region};

use crate::invoice::Invoice;
use crate::line::InvoiceLine;

/// Fixed terms printed under every invoice.
pub const TERMS_AND_CONDITIONS: [&str; 3] = [
    "Goods once sold will not be taken back.",
    "Interest @ 18% p.a. will be charged if bill is not paid within due date.",
    "Subject to local jurisdiction.",
];

const EMPTY_CELL: &str = "-";

/// The issuing business, printed in the invoice header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerProfile {
    pub name: String,
    pub tagline: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Drug licence numbers, printed comma-separated.
    pub dl_nos: Vec<String>,
    pub gstin: String,
    pub region: Region,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        Self {
            name: "Pharma Distributors".to_string(),
            tagline: "Wholesale Chemist & Druggist".to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            dl_nos: Vec::new(),
            gstin: String::new(),
            region: Region::default(),
        }
    }
}

/// The "Billed To" block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilledTo {
    pub name: String,
    pub address: String,
    pub gstin: String,
    pub dl_no: String,
}

impl BilledTo {
    /// Uses the live counterparty record when available, otherwise only the
    /// name stored on the invoice.
    fn resolve(invoice: &Invoice, counterparty: Option<&Counterparty>) -> Self {
        match counterparty {
            Some(party) => {
                let details = party.details();
                Self {
                    name: details.name.clone(),
                    address: details.address.clone(),
                    gstin: details.gstin.clone(),
                    dl_no: details.dl_no.clone(),
                }
            }
            None => Self {
                name: invoice.counterparty_name().to_string(),
                address: String::new(),
                gstin: String::new(),
                dl_no: String::new(),
            },
        }
    }
}

/// One row of the item table, formatted for print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub serial: usize,
    pub name: String,
    pub hsn: String,
    pub batch_no: String,
    pub expiry: String,
    pub qty: String,
    pub free_qty: String,
    pub mrp: String,
    pub rate: String,
    pub discount_percent: String,
    pub gst_percent: String,
    pub taxable_value: String,
    pub amount: String,
}

impl DocumentLine {
    fn from_line(serial: usize, line: &InvoiceLine) -> Self {
        let item = line.item();
        Self {
            serial,
            name: item.name.clone(),
            hsn: item.hsn.clone(),
            batch_no: item.batch_no.clone(),
            expiry: item.expiry.clone(),
            qty: line.qty().to_string(),
            free_qty: if line.free_qty() > 0 {
                line.free_qty().to_string()
            } else {
                EMPTY_CELL.to_string()
            },
            mrp: format_amount(item.mrp),
            rate: format_amount(line.rate()),
            discount_percent: if line.discount_percent() > Decimal::ZERO {
                format_percent(line.discount_percent())
            } else {
                EMPTY_CELL.to_string()
            },
            gst_percent: format_percent(line.gst_percent()),
            taxable_value: format_amount(line.taxable_value()),
            amount: format_amount(line.total_amount()),
        }
    }
}

/// Formatted content of a printed invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub issuer: IssuerProfile,
    pub billed_to: BilledTo,
    pub invoice_no: String,
    /// `DD/MM/YYYY`.
    pub date: String,
    /// Place of supply, e.g. `Maharashtra (27)`.
    pub region: String,
    pub lines: Vec<DocumentLine>,
    pub sub_total: String,
    pub total_gst: String,
    pub round_off: String,
    /// INR with Indian digit grouping, e.g. `₹1,23,456.00`.
    pub grand_total: String,
    pub terms: Vec<String>,
}

impl InvoiceDocument {
    pub fn build(
        invoice: &Invoice,
        counterparty: Option<&Counterparty>,
        issuer: &IssuerProfile,
    ) -> Self {
        let totals = invoice.totals();
        Self {
            issuer: issuer.clone(),
            billed_to: BilledTo::resolve(invoice, counterparty),
            invoice_no: invoice.invoice_no().to_string(),
            date: invoice.date().format("%d/%m/%Y").to_string(),
            region: issuer.region.to_string(),
            lines: invoice
                .lines()
                .iter()
                .enumerate()
                .map(|(i, line)| DocumentLine::from_line(i + 1, line))
                .collect(),
            sub_total: format_amount(totals.sub_total),
            total_gst: format_amount(totals.total_gst),
            round_off: format_amount(totals.round_off),
            grand_total: format_inr(totals.grand_total),
            terms: TERMS_AND_CONDITIONS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Plain-text rendering of the whole document.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InvoiceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issuer = &self.issuer;
        let rule = "=".repeat(132);

        writeln!(f, "{}", issuer.name.to_uppercase())?;
        writeln!(f, "{}", issuer.tagline)?;
        if !issuer.address.is_empty() {
            writeln!(f, "{}", issuer.address)?;
        }
        writeln!(f, "Mob: {} | Email: {}", issuer.phone, issuer.email)?;
        writeln!(
            f,
            "DL No: {} | GSTIN: {}",
            issuer.dl_nos.join(", "),
            issuer.gstin
        )?;
        writeln!(f, "{rule}")?;

        let billed = &self.billed_to;
        writeln!(f, "Billed To: {:<60} Invoice No: {}", billed.name, self.invoice_no)?;
        writeln!(f, "           {:<60} Date: {}", billed.address, self.date)?;
        writeln!(f, "GSTIN: {:<64} State: {}", billed.gstin, self.region)?;
        writeln!(f, "DL No: {}", billed.dl_no)?;
        writeln!(f, "{rule}")?;

        writeln!(
            f,
            "{:>3} {:<28} {:<9} {:<10} {:<10} {:>5} {:>5} {:>9} {:>9} {:>6} {:>5} {:>11} {:>11}",
            "#", "Product Name", "HSN", "Batch", "Exp", "Qty", "Free", "MRP", "Rate", "Disc%",
            "GST%", "Taxable", "Amount"
        )?;
        for line in &self.lines {
            writeln!(
                f,
                "{:>3} {:<28} {:<9} {:<10} {:<10} {:>5} {:>5} {:>9} {:>9} {:>6} {:>5} {:>11} {:>11}",
                line.serial,
                line.name,
                line.hsn,
                line.batch_no,
                line.expiry,
                line.qty,
                line.free_qty,
                line.mrp,
                line.rate,
                line.discount_percent,
                line.gst_percent,
                line.taxable_value,
                line.amount
            )?;
        }
        writeln!(f, "{rule}")?;

        writeln!(f, "{:>118} {:>13}", "Sub Total:", self.sub_total)?;
        writeln!(f, "{:>118} {:>13}", "Total GST:", self.total_gst)?;
        writeln!(f, "{:>118} {:>13}", "Round Off:", self.round_off)?;
        writeln!(f, "{:>118} {:>13}", "Grand Total:", self.grand_total)?;

        writeln!(f, "Terms & Conditions:")?;
        for term in &self.terms {
            writeln!(f, "  * {term}")?;
        }
        writeln!(f)?;
        writeln!(f, "{:<100} For {}", "", issuer.name)?;
        write!(f, "{:<100} {}", "Receiver's Signature", "Authorized Signatory")
    }
}

/// `12` -> `"12"`, `7.50` -> `"7.5"`.
fn format_percent(value: Decimal) -> String {
    value.normalize().to_string()
}
