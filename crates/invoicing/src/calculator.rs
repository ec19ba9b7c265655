//! Line-item GST calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmabill_core::money::{percent_of, round2};

/// Derived monetary fields of one invoice line, each rounded to paise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub taxable_value: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

/// Compute taxable value, GST and line total.
///
/// ```text
/// base     = rate * qty
/// taxable  = round2(base - base * discount% / 100)
/// gst      = round2(taxable * gst% / 100)
/// total    = round2(taxable + gst)
/// ```
///
/// GST is charged on the rounded taxable value so the stored fields satisfy
/// `gst = round2(taxable * gst% / 100)` exactly. Inputs are not validated here;
/// bounds are enforced where lines are edited. Amounts beyond the `Decimal`
/// range saturate instead of panicking.
pub fn calculate_item_totals(
    rate: Decimal,
    qty: i64,
    gst_percent: Decimal,
    discount_percent: Decimal,
) -> LineTotals {
    let base_amount = rate.saturating_mul(Decimal::from(qty));
    let discount_amount = percent_of(base_amount, discount_percent);
    let taxable_value = round2(base_amount.saturating_sub(discount_amount));
    let gst_amount = round2(percent_of(taxable_value, gst_percent));
    let total_amount = round2(taxable_value.saturating_add(gst_amount));

    LineTotals {
        taxable_value,
        gst_amount,
        total_amount,
    }
}
