//! Invoice display numbers: `INV-YYMM-RRR`.

use chrono::{Datelike, NaiveDate};
use rand::Rng;

pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Largest random suffix (inclusive).
const MAX_SUFFIX: u32 = 999;

/// Generate a display number for an invoice dated `date`.
///
/// The suffix is random, so numbers are not guaranteed unique; callers that
/// care check against existing invoices and retry.
pub fn generate_invoice_number<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> String {
    let suffix = rng.gen_range(0..=MAX_SUFFIX);
    format!(
        "{INVOICE_NUMBER_PREFIX}-{:02}{:02}-{suffix:03}",
        date.year().rem_euclid(100),
        date.month()
    )
}

/// Whether `value` has the `INV-YYMM-RRR` shape.
pub fn is_well_formed_invoice_number(value: &str) -> bool {
    let Some(rest) = value
        .strip_prefix(INVOICE_NUMBER_PREFIX)
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };
    let Some((period, suffix)) = rest.split_once('-') else {
        return false;
    };

    let all_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(period, 4) || !all_digits(suffix, 3) {
        return false;
    }

    matches!(period[2..].parse::<u32>(), Ok(1..=12))
}
