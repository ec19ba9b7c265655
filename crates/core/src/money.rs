//! Money arithmetic and formatting.
//!
//! All monetary values are `rust_decimal::Decimal` in rupees. Rounding is pinned
//! to round-half-away-from-zero so totals are identical on every platform:
//! line amounts round to paise (2 dp), grand totals round to whole rupees.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for stored monetary amounts.
pub const MONEY_DP: u32 = 2;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Round to 2 decimal places (paise), half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, ROUNDING)
}

/// Round to the nearest whole unit (rupee), half away from zero.
///
/// `100.50 -> 101`, `-100.50 -> -101`.
pub fn round_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, ROUNDING)
}

/// `amount * percent / 100`, unrounded. Saturates at the `Decimal` range.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount.saturating_mul(percent) / Decimal::ONE_HUNDRED
}

/// Format with exactly two decimals (`135` -> `"135.00"`).
pub fn format_amount(value: Decimal) -> String {
    let mut v = round2(value);
    v.rescale(MONEY_DP);
    v.to_string()
}

/// Format as Indian rupees with lakh/crore digit grouping: `₹1,23,456.00`.
pub fn format_inr(value: Decimal) -> String {
    let formatted = format_amount(value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let grouped = group_indian(int_part);
    let sign = if round2(value).is_sign_negative() && !round2(value).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}₹{grouped}.{frac_part}")
}

/// Last three digits form one group, every two digits before that another.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
