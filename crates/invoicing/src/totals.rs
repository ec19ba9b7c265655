//! Invoice aggregator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmabill_core::money::{round2, round_unit};

use crate::calculator::LineTotals;
use crate::line::InvoiceLine;

/// Invoice-level amounts folded from its lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Σ taxable value.
    pub sub_total: Decimal,
    /// Σ GST.
    pub total_gst: Decimal,
    /// `sub_total + total_gst` before whole-rupee rounding.
    pub total_amount: Decimal,
    /// `grand_total - total_amount`, magnitude at most 0.50.
    pub round_off: Decimal,
    /// `total_amount` rounded to whole rupees, half away from zero.
    pub grand_total: Decimal,
}

impl InvoiceTotals {
    /// Fold line amounts into invoice totals. No lines yields all zeros.
    pub fn aggregate<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a LineTotals>,
    {
        let (sub_total, total_gst) = lines
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(taxable, gst), line| {
                (
                    taxable.saturating_add(line.taxable_value),
                    gst.saturating_add(line.gst_amount),
                )
            });

        let sub_total = round2(sub_total);
        let total_gst = round2(total_gst);
        let total_amount = sub_total.saturating_add(total_gst);
        let grand_total = round_unit(total_amount);

        Self {
            sub_total,
            total_gst,
            total_amount,
            round_off: grand_total.saturating_sub(total_amount),
            grand_total,
        }
    }

    pub fn from_lines(lines: &[InvoiceLine]) -> Self {
        Self::aggregate(lines.iter().map(InvoiceLine::totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::calculate_item_totals;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(taxable: Decimal, gst: Decimal) -> LineTotals {
        LineTotals {
            taxable_value: taxable,
            gst_amount: gst,
            total_amount: taxable + gst,
        }
    }

    #[test]
    fn no_lines_yields_zeros() {
        let totals = InvoiceTotals::aggregate(std::iter::empty::<&LineTotals>());
        assert_eq!(totals, InvoiceTotals::default());
        assert!(totals.grand_total.is_zero());
    }

    #[test]
    fn rounds_up_to_whole_rupees() {
        let lines = [calculate_item_totals(dec!(50), 3, dec!(5), dec!(10))];
        let totals = InvoiceTotals::aggregate(&lines);

        assert_eq!(totals.sub_total, dec!(135.00));
        assert_eq!(totals.total_gst, dec!(6.75));
        assert_eq!(totals.total_amount, dec!(141.75));
        assert_eq!(totals.grand_total, dec!(142));
        assert_eq!(totals.round_off, dec!(0.25));
    }

    #[test]
    fn half_rupee_rounds_away_from_zero() {
        let totals = InvoiceTotals::aggregate(&[line(dec!(95.71), dec!(4.79))]);
        assert_eq!(totals.total_amount, dec!(100.50));
        assert_eq!(totals.grand_total, dec!(101));
        assert_eq!(totals.round_off, dec!(0.50));
    }

    #[test]
    fn rounds_down_with_negative_round_off() {
        let totals = InvoiceTotals::aggregate(&[
            line(dec!(200.00), dec!(24.00)),
            line(dec!(10.20), dec!(0.00)),
        ]);
        assert_eq!(totals.sub_total, dec!(210.20));
        assert_eq!(totals.grand_total, dec!(234));
        assert_eq!(totals.round_off, dec!(-0.20));
    }

    #[test]
    fn negative_half_rupee_rounds_away_from_zero() {
        let totals = InvoiceTotals::aggregate(&[line(dec!(-95.71), dec!(-4.79))]);
        assert_eq!(totals.grand_total, dec!(-101));
        assert_eq!(totals.round_off, dec!(-0.50));
    }

    #[test]
    fn sums_beyond_decimal_range_saturate() {
        let huge = line(Decimal::MAX - Decimal::ONE, Decimal::ZERO);
        let totals = InvoiceTotals::aggregate([&huge, &huge]);
        assert_eq!(totals.sub_total, Decimal::MAX);
        assert_eq!(totals.grand_total, Decimal::MAX);
        assert!(totals.round_off.is_zero());
    }

    fn line_totals() -> impl Strategy<Value = LineTotals> {
        (0i64..1_000_000, 0i64..=2_800, 0i64..=10_000, 1i64..100).prop_map(
            |(rate, gst, disc, qty)| {
                calculate_item_totals(
                    Decimal::new(rate, 2),
                    qty,
                    Decimal::new(gst, 2),
                    Decimal::new(disc, 2),
                )
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: aggregating the same lines twice yields equal totals.
        #[test]
        fn aggregation_is_idempotent(lines in prop::collection::vec(line_totals(), 0..20)) {
            prop_assert_eq!(InvoiceTotals::aggregate(&lines), InvoiceTotals::aggregate(&lines));
        }

        /// Property: grand total is a whole number within half a rupee of the raw total.
        #[test]
        fn round_off_is_bounded(lines in prop::collection::vec(line_totals(), 0..20)) {
            let totals = InvoiceTotals::aggregate(&lines);

            prop_assert_eq!(totals.grand_total, totals.grand_total.trunc());
            prop_assert_eq!(totals.round_off, totals.grand_total - totals.total_amount);
            prop_assert!(totals.round_off.abs() <= dec!(0.50));
            prop_assert_eq!(totals.total_amount, totals.sub_total + totals.total_gst);
        }
    }
}
