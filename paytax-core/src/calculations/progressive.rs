//! Progressive bracket evaluation.
//!
//! Two strategies are in use and give the same answer for equivalent data:
//!
//! | Strategy | Used by | Formula |
//! |----------|---------|---------|
//! | Cumulative marginal | Singapore, United States | Σ (min(income, upper) − lower) × rate over touched brackets |
//! | Direct lookup with quick deduction | China | income × rate − quick_deduction for the containing bracket |
//!
//! Both expect brackets sorted ascending and contiguous, which the
//! [`RateTableStore`](crate::store::RateTableStore) guarantees. Results are
//! unrounded; callers round the amounts they report.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use paytax_core::calculations::{cumulative_marginal_tax, quick_deduction_tax};
//! use paytax_core::Bracket;
//!
//! let marginal = vec![
//!     Bracket::new(dec!(0), Some(dec!(36000)), dec!(0.03)),
//!     Bracket::new(dec!(36000), None, dec!(0.10)),
//! ];
//! let lookup = vec![
//!     Bracket::new(dec!(0), Some(dec!(36000)), dec!(0.03)).with_quick_deduction(dec!(0)),
//!     Bracket::new(dec!(36000), None, dec!(0.10)).with_quick_deduction(dec!(2520)),
//! ];
//!
//! assert_eq!(cumulative_marginal_tax(&marginal, dec!(50000)), dec!(2480));
//! assert_eq!(quick_deduction_tax(&lookup, dec!(50000)), dec!(2480));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::non_negative;
use crate::models::Bracket;

/// Sums the marginal tax across every bracket the income reaches.
///
/// A bracket contributes only while `income > lower_bound`; iteration stops at
/// the first bracket whose lower bound is at or above the income. Income above
/// the last finite bound is taxed in the unbounded top bracket. Negative income
/// is treated as zero.
pub fn cumulative_marginal_tax(
    brackets: &[Bracket],
    income: Decimal,
) -> Decimal {
    let income = non_negative(income);
    let mut tax = Decimal::ZERO;

    for bracket in brackets {
        if income <= bracket.lower_bound {
            break;
        }
        let top = bracket
            .upper_bound
            .map_or(income, |upper| income.min(upper));
        tax += (top - bracket.lower_bound) * bracket.rate;
    }

    non_negative(tax)
}

/// Finds the bracket used by direct lookup.
///
/// The first bracket that is unbounded or satisfies `income <= upper_bound`
/// is chosen, so an income equal to a bound stays in the lower bracket. Falls
/// back to the last bracket when no bound matches.
pub fn lookup_bracket(
    brackets: &[Bracket],
    income: Decimal,
) -> Option<&Bracket> {
    brackets
        .iter()
        .find(|b| b.upper_bound.is_none_or(|upper| income <= upper))
        .or_else(|| brackets.last())
}

/// Computes `income × rate − quick_deduction` for the containing bracket.
///
/// The result is floored at zero. An empty schedule yields zero.
pub fn quick_deduction_tax(
    brackets: &[Bracket],
    income: Decimal,
) -> Decimal {
    let income = non_negative(income);
    let Some(bracket) = lookup_bracket(brackets, income) else {
        return Decimal::ZERO;
    };

    debug!(
        income = %income,
        lower_bound = %bracket.lower_bound,
        rate = %bracket.rate,
        "quick deduction bracket selected"
    );

    let offset = bracket.quick_deduction.unwrap_or(Decimal::ZERO);
    non_negative(income * bracket.rate - offset)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn us_federal_2024() -> Vec<Bracket> {
        vec![
            Bracket::new(dec!(0), Some(dec!(11600)), dec!(0.10)),
            Bracket::new(dec!(11600), Some(dec!(47150)), dec!(0.12)),
            Bracket::new(dec!(47150), Some(dec!(100525)), dec!(0.22)),
            Bracket::new(dec!(100525), Some(dec!(191950)), dec!(0.24)),
            Bracket::new(dec!(191950), Some(dec!(243725)), dec!(0.32)),
            Bracket::new(dec!(243725), Some(dec!(609350)), dec!(0.35)),
            Bracket::new(dec!(609350), None, dec!(0.37)),
        ]
    }

    fn singapore_2024() -> Vec<Bracket> {
        vec![
            Bracket::new(dec!(0), Some(dec!(20000)), dec!(0)),
            Bracket::new(dec!(20000), Some(dec!(30000)), dec!(0.02)),
            Bracket::new(dec!(30000), Some(dec!(40000)), dec!(0.035)),
            Bracket::new(dec!(40000), Some(dec!(80000)), dec!(0.07)),
            Bracket::new(dec!(80000), Some(dec!(120000)), dec!(0.115)),
            Bracket::new(dec!(120000), None, dec!(0.15)),
        ]
    }

    fn china_resident() -> Vec<Bracket> {
        vec![
            Bracket::new(dec!(0), Some(dec!(36000)), dec!(0.03)).with_quick_deduction(dec!(0)),
            Bracket::new(dec!(36000), Some(dec!(144000)), dec!(0.10))
                .with_quick_deduction(dec!(2520)),
            Bracket::new(dec!(144000), Some(dec!(300000)), dec!(0.20))
                .with_quick_deduction(dec!(16920)),
            Bracket::new(dec!(300000), Some(dec!(420000)), dec!(0.25))
                .with_quick_deduction(dec!(31920)),
            Bracket::new(dec!(420000), Some(dec!(660000)), dec!(0.30))
                .with_quick_deduction(dec!(52920)),
            Bracket::new(dec!(660000), Some(dec!(960000)), dec!(0.35))
                .with_quick_deduction(dec!(85920)),
            Bracket::new(dec!(960000), None, dec!(0.45)).with_quick_deduction(dec!(181920)),
        ]
    }

    // =========================================================================
    // cumulative_marginal_tax tests
    // =========================================================================

    #[test]
    fn cumulative_marginal_zero_income() {
        assert_eq!(cumulative_marginal_tax(&us_federal_2024(), dec!(0)), dec!(0));
    }

    #[test]
    fn cumulative_marginal_first_bracket() {
        let tax = cumulative_marginal_tax(&us_federal_2024(), dec!(10000));

        assert_eq!(tax, dec!(1000));
    }

    #[test]
    fn cumulative_marginal_spans_three_brackets() {
        let tax = cumulative_marginal_tax(&us_federal_2024(), dec!(100000));

        // 11600 × 0.10 + 35550 × 0.12 + 52850 × 0.22 = 1160 + 4266 + 11627
        assert_eq!(tax, dec!(17053));
    }

    #[test]
    fn cumulative_marginal_above_highest_bound_uses_top_bracket() {
        let at_top = cumulative_marginal_tax(&us_federal_2024(), dec!(609350));
        let above = cumulative_marginal_tax(&us_federal_2024(), dec!(709350));

        assert_eq!(above - at_top, dec!(37000));
    }

    #[test]
    fn cumulative_marginal_income_equal_to_lower_bound_stops() {
        // Exactly 20000 never enters the 2% bracket.
        let tax = cumulative_marginal_tax(&singapore_2024(), dec!(20000));

        assert_eq!(tax, dec!(0));
    }

    #[test]
    fn cumulative_marginal_singapore_resident() {
        let tax = cumulative_marginal_tax(&singapore_2024(), dec!(100000));

        // 200 + 350 + 2800 + 2300
        assert_eq!(tax, dec!(5650));
    }

    #[test]
    fn cumulative_marginal_negative_income_is_zero() {
        assert_eq!(
            cumulative_marginal_tax(&us_federal_2024(), dec!(-5000)),
            dec!(0)
        );
    }

    #[test]
    fn cumulative_marginal_empty_schedule_is_zero() {
        assert_eq!(cumulative_marginal_tax(&[], dec!(5000)), dec!(0));
    }

    // =========================================================================
    // quick_deduction_tax tests
    // =========================================================================

    #[test]
    fn quick_deduction_second_bracket() {
        let tax = quick_deduction_tax(&china_resident(), dec!(119000));

        assert_eq!(tax, dec!(9380));
    }

    #[test]
    fn quick_deduction_income_at_bound_stays_in_lower_bracket() {
        let brackets = china_resident();

        let bracket = lookup_bracket(&brackets, dec!(36000)).unwrap();

        assert_eq!(bracket.rate, dec!(0.03));
        assert_eq!(quick_deduction_tax(&brackets, dec!(36000)), dec!(1080));
    }

    #[test]
    fn quick_deduction_top_bracket() {
        let tax = quick_deduction_tax(&china_resident(), dec!(1000000));

        assert_eq!(tax, dec!(268080));
    }

    #[test]
    fn quick_deduction_falls_back_to_last_bracket() {
        // A schedule whose top bracket still carries a finite bound.
        let brackets = vec![
            Bracket::new(dec!(0), Some(dec!(3000)), dec!(0.03)).with_quick_deduction(dec!(0)),
            Bracket::new(dec!(3000), Some(dec!(12000)), dec!(0.10))
                .with_quick_deduction(dec!(210)),
        ];

        let tax = quick_deduction_tax(&brackets, dec!(20000));

        assert_eq!(tax, dec!(1790));
    }

    #[test]
    fn quick_deduction_never_negative() {
        // An oversized offset would push the raw result below zero.
        let brackets = vec![Bracket::new(dec!(0), None, dec!(0.10)).with_quick_deduction(dec!(500))];

        assert_eq!(quick_deduction_tax(&brackets, dec!(1000)), dec!(0));
    }

    #[test]
    fn quick_deduction_empty_schedule_is_zero() {
        assert_eq!(quick_deduction_tax(&[], dec!(1000)), dec!(0));
    }

    // =========================================================================
    // cross-strategy and boundary properties
    // =========================================================================

    #[test]
    fn strategies_agree_on_equivalent_data() {
        let lookup = china_resident();
        let marginal: Vec<Bracket> = lookup
            .iter()
            .map(|b| Bracket::new(b.lower_bound, b.upper_bound, b.rate))
            .collect();

        for income in [
            dec!(0),
            dec!(1),
            dec!(35999.99),
            dec!(36000),
            dec!(143999),
            dec!(250000),
            dec!(420000),
            dec!(800000),
            dec!(2500000),
        ] {
            assert_eq!(
                quick_deduction_tax(&lookup, income),
                cumulative_marginal_tax(&marginal, income),
                "strategies disagree at income {income}"
            );
        }
    }

    #[test]
    fn tax_strictly_increases_across_every_boundary() {
        let epsilon = dec!(0.01);

        for brackets in [us_federal_2024(), singapore_2024(), china_resident()] {
            for upper in brackets
                .iter()
                .filter(|b| b.rate > Decimal::ZERO)
                .filter_map(|b| b.upper_bound)
            {
                let below = cumulative_marginal_tax(&brackets, upper - epsilon);
                let above = cumulative_marginal_tax(&brackets, upper + epsilon);
                assert!(below < above, "no increase across {upper}");
            }
        }

        let lookup = china_resident();
        for upper in lookup.iter().filter_map(|b| b.upper_bound) {
            let below = quick_deduction_tax(&lookup, upper - epsilon);
            let above = quick_deduction_tax(&lookup, upper + epsilon);
            assert!(below < above, "lookup has no increase across {upper}");
        }
    }

    #[test]
    fn tax_is_never_negative() {
        for income in [dec!(0), dec!(0.01), dec!(19999), dec!(20000.01), dec!(10000000)] {
            assert!(cumulative_marginal_tax(&singapore_2024(), income) >= Decimal::ZERO);
            assert!(cumulative_marginal_tax(&us_federal_2024(), income) >= Decimal::ZERO);
            assert!(quick_deduction_tax(&china_resident(), income) >= Decimal::ZERO);
        }
    }
}
