//! Independent recomputation of the invariants a result must satisfy.
//!
//! Figures are compared with a tolerance of two cents so that a result
//! serialised and read back, or produced by another implementation, can be
//! checked without tripping on rounding.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::common::{max, round_half_up};
use crate::models::{BaseScenario, ScenarioResult, TaxRateConfig};

pub const TOLERANCE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsistencyIssue {
    #[error("{scenario}: {figure} is negative ({value})")]
    Negative {
        scenario: String,
        figure: &'static str,
        value: Decimal,
    },

    #[error("{scenario}: {figure} is {actual}, expected {expected}")]
    Mismatch {
        scenario: String,
        figure: &'static str,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("{scenario}: rate {actual} applied, expected {expected} for taxable income {taxable_income}")]
    WrongRate {
        scenario: String,
        taxable_income: Decimal,
        expected: Decimal,
        actual: Decimal,
    },
}

/// Checks the base scenario against `rates`.
pub fn verify_base(
    base: &BaseScenario,
    rates: &TaxRateConfig,
) -> Vec<ConsistencyIssue> {
    let name = "base";
    let mut issues = Vec::new();

    check(
        &mut issues,
        name,
        "taxable income",
        base.total_income - base.total_expenses,
        base.taxable_income,
    );
    check(
        &mut issues,
        name,
        "R&D offset",
        round_half_up(base.rnd_expenditure * rates.rnd_offset_rate),
        base.rnd_offset,
    );
    check_position(
        &mut issues,
        name,
        rates,
        base.taxable_income,
        base.tax_rate,
        base.tax_payable,
        base.rnd_offset,
        base.net_tax_position,
    );

    issues
}

/// Checks one scenario result against its base and `rates`.
pub fn verify_scenario(
    base: &BaseScenario,
    scenario: &ScenarioResult,
    rates: &TaxRateConfig,
) -> Vec<ConsistencyIssue> {
    let name = scenario.name.as_str();
    let adjustments = &scenario.adjustments;
    let mut issues = Vec::new();

    check(
        &mut issues,
        name,
        "taxable income",
        base.taxable_income + adjustments.income_adjustment - adjustments.deduction_adjustment,
        scenario.taxable_income,
    );
    check(
        &mut issues,
        name,
        "R&D offset",
        base.rnd_offset + adjustments.rnd_offset_adjustment,
        scenario.rnd_offset,
    );
    check_position(
        &mut issues,
        name,
        rates,
        scenario.taxable_income,
        scenario.tax_rate,
        scenario.tax_payable,
        scenario.rnd_offset,
        scenario.net_tax_position,
    );
    check(
        &mut issues,
        name,
        "savings vs base",
        base.net_tax_position - scenario.net_tax_position,
        scenario.savings_vs_base,
    );

    issues
}

#[allow(clippy::too_many_arguments)]
fn check_position(
    issues: &mut Vec<ConsistencyIssue>,
    name: &str,
    rates: &TaxRateConfig,
    taxable_income: Decimal,
    tax_rate: Decimal,
    tax_payable: Decimal,
    rnd_offset: Decimal,
    net_tax_position: Decimal,
) {
    let expected_rate = rates.rate_for(taxable_income);
    if tax_rate != expected_rate {
        issues.push(ConsistencyIssue::WrongRate {
            scenario: name.to_string(),
            taxable_income,
            expected: expected_rate,
            actual: tax_rate,
        });
    }

    non_negative(issues, name, "tax payable", tax_payable);
    non_negative(issues, name, "net tax position", net_tax_position);

    check(
        issues,
        name,
        "tax payable",
        max(taxable_income * tax_rate, Decimal::ZERO),
        tax_payable,
    );
    check(
        issues,
        name,
        "net tax position",
        max(tax_payable - rnd_offset, Decimal::ZERO),
        net_tax_position,
    );
}

fn check(
    issues: &mut Vec<ConsistencyIssue>,
    name: &str,
    figure: &'static str,
    expected: Decimal,
    actual: Decimal,
) {
    if (expected - actual).abs() > TOLERANCE {
        issues.push(ConsistencyIssue::Mismatch {
            scenario: name.to_string(),
            figure,
            expected: round_half_up(expected),
            actual,
        });
    }
}

fn non_negative(
    issues: &mut Vec<ConsistencyIssue>,
    name: &str,
    figure: &'static str,
    value: Decimal,
) {
    if value < Decimal::ZERO {
        issues.push(ConsistencyIssue::Negative {
            scenario: name.to_string(),
            figure,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::{BaseScenarioCalculator, ScenarioDeltaCalculator};
    use crate::models::{FinancialYear, NamedScenario, RateSchedule, ScenarioChanges, TransactionRecord};

    fn fy() -> FinancialYear {
        FinancialYear::new(2024).unwrap()
    }

    fn fixtures() -> (TaxRateConfig, BaseScenario) {
        let rates = RateSchedule::fy2024_25().fallback_config(fy());
        let base = BaseScenarioCalculator::new(&rates).calculate(
            &[
                TransactionRecord::new(fy(), dec!(500000), false),
                TransactionRecord::new(fy(), dec!(-250000), false),
                TransactionRecord::new(fy(), dec!(-50000), true),
            ],
            None,
        );
        (rates, base)
    }

    #[test]
    fn calculated_base_is_consistent() {
        let (rates, base) = fixtures();

        assert_eq!(verify_base(&base, &rates), Vec::new());
    }

    #[test]
    fn calculated_scenarios_are_consistent() {
        let (rates, base) = fixtures();
        let calculator = ScenarioDeltaCalculator::new(&rates, &base);

        for changes in [
            ScenarioChanges {
                deferred_income: Some(dec!(50000)),
                ..Default::default()
            },
            ScenarioChanges {
                additional_rnd_claim: Some(dec!(100000)),
                div7a_loan_reduction: Some(dec!(12345.67)),
                ..Default::default()
            },
        ] {
            let result = calculator.calculate(&NamedScenario {
                name: "ok".to_string(),
                changes,
            });
            assert_eq!(verify_scenario(&base, &result, &rates), Vec::new());
        }
    }

    #[test]
    fn differences_within_two_cents_are_tolerated() {
        let (rates, mut base) = fixtures();
        base.rnd_offset += dec!(0.02);
        base.net_tax_position -= dec!(0.02);

        assert_eq!(verify_base(&base, &rates), Vec::new());
    }

    #[test]
    fn tampered_payable_is_reported() {
        let (rates, mut base) = fixtures();
        base.tax_payable = dec!(60000.00);

        let issues = verify_base(&base, &rates);

        assert!(issues.contains(&ConsistencyIssue::Mismatch {
            scenario: "base".to_string(),
            figure: "tax payable",
            expected: dec!(50000.00),
            actual: dec!(60000.00),
        }));
    }

    #[test]
    fn wrong_rate_is_reported() {
        let (rates, mut base) = fixtures();
        base.tax_rate = dec!(0.30);

        let issues = verify_base(&base, &rates);

        assert!(matches!(issues[0], ConsistencyIssue::WrongRate { .. }));
        assert_eq!(
            issues[0].to_string(),
            "base: rate 0.30 applied, expected 0.25 for taxable income 200000"
        );
    }

    #[test]
    fn broken_savings_identity_is_reported() {
        let (rates, base) = fixtures();
        let mut result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&NamedScenario {
            name: "Defer".to_string(),
            changes: ScenarioChanges {
                deferred_income: Some(dec!(50000)),
                ..Default::default()
            },
        });
        result.savings_vs_base = dec!(20000.00);

        let issues = verify_scenario(&base, &result, &rates);

        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].to_string(),
            "Defer: savings vs base is 20000.00, expected 12500.00"
        );
    }

    #[test]
    fn negative_net_position_is_reported() {
        let (rates, mut base) = fixtures();
        base.net_tax_position = dec!(-1.00);

        let issues = verify_base(&base, &rates);

        assert!(issues.iter().any(|i| matches!(i, ConsistencyIssue::Negative { .. })));
    }
}
