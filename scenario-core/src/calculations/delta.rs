//! Applies a named set of hypothetical adjustments to the base scenario.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use scenario_core::calculations::{BaseScenarioCalculator, ScenarioDeltaCalculator};
//! use scenario_core::{FinancialYear, NamedScenario, RateSchedule, ScenarioChanges, TransactionRecord};
//!
//! let fy = FinancialYear::new(2024).unwrap();
//! let rates = RateSchedule::fy2024_25().fallback_config(fy);
//! let base = BaseScenarioCalculator::new(&rates).calculate(
//!     &[
//!         TransactionRecord::new(fy, dec!(500000), false),
//!         TransactionRecord::new(fy, dec!(-250000), false),
//!         TransactionRecord::new(fy, dec!(-50000), true),
//!     ],
//!     None,
//! );
//!
//! let scenario = NamedScenario {
//!     name: "Defer invoices".to_string(),
//!     changes: ScenarioChanges {
//!         deferred_income: Some(dec!(50000)),
//!         ..Default::default()
//!     },
//! };
//! let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario);
//!
//! assert_eq!(result.taxable_income, dec!(150000));
//! assert_eq!(result.net_tax_position, dec!(15750.00));
//! assert_eq!(result.savings_vs_base, dec!(12500.00));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::advisories::Advisories;
use crate::calculations::common::{effective_tax_rate, net_tax_position, round_half_up, tax_payable};
use crate::models::{
    AdjustmentBreakdown, BaseScenario, NamedScenario, ScenarioChanges, ScenarioResult, TaxRateConfig,
};

/// Share of a Division 7A loan reduction treated as a reduction in deemed
/// dividend income. A flat estimate, not the statutory calculation.
pub const DIV7A_DEEMED_DIVIDEND_FACTOR: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Calculator for one scenario against a fixed base.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioDeltaCalculator<'a> {
    rates: &'a TaxRateConfig,
    base: &'a BaseScenario,
}

impl<'a> ScenarioDeltaCalculator<'a> {
    pub fn new(
        rates: &'a TaxRateConfig,
        base: &'a BaseScenario,
    ) -> Self {
        Self { rates, base }
    }

    /// Calculates the scenario result, including its warnings and
    /// recommendations. Total over every combination of inputs.
    pub fn calculate(
        &self,
        scenario: &NamedScenario,
    ) -> ScenarioResult {
        let adjustments = self.adjustments(&scenario.changes);

        let taxable_income = self.base.taxable_income + adjustments.income_adjustment
            - adjustments.deduction_adjustment;
        let rnd_offset = self.base.rnd_offset + adjustments.rnd_offset_adjustment;

        let tax_rate = self.rates.rate_for(taxable_income);
        let tax_payable = tax_payable(taxable_income, tax_rate);
        let net_tax_position = net_tax_position(tax_payable, rnd_offset);
        let savings_vs_base = round_half_up(self.base.net_tax_position - net_tax_position);
        let effective_tax_rate = effective_tax_rate(net_tax_position, taxable_income);

        debug!(
            scenario = %scenario.name,
            %taxable_income,
            %tax_payable,
            %rnd_offset,
            %net_tax_position,
            %savings_vs_base,
            "Calculated scenario"
        );

        let mut result = ScenarioResult {
            name: scenario.name.clone(),
            taxable_income,
            tax_rate,
            tax_payable,
            effective_tax_rate,
            rnd_offset,
            net_tax_position,
            savings_vs_base,
            adjustments,
            warnings: Vec::new(),
            recommendations: Vec::new(),
        };

        let advisories = Advisories::for_scenario(&scenario.changes, self.base, &result, self.rates);
        result.warnings = advisories.warnings;
        result.recommendations = advisories.recommendations;
        result
    }

    fn adjustments(
        &self,
        changes: &ScenarioChanges,
    ) -> AdjustmentBreakdown {
        let amount = |value: Option<Decimal>| value.unwrap_or(Decimal::ZERO);

        let income_adjustment = -amount(changes.deferred_income)
            - amount(changes.div7a_loan_reduction) * DIV7A_DEEMED_DIVIDEND_FACTOR;

        let deduction_adjustment = amount(changes.accelerated_deductions)
            + amount(changes.asset_purchases)
            + amount(changes.loss_utilization);

        let rnd_offset_adjustment =
            round_half_up(amount(changes.additional_rnd_claim) * self.rates.rnd_offset_rate);

        AdjustmentBreakdown {
            income_adjustment,
            deduction_adjustment,
            rnd_offset_adjustment,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::BaseScenarioCalculator;
    use crate::models::{FinancialYear, MAX_AMOUNT, RateSchedule, TransactionRecord};

    fn fy() -> FinancialYear {
        FinancialYear::new(2024).unwrap()
    }

    fn rates() -> TaxRateConfig {
        RateSchedule::fy2024_25().fallback_config(fy())
    }

    fn base(rates: &TaxRateConfig) -> BaseScenario {
        BaseScenarioCalculator::new(rates).calculate(
            &[
                TransactionRecord::new(fy(), dec!(500000), false),
                TransactionRecord::new(fy(), dec!(-250000), false),
                TransactionRecord::new(fy(), dec!(-50000), true),
            ],
            None,
        )
    }

    fn scenario(changes: ScenarioChanges) -> NamedScenario {
        NamedScenario {
            name: "Test".to_string(),
            changes,
        }
    }

    // =========================================================================
    // adjustments
    // =========================================================================

    #[test]
    fn div7a_reduction_counts_ten_percent_as_income_reduction() {
        let rates = rates();
        let base = base(&rates);

        let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(
            ScenarioChanges {
                deferred_income: Some(dec!(1000)),
                div7a_loan_reduction: Some(dec!(20000)),
                ..Default::default()
            },
        ));

        assert_eq!(result.adjustments.income_adjustment, dec!(-3000));
        assert_eq!(result.taxable_income, dec!(197000));
    }

    #[test]
    fn deductions_sum_three_categories() {
        let rates = rates();
        let base = base(&rates);

        let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(
            ScenarioChanges {
                accelerated_deductions: Some(dec!(10000)),
                asset_purchases: Some(dec!(15000)),
                loss_utilization: Some(dec!(5000)),
                ..Default::default()
            },
        ));

        assert_eq!(result.adjustments.deduction_adjustment, dec!(30000));
        assert_eq!(result.taxable_income, dec!(170000));
        assert_eq!(result.tax_payable, dec!(42500.00));
    }

    #[test]
    fn empty_changes_reproduce_base() {
        let rates = rates();
        let base = base(&rates);

        let result =
            ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(ScenarioChanges::default()));

        assert_eq!(result.adjustments, AdjustmentBreakdown::default());
        assert_eq!(result.taxable_income, base.taxable_income);
        assert_eq!(result.net_tax_position, base.net_tax_position);
        assert_eq!(result.savings_vs_base, Decimal::ZERO);
        assert!(result.warnings.is_empty());
        assert!(result.recommendations.is_empty());
    }

    // =========================================================================
    // concrete scenarios
    // =========================================================================

    #[test]
    fn deferred_income_scenario() {
        let rates = rates();
        let base = base(&rates);

        let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(
            ScenarioChanges {
                deferred_income: Some(dec!(50000)),
                ..Default::default()
            },
        ));

        assert_eq!(result.adjustments.income_adjustment, dec!(-50000));
        assert_eq!(result.taxable_income, dec!(150000));
        assert_eq!(result.tax_payable, dec!(37500.00));
        assert_eq!(result.net_tax_position, dec!(15750.00));
        assert_eq!(result.savings_vs_base, dec!(12500.00));
        assert!(result.warnings.iter().any(|w| w.contains("scrutiny")));
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.contains("before 30 June 2025") && r.contains("$12,500.00"))
        );
    }

    #[test]
    fn additional_rnd_claim_scenario_reports_refund() {
        let rates = rates();
        let base = base(&rates);

        let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(
            ScenarioChanges {
                additional_rnd_claim: Some(dec!(100000)),
                ..Default::default()
            },
        ));

        assert_eq!(result.adjustments.rnd_offset_adjustment, dec!(43500.00));
        assert_eq!(result.rnd_offset, dec!(65250.00));
        assert_eq!(result.tax_payable, dec!(50000.00));
        assert_eq!(result.net_tax_position, Decimal::ZERO);
        assert_eq!(result.savings_vs_base, dec!(28250.00));
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.contains("refund") && r.contains("$15,250.00"))
        );
    }

    // =========================================================================
    // invariants
    // =========================================================================

    #[test]
    fn savings_can_be_negative() {
        let rates = rates();
        let base = base(&rates);

        let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(
            ScenarioChanges {
                deferred_income: Some(dec!(-40000)),
                ..Default::default()
            },
        ));

        assert_eq!(result.taxable_income, dec!(240000));
        assert_eq!(result.net_tax_position, dec!(38250.00));
        assert_eq!(result.savings_vs_base, dec!(-10000.00));
    }

    #[test]
    fn savings_identity_holds() {
        let rates = rates();
        let base = base(&rates);
        let calculator = ScenarioDeltaCalculator::new(&rates, &base);

        for changes in [
            ScenarioChanges {
                loss_utilization: Some(dec!(12345.67)),
                ..Default::default()
            },
            ScenarioChanges {
                div7a_loan_reduction: Some(dec!(333.33)),
                additional_rnd_claim: Some(dec!(777.77)),
                ..Default::default()
            },
            ScenarioChanges {
                accelerated_deductions: Some(dec!(500000)),
                ..Default::default()
            },
        ] {
            let result = calculator.calculate(&scenario(changes));
            assert_eq!(
                result.savings_vs_base,
                base.net_tax_position - result.net_tax_position
            );
            assert!(result.tax_payable >= Decimal::ZERO);
            assert!(result.net_tax_position >= Decimal::ZERO);
        }
    }

    #[test]
    fn deductions_beyond_income_floor_payable_at_zero() {
        let rates = rates();
        let base = base(&rates);

        let result = ScenarioDeltaCalculator::new(&rates, &base).calculate(&scenario(
            ScenarioChanges {
                accelerated_deductions: Some(dec!(500000)),
                ..Default::default()
            },
        ));

        assert_eq!(result.taxable_income, dec!(-300000));
        assert_eq!(result.tax_payable, Decimal::ZERO);
        assert_eq!(result.effective_tax_rate, Decimal::ZERO);
    }

    #[test]
    fn rate_is_reselected_when_scenario_crosses_threshold() {
        let rates = rates();
        let big_base = BaseScenarioCalculator::new(&rates).calculate(
            &[TransactionRecord::new(fy(), dec!(50000100), false)],
            None,
        );
        assert_eq!(big_base.tax_rate, dec!(0.30));

        let result = ScenarioDeltaCalculator::new(&rates, &big_base).calculate(&scenario(
            ScenarioChanges {
                accelerated_deductions: Some(dec!(100.01)),
                ..Default::default()
            },
        ));

        assert_eq!(result.taxable_income, dec!(49999999.99));
        assert_eq!(result.tax_rate, dec!(0.25));
    }

    // =========================================================================
    // input limits
    // =========================================================================

    #[test]
    fn largest_accepted_amounts_do_not_overflow() {
        let rates = rates();
        let profitable: Vec<_> = (0..1000)
            .map(|_| TransactionRecord::new(fy(), MAX_AMOUNT, false))
            .collect();
        let loss_making: Vec<_> = (0..1000)
            .flat_map(|_| {
                [
                    TransactionRecord::new(fy(), MAX_AMOUNT, false),
                    TransactionRecord::new(fy(), -MAX_AMOUNT, true),
                    TransactionRecord::new(fy(), -MAX_AMOUNT, false),
                ]
            })
            .collect();
        let everything = ScenarioChanges {
            additional_rnd_claim: Some(MAX_AMOUNT),
            deferred_income: Some(MAX_AMOUNT),
            accelerated_deductions: Some(MAX_AMOUNT),
            asset_purchases: Some(MAX_AMOUNT),
            div7a_loan_reduction: Some(MAX_AMOUNT),
            loss_utilization: Some(MAX_AMOUNT),
        };

        for ledger in [profitable, loss_making] {
            let base = BaseScenarioCalculator::new(&rates).calculate(&ledger, Some(dec!(100)));
            let result = ScenarioDeltaCalculator::new(&rates, &base)
                .calculate(&scenario(everything.clone()));

            assert!(result.tax_payable >= Decimal::ZERO);
            assert!(result.net_tax_position >= Decimal::ZERO);
            assert_eq!(
                result.savings_vs_base,
                base.net_tax_position - result.net_tax_position
            );
        }
    }
}
