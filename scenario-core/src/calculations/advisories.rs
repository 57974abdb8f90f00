//! Advisory warnings and recommendations for a calculated scenario.
//!
//! These are heuristics over the computed figures, not calculations. Each
//! rule fires independently.

use rust_decimal::Decimal;

use crate::calculations::common::{format_aud, round_half_up};
use crate::models::{BaseScenario, ScenarioChanges, ScenarioResult, TaxRateConfig};

/// Deferrals above this share of base taxable income draw a scrutiny warning.
pub const DEFERRAL_SCRUTINY_RATIO: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Savings above this amount earn an "implement before year end" recommendation.
pub const SIGNIFICANT_SAVINGS: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advisories {
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Advisories {
    pub fn for_scenario(
        changes: &ScenarioChanges,
        base: &BaseScenario,
        result: &ScenarioResult,
        rates: &TaxRateConfig,
    ) -> Self {
        Self {
            warnings: warnings(changes, base, rates),
            recommendations: recommendations(changes, base, result),
        }
    }
}

fn warnings(
    changes: &ScenarioChanges,
    base: &BaseScenario,
    rates: &TaxRateConfig,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(reduction) = ScenarioChanges::present(changes.div7a_loan_reduction) {
        warnings.push(format!(
            "Division 7A loan reduction of {} may require a cash payment to the company \
             to be effective",
            format_aud(reduction)
        ));
    }

    if ScenarioChanges::present(changes.loss_utilization).is_some() {
        warnings.push(
            "Verify the continuity of ownership test or same business test is satisfied \
             before utilising carried-forward losses"
                .to_string(),
        );
    }

    if let Some(deferred) = ScenarioChanges::present(changes.deferred_income) {
        if deferred > base.taxable_income * DEFERRAL_SCRUTINY_RATIO {
            warnings.push(format!(
                "Deferring {} is more than 20% of base taxable income and may trigger \
                 ATO scrutiny",
                format_aud(deferred)
            ));
        }
    }

    if let Some(claim) = ScenarioChanges::present(changes.additional_rnd_claim) {
        warnings.push(format!(
            "Additional R&D claim of {} requires contemporaneous documentation and \
             Division 355 compliance",
            format_aud(claim)
        ));
    }

    if let Some(assets) = ScenarioChanges::present(changes.asset_purchases) {
        if assets > rates.instant_asset_write_off_threshold {
            warnings.push(format!(
                "Asset purchases total {}; the instant asset write-off applies per asset, \
                 so check that each asset costs less than {}",
                format_aud(assets),
                format_aud(rates.instant_asset_write_off_threshold)
            ));
        }
    }

    warnings
}

fn recommendations(
    changes: &ScenarioChanges,
    base: &BaseScenario,
    result: &ScenarioResult,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    let cutoff_year = base.financial_year.end_year();

    if ScenarioChanges::present(changes.additional_rnd_claim).is_some() {
        recommendations.push(
            "Consider obtaining an advance finding from AusIndustry before lodging a large \
             R&D claim"
                .to_string(),
        );
    }

    if ScenarioChanges::present(changes.asset_purchases).is_some() {
        recommendations.push(format!(
            "Ensure assets are purchased and installed ready for use by 30 June {cutoff_year} \
             to qualify for the instant asset write-off"
        ));
    }

    if result.savings_vs_base > SIGNIFICANT_SAVINGS {
        recommendations.push(format!(
            "Implement this scenario before 30 June {cutoff_year} to save {}",
            format_aud(result.savings_vs_base)
        ));
    }

    if result.net_tax_position.is_zero() && result.rnd_offset > result.tax_payable {
        let refund = round_half_up(result.rnd_offset - result.tax_payable);
        recommendations.push(format!(
            "Claim the excess refundable R&D tax offset: estimated refund of {}",
            format_aud(refund)
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::{BaseScenarioCalculator, ScenarioDeltaCalculator};
    use crate::models::{FinancialYear, NamedScenario, RateSchedule, TransactionRecord};

    fn fy() -> FinancialYear {
        FinancialYear::new(2024).unwrap()
    }

    fn rates() -> TaxRateConfig {
        RateSchedule::fy2024_25().fallback_config(fy())
    }

    fn base_with_taxable(
        rates: &TaxRateConfig,
        taxable: Decimal,
    ) -> BaseScenario {
        BaseScenarioCalculator::new(rates)
            .calculate(&[TransactionRecord::new(fy(), taxable, false)], None)
    }

    fn run(
        rates: &TaxRateConfig,
        base: &BaseScenario,
        changes: ScenarioChanges,
    ) -> ScenarioResult {
        ScenarioDeltaCalculator::new(rates, base).calculate(&NamedScenario {
            name: "Advice".to_string(),
            changes,
        })
    }

    // =========================================================================
    // warnings
    // =========================================================================

    #[test]
    fn div7a_reduction_warns_about_cash_payment() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                div7a_loan_reduction: Some(dec!(5000)),
                ..Default::default()
            },
        );

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("cash payment"));
    }

    #[test]
    fn loss_utilisation_warns_about_cot_and_sbt() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                loss_utilization: Some(dec!(1000)),
                ..Default::default()
            },
        );

        assert!(result.warnings[0].contains("continuity of ownership"));
        assert!(result.warnings[0].contains("same business test"));
    }

    #[test]
    fn deferral_at_twenty_percent_does_not_warn() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                deferred_income: Some(dec!(40000)),
                ..Default::default()
            },
        );

        assert!(result.warnings.is_empty());
    }

    #[test]
    fn deferral_above_twenty_percent_warns() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                deferred_income: Some(dec!(40000.01)),
                ..Default::default()
            },
        );

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("scrutiny"));
    }

    #[test]
    fn any_deferral_warns_when_base_is_a_loss() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(-10000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                deferred_income: Some(dec!(1)),
                ..Default::default()
            },
        );

        assert!(result.warnings.iter().any(|w| w.contains("scrutiny")));
    }

    #[test]
    fn rnd_claim_warns_and_recommends_advance_finding() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                additional_rnd_claim: Some(dec!(1000)),
                ..Default::default()
            },
        );

        assert!(result.warnings[0].contains("Division 355"));
        assert!(result.recommendations[0].contains("advance finding"));
    }

    #[test]
    fn asset_purchase_above_write_off_threshold_warns() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let at_threshold = run(
            &rates,
            &base,
            ScenarioChanges {
                asset_purchases: Some(dec!(20000)),
                ..Default::default()
            },
        );
        let above = run(
            &rates,
            &base,
            ScenarioChanges {
                asset_purchases: Some(dec!(25000)),
                ..Default::default()
            },
        );

        assert!(at_threshold.warnings.is_empty());
        assert_eq!(
            above.warnings,
            vec![
                "Asset purchases total $25,000.00; the instant asset write-off applies per \
                 asset, so check that each asset costs less than $20,000.00"
                    .to_string()
            ]
        );
    }

    #[test]
    fn zero_valued_changes_trigger_nothing() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                additional_rnd_claim: Some(dec!(0)),
                deferred_income: Some(dec!(0)),
                accelerated_deductions: Some(dec!(0)),
                asset_purchases: Some(dec!(0)),
                div7a_loan_reduction: Some(dec!(0)),
                loss_utilization: Some(dec!(0)),
            },
        );

        assert_eq!(result.warnings, Vec::<String>::new());
        assert_eq!(result.recommendations, Vec::<String>::new());
    }

    // =========================================================================
    // recommendations
    // =========================================================================

    #[test]
    fn asset_purchase_recommends_installation_by_cutoff() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                asset_purchases: Some(dec!(5000)),
                ..Default::default()
            },
        );

        assert_eq!(
            result.recommendations,
            vec![
                "Ensure assets are purchased and installed ready for use by 30 June 2025 \
                 to qualify for the instant asset write-off"
                    .to_string()
            ]
        );
    }

    #[test]
    fn savings_of_exactly_ten_thousand_do_not_recommend_implementation() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                accelerated_deductions: Some(dec!(40000)),
                ..Default::default()
            },
        );

        assert_eq!(result.savings_vs_base, dec!(10000.00));
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn savings_above_ten_thousand_recommend_implementation() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                accelerated_deductions: Some(dec!(40000.04)),
                ..Default::default()
            },
        );

        assert_eq!(result.savings_vs_base, dec!(10000.01));
        assert_eq!(
            result.recommendations,
            vec!["Implement this scenario before 30 June 2025 to save $10,000.01".to_string()]
        );
    }

    #[test]
    fn zero_net_without_offset_is_not_a_refund() {
        let rates = rates();
        let base = base_with_taxable(&rates, dec!(200000));

        let result = run(
            &rates,
            &base,
            ScenarioChanges {
                accelerated_deductions: Some(dec!(300000)),
                ..Default::default()
            },
        );

        assert_eq!(result.net_tax_position, Decimal::ZERO);
        assert!(!result.recommendations.iter().any(|r| r.contains("refund")));
    }
}
