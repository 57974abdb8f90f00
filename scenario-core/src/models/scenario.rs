use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FinancialYear, TaxRateConfig};

/// Hypothetical adjustments proposed for a scenario.
///
/// A field left as `None` means "no change" and contributes a zero delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioChanges {
    #[serde(alias = "additionalRndClaim")]
    pub additional_rnd_claim: Option<Decimal>,

    #[serde(alias = "deferredIncome")]
    pub deferred_income: Option<Decimal>,

    #[serde(alias = "acceleratedDeductions")]
    pub accelerated_deductions: Option<Decimal>,

    #[serde(alias = "assetPurchases")]
    pub asset_purchases: Option<Decimal>,

    #[serde(alias = "div7aLoanReduction")]
    pub div7a_loan_reduction: Option<Decimal>,

    #[serde(alias = "lossUtilization", alias = "loss_utilisation")]
    pub loss_utilization: Option<Decimal>,
}

impl ScenarioChanges {
    /// Returns the amount when the field is set to a non-zero value.
    pub fn present(value: Option<Decimal>) -> Option<Decimal> {
        value.filter(|v| !v.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    #[serde(flatten)]
    pub changes: ScenarioChanges,
}

/// Everything the engine needs for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub base_year: FinancialYear,
    pub passive_income_percentage: Option<Decimal>,
    pub scenarios: Vec<NamedScenario>,
}

/// Tax position of the base financial year, before any adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseScenario {
    pub financial_year: FinancialYear,
    pub transaction_count: usize,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub rnd_expenditure: Decimal,

    /// Not floored; a negative value is a loss.
    pub taxable_income: Decimal,
    pub tax_rate: Decimal,
    pub tax_payable: Decimal,
    pub rnd_offset: Decimal,
    pub net_tax_position: Decimal,
    pub effective_tax_rate: Decimal,
    pub warnings: Vec<String>,
}

/// The three adjustment categories applied on top of the base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentBreakdown {
    pub income_adjustment: Decimal,
    pub deduction_adjustment: Decimal,
    pub rnd_offset_adjustment: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub taxable_income: Decimal,
    pub tax_rate: Decimal,
    pub tax_payable: Decimal,
    pub effective_tax_rate: Decimal,
    pub rnd_offset: Decimal,
    pub net_tax_position: Decimal,

    /// Negative when the scenario is worse than the base.
    pub savings_vs_base: Decimal,
    pub adjustments: AdjustmentBreakdown,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub name: String,
    pub net_tax_position: Decimal,
    pub savings_vs_base: Decimal,
    pub effective_tax_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInsights {
    pub best_scenario: Option<String>,
    pub max_savings: Option<Decimal>,
    pub comparison: Vec<ComparisonRow>,
}

/// Aggregated response for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub rates: TaxRateConfig,
    pub base: BaseScenario,
    pub scenarios: Vec<ScenarioResult>,
    pub insights: ScenarioInsights,
}
