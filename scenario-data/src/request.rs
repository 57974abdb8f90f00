use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use scenario_core::{FinancialYear, MAX_AMOUNT, NamedScenario, ScenarioChanges, ScenarioRequest};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioRequestError {
    #[error("failed to read request file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("invalid request file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("passive income percentage must be between 0 and 100, got {0}")]
    PassiveIncomeOutOfRange(Decimal),

    #[error("request must contain at least one scenario")]
    NoScenarios,

    #[error("scenario {0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate scenario name '{0}'")]
    DuplicateName(String),

    #[error("scenario '{scenario}': {field} must not be negative, got {value}")]
    NegativeChange {
        scenario: String,
        field: &'static str,
        value: Decimal,
    },

    #[error("scenario '{scenario}': {field} of {value} is beyond the {limit} limit")]
    ChangeTooLarge {
        scenario: String,
        field: &'static str,
        value: Decimal,
        limit: Decimal,
    },
}

/// On-disk form of a scenario request.
///
/// ```toml
/// base_year = "FY2024-25"
/// passive_income_percentage = 20
///
/// [[scenarios]]
/// name = "Defer June invoices"
/// deferred_income = 50000
///
/// [[scenarios]]
/// name = "Extra R&D"
/// additional_rnd_claim = 100000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioRequestFile {
    #[serde(alias = "baseYear")]
    pub base_year: FinancialYear,

    #[serde(default, alias = "passiveIncomePercentage")]
    pub passive_income_percentage: Option<Decimal>,

    #[serde(default)]
    pub scenarios: Vec<ScenarioEntry>,
}

/// One `[[scenarios]]` table. Unknown keys are rejected so that a misspelt
/// change is reported instead of silently read as "no change".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioEntry {
    pub name: String,

    #[serde(default, alias = "additionalRndClaim")]
    pub additional_rnd_claim: Option<Decimal>,

    #[serde(default, alias = "deferredIncome")]
    pub deferred_income: Option<Decimal>,

    #[serde(default, alias = "acceleratedDeductions")]
    pub accelerated_deductions: Option<Decimal>,

    #[serde(default, alias = "assetPurchases")]
    pub asset_purchases: Option<Decimal>,

    #[serde(default, alias = "div7aLoanReduction")]
    pub div7a_loan_reduction: Option<Decimal>,

    #[serde(default, alias = "lossUtilization", alias = "loss_utilisation")]
    pub loss_utilization: Option<Decimal>,
}

impl From<ScenarioEntry> for NamedScenario {
    fn from(entry: ScenarioEntry) -> Self {
        NamedScenario {
            name: entry.name,
            changes: ScenarioChanges {
                additional_rnd_claim: entry.additional_rnd_claim,
                deferred_income: entry.deferred_income,
                accelerated_deductions: entry.accelerated_deductions,
                asset_purchases: entry.asset_purchases,
                div7a_loan_reduction: entry.div7a_loan_reduction,
                loss_utilization: entry.loss_utilization,
            },
        }
    }
}

impl ScenarioRequestFile {
    pub fn parse(source: &str) -> Result<Self, ScenarioRequestError> {
        Ok(toml::from_str(source)?)
    }

    pub fn read(path: &Path) -> Result<Self, ScenarioRequestError> {
        let source = std::fs::read_to_string(path).map_err(|e| ScenarioRequestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&source)
    }

    /// Validates the file and converts it into an engine request.
    pub fn into_request(self) -> Result<ScenarioRequest, ScenarioRequestError> {
        self.validate()?;
        Ok(ScenarioRequest {
            base_year: self.base_year,
            passive_income_percentage: self.passive_income_percentage,
            scenarios: self.scenarios.into_iter().map(NamedScenario::from).collect(),
        })
    }

    pub fn validate(&self) -> Result<(), ScenarioRequestError> {
        if let Some(pct) = self.passive_income_percentage {
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(ScenarioRequestError::PassiveIncomeOutOfRange(pct));
            }
        }

        if self.scenarios.is_empty() {
            return Err(ScenarioRequestError::NoScenarios);
        }

        let mut names = HashSet::new();
        for (index, scenario) in self.scenarios.iter().enumerate() {
            let name = scenario.name.trim();
            if name.is_empty() {
                return Err(ScenarioRequestError::EmptyName(index + 1));
            }
            if !names.insert(name) {
                return Err(ScenarioRequestError::DuplicateName(name.to_string()));
            }
            check_amounts(name, scenario)?;
        }

        Ok(())
    }
}

fn check_amounts(
    scenario: &str,
    entry: &ScenarioEntry,
) -> Result<(), ScenarioRequestError> {
    let fields = [
        ("additional_rnd_claim", entry.additional_rnd_claim),
        ("deferred_income", entry.deferred_income),
        ("accelerated_deductions", entry.accelerated_deductions),
        ("asset_purchases", entry.asset_purchases),
        ("div7a_loan_reduction", entry.div7a_loan_reduction),
        ("loss_utilization", entry.loss_utilization),
    ];

    for (field, value) in fields.into_iter().filter_map(|(f, v)| Some((f, v?))) {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ScenarioRequestError::NegativeChange {
                scenario: scenario.to_string(),
                field,
                value,
            });
        }
        if value > MAX_AMOUNT {
            return Err(ScenarioRequestError::ChangeTooLarge {
                scenario: scenario.to_string(),
                field,
                value,
                limit: MAX_AMOUNT,
            });
        }
    }
    Ok(())
}
