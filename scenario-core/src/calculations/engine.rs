//! Runs a full scenario analysis for one request.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::checks::{verify_base, verify_scenario};
use crate::calculations::{
    BaseScenarioCalculator, InsightAggregator, RateProvider, RateResolver, ScenarioDeltaCalculator,
};
use crate::db::repository::{RepositoryError, TransactionRepository};
use crate::models::{FinancialYear, RateSchedules, ScenarioAnalysis, ScenarioRequest};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("no transactions found for {0}")]
    NoTransactions(FinancialYear),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Wires the transaction store and rate source to the calculators.
pub struct ScenarioEngine<'a> {
    transactions: &'a dyn TransactionRepository,
    rate_provider: Option<&'a dyn RateProvider>,
    schedules: RateSchedules,
}

impl<'a> ScenarioEngine<'a> {
    pub fn new(transactions: &'a dyn TransactionRepository) -> Self {
        Self {
            transactions,
            rate_provider: None,
            schedules: RateSchedules::default(),
        }
    }

    pub fn with_rate_provider(
        mut self,
        provider: &'a dyn RateProvider,
    ) -> Self {
        self.rate_provider = Some(provider);
        self
    }

    pub fn with_schedules(
        mut self,
        schedules: RateSchedules,
    ) -> Self {
        self.schedules = schedules;
        self
    }

    /// Analyses every scenario in `request` against its base year.
    ///
    /// # Errors
    ///
    /// * [`ScenarioError::NoTransactions`] when the base year has no rows.
    /// * [`ScenarioError::Repository`] when the transactions cannot be read.
    pub async fn analyse(
        &self,
        request: &ScenarioRequest,
    ) -> Result<ScenarioAnalysis, ScenarioError> {
        let financial_year = request.base_year;

        let transactions = self.transactions.list_transactions(financial_year).await?;
        if transactions.is_empty() {
            return Err(ScenarioError::NoTransactions(financial_year));
        }

        let rates = RateResolver::new(self.rate_provider, &self.schedules)
            .resolve(financial_year, request.passive_income_percentage)
            .await;

        let base = BaseScenarioCalculator::new(&rates)
            .calculate(&transactions, request.passive_income_percentage);

        let delta = ScenarioDeltaCalculator::new(&rates, &base);
        let scenarios: Vec<_> = request.scenarios.iter().map(|s| delta.calculate(s)).collect();

        let insights = InsightAggregator::aggregate(&scenarios);

        let issues: Vec<_> = verify_base(&base, &rates)
            .into_iter()
            .chain(scenarios.iter().flat_map(|s| verify_scenario(&base, s, &rates)))
            .collect();
        for issue in &issues {
            warn!(%issue, "Inconsistent scenario figures");
        }
        debug!(issues = issues.len(), "Verified scenario figures");

        info!(
            financial_year = %financial_year,
            rate_source = %rates.source,
            scenarios = scenarios.len(),
            best = insights.best_scenario.as_deref().unwrap_or("-"),
            "Scenario analysis complete"
        );

        Ok(ScenarioAnalysis {
            rates,
            base,
            scenarios,
            insights,
        })
    }
}
