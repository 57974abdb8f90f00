mod financial_year;
mod rates;
mod scenario;
mod transaction;

pub use financial_year::{FinancialYear, FinancialYearError};
pub use rates::{CachedRates, LiveRates, RateSchedule, RateSchedules, RateSources, TaxRateConfig};
pub use scenario::{
    AdjustmentBreakdown, BaseScenario, ComparisonRow, NamedScenario, ScenarioAnalysis,
    ScenarioChanges, ScenarioInsights, ScenarioRequest, ScenarioResult,
};
pub use transaction::{MAX_AMOUNT, TransactionRecord};
