//! The scenario engine.
//!
//! Data flows one way: rates are resolved once, the base year is calculated
//! from its transactions, each scenario is applied to the base on its own,
//! and the results are summarised into insights.

pub mod advisories;
pub mod base;
pub mod checks;
pub mod common;
pub mod delta;
pub mod engine;
pub mod insights;
pub mod rates;

pub use advisories::Advisories;
pub use base::BaseScenarioCalculator;
pub use checks::{ConsistencyIssue, verify_base, verify_scenario};
pub use delta::ScenarioDeltaCalculator;
pub use engine::{ScenarioEngine, ScenarioError};
pub use insights::InsightAggregator;
pub use rates::{RateProvider, RateProviderError, RateResolver};
