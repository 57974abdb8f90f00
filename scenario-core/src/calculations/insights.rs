//! Summary across all scenarios of a request.

use crate::models::{ComparisonRow, ScenarioInsights, ScenarioResult};

/// Picks the best scenario and builds the comparison table.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightAggregator;

impl InsightAggregator {
    /// The best scenario is the one with the lowest net tax position. On a tie
    /// the earliest scenario in `results` wins. Rows keep input order.
    pub fn aggregate(results: &[ScenarioResult]) -> ScenarioInsights {
        let best_scenario = results
            .iter()
            .reduce(|best, candidate| {
                if candidate.net_tax_position < best.net_tax_position {
                    candidate
                } else {
                    best
                }
            })
            .map(|best| best.name.clone());

        let max_savings = results.iter().map(|r| r.savings_vs_base).max();

        let comparison = results
            .iter()
            .map(|r| ComparisonRow {
                name: r.name.clone(),
                net_tax_position: r.net_tax_position,
                savings_vs_base: r.savings_vs_base,
                effective_tax_rate: r.effective_tax_rate,
            })
            .collect();

        ScenarioInsights {
            best_scenario,
            max_savings,
            comparison,
        }
    }
}
