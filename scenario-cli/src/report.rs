use std::fmt::Write;

use clap::ValueEnum;
use rust_decimal::Decimal;
use scenario_core::calculations::common::format_aud;
use scenario_core::ScenarioAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(
    analysis: &ScenarioAnalysis,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(analysis)),
        OutputFormat::Json => serde_json::to_string_pretty(analysis),
    }
}

fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

/// Plain text report for terminals.
pub fn render_text(analysis: &ScenarioAnalysis) -> String {
    let mut out = String::new();
    write_text(&mut out, analysis).expect("writing into a String never fails");
    out
}

fn write_text(
    out: &mut String,
    analysis: &ScenarioAnalysis,
) -> std::fmt::Result {
    let rates = &analysis.rates;
    let base = &analysis.base;

    writeln!(out, "Tax scenarios for {}", base.financial_year)?;
    write!(
        out,
        "Rates: {} small / {} standard / {} R&D offset (source: {}",
        percent(rates.corporate_tax_rate_small),
        percent(rates.corporate_tax_rate_standard),
        percent(rates.rnd_offset_rate),
        rates.source
    )?;
    if rates.cache_hit {
        write!(out, ", cached")?;
    }
    writeln!(out, ")")?;
    writeln!(out)?;

    writeln!(out, "Base position ({} transactions)", base.transaction_count)?;
    let rows = [
        ("Total income", format_aud(base.total_income)),
        ("Total expenses", format_aud(base.total_expenses)),
        ("R&D expenditure", format_aud(base.rnd_expenditure)),
        ("Taxable income", format_aud(base.taxable_income)),
        ("Tax rate", percent(base.tax_rate)),
        ("Tax payable", format_aud(base.tax_payable)),
        ("R&D offset", format_aud(base.rnd_offset)),
        ("Net tax position", format_aud(base.net_tax_position)),
        ("Effective rate", format!("{}%", base.effective_tax_rate)),
    ];
    for (label, value) in rows {
        writeln!(out, "  {label:<18}{value:>18}")?;
    }
    for warning in &base.warnings {
        writeln!(out, "  ! {warning}")?;
    }
    writeln!(out)?;

    let name_width = analysis
        .scenarios
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Scenario".len());

    writeln!(
        out,
        "{:<name_width$}  {:>16}  {:>16}  {:>16}  {:>9}",
        "Scenario", "Taxable income", "Net tax", "Savings", "Eff. rate"
    )?;
    for scenario in &analysis.scenarios {
        writeln!(
            out,
            "{:<name_width$}  {:>16}  {:>16}  {:>16}  {:>9}",
            scenario.name,
            format_aud(scenario.taxable_income),
            format_aud(scenario.net_tax_position),
            format_aud(scenario.savings_vs_base),
            format!("{}%", scenario.effective_tax_rate),
        )?;
    }

    for scenario in &analysis.scenarios {
        if scenario.warnings.is_empty() && scenario.recommendations.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{}", scenario.name)?;
        for warning in &scenario.warnings {
            writeln!(out, "  ! {warning}")?;
        }
        for recommendation in &scenario.recommendations {
            writeln!(out, "  > {recommendation}")?;
        }
    }

    writeln!(out)?;
    match (&analysis.insights.best_scenario, analysis.insights.max_savings) {
        (Some(best), Some(savings)) => {
            writeln!(out, "Best scenario: {best} ({})", format_aud(savings))?
        }
        _ => writeln!(out, "Best scenario: none")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use scenario_core::calculations::{BaseScenarioCalculator, InsightAggregator, ScenarioDeltaCalculator};
    use scenario_core::{FinancialYear, NamedScenario, RateSchedule, ScenarioChanges, TransactionRecord};

    use super::*;

    fn analysis() -> ScenarioAnalysis {
        let fy = FinancialYear::new(2024).unwrap();
        let rates = RateSchedule::fy2024_25().fallback_config(fy);
        let records = [
            TransactionRecord::new(fy, dec!(500000), false),
            TransactionRecord::new(fy, dec!(-250000), false),
            TransactionRecord::new(fy, dec!(-50000), true),
        ];
        let base = BaseScenarioCalculator::new(&rates).calculate(&records, None);
        let scenarios: Vec<_> = [
            ("Defer invoices", ScenarioChanges {
                deferred_income: Some(dec!(50000)),
                ..Default::default()
            }),
            ("Nothing", ScenarioChanges::default()),
        ]
        .into_iter()
        .map(|(name, changes)| {
            ScenarioDeltaCalculator::new(&rates, &base).calculate(&NamedScenario {
                name: name.to_string(),
                changes,
            })
        })
        .collect();
        let insights = InsightAggregator::aggregate(&scenarios);

        ScenarioAnalysis {
            rates,
            base,
            scenarios,
            insights,
        }
    }

    #[test]
    fn percent_drops_trailing_zeros() {
        assert_eq!(percent(dec!(0.25)), "25%");
        assert_eq!(percent(dec!(0.435)), "43.5%");
    }

    #[test]
    fn text_report_shows_base_and_scenarios() {
        let text = render(&analysis(), OutputFormat::Text).unwrap();

        assert!(text.starts_with("Tax scenarios for FY2024-25\n"));
        assert!(text.contains("source: fallback_FY2024-25)"));
        assert!(text.contains("Taxable income           $200,000.00"));
        assert!(text.contains("Net tax position          $28,250.00"));
        assert!(text.contains("Defer invoices"));
        assert!(text.contains("$12,500.00"));
        assert!(text.contains("Best scenario: Defer invoices ($12,500.00)"));
    }

    #[test]
    fn text_report_lists_advisories_under_their_scenario() {
        let text = render_text(&analysis());

        let section = text.split("\nDefer invoices\n").nth(1).unwrap();
        assert!(section.contains("  ! "));
        assert!(section.contains("  > Implement this scenario before 30 June 2025"));
    }

    #[test]
    fn json_report_round_trips() {
        let analysis = analysis();

        let json = render(&analysis, OutputFormat::Json).unwrap();
        let parsed: ScenarioAnalysis = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, analysis);
    }
}
