//! Baseline tax position for a financial year.
//!
//! Aggregates the year's ledger lines into the figures every scenario is
//! measured against.
//!
//! | Step | Figure |
//! |------|--------|
//! | 1    | Total income (sum of positive amounts) |
//! | 2    | Total expenses (sum of absolute negative amounts) |
//! | 3    | Taxable income (1 - 2, not floored) |
//! | 4    | R&D expenditure (absolute amounts of R&D candidates) |
//! | 5    | R&D offset (4 × offset rate) |
//! | 6    | Tax rate (small below the threshold, else standard) |
//! | 7    | Tax payable (3 × 6, minimum 0) |
//! | 8    | Net tax position (7 - 5, minimum 0) |
//! | 9    | Effective tax rate (8 / 3 × 100, 0 without taxable income) |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use scenario_core::calculations::BaseScenarioCalculator;
//! use scenario_core::{FinancialYear, RateSchedule, TransactionRecord};
//!
//! let fy = FinancialYear::new(2024).unwrap();
//! let rates = RateSchedule::fy2024_25().fallback_config(fy);
//! let transactions = vec![
//!     TransactionRecord::new(fy, dec!(500000), false),
//!     TransactionRecord::new(fy, dec!(-250000), false),
//!     TransactionRecord::new(fy, dec!(-50000), true),
//! ];
//!
//! let base = BaseScenarioCalculator::new(&rates).calculate(&transactions, None);
//!
//! assert_eq!(base.taxable_income, dec!(200000));
//! assert_eq!(base.rnd_offset, dec!(21750.00));
//! assert_eq!(base.tax_payable, dec!(50000.00));
//! assert_eq!(base.net_tax_position, dec!(28250.00));
//! assert_eq!(base.effective_tax_rate, dec!(14.13));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{effective_tax_rate, net_tax_position, round_half_up, tax_payable};
use crate::models::{BaseScenario, TaxRateConfig, TransactionRecord};

/// Calculator for the base scenario.
#[derive(Debug, Clone, Copy)]
pub struct BaseScenarioCalculator<'a> {
    rates: &'a TaxRateConfig,
}

impl<'a> BaseScenarioCalculator<'a> {
    pub fn new(rates: &'a TaxRateConfig) -> Self {
        Self { rates }
    }

    /// Calculates the base position from `transactions`.
    ///
    /// The caller is responsible for rejecting an empty year; an empty slice
    /// simply produces zero figures.
    pub fn calculate(
        &self,
        transactions: &[TransactionRecord],
        passive_income_percentage: Option<Decimal>,
    ) -> BaseScenario {
        let total_income = self.total_income(transactions);
        let total_expenses = self.total_expenses(transactions);
        let taxable_income = total_income - total_expenses;

        let rnd_expenditure = self.rnd_expenditure(transactions);
        let rnd_offset = round_half_up(rnd_expenditure * self.rates.rnd_offset_rate);

        let tax_rate = self.rates.rate_for(taxable_income);
        let tax_payable = tax_payable(taxable_income, tax_rate);
        let net_tax_position = net_tax_position(tax_payable, rnd_offset);
        let effective_tax_rate = effective_tax_rate(net_tax_position, taxable_income);

        debug!(
            financial_year = %self.rates.financial_year,
            transactions = transactions.len(),
            %taxable_income,
            %tax_payable,
            %rnd_offset,
            %net_tax_position,
            "Calculated base scenario"
        );

        BaseScenario {
            financial_year: self.rates.financial_year,
            transaction_count: transactions.len(),
            total_income,
            total_expenses,
            rnd_expenditure,
            taxable_income,
            tax_rate,
            tax_payable,
            rnd_offset,
            net_tax_position,
            effective_tax_rate,
            warnings: self.warnings(passive_income_percentage),
        }
    }

    fn total_income(
        &self,
        transactions: &[TransactionRecord],
    ) -> Decimal {
        transactions
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum()
    }

    fn total_expenses(
        &self,
        transactions: &[TransactionRecord],
    ) -> Decimal {
        transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount.abs())
            .sum()
    }

    fn rnd_expenditure(
        &self,
        transactions: &[TransactionRecord],
    ) -> Decimal {
        transactions
            .iter()
            .filter(|t| t.is_rnd_candidate)
            .map(|t| t.amount.abs())
            .sum()
    }

    fn warnings(
        &self,
        passive_income_percentage: Option<Decimal>,
    ) -> Vec<String> {
        match passive_income_percentage {
            Some(pct) if pct > self.rates.passive_income_limit => vec![format!(
                "Passive income of {pct}% exceeds the {}% base rate entity limit; \
                 the company is not a base rate entity and the standard rate of {}% has been applied",
                self.rates.passive_income_limit,
                (self.rates.corporate_tax_rate_standard * Decimal::ONE_HUNDRED).normalize()
            )],
            _ => Vec::new(),
        }
    }
}
