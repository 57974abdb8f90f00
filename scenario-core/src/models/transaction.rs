use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FinancialYear;

/// Largest magnitude accepted for a ledger amount or a scenario change.
///
/// Inputs at this bound keep every sum and product the calculators form
/// well inside the range of [`Decimal`].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// One ledger line for a financial year.
///
/// Positive amounts are income, negative amounts are expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub financial_year: FinancialYear,
    pub amount: Decimal,
    pub is_rnd_candidate: bool,

    // Ledger context, not used by the calculators
    pub transaction_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub account_code: Option<String>,
}

impl TransactionRecord {
    pub fn new(
        financial_year: FinancialYear,
        amount: Decimal,
        is_rnd_candidate: bool,
    ) -> Self {
        Self {
            financial_year,
            amount,
            is_rnd_candidate,
            transaction_date: None,
            description: None,
            account_code: None,
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_expense(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn max_amount_is_one_quadrillion() {
        assert_eq!(MAX_AMOUNT, dec!(1_000_000_000_000_000));
    }
}
