use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use scenario_core::{
    FinancialYear, FinancialYearError, MAX_AMOUNT, RepositoryError, TransactionRecord,
    TransactionRepository,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading ledger transactions.
#[derive(Debug, Error)]
pub enum TransactionLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("line {line}: {source}")]
    InvalidFinancialYear {
        line: usize,
        #[source]
        source: FinancialYearError,
    },

    #[error("line {line}: invalid amount '{value}'")]
    InvalidAmount { line: usize, value: String },

    #[error("line {line}: amount {value} is beyond the {limit} limit")]
    AmountOutOfRange {
        line: usize,
        value: Decimal,
        limit: Decimal,
    },

    #[error("line {line}: invalid R&D flag '{value}' - expected true/false, yes/no or 1/0")]
    InvalidFlag { line: usize, value: String },

    #[error("line {line}: invalid date '{value}' - expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDate { line: usize, value: String },

    #[error("line {line}: date {date} is outside {financial_year}")]
    DateOutsideYear {
        line: usize,
        date: NaiveDate,
        financial_year: FinancialYear,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for TransactionLoaderError {
    fn from(err: csv::Error) -> Self {
        TransactionLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a ledger CSV file, as written by the exporter.
///
/// - `financial_year`: label such as `FY2024-25`
/// - `amount`: signed amount, positive for income and negative for expenses
/// - `is_rnd_candidate`: `true/false`, `yes/no` or `1/0`
/// - `transaction_date`, `description`, `account_code`: optional ledger context
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TransactionCsvRecord {
    pub financial_year: String,
    pub amount: String,
    pub is_rnd_candidate: String,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub account_code: Option<String>,
}

impl TransactionCsvRecord {
    fn into_transaction(
        self,
        line: usize,
    ) -> Result<TransactionRecord, TransactionLoaderError> {
        let financial_year: FinancialYear = self
            .financial_year
            .parse()
            .map_err(|source| TransactionLoaderError::InvalidFinancialYear { line, source })?;

        let amount = self
            .amount
            .replace([',', '$'], "")
            .parse::<Decimal>()
            .map_err(|_| TransactionLoaderError::InvalidAmount {
                line,
                value: self.amount.clone(),
            })?;
        if amount.abs() > MAX_AMOUNT {
            return Err(TransactionLoaderError::AmountOutOfRange {
                line,
                value: amount,
                limit: MAX_AMOUNT,
            });
        }

        let is_rnd_candidate =
            parse_flag(&self.is_rnd_candidate).ok_or_else(|| TransactionLoaderError::InvalidFlag {
                line,
                value: self.is_rnd_candidate.clone(),
            })?;

        let transaction_date = match non_empty(self.transaction_date) {
            Some(value) => {
                let date = parse_date(&value)
                    .ok_or(TransactionLoaderError::InvalidDate { line, value })?;
                if !financial_year.contains(date) {
                    return Err(TransactionLoaderError::DateOutsideYear {
                        line,
                        date,
                        financial_year,
                    });
                }
                Some(date)
            }
            None => None,
        };

        Ok(TransactionRecord {
            financial_year,
            amount,
            is_rnd_candidate,
            transaction_date,
            description: non_empty(self.description),
            account_code: non_empty(self.account_code),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

/// Loader for ledger transactions from CSV files.
///
/// Works with any [`TransactionRepository`] backend.
pub struct TransactionLoader;

impl TransactionLoader {
    /// Parse and validate transactions from a CSV reader.
    ///
    /// Errors carry the 1-based line number of the offending row.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, TransactionLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let row: TransactionCsvRecord = result?;
            // Header is line 1
            records.push(row.into_transaction(index + 2)?);
        }

        Ok(records)
    }

    /// Load transactions into the repository.
    ///
    /// Each financial year present in `records` is replaced as a whole, so
    /// loading the same file twice leaves one copy.
    pub async fn load<R: TransactionRepository + ?Sized>(
        repo: &R,
        records: &[TransactionRecord],
    ) -> Result<usize, TransactionLoaderError> {
        let mut groups: BTreeMap<FinancialYear, Vec<TransactionRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.financial_year).or_default().push(record.clone());
        }

        let mut inserted = 0;
        for (financial_year, group) in groups {
            let removed = repo.replace_transactions(financial_year, &group).await?;
            debug!(%financial_year, removed, added = group.len(), "Replaced transactions");
            inserted += group.len();
        }

        info!(inserted, "Loaded transactions");
        Ok(inserted)
    }
}
