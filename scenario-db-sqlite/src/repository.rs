use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use scenario_core::calculations::{RateProvider, RateProviderError};
use scenario_core::{
    CachedRates, FinancialYear, LiveRates, RateCacheRepository, RepositoryError,
    TransactionRecord, TransactionRepository,
};
use sqlx::{Row, SqliteExecutor, sqlite::SqlitePool};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(seed = %path.display(), "Applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn database_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn parse_financial_year(label: &str) -> Result<FinancialYear, RepositoryError> {
    label
        .parse()
        .map_err(|e| RepositoryError::Database(format!("Invalid financial year '{}': {}", label, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Database(format!("Invalid timestamp '{}': {}", value, e)))
}

fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<TransactionRecord, RepositoryError> {
    let financial_year: String = row.try_get("financial_year").map_err(database_error)?;
    let is_rnd_candidate: i64 = row.try_get("is_rnd_candidate").map_err(database_error)?;
    let transaction_date = row
        .try_get::<Option<String>, _>("transaction_date")
        .map_err(database_error)?
        .map(|d| {
            NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .map_err(|e| RepositoryError::Database(format!("Invalid date '{}': {}", d, e)))
        })
        .transpose()?;

    Ok(TransactionRecord {
        financial_year: parse_financial_year(&financial_year)?,
        amount: get_decimal(row, "amount")?,
        is_rnd_candidate: is_rnd_candidate != 0,
        transaction_date,
        description: row.try_get("description").map_err(database_error)?,
        account_code: row.try_get("account_code").map_err(database_error)?,
    })
}

fn row_to_cached_rates(row: &sqlx::sqlite::SqliteRow) -> Result<CachedRates, RepositoryError> {
    let financial_year: String = row.try_get("financial_year").map_err(database_error)?;
    let fetched_at: String = row.try_get("fetched_at").map_err(database_error)?;

    Ok(CachedRates {
        financial_year: parse_financial_year(&financial_year)?,
        corporate_tax_rate_small: get_decimal(row, "corporate_tax_rate_small")?,
        corporate_tax_rate_standard: get_decimal(row, "corporate_tax_rate_standard")?,
        rnd_offset_rate: get_decimal(row, "rnd_offset_rate")?,
        source: row.try_get("source").map_err(database_error)?,
        fetched_at: parse_timestamp(&fetched_at)?,
    })
}

async fn insert_transaction_with<'e, E>(
    executor: E,
    record: &TransactionRecord,
) -> Result<(), RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO transactions (financial_year, amount, is_rnd_candidate,
                                   transaction_date, description, account_code)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(record.financial_year.label())
    .bind(decimal_to_text(record.amount))
    .bind(record.is_rnd_candidate)
    .bind(record.transaction_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(record.description.as_deref())
    .bind(record.account_code.as_deref())
    .execute(executor)
    .await
    .map_err(database_error)?;

    Ok(())
}

#[async_trait]
impl TransactionRepository for SqliteRepository {
    async fn list_transactions(
        &self,
        financial_year: FinancialYear,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT financial_year, amount, is_rnd_candidate, transaction_date,
                    description, account_code
             FROM transactions
             WHERE financial_year = ?
             ORDER BY id",
        )
        .bind(financial_year.label())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn insert_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<(), RepositoryError> {
        insert_transaction_with(&self.pool, record).await
    }

    async fn delete_transactions(
        &self,
        financial_year: FinancialYear,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE financial_year = ?")
            .bind(financial_year.label())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn list_financial_years(&self) -> Result<Vec<FinancialYear>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT financial_year FROM transactions ORDER BY financial_year",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        let mut years = rows
            .iter()
            .map(|row| {
                let label: String = row.try_get("financial_year").map_err(database_error)?;
                parse_financial_year(&label)
            })
            .collect::<Result<Vec<_>, _>>()?;
        years.sort();
        Ok(years)
    }

    async fn replace_transactions(
        &self,
        financial_year: FinancialYear,
        records: &[TransactionRecord],
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let removed = sqlx::query("DELETE FROM transactions WHERE financial_year = ?")
            .bind(financial_year.label())
            .execute(&mut *tx)
            .await
            .map_err(database_error)?
            .rows_affected();

        for record in records {
            insert_transaction_with(&mut *tx, record).await?;
        }

        tx.commit().await.map_err(database_error)?;
        Ok(removed)
    }
}

#[async_trait]
impl RateCacheRepository for SqliteRepository {
    async fn get_rates(
        &self,
        financial_year: FinancialYear,
    ) -> Result<CachedRates, RepositoryError> {
        let row = sqlx::query(
            "SELECT financial_year, corporate_tax_rate_small, corporate_tax_rate_standard,
                    rnd_offset_rate, source, fetched_at
             FROM tax_rates WHERE financial_year = ?",
        )
        .bind(financial_year.label())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_cached_rates(&row)
    }

    async fn upsert_rates(
        &self,
        rates: &CachedRates,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_rates (financial_year, corporate_tax_rate_small,
                                    corporate_tax_rate_standard, rnd_offset_rate,
                                    source, fetched_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (financial_year) DO UPDATE SET
                corporate_tax_rate_small = excluded.corporate_tax_rate_small,
                corporate_tax_rate_standard = excluded.corporate_tax_rate_standard,
                rnd_offset_rate = excluded.rnd_offset_rate,
                source = excluded.source,
                fetched_at = excluded.fetched_at",
        )
        .bind(rates.financial_year.label())
        .bind(decimal_to_text(rates.corporate_tax_rate_small))
        .bind(decimal_to_text(rates.corporate_tax_rate_standard))
        .bind(decimal_to_text(rates.rnd_offset_rate))
        .bind(&rates.source)
        .bind(rates.fetched_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }
}

/// The rate cache doubles as the live rate source.
#[async_trait]
impl RateProvider for SqliteRepository {
    async fn current_rates(
        &self,
        financial_year: FinancialYear,
    ) -> Result<LiveRates, RateProviderError> {
        match self.get_rates(financial_year).await {
            Ok(cached) => Ok(LiveRates::from(cached)),
            Err(RepositoryError::NotFound) => Err(RateProviderError::NotPublished(financial_year)),
            Err(e) => Err(RateProviderError::Unavailable(e.to_string())),
        }
    }
}
