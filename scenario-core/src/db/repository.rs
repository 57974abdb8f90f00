use async_trait::async_trait;
use thiserror::Error;

use crate::calculations::RateProvider;
use crate::models::{CachedRates, FinancialYear, TransactionRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn list_transactions(
        &self,
        financial_year: FinancialYear,
    ) -> Result<Vec<TransactionRecord>, RepositoryError>;

    async fn insert_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<(), RepositoryError>;

    /// Removes every transaction of `financial_year`, returning how many went.
    async fn delete_transactions(
        &self,
        financial_year: FinancialYear,
    ) -> Result<u64, RepositoryError>;

    async fn list_financial_years(&self) -> Result<Vec<FinancialYear>, RepositoryError>;

    /// Replaces every transaction of `financial_year` with `records`,
    /// returning how many rows were removed.
    ///
    /// Backends with transactions override this so that a failure leaves
    /// the year as it was. The default deletes and then inserts row by row.
    async fn replace_transactions(
        &self,
        financial_year: FinancialYear,
        records: &[TransactionRecord],
    ) -> Result<u64, RepositoryError> {
        let removed = self.delete_transactions(financial_year).await?;
        for record in records {
            self.insert_transaction(record).await?;
        }
        Ok(removed)
    }
}

/// Local cache of rates previously fetched from the live source.
#[async_trait]
pub trait RateCacheRepository: Send + Sync {
    async fn get_rates(
        &self,
        financial_year: FinancialYear,
    ) -> Result<CachedRates, RepositoryError>;

    async fn upsert_rates(
        &self,
        rates: &CachedRates,
    ) -> Result<(), RepositoryError>;
}

/// Everything the engine needs from a backend, behind one trait object.
pub trait ScenarioStore: TransactionRepository + RateCacheRepository + RateProvider {
    fn transactions(&self) -> &dyn TransactionRepository;
    fn rate_cache(&self) -> &dyn RateCacheRepository;
    fn rate_provider(&self) -> &dyn RateProvider;
}

impl<T> ScenarioStore for T
where
    T: TransactionRepository + RateCacheRepository + RateProvider,
{
    fn transactions(&self) -> &dyn TransactionRepository {
        self
    }

    fn rate_cache(&self) -> &dyn RateCacheRepository {
        self
    }

    fn rate_provider(&self) -> &dyn RateProvider {
        self
    }
}
