//! Resolution of the corporate and R&D offset rates for one request.
//!
//! Live rates come from a [`RateProvider`]. Whatever goes wrong with the
//! provider, the resolver degrades to the versioned [`RateSchedule`] for the
//! year and still returns a usable [`TaxRateConfig`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{FinancialYear, LiveRates, RateSchedule, RateSchedules, TaxRateConfig};

/// Errors a [`RateProvider`] may report. None of them escape the resolver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateProviderError {
    #[error("rate source unavailable: {0}")]
    Unavailable(String),

    #[error("no rates published for {0}")]
    NotPublished(FinancialYear),

    #[error("malformed rate data: {0}")]
    Malformed(String),
}

/// Source of "current tax rates".
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn current_rates(
        &self,
        financial_year: FinancialYear,
    ) -> Result<LiveRates, RateProviderError>;
}

/// Produces the [`TaxRateConfig`] used by every calculator in a request.
#[derive(Clone, Copy)]
pub struct RateResolver<'a> {
    provider: Option<&'a dyn RateProvider>,
    schedules: &'a RateSchedules,
}

impl<'a> RateResolver<'a> {
    pub fn new(
        provider: Option<&'a dyn RateProvider>,
        schedules: &'a RateSchedules,
    ) -> Self {
        Self {
            provider,
            schedules,
        }
    }

    /// A resolver that never consults a live source.
    pub fn fallback_only(schedules: &'a RateSchedules) -> Self {
        Self::new(None, schedules)
    }

    /// Resolves the rates for `financial_year`.
    ///
    /// Never fails. Provider errors, missing fields and out-of-range rates all
    /// fall back to the schedule constants. When `passive_income_percentage`
    /// exceeds the schedule's passive income limit the small rate is replaced
    /// by the standard rate.
    pub async fn resolve(
        &self,
        financial_year: FinancialYear,
        passive_income_percentage: Option<Decimal>,
    ) -> TaxRateConfig {
        let schedule = self.schedules.for_year(financial_year);

        let mut config = match self.live_config(financial_year, schedule).await {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    financial_year = %financial_year,
                    error = %e,
                    source = %schedule.fallback_source(),
                    "Live tax rates unavailable, using fallback schedule"
                );
                schedule.fallback_config(financial_year)
            }
        };

        if exceeds_passive_limit(schedule, passive_income_percentage) {
            debug!(
                financial_year = %financial_year,
                "Passive income above base rate entity limit, applying standard rate"
            );
            config.corporate_tax_rate_small = config.corporate_tax_rate_standard;
        }

        config
    }

    async fn live_config(
        &self,
        financial_year: FinancialYear,
        schedule: &RateSchedule,
    ) -> Result<TaxRateConfig, RateProviderError> {
        let provider = self
            .provider
            .ok_or_else(|| RateProviderError::Unavailable("no rate provider configured".into()))?;

        let live = provider.current_rates(financial_year).await?;

        let small = required_rate(live.corporate_tax_rate_small, "corporateTaxRateSmall")?;
        let standard = required_rate(live.corporate_tax_rate_standard, "corporateTaxRateStandard")?;
        let rnd = required_rate(
            live.rnd_offset_rate_small_business.or(live.rnd_offset_rate),
            "rndOffsetRate",
        )?;
        let source = live
            .sources
            .corporate_tax
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| RateProviderError::Malformed("missing sources.corporateTax".into()))?;

        debug!(
            financial_year = %financial_year,
            %small,
            %standard,
            %rnd,
            cache_hit = live.cache_hit,
            "Resolved live tax rates"
        );

        Ok(TaxRateConfig {
            financial_year,
            corporate_tax_rate_small: small,
            corporate_tax_rate_standard: standard,
            rnd_offset_rate: rnd,
            source,
            verified_at: live.fetched_at,
            cache_hit: live.cache_hit,
            small_business_threshold: schedule.small_business_threshold,
            passive_income_limit: schedule.passive_income_limit,
            instant_asset_write_off_threshold: schedule.instant_asset_write_off_threshold,
        })
    }
}

/// True when the passive income percentage disqualifies base rate entity status.
pub fn exceeds_passive_limit(
    schedule: &RateSchedule,
    passive_income_percentage: Option<Decimal>,
) -> bool {
    passive_income_percentage.is_some_and(|p| p > schedule.passive_income_limit)
}

fn required_rate(
    value: Option<Decimal>,
    field: &str,
) -> Result<Decimal, RateProviderError> {
    let rate = value.ok_or_else(|| RateProviderError::Malformed(format!("missing {field}")))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(RateProviderError::Malformed(format!(
            "{field} out of range: {rate}"
        )));
    }
    Ok(rate)
}
