use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FinancialYear;

/// Legislated rates and thresholds for a single financial year.
///
/// Schedules are the fallback used whenever the live rate source cannot
/// answer. Supporting a new year means adding a schedule, not touching the
/// calculators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub financial_year: FinancialYear,

    /// Corporate rate for base rate entities (s 23AA ITAA 1997).
    pub corporate_tax_rate_small: Decimal,

    /// Corporate rate for every other company.
    pub corporate_tax_rate_standard: Decimal,

    /// Refundable R&D tax offset rate (Division 355).
    pub rnd_offset_rate: Decimal,

    /// Taxable income below this uses the base rate entity rate.
    pub small_business_threshold: Decimal,

    /// Passive income percentage above which base rate entity status is lost.
    pub passive_income_limit: Decimal,

    /// Per-asset cost limit for the instant asset write-off.
    pub instant_asset_write_off_threshold: Decimal,
}

impl RateSchedule {
    /// Rates published for the 2024-25 income year.
    pub fn fy2024_25() -> Self {
        Self {
            financial_year: FinancialYear::new_unchecked(2024),
            corporate_tax_rate_small: Decimal::new(25, 2),
            corporate_tax_rate_standard: Decimal::new(30, 2),
            rnd_offset_rate: Decimal::new(435, 3),
            small_business_threshold: Decimal::from(50_000_000),
            passive_income_limit: Decimal::from(80),
            instant_asset_write_off_threshold: Decimal::from(20_000),
        }
    }

    /// Provenance label attached to configs built from this schedule.
    pub fn fallback_source(&self) -> String {
        format!("fallback_{}", self.financial_year)
    }

    /// Builds a rate config for `financial_year` from the hardcoded values.
    pub fn fallback_config(
        &self,
        financial_year: FinancialYear,
    ) -> TaxRateConfig {
        TaxRateConfig {
            financial_year,
            corporate_tax_rate_small: self.corporate_tax_rate_small,
            corporate_tax_rate_standard: self.corporate_tax_rate_standard,
            rnd_offset_rate: self.rnd_offset_rate,
            source: self.fallback_source(),
            verified_at: None,
            cache_hit: false,
            small_business_threshold: self.small_business_threshold,
            passive_income_limit: self.passive_income_limit,
            instant_asset_write_off_threshold: self.instant_asset_write_off_threshold,
        }
    }
}

/// The set of known [`RateSchedule`]s, ordered by financial year.
///
/// Never empty: it starts from the built-in schedules and only grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSchedules {
    schedules: Vec<RateSchedule>,
}

impl RateSchedules {
    /// Adds a schedule, replacing any existing schedule for the same year.
    pub fn insert(
        &mut self,
        schedule: RateSchedule,
    ) {
        self.schedules
            .retain(|s| s.financial_year != schedule.financial_year);
        self.schedules.push(schedule);
        self.schedules.sort_by_key(|s| s.financial_year);
    }

    /// The schedule for `financial_year`, or the most recent earlier one.
    /// Years before every known schedule get the earliest schedule.
    pub fn for_year(
        &self,
        financial_year: FinancialYear,
    ) -> &RateSchedule {
        self.schedules
            .iter()
            .rev()
            .find(|s| s.financial_year <= financial_year)
            .unwrap_or(&self.schedules[0])
    }
}

impl Default for RateSchedules {
    fn default() -> Self {
        Self {
            schedules: vec![RateSchedule::fy2024_25()],
        }
    }
}

/// Resolved, immutable rate configuration for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRateConfig {
    pub financial_year: FinancialYear,
    pub corporate_tax_rate_small: Decimal,
    pub corporate_tax_rate_standard: Decimal,
    pub rnd_offset_rate: Decimal,
    pub source: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub cache_hit: bool,
    pub small_business_threshold: Decimal,
    pub passive_income_limit: Decimal,
    pub instant_asset_write_off_threshold: Decimal,
}

impl TaxRateConfig {
    /// Corporate rate applicable to `taxable_income`.
    ///
    /// Aggregated turnover is approximated by taxable income.
    pub fn rate_for(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        if taxable_income < self.small_business_threshold {
            self.corporate_tax_rate_small
        } else {
            self.corporate_tax_rate_standard
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source.starts_with("fallback_")
    }
}

/// Provenance block returned by the live rate source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSources {
    pub corporate_tax: Option<String>,
}

/// Response shape of the "current tax rates" source.
///
/// Every rate is optional because the source may omit fields; the resolver
/// treats a missing rate the same as an unreachable source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRates {
    pub corporate_tax_rate_small: Option<Decimal>,
    pub corporate_tax_rate_standard: Option<Decimal>,
    pub rnd_offset_rate_small_business: Option<Decimal>,
    pub rnd_offset_rate: Option<Decimal>,
    #[serde(default)]
    pub sources: RateSources,
    #[serde(default)]
    pub cache_hit: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// A row of the local rate cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRates {
    pub financial_year: FinancialYear,
    pub corporate_tax_rate_small: Decimal,
    pub corporate_tax_rate_standard: Decimal,
    pub rnd_offset_rate: Decimal,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl From<CachedRates> for LiveRates {
    fn from(cached: CachedRates) -> Self {
        Self {
            corporate_tax_rate_small: Some(cached.corporate_tax_rate_small),
            corporate_tax_rate_standard: Some(cached.corporate_tax_rate_standard),
            rnd_offset_rate_small_business: Some(cached.rnd_offset_rate),
            rnd_offset_rate: None,
            sources: RateSources {
                corporate_tax: Some(cached.source),
            },
            cache_hit: true,
            fetched_at: Some(cached.fetched_at),
        }
    }
}
