use std::path::Path;

use anyhow::{Context, Result};
use scenario_core::calculations::{
    ConsistencyIssue, ScenarioEngine, ScenarioError, verify_base, verify_scenario,
};
use scenario_core::db::{DbConfig, RepositoryRegistry};
use scenario_core::{ScenarioAnalysis, ScenarioRequest, ScenarioStore};
use scenario_data::ScenarioRequestFile;
use scenario_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

/// Every backend this binary can talk to.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_store(config: &DbConfig) -> Result<Box<dyn ScenarioStore>> {
    let registry = build_registry();
    debug!(backends = ?registry.available_backends(), "Registered backends");

    registry
        .create(config)
        .await
        .with_context(|| {
            format!(
                "Failed to open {} database '{}'",
                config.backend, config.connection_string
            )
        })
}

/// Reads and validates a TOML request file.
pub fn load_request(path: &Path) -> Result<ScenarioRequest> {
    let request = ScenarioRequestFile::read(path)
        .and_then(ScenarioRequestFile::into_request)
        .with_context(|| format!("Invalid scenario request: {}", path.display()))?;

    info!(
        base_year = %request.base_year,
        scenarios = request.scenarios.len(),
        "Loaded scenario request"
    );
    Ok(request)
}

/// Runs the engine against `store`.
///
/// With `use_rate_cache` off the store's cached rates are ignored and the
/// built-in schedule for the year is used.
pub async fn run_analysis(
    store: &dyn ScenarioStore,
    request: &ScenarioRequest,
    use_rate_cache: bool,
) -> Result<ScenarioAnalysis, ScenarioError> {
    let engine = ScenarioEngine::new(store.transactions());
    let engine = if use_rate_cache {
        engine.with_rate_provider(store.rate_provider())
    } else {
        engine
    };
    engine.analyse(request).await
}

/// Recomputes the invariants of every figure in `analysis`.
pub fn verify(analysis: &ScenarioAnalysis) -> Vec<ConsistencyIssue> {
    let mut issues = verify_base(&analysis.base, &analysis.rates);
    for scenario in &analysis.scenarios {
        issues.extend(verify_scenario(&analysis.base, scenario, &analysis.rates));
    }
    issues
}
