use std::path::PathBuf;

use async_trait::async_trait;
use scenario_core::db::{DbConfig, RepositoryFactory};
use scenario_core::{RepositoryError, ScenarioStore};
use tracing::info;

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`SCENARIO_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir** (`$CARGO_MANIFEST_DIR/seeds`) as last resort.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SCENARIO_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Map a connection string to a sqlx URL.
///
/// * `":memory:"` becomes `sqlite::memory:`.
/// * Strings already starting with `sqlite:` pass through.
/// * Anything else is a file path, created if missing.
pub fn database_url(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        "sqlite::memory:".to_string()
    } else if connection_string.starts_with("sqlite:") {
        connection_string.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", connection_string)
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use scenario_core::db::RepositoryRegistry;
/// use scenario_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database, run migrations and apply seed files from
    /// [`seeds_dir`].
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ScenarioStore>, RepositoryError> {
        let url = database_url(&config.connection_string);
        let repo = SqliteRepository::new(&url)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        repo.run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(database = %url, seeds = %seeds.display(), "Opened SQLite scenario store");
        Ok(Box::new(repo))
    }
}
