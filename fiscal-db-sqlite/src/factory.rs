use std::path::PathBuf;

use async_trait::async_trait;
use fiscal_core::db::{DbConfig, FiscalRepository, RepositoryError, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Environment variable that overrides the seeds directory.
pub const SEEDS_DIR_ENV: &str = "FISCAL_DB_SQLITE_SEEDS_DIR";

/// Resolve the seeds directory at runtime so it works both from the build
/// tree and from a packaged install.
///
/// Resolution order:
/// 1. **`FISCAL_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if it exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as a last resort.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use fiscal_core::db::RepositoryRegistry;
/// use fiscal_db_sqlite::SqliteRepositoryFactory;
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

    /// Opens `config.connection_string` (a path, a `sqlite:` URL or
    /// `:memory:`), runs migrations and applies the seed files.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FiscalRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
