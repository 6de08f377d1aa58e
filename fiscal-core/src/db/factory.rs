use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{FiscalRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is handed to that factory as is.
///
/// | backend    | connection_string examples                  |
/// |------------|---------------------------------------------|
/// | `sqlite`   | `fiscal.db`, `sqlite://fiscal.db`, `:memory:` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// One implementation per database backend, registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) a connection and return a ready-to-use repository.
    /// Implementations may run migrations and seeds here.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn FiscalRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FiscalRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::models::{BracketTableCode, FiscalYearConfig, TaxBracket};

    use super::{DbConfig, FiscalRepository, RepositoryError, RepositoryFactory, RepositoryRegistry};

    // Routing tests never touch the data, so every call reports NotFound.
    struct EmptyRepository;

    #[async_trait]
    impl FiscalRepository for EmptyRepository {
        async fn get_fiscal_year_config(
            &self,
            _year: i32,
        ) -> Result<FiscalYearConfig, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_fiscal_years(&self) -> Result<Vec<i32>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn get_tax_brackets(
            &self,
            _fiscal_year: i32,
            _table: BracketTableCode,
        ) -> Result<Vec<TaxBracket>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn list_tax_brackets(
            &self,
            _fiscal_year: i32,
        ) -> Result<Vec<TaxBracket>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn insert_tax_bracket(
            &self,
            _bracket: &TaxBracket,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn delete_tax_brackets(
            &self,
            _fiscal_year: i32,
            _table: BracketTableCode,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    /// Flips `called` so tests can prove `create` was reached.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn FiscalRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(EmptyRepository))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn FiscalRepository>, RepositoryError> {
            Err(RepositoryError::Connection("database is locked".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config_for(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: "fiscal.db".to_string(),
        }
    }

    #[test]
    fn dbconfig_default_is_sqlite_memory() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, ":memory:");
    }

    #[test]
    fn default_registry_is_empty() {
        assert!(RepositoryRegistry::default().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted_and_deduplicated() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("postgres");
        let (f3, _) = stub_factory("sqlite");
        reg.register(f1);
        reg.register(f2);
        reg.register(f3);

        assert_eq!(reg.available_backends(), vec!["postgres", "sqlite"]);
    }

    #[tokio::test]
    async fn create_routes_to_matching_factory_only() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (postgres, postgres_called) = stub_factory("postgres");
        reg.register(sqlite);
        reg.register(postgres);

        let repo = reg.create(&config_for("sqlite")).await.unwrap();

        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!postgres_called.load(Ordering::SeqCst));
        assert_eq!(repo.list_fiscal_years().await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available_backends() {
        let mut reg = RepositoryRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config_for("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.contains("sqlite"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let result = reg.create(&config_for("failing")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Connection(msg)) if msg == "database is locked"
        ));
    }
}
