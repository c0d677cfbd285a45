use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

/// Environment variables consulted for the connection string, in order.
pub const DATABASE_URL_VARS: [&str; 2] = ["DATABASE_URL", "POSTGRES_URL"];

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Key lookup used to find the connection string. Production reads the
/// process environment.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub fn process_env() -> EnvLookup {
    Arc::new(|key: &str| std::env::var(key).ok())
}

/// Find the connection string and check its scheme. Never touches the network.
pub fn resolve_database_url(lookup: &dyn Fn(&str) -> Option<String>) -> Result<String, DatabaseError> {
    let raw = DATABASE_URL_VARS
        .iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .ok_or(DatabaseError::ConfigMissing("DATABASE_URL (or POSTGRES_URL)"))?;
    let raw = raw.trim().to_string();

    let url = url::Url::parse(&raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(raw),
        _ => Err(DatabaseError::InvalidDatabaseUrl),
    }
}

/// Connection string with the password masked, for logs.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&DatabaseConfig> for PoolSettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections.max(1),
            acquire_timeout: Duration::from_secs(config.connection_timeout),
        }
    }
}

/// Builds the pooled client. Called at most once per `LazyDatabase`.
#[async_trait]
pub trait PoolConnector: Send + Sync {
    async fn connect(&self, url: &str, settings: &PoolSettings) -> Result<PgPool, DatabaseError>;
}

/// Connector that opens a real PostgreSQL pool.
pub struct PgConnector;

#[async_trait]
impl PoolConnector for PgConnector {
    async fn connect(&self, url: &str, settings: &PoolSettings) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await?;
        Ok(pool)
    }
}

/// Database handle that builds its pool on first use.
///
/// Constructing a `LazyDatabase` does no I/O. The first call to [`pool`]
/// resolves the connection string and runs the connector; every later call
/// returns the cached pool. Concurrent first calls wait on the same
/// initialization, so the connector runs once per handle.
///
/// [`pool`]: LazyDatabase::pool
pub struct LazyDatabase {
    lookup: EnvLookup,
    connector: Arc<dyn PoolConnector>,
    settings: PoolSettings,
    pool: OnceCell<PgPool>,
}

impl LazyDatabase {
    pub fn new(lookup: EnvLookup, connector: Arc<dyn PoolConnector>, settings: PoolSettings) -> Self {
        Self {
            lookup,
            connector,
            settings,
            pool: OnceCell::new(),
        }
    }

    /// Handle reading the process environment and connecting to PostgreSQL.
    pub fn from_env(settings: PoolSettings) -> Self {
        Self::new(process_env(), Arc::new(PgConnector), settings)
    }

    pub async fn pool(&self) -> Result<&PgPool, DatabaseError> {
        self.pool.get_or_try_init(|| self.open()).await
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }

    async fn open(&self) -> Result<PgPool, DatabaseError> {
        let url = resolve_database_url(&*self.lookup)?;
        debug!("Opening database pool for {}", redact_url(&url));

        let pool = self.connector.connect(&url, &self.settings).await?;

        info!(
            "Created database pool ({} connection slot(s)) for {}",
            self.settings.max_connections,
            redact_url(&url)
        );
        Ok(pool)
    }
}

impl std::fmt::Debug for LazyDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyDatabase")
            .field("settings", &self.settings)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
