use serde::{Deserialize, Serialize};
use std::env;

/// Secret used when no session secret is configured outside production.
pub const DEVELOPMENT_SESSION_SECRET: &str = "openshelter-development-secret";

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Pool slots for the process-wide handle.
    pub max_connections: u32,
    /// Seconds to wait for a connection before giving up.
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("OPENSHELTER_HOST") {
            self.server.host = v;
        }
        if let Some(port) = lookup("OPENSHELTER_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("SESSION_SECRET").or_else(|| lookup("AUTH_SECRET")) {
            self.security.session_secret = v;
        }
        if let Some(v) = lookup("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Some(v) = lookup("SESSION_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }

        self
    }

    /// Reject configurations that must not be served. A pool size of 0 is
    /// not an error; the pool settings clamp it to one slot.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.security.session_secret.is_empty() {
            anyhow::bail!("SESSION_SECRET must be set when APP_ENV is {:?}", self.environment);
        }
        if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&self.security.session_expiry_hours) {
            anyhow::bail!(
                "SESSION_EXPIRY_HOURS must be between 1 and {}, got {}",
                MAX_SESSION_EXPIRY_HOURS,
                self.security.session_expiry_hours
            );
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections: 1,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                cookie_secure: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections: 1,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: Vec::new(),
                session_secret: String::new(),
                session_expiry_hours: 24,
                cookie_secure: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections: 1,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: Vec::new(),
                session_secret: String::new(),
                session_expiry_hours: 8,
                cookie_secure: true,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}
