use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::auth::PasswordPolicy;

/// Minimum signing secret length accepted in production
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Longest accepted access-token lifetime (one week)
pub const MAX_TOKEN_TTL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("JWT_SECRET must be at least 32 bytes in production")]
    WeakSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub password: PasswordPolicy,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: jsonwebtoken::Algorithm,
    pub token_ttl_minutes: u64,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppConfig {
    /// Build configuration from an arbitrary key lookup. Profile defaults are
    /// selected by `APP_ENV` and then overridden key by key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("NOTES_API_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("NOTES_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse_or("NOTES_API_PORT", &v, self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("NOTES_STORE") {
            self.database.backend = v
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "NOTES_STORE", value: v.clone() })?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_or("DATABASE_MAX_CONNECTIONS", &v, self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                parse_or("DATABASE_CONNECTION_TIMEOUT", &v, self.database.connection_timeout_secs);
        }

        // API overrides
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes =
                parse_or("API_MAX_REQUEST_SIZE_BYTES", &v, self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_ALGORITHM") {
            self.security.jwt_algorithm = parse_algorithm(&v)?;
        }
        if let Some(v) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.token_ttl_minutes =
                parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", &v, self.security.token_ttl_minutes);
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Password policy overrides
        if let Some(v) = lookup("PASSWORD_MIN_LENGTH") {
            self.password.min_length = parse_or("PASSWORD_MIN_LENGTH", &v, self.password.min_length);
        }
        if let Some(v) = lookup("PASSWORD_MAX_LENGTH") {
            self.password.max_length = v.parse().ok().filter(|n: &usize| *n > 0);
        }
        if let Some(v) = lookup("PASSWORD_REQUIRE_DIGIT") {
            self.password.require_digit = parse_or("PASSWORD_REQUIRE_DIGIT", &v, self.password.require_digit);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment == Environment::Production
            && self.security.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN
        {
            return Err(ConfigError::WeakSecret);
        }
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let ttl = self.security.token_ttl_minutes;
        if ttl == 0 || ttl > MAX_TOKEN_TTL_MINUTES {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: ttl.to_string(),
            });
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 8000 },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: jsonwebtoken::Algorithm::HS256,
                token_ttl_minutes: 30,
                cors_origins: vec!["*".to_string()],
            },
            password: PasswordPolicy {
                min_length: 1,
                max_length: None,
                require_digit: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            password: PasswordPolicy {
                min_length: 8,
                max_length: Some(128),
                require_digit: false,
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: jsonwebtoken::Algorithm::HS256,
                token_ttl_minutes: 15,
                cors_origins: vec!["*".to_string()],
            },
            password: PasswordPolicy {
                min_length: 8,
                max_length: Some(128),
                require_digit: true,
            },
            ..Self::development()
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: &str, current: T) -> T {
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("Ignoring unparseable value for {}: {:?}", key, raw);
            current
        }
    }
}

fn parse_algorithm(raw: &str) -> Result<jsonwebtoken::Algorithm, ConfigError> {
    use jsonwebtoken::Algorithm;

    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::Invalid { key: "JWT_ALGORITHM", value: raw.to_string() }),
    }
}
