use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub pagination: PaginationConfig,
    pub ingestion: IngestionConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Destination folder in the object store
    pub namespace: String,
    pub max_concurrency: usize,
    pub max_image_bytes: usize,
    /// Best-effort delete of already-uploaded objects when a create/update fails
    pub cleanup_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    /// When set, a successful create redirects to `{public_base_url}/properties/{id}`
    pub public_base_url: Option<String>,
    /// Per-request deadline for service operations; 0 disables it
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Report owner mismatches as 401 (legacy) instead of 403
    pub legacy_owner_denied_status: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_PAGE_SIZE") {
            self.pagination.default_page_size = v.parse().unwrap_or(self.pagination.default_page_size);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_PAGE_SIZE") {
            self.pagination.max_page_size = v.parse().unwrap_or(self.pagination.max_page_size);
        }

        // Ingestion overrides
        if let Ok(v) = env::var("INGESTION_NAMESPACE") {
            if !v.trim().is_empty() {
                self.ingestion.namespace = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("INGESTION_MAX_CONCURRENCY") {
            self.ingestion.max_concurrency = v.parse().unwrap_or(self.ingestion.max_concurrency);
        }
        if let Ok(v) = env::var("INGESTION_MAX_IMAGE_BYTES") {
            self.ingestion.max_image_bytes = v.parse().unwrap_or(self.ingestion.max_image_bytes);
        }
        if let Ok(v) = env::var("INGESTION_CLEANUP_ON_FAILURE") {
            self.ingestion.cleanup_on_failure = v.parse().unwrap_or(self.ingestion.cleanup_on_failure);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_PUBLIC_BASE_URL") {
            let v = v.trim().trim_end_matches('/');
            self.api.public_base_url = if v.is_empty() { None } else { Some(v.to_string()) };
        }
        if let Ok(v) = env::var("API_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_JWT_SECRET").or_else(|_| env::var("JWT_SECRET")) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_LEGACY_OWNER_DENIED_STATUS") {
            self.security.legacy_owner_denied_status =
                v.parse().unwrap_or(self.security.legacy_owner_denied_status);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            pagination: PaginationConfig {
                default_page_size: 6,
                max_page_size: 100,
            },
            ingestion: IngestionConfig {
                namespace: "propertypulse".to_string(),
                max_concurrency: 4,
                max_image_bytes: 10 * 1024 * 1024, // 10MB
                cleanup_on_failure: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                max_request_size_bytes: 50 * 1024 * 1024, // 50MB
                public_base_url: None,
                request_timeout_secs: 120,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                legacy_owner_denied_status: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            pagination: PaginationConfig {
                default_page_size: 6,
                max_page_size: 50,
            },
            ingestion: IngestionConfig {
                namespace: "propertypulse".to_string(),
                max_concurrency: 4,
                max_image_bytes: 8 * 1024 * 1024, // 8MB
                cleanup_on_failure: true,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                max_request_size_bytes: 40 * 1024 * 1024, // 40MB
                public_base_url: None,
                request_timeout_secs: 60,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                legacy_owner_denied_status: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            pagination: PaginationConfig {
                default_page_size: 6,
                max_page_size: 50,
            },
            ingestion: IngestionConfig {
                namespace: "propertypulse".to_string(),
                max_concurrency: 8,
                max_image_bytes: 8 * 1024 * 1024, // 8MB
                cleanup_on_failure: true,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                max_request_size_bytes: 40 * 1024 * 1024, // 40MB
                public_base_url: None,
                request_timeout_secs: 60,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                legacy_owner_denied_status: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
