use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration, built once in `main` and handed to the router
/// through axum state. Nothing reads the process environment after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub admin: AdminConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,
    /// Absolute origin used when generating sitemap URLs.
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Memory,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Path of the single-file development store.
    pub sqlite_path: String,
    /// Connection URL of the remote managed database.
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionBackend {
    Memory,
    Sql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub ttl_hours: i64,
    /// Secret mixed into the session cookie signature.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadMode {
    /// Write re-encoded images under `dir`, serve them at /uploads.
    Disk,
    /// Return base64 data URLs for read-only-filesystem deployments.
    Inline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub mode: UploadMode,
    pub dir: String,
    pub max_files: usize,
    pub max_file_bytes: usize,
    /// Images larger than this on either axis are scaled down before encoding.
    pub max_dimension: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.http.port = v.parse().unwrap_or(self.http.port);
        }
        if let Ok(v) = env::var("BASE_URL") {
            self.http.base_url = v;
        }

        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.storage.backend = match v.as_str() {
                "memory" => StorageBackend::Memory,
                "sqlite" => StorageBackend::Sqlite,
                "postgres" => StorageBackend::Postgres,
                other => {
                    tracing::warn!("unknown STORAGE_BACKEND '{}', keeping default", other);
                    self.storage.backend
                }
            };
        }
        if let Ok(v) = env::var("SQLITE_PATH") {
            self.storage.sqlite_path = v;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.storage.database_url = Some(v);
        }
        // A configured remote URL implies the remote backend unless overridden
        if self.storage.database_url.is_some() && env::var("STORAGE_BACKEND").is_err() {
            self.storage.backend = StorageBackend::Postgres;
        }

        if let Ok(v) = env::var("SESSION_STORE") {
            self.session.backend = match v.as_str() {
                "memory" => SessionBackend::Memory,
                "sql" => SessionBackend::Sql,
                other => {
                    tracing::warn!("unknown SESSION_STORE '{}', keeping default", other);
                    self.session.backend
                }
            };
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.session.ttl_hours = v.parse().unwrap_or(self.session.ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = v;
        }

        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.admin.email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.admin.password = Some(v);
        }

        if let Ok(v) = env::var("UPLOAD_MODE") {
            self.upload.mode = match v.as_str() {
                "disk" => UploadMode::Disk,
                "inline" => UploadMode::Inline,
                other => {
                    tracing::warn!("unknown UPLOAD_MODE '{}', keeping default", other);
                    self.upload.mode
                }
            };
        }
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.upload.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILES") {
            self.upload.max_files = v.parse().unwrap_or(self.upload.max_files);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILE_BYTES") {
            self.upload.max_file_bytes = v.parse().unwrap_or(self.upload.max_file_bytes);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_DIMENSION") {
            self.upload.max_dimension = v.parse().unwrap_or(self.upload.max_dimension);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            http: HttpConfig {
                port: 3000,
                base_url: "http://localhost:3000".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                sqlite_path: "imovia.db".to_string(),
                database_url: None,
            },
            session: SessionConfig {
                backend: SessionBackend::Sql,
                ttl_hours: 24 * 7,
                secret: "dev-session-secret".to_string(),
            },
            admin: AdminConfig { email: None, password: None },
            upload: UploadConfig {
                mode: UploadMode::Disk,
                dir: "uploads".to_string(),
                max_files: 10,
                max_file_bytes: 5 * 1024 * 1024,
                max_dimension: 1600,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            http: HttpConfig {
                port: 3000,
                base_url: "https://example.com".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                sqlite_path: "imovia.db".to_string(),
                database_url: None,
            },
            session: SessionConfig {
                backend: SessionBackend::Sql,
                ttl_hours: 24,
                secret: String::new(),
            },
            admin: AdminConfig { email: None, password: None },
            upload: UploadConfig {
                mode: UploadMode::Inline,
                dir: "uploads".to_string(),
                max_files: 10,
                max_file_bytes: 5 * 1024 * 1024,
                max_dimension: 1600,
            },
        }
    }

    /// Hermetic defaults for in-process tests: everything ephemeral.
    pub fn test() -> Self {
        Self {
            environment: Environment::Development,
            http: HttpConfig {
                port: 0,
                base_url: "http://testserver".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                sqlite_path: ":memory:".to_string(),
                database_url: None,
            },
            session: SessionConfig {
                backend: SessionBackend::Memory,
                ttl_hours: 1,
                secret: "test-secret".to_string(),
            },
            admin: AdminConfig { email: None, password: None },
            upload: UploadConfig {
                mode: UploadMode::Inline,
                dir: "uploads".to_string(),
                max_files: 3,
                max_file_bytes: 1024 * 1024,
                max_dimension: 640,
            },
        }
    }
}
