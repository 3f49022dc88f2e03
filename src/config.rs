use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub node: NodeConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory blobs are written to
    pub upload_dir: String,
    /// Upper bound on a single metadata or blob store operation
    pub store_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
    /// Lowercase file extensions accepted on upload, without the dot
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 30 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: "./uploads".to_string(),
            store_timeout: Duration::from_millis(5000),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let store_timeout_ms = std::env::var("STORE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE);

        let allowed_extensions = std::env::var("ALLOWED_EXTENSIONS")
            .map(|v| parse_extensions(&v))
            .unwrap_or_else(|_| UploadConfig::default().allowed_extensions);

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!(
                    "JWT_SECRET is not set; using a random secret. \
                     Issued tokens will not survive a restart."
                );
                format!(
                    "{}{}",
                    uuid::Uuid::new_v4().simple(),
                    uuid::Uuid::new_v4().simple()
                )
            }
        };

        let token_ttl_days = std::env::var("TOKEN_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);

        let config = Config {
            auth: AuthConfig {
                jwt_secret,
                token_ttl_days,
            },
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                upload_dir,
                store_timeout: Duration::from_millis(store_timeout_ms),
            },
            upload: UploadConfig {
                max_upload_size,
                allowed_extensions,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "ALLOWED_EXTENSIONS cannot be empty".to_string(),
            ));
        }

        if self.storage.store_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "STORE_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT_SECRET cannot be empty".to_string(),
            ));
        }

        if self.auth.token_ttl_days <= 0 {
            return Err(ConfigError::ValidationError(
                "TOKEN_TTL_DAYS must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Split a comma-separated extension list, dropping dots and normalizing case.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                jwt_secret: "secret".to_string(),
                token_ttl_days: 7,
            },
            node: NodeConfig {
                bind_address: "127.0.0.1:0".to_string(),
                data_dir: "./data".to_string(),
            },
            storage: StorageConfig::default(),
            upload: UploadConfig::default(),
        }
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(
            parse_extensions(" .PDF, docx,,png "),
            vec!["pdf".to_string(), "docx".to_string(), "png".to_string()]
        );
    }

    #[test]
    fn test_default_upload_limits() {
        let upload = UploadConfig::default();
        assert_eq!(upload.max_upload_size, 30 * 1024 * 1024);
        assert!(upload.allowed_extensions.contains(&"jpeg".to_string()));
        assert!(!upload.allowed_extensions.contains(&"exe".to_string()));
    }

    #[test]
    fn test_validate_rejects_empty_allow_list() {
        let mut config = valid_config();
        config.upload.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_upload_size() {
        let mut config = valid_config();
        config.upload.max_upload_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }
}
