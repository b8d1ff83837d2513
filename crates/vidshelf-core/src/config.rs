//! Configuration module
//!
//! Configuration is read from the process environment (with `.env` support)
//! once at startup and handed to the setup code, which builds every client
//! explicitly from it.

use std::env;
use std::str::FromStr;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MEDIA_UPLOAD_FOLDER: &str = "video-uploads";
const MEDIA_UPLOAD_TIMEOUT_SECS: u64 = 600;
const JWKS_CACHE_TTL_SECS: i64 = 3600;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;

/// Server, database and environment settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// `None` leaves multipart uploads unbounded.
    pub max_upload_size_bytes: Option<usize>,
    pub http_concurrency_limit: usize,
}

/// Credentials for the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Media service settings.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// `None` when any of the three credentials is missing.
    pub credentials: Option<CloudinaryCredentials>,
    /// Some, but not all, of the three credentials are set.
    pub credentials_partial: bool,
    pub api_base: Option<String>,
    pub upload_folder: String,
    pub upload_timeout_secs: u64,
}

/// Where session token verification keys come from.
#[derive(Clone)]
pub enum AuthKeySource {
    Jwks { url: String, cache_ttl_secs: i64 },
    RsaPublicKeyPem(String),
    SharedSecret(String),
}

impl std::fmt::Debug for AuthKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthKeySource::Jwks {
                url,
                cache_ttl_secs,
            } => f
                .debug_struct("Jwks")
                .field("url", url)
                .field("cache_ttl_secs", cache_ttl_secs)
                .finish(),
            AuthKeySource::RsaPublicKeyPem(_) => f.write_str("RsaPublicKeyPem(..)"),
            AuthKeySource::SharedSecret(_) => f.write_str("SharedSecret(<redacted>)"),
        }
    }
}

/// Identity verification settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub key_source: AuthKeySource,
    pub issuer: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url =
            var("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let base = BaseConfig {
            server_port: parse_or(var("PORT"), "PORT", SERVER_PORT)?,
            cors_origins,
            environment,
            database_url,
            db_max_connections: parse_or(
                var("DB_MAX_CONNECTIONS"),
                "DB_MAX_CONNECTIONS",
                MAX_CONNECTIONS,
            )?,
            db_timeout_seconds: parse_or(
                var("DB_TIMEOUT_SECONDS"),
                "DB_TIMEOUT_SECONDS",
                CONNECTION_TIMEOUT_SECS,
            )?,
            max_upload_size_bytes: parse_opt::<usize>(var("MAX_UPLOAD_SIZE_MB"), "MAX_UPLOAD_SIZE_MB")?
                .map(|mb| {
                    mb.checked_mul(1024 * 1024)
                        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))
                })
                .transpose()?,
            http_concurrency_limit: parse_or(
                var("HTTP_CONCURRENCY_LIMIT"),
                "HTTP_CONCURRENCY_LIMIT",
                HTTP_CONCURRENCY_LIMIT,
            )?
            .max(1),
        };

        let cloud_name = var("CLOUDINARY_CLOUD_NAME")
            .or_else(|| var("NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME"));
        let api_key = var("CLOUDINARY_API_KEY");
        let api_secret = var("CLOUDINARY_API_SECRET");
        let credentials_partial = [&cloud_name, &api_key, &api_secret]
            .iter()
            .any(|v| v.is_some());
        let credentials = match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let media = MediaConfig {
            credentials_partial: credentials_partial && credentials.is_none(),
            credentials,
            api_base: var("CLOUDINARY_API_BASE"),
            upload_folder: var("MEDIA_UPLOAD_FOLDER")
                .unwrap_or_else(|| MEDIA_UPLOAD_FOLDER.to_string()),
            upload_timeout_secs: parse_or(
                var("MEDIA_UPLOAD_TIMEOUT_SECS"),
                "MEDIA_UPLOAD_TIMEOUT_SECS",
                MEDIA_UPLOAD_TIMEOUT_SECS,
            )?,
        };

        let key_source = if let Some(url) = var("AUTH_JWKS_URL") {
            AuthKeySource::Jwks {
                url,
                cache_ttl_secs: parse_or(
                    var("AUTH_JWKS_CACHE_TTL_SECS"),
                    "AUTH_JWKS_CACHE_TTL_SECS",
                    JWKS_CACHE_TTL_SECS,
                )?,
            }
        } else if let Some(pem) = var("AUTH_JWT_PUBLIC_KEY") {
            // Single-line env values carry PEM newlines escaped.
            AuthKeySource::RsaPublicKeyPem(pem.replace("\\n", "\n"))
        } else if let Some(secret) = var("AUTH_JWT_SECRET") {
            AuthKeySource::SharedSecret(secret)
        } else {
            return Err(anyhow::anyhow!(
                "One of AUTH_JWKS_URL, AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET must be set"
            ));
        };

        let auth = AuthConfig {
            key_source,
            issuer: var("AUTH_ISSUER"),
        };

        Ok(Config { base, media, auth })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.base.database_url.starts_with("postgres://")
            && !self.base.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        if self.base.db_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Database timeout cannot be 0"));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if let AuthKeySource::SharedSecret(secret) = &self.auth.key_source {
            if secret.len() < 32 {
                return Err(anyhow::anyhow!(
                    "AUTH_JWT_SECRET must be at least 32 characters long"
                ));
            }
        }

        Ok(())
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn database_url(&self) -> &str {
        &self.base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.base.db_timeout_seconds
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn max_upload_size_bytes(&self) -> Option<usize> {
        self.base.max_upload_size_bytes
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.base.http_concurrency_limit
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, anyhow::Error> {
    Ok(parse_opt(value, key)?.unwrap_or(default))
}

fn parse_opt<T: FromStr>(value: Option<String>, key: &str) -> Result<Option<T>, anyhow::Error> {
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} must be a valid number", key))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
        ])
        .expect("config");
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.db_max_connections(), 10);
        assert_eq!(config.media.upload_folder, "video-uploads");
        assert!(config.media.credentials.is_none());
        assert!(config.max_upload_size_bytes().is_none());
        assert!(!config.is_production());
        config.validate().expect("valid");
    }

    #[test]
    fn test_credentials_require_all_three() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
        ])
        .expect("config");
        assert!(config.media.credentials.is_none());
        assert!(config.media.credentials_partial);
    }

    #[test]
    fn test_public_cloud_name_fallback() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
        .expect("config");
        let creds = config.media.credentials.expect("credentials");
        assert_eq!(creds.cloud_name, "demo");
    }

    #[test]
    fn test_missing_auth_source_is_rejected() {
        let err = config_from(&[("DATABASE_URL", "postgres://localhost/vidshelf")]).unwrap_err();
        assert!(err.to_string().contains("AUTH_JWKS_URL"));
    }

    #[test]
    fn test_jwks_takes_precedence() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("AUTH_JWKS_URL", "https://example.com/.well-known/jwks.json"),
        ])
        .expect("config");
        assert!(matches!(config.auth.key_source, AuthKeySource::Jwks { .. }));
    }

    #[test]
    fn test_invalid_port_is_error() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("PORT", "abc"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_upload_limit_in_megabytes() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("MAX_UPLOAD_SIZE_MB", "2"),
        ])
        .expect("config");
        assert_eq!(config.max_upload_size_bytes(), Some(2 * 1024 * 1024));
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("ENVIRONMENT", "production"),
        ])
        .expect("config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", "short"),
        ])
        .expect("config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_upload_limit_overflow_is_rejected() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("MAX_UPLOAD_SIZE_MB", usize::MAX.to_string().as_str()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_SIZE_MB is too large"));
    }

    #[test]
    fn test_complete_or_absent_credentials_are_not_partial() {
        let unset = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
        ])
        .expect("config");
        assert!(!unset.media.credentials_partial);

        let complete = config_from(&[
            ("DATABASE_URL", "postgres://localhost/vidshelf"),
            ("AUTH_JWT_SECRET", SECRET),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
        .expect("config");
        assert!(complete.media.credentials.is_some());
        assert!(!complete.media.credentials_partial);
    }
}
