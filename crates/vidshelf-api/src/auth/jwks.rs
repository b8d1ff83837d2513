//! JWKS (JSON Web Key Set) key store with caching
//!
//! Verification keys for RS256/ES256 session tokens are fetched from the
//! identity provider's JWKS endpoint and cached as a whole set. An unknown key
//! id refetches the set so rotated keys are picked up without a restart, but
//! never more than once per `MIN_REFETCH_SECS`.

use chrono::{DateTime, Utc};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use vidshelf_core::AppError;

/// Minimum time between two fetches of the key set.
const MIN_REFETCH_SECS: i64 = 30;

/// JWKS structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>, // For RSA
    #[serde(rename = "e")]
    pub exponent: Option<String>, // For RSA
    #[serde(rename = "x")]
    pub x_coordinate: Option<String>, // For EC
    #[serde(rename = "y")]
    pub y_coordinate: Option<String>, // For EC
    #[serde(rename = "crv")]
    pub curve: Option<String>, // For EC
}

/// Keys from one JWKS fetch.
struct KeySet {
    by_kid: HashMap<String, DecodingKey>,
    /// First usable key, for tokens without a `kid`.
    default: Option<DecodingKey>,
    fetched_at: DateTime<Utc>,
}

impl KeySet {
    fn from_jwks(jwks: &Jwks, fetched_at: DateTime<Utc>) -> Self {
        let mut by_kid = HashMap::new();
        let mut default = None;
        for jwk in &jwks.keys {
            match jwk_to_decoding_key(jwk) {
                Ok(key) => {
                    if default.is_none() {
                        default = Some(key.clone());
                    }
                    if let Some(kid) = &jwk.key_id {
                        by_kid.insert(kid.clone(), key);
                    }
                }
                Err(e) => {
                    tracing::debug!(kid = ?jwk.key_id, error = %e, "Skipping unusable JWK");
                }
            }
        }
        Self {
            by_kid,
            default,
            fetched_at,
        }
    }

    fn get(&self, kid: Option<&str>) -> Option<DecodingKey> {
        match kid {
            Some(kid) => self.by_kid.get(kid).cloned(),
            None => self.default.clone(),
        }
    }
}

/// Cached view of a remote JWKS endpoint.
pub struct JwksKeyStore {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<KeySet>>>,
    cache_ttl_seconds: i64,
    min_refetch_seconds: i64,
}

impl JwksKeyStore {
    pub fn new(jwks_url: String, cache_ttl_seconds: i64) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create JWKS client: {}", e)))?;

        Ok(Self {
            jwks_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl_seconds,
            min_refetch_seconds: MIN_REFETCH_SECS,
        })
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse JWKS: {}", e)))
    }

    fn is_fresh(&self, set: &KeySet, now: DateTime<Utc>) -> bool {
        set.fetched_at + chrono::Duration::seconds(self.cache_ttl_seconds) > now
    }

    fn recently_fetched(&self, set: &KeySet, now: DateTime<Utc>) -> bool {
        set.fetched_at + chrono::Duration::seconds(self.min_refetch_seconds) > now
    }

    /// Decoding key for `kid`, served from the cached key set while fresh.
    ///
    /// An unknown `kid` refetches the set, at most once per `MIN_REFETCH_SECS`.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(set) = cache.as_ref() {
                let now = Utc::now();
                if self.is_fresh(set, now) || self.recently_fetched(set, now) {
                    if let Some(key) = set.get(kid) {
                        return Ok(key);
                    }
                }
                if self.recently_fetched(set, now) {
                    return Err(key_not_found(kid));
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed the set while we waited for the lock.
        let refreshed = cache
            .as_ref()
            .is_some_and(|set| self.recently_fetched(set, Utc::now()));
        if !refreshed {
            let jwks = self.fetch_jwks().await?;
            *cache = Some(KeySet::from_jwks(&jwks, Utc::now()));
        }

        cache
            .as_ref()
            .and_then(|set| set.get(kid))
            .ok_or_else(|| key_not_found(kid))
    }
}

fn key_not_found(kid: Option<&str>) -> AppError {
    match kid {
        Some(kid) => AppError::Unauthorized(format!("Key ID {} not found in JWKS", kid)),
        None => AppError::Unauthorized("No keys found in JWKS".to_string()),
    }
}

/// Convert a JWK to a `DecodingKey`.
pub fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
    match jwk.key_type.as_str() {
        "RSA" => {
            let n = jwk
                .modulus
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("RSA key missing modulus".to_string()))?;
            let e = jwk
                .exponent
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("RSA key missing exponent".to_string()))?;
            DecodingKey::from_rsa_components(n, e)
                .map_err(|e| AppError::Unauthorized(format!("Failed to create RSA key: {}", e)))
        }
        "EC" => {
            let x = jwk
                .x_coordinate
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("EC key missing x coordinate".to_string()))?;
            let y = jwk
                .y_coordinate
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("EC key missing y coordinate".to_string()))?;
            let curve = jwk
                .curve
                .as_deref()
                .ok_or_else(|| AppError::Unauthorized("EC key missing curve".to_string()))?;
            if curve != "P-256" {
                return Err(AppError::Unauthorized(format!(
                    "Unsupported EC curve: {} (only P-256 is supported)",
                    curve
                )));
            }
            DecodingKey::from_ec_components(x, y)
                .map_err(|e| AppError::Unauthorized(format!("Failed to create EC key: {}", e)))
        }
        other => Err(AppError::Unauthorized(format!(
            "Unsupported key type: {}",
            other
        ))),
    }
}
