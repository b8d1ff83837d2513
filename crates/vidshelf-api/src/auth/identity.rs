//! Identity provider: "current authenticated user id, or none".

use crate::auth::jwks::JwksKeyStore;
use crate::auth::models::{SessionClaims, UserId};
use crate::constants::SESSION_COOKIE;
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use vidshelf_core::{AppError, AuthConfig, AuthKeySource};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The authenticated user behind this request, if any.
    async fn current_user(&self, headers: &HeaderMap) -> Option<UserId>;
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            let (scheme, token) = h.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

enum VerificationKeys {
    Static {
        key: DecodingKey,
        algorithm: Algorithm,
    },
    Jwks(JwksKeyStore),
}

/// Verifies signed session tokens and reads the user id from `sub`.
pub struct JwtIdentityProvider {
    keys: VerificationKeys,
    issuer: Option<String>,
}

impl JwtIdentityProvider {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        let keys = match &config.key_source {
            AuthKeySource::Jwks {
                url,
                cache_ttl_secs,
            } => VerificationKeys::Jwks(JwksKeyStore::new(url.clone(), *cache_ttl_secs)?),
            AuthKeySource::RsaPublicKeyPem(pem) => VerificationKeys::Static {
                key: DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::Configuration(format!("Invalid AUTH_JWT_PUBLIC_KEY: {}", e))
                })?,
                algorithm: Algorithm::RS256,
            },
            AuthKeySource::SharedSecret(secret) => VerificationKeys::Static {
                key: DecodingKey::from_secret(secret.as_bytes()),
                algorithm: Algorithm::HS256,
            },
        };

        Ok(Self {
            keys,
            issuer: config.issuer.clone(),
        })
    }

    /// HS256 verification with a shared secret.
    pub fn with_shared_secret(secret: &str) -> Self {
        Self {
            keys: VerificationKeys::Static {
                key: DecodingKey::from_secret(secret.as_bytes()),
                algorithm: Algorithm::HS256,
            },
            issuer: None,
        }
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_nbf = true;
        if let Some(issuer) = &self.issuer {
            // `set_issuer` alone accepts tokens that omit `iss`.
            validation.set_required_spec_claims(&["exp", "sub", "iss"]);
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    /// Validate and decode a session token.
    pub async fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        let (key, algorithm) = match &self.keys {
            VerificationKeys::Static { key, algorithm } => {
                if header.alg != *algorithm {
                    return Err(AppError::Unauthorized(format!(
                        "Unexpected token algorithm: {:?}",
                        header.alg
                    )));
                }
                (key.clone(), *algorithm)
            }
            VerificationKeys::Jwks(store) => {
                if !matches!(header.alg, Algorithm::RS256 | Algorithm::ES256) {
                    return Err(AppError::Unauthorized(format!(
                        "Unsupported token algorithm: {:?}",
                        header.alg
                    )));
                }
                (store.decoding_key(header.kid.as_deref()).await?, header.alg)
            }
        };

        let data = decode::<SessionClaims>(token, &key, &self.validation(algorithm))
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }

        Ok(data.claims)
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn current_user(&self, headers: &HeaderMap) -> Option<UserId> {
        let token = extract_session_token(headers)?;
        match self.verify(&token).await {
            Ok(claims) => Some(UserId(claims.sub)),
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-test-secret-test-secret";

    fn token(sub: &str, exp_offset_secs: i64, secret: &str) -> String {
        token_with_issuer(sub, exp_offset_secs, secret, None)
    }

    fn token_with_issuer(
        sub: &str,
        exp_offset_secs: i64,
        secret: &str,
        issuer: Option<&str>,
    ) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: sub.to_string(),
            exp: now + exp_offset_secs,
            iat: Some(now),
            nbf: None,
            iss: issuer.map(str::to_string),
            azp: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode")
    }

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer abc.def.ghi");
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_session_cookie() {
        let headers = headers_with(header::COOKIE, "theme=dark; __session=abc.def.ghi; other=1");
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let headers = headers_with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert_eq!(extract_session_token(&headers), None);
    }

    #[tokio::test]
    async fn test_valid_token_yields_user() {
        let provider = JwtIdentityProvider::with_shared_secret(SECRET);
        let headers = headers_with(
            header::AUTHORIZATION,
            &format!("Bearer {}", token("user_2abc", 3600, SECRET)),
        );
        assert_eq!(
            provider.current_user(&headers).await,
            Some(UserId("user_2abc".to_string()))
        );
    }

    #[tokio::test]
    async fn test_expired_token_yields_none() {
        let provider = JwtIdentityProvider::with_shared_secret(SECRET);
        let headers = headers_with(
            header::AUTHORIZATION,
            &format!("Bearer {}", token("user_2abc", -3600, SECRET)),
        );
        assert_eq!(provider.current_user(&headers).await, None);
    }

    #[tokio::test]
    async fn test_wrong_secret_yields_none() {
        let provider = JwtIdentityProvider::with_shared_secret(SECRET);
        let headers = headers_with(
            header::AUTHORIZATION,
            &format!("Bearer {}", token("user_2abc", 3600, "another-secret-another-secret-xx")),
        );
        assert_eq!(provider.current_user(&headers).await, None);
    }

    const ISSUER: &str = "https://clerk.example.com";

    fn provider_with_issuer() -> JwtIdentityProvider {
        JwtIdentityProvider::from_config(&AuthConfig {
            key_source: AuthKeySource::SharedSecret(SECRET.to_string()),
            issuer: Some(ISSUER.to_string()),
        })
        .expect("provider")
    }

    #[tokio::test]
    async fn test_issuer_is_enforced_when_configured() {
        let err = provider_with_issuer()
            .verify(&token("user_2abc", 3600, SECRET))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_wrong_issuer_is_rejected() {
        let err = provider_with_issuer()
            .verify(&token_with_issuer(
                "user_2abc",
                3600,
                SECRET,
                Some("https://evil.example"),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_matching_issuer_is_accepted() {
        let claims = provider_with_issuer()
            .verify(&token_with_issuer("user_2abc", 3600, SECRET, Some(ISSUER)))
            .await
            .expect("claims");
        assert_eq!(claims.sub, "user_2abc");
        assert_eq!(claims.iss.as_deref(), Some(ISSUER));
    }

    #[tokio::test]
    async fn test_missing_token_yields_none() {
        let provider = JwtIdentityProvider::with_shared_secret(SECRET);
        assert_eq!(provider.current_user(&HeaderMap::new()).await, None);
    }
}
