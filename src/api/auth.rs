//! Bearer-token authentication for the admin API.
//!
//! Tokens are verified either with a shared HS256 secret or against the
//! identity provider's JWKS, which is cached for `jwks_cache_ttl_seconds`.
//! A configured `required_permission` must appear in the `permissions` array
//! or the space-separated `scope` claim.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::api::AppState;
use crate::config::AuthConfig;
use crate::error::{AppError, Result};

/// Subject used for admin requests when authentication is disabled
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// The authenticated caller of an admin request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub subject: String,
}

impl AdminPrincipal {
    pub fn anonymous() -> Self {
        Self {
            subject: ANONYMOUS_SUBJECT.to_string(),
        }
    }
}

fn invalid_token() -> AppError {
    AppError::Authentication("Invalid or expired token".to_string())
}

#[derive(Debug, Clone)]
struct CachedJwks {
    set: Arc<JwkSet>,
    fetched_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// JWT verification service used by the admin middleware
#[derive(Debug)]
pub struct JwtVerifier {
    config: AuthConfig,
    jwks_cache: RwLock<Option<CachedJwks>>,
    http: reqwest::Client,
}

impl JwtVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Failed to configure reqwest client; using defaults"
                );
                reqwest::Client::new()
            }
        };

        Self {
            config,
            jwks_cache: RwLock::new(None),
            http,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Verify `token` and check the required permission
    pub async fn verify(&self, token: &str) -> Result<AdminPrincipal> {
        let claims = if let Some(secret) = self.config.hs256_secret.as_ref() {
            self.decode_hs256(token, secret)?
        } else if self.config.jwks_url.is_some() {
            self.decode_with_jwks(token).await?
        } else {
            tracing::error!("Admin auth is enabled but no signing key source is configured");
            return Err(invalid_token());
        };

        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid_token)?
            .to_string();

        if let Some(permission) = self.config.required_permission.as_deref() {
            if !has_permission(&claims, permission) {
                tracing::warn!(subject = %subject, permission, "Token lacks required permission");
                return Err(AppError::Authorization(format!(
                    "Missing permission: {}",
                    permission
                )));
            }
        }

        Ok(AdminPrincipal { subject })
    }

    fn decode_hs256(&self, token: &str, secret: &str) -> Result<Value> {
        let mut validation = self.validation_for(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];

        decode::<Value>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|t| t.claims)
        .map_err(|_| invalid_token())
    }

    async fn decode_with_jwks(&self, token: &str) -> Result<Value> {
        let header = decode_header(token).map_err(|_| invalid_token())?;
        let kid = header.kid.ok_or_else(invalid_token)?;

        let jwk = self.get_jwk(&kid).await?.ok_or_else(invalid_token)?;
        let decoding_key = DecodingKey::from_jwk(&jwk).map_err(|_| invalid_token())?;

        let mut validation = self.validation_for(Algorithm::RS256);
        validation.algorithms = vec![Algorithm::RS256, Algorithm::ES256];

        decode::<Value>(token, &decoding_key, &validation)
            .map(|t| t.claims)
            .map_err(|_| invalid_token())
    }

    fn validation_for(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = self.config.leeway_seconds;

        if let Some(aud) = self.config.audience.as_deref() {
            validation.set_audience(&[aud]);
            validation.set_required_spec_claims(&["exp", "aud"]);
        }

        if let Some(iss) = self.config.issuer.as_deref() {
            validation.set_issuer(&[iss]);

            if self.config.audience.is_none() {
                validation.set_required_spec_claims(&["exp", "iss"]);
            } else {
                validation.required_spec_claims.insert("iss".to_string());
            }
        }

        validation
    }

    async fn get_jwk(&self, kid: &str) -> Result<Option<jsonwebtoken::jwk::Jwk>> {
        let ttl = Duration::from_secs(self.config.jwks_cache_ttl_seconds);

        if let Some(jwk) = self.cached_jwk(kid, ttl).await {
            return Ok(Some(jwk));
        }

        self.refresh_jwks().await?;
        Ok(self.cached_jwk(kid, ttl).await)
    }

    async fn cached_jwk(&self, kid: &str, ttl: Duration) -> Option<jsonwebtoken::jwk::Jwk> {
        let cache = self.jwks_cache.read().await;
        let set = match cache.as_ref() {
            Some(cached) if cached.is_fresh(ttl) => Arc::clone(&cached.set),
            _ => return None,
        };
        drop(cache);

        set.keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .cloned()
    }

    async fn refresh_jwks(&self) -> Result<()> {
        let Some(url) = self.config.jwks_url.as_deref() else {
            return Ok(());
        };

        let set = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch JWKS");
                invalid_token()
            })?
            .json::<JwkSet>()
            .await
            .map_err(|_| invalid_token())?;

        *self.jwks_cache.write().await = Some(CachedJwks {
            set: Arc::new(set),
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

/// Whether `claims` grant `permission` via `permissions` or `scope`
fn has_permission(claims: &Value, permission: &str) -> bool {
    let in_permissions = claims
        .get("permissions")
        .and_then(Value::as_array)
        .is_some_and(|p| p.iter().any(|v| v.as_str() == Some(permission)));
    let in_scope = claims
        .get("scope")
        .and_then(Value::as_str)
        .is_some_and(|s| s.split_whitespace().any(|p| p == permission));
    in_permissions || in_scope
}

fn bearer_token(request: &Request) -> Result<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".to_string()))?;
    header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Authentication("Expected a Bearer token".to_string()))
}

/// Middleware guarding the admin routes. Inserts an [`AdminPrincipal`]
/// into the request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let principal = if state.auth.enabled() {
        let token = bearer_token(&request)?.to_string();
        state.auth.verify(&token).await?
    } else {
        AdminPrincipal::anonymous()
    };

    tracing::debug!(subject = %principal.subject, path = %request.uri().path(), "Admin request");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn config(permission: Option<&str>) -> AuthConfig {
        AuthConfig {
            hs256_secret: Some(SECRET.to_string()),
            required_permission: permission.map(str::to_string),
            ..Default::default()
        }
    }

    fn token(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 600
    }

    #[tokio::test]
    async fn test_valid_token() {
        let verifier = JwtVerifier::new(config(None));
        let principal = verifier
            .verify(&token(json!({"sub": "admin-1", "exp": exp()})))
            .await
            .unwrap();
        assert_eq!(principal.subject, "admin-1");
    }

    #[tokio::test]
    async fn test_expired_and_garbage_tokens() {
        let verifier = JwtVerifier::new(config(None));
        let expired = token(json!({"sub": "a", "exp": chrono::Utc::now().timestamp() - 3600}));

        assert!(matches!(
            verifier.verify(&expired).await,
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_required_permission() {
        let verifier = JwtVerifier::new(config(Some("write:content")));

        let scoped = token(json!({"sub": "a", "exp": exp(), "scope": "read:content write:content"}));
        assert!(verifier.verify(&scoped).await.is_ok());

        let listed = token(json!({"sub": "a", "exp": exp(), "permissions": ["write:content"]}));
        assert!(verifier.verify(&listed).await.is_ok());

        let missing = token(json!({"sub": "a", "exp": exp(), "scope": "read:content"}));
        assert!(matches!(
            verifier.verify(&missing).await,
            Err(AppError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn test_no_key_source() {
        let verifier = JwtVerifier::new(AuthConfig::default());
        assert!(verifier.verify("a.b.c").await.is_err());
    }
}
