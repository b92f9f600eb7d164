use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::{decode_unverified, split_token, AuthError, Claims};
use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("token signature verification is not configured; set AUTH_JWKS_URL or AUTH_JWT_SECRET, or AUTH_ALLOW_UNVERIFIED=true")]
    UnverifiedNotAllowed,

    #[error("failed to fetch key set: {0}")]
    JwksFetch(#[from] reqwest::Error),

    #[error("key set at {0} contains no keys")]
    EmptyKeySet(String),
}

/// Decides whether a bearer token is trusted.
///
/// `Unverified` only inspects the token's structure and expiry. The other
/// modes check the signature with `jsonwebtoken` before reading claims.
pub enum TokenVerifier {
    Unverified,
    SharedSecret {
        key: DecodingKey,
        issuer: Option<String>,
        audience: Option<String>,
    },
    Jwks {
        keys: JwkSet,
        issuer: Option<String>,
        audience: Option<String>,
    },
}

impl TokenVerifier {
    /// Pick a mode from configuration. A JWKS URL wins over a shared secret.
    pub async fn from_config(config: &AuthConfig) -> Result<Self, VerifierError> {
        if let Some(url) = &config.jwks_url {
            let keys = fetch_jwks(url).await?;
            tracing::info!("Verifying bearer tokens against {} key(s) from {}", keys.keys.len(), url);
            return Ok(Self::Jwks {
                keys,
                issuer: config.issuer.clone(),
                audience: config.audience.clone(),
            });
        }

        if let Some(secret) = &config.jwt_secret {
            tracing::info!("Verifying bearer tokens with a shared HS256 secret");
            return Ok(Self::shared_secret(secret, config.issuer.clone(), config.audience.clone()));
        }

        if config.allow_unverified {
            tracing::warn!("Bearer token signatures are NOT verified; any well-formed token is trusted");
            return Ok(Self::Unverified);
        }

        Err(VerifierError::UnverifiedNotAllowed)
    }

    pub fn shared_secret(secret: &str, issuer: Option<String>, audience: Option<String>) -> Self {
        Self::SharedSecret {
            key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            TokenVerifier::Unverified => "unverified",
            TokenVerifier::SharedSecret { .. } => "shared-secret",
            TokenVerifier::Jwks { .. } => "jwks",
        }
    }

    /// Check a bearer token and return its claims. `now` is a unix timestamp.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        split_token(token)?;

        match self {
            TokenVerifier::Unverified => decode_unverified(token, now),
            TokenVerifier::SharedSecret { key, issuer, audience } => {
                let validation = validation_for(Algorithm::HS256, issuer, audience);
                decode_checked(token, key, &validation, now)
            }
            TokenVerifier::Jwks { keys, issuer, audience } => {
                let header = decode_header(token).map_err(|_| AuthError::Malformed)?;
                if matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
                    return Err(AuthError::Rejected("symmetric algorithms are not accepted".to_string()));
                }

                // TODO: refetch the key set once when a token names an unknown kid
                let kid = header.kid.as_deref().ok_or(AuthError::UnknownKey)?;
                let jwk = keys.find(kid).ok_or(AuthError::UnknownKey)?;
                let key = DecodingKey::from_jwk(jwk).map_err(|e| AuthError::Rejected(e.to_string()))?;

                let validation = validation_for(header.alg, issuer, audience);
                decode_checked(token, &key, &validation, now)
            }
        }
    }
}

fn validation_for(alg: Algorithm, issuer: &Option<String>, audience: &Option<String>) -> Validation {
    let mut validation = Validation::new(alg);
    // `exp` stays optional, matching the structural check; expiry is
    // re-checked against `now` after decoding.
    validation.required_spec_claims.clear();
    validation.leeway = 0;

    match audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    validation
}

fn decode_checked(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
    now: i64,
) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(token, key, validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => AuthError::Malformed,
        ErrorKind::Json(_) => AuthError::InvalidPayload,
        _ => AuthError::Rejected(e.to_string()),
    })?;

    data.claims.check_expiry(now)?;
    Ok(data.claims)
}

async fn fetch_jwks(url: &str) -> Result<JwkSet, VerifierError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let keys: JwkSet = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if keys.keys.is_empty() {
        return Err(VerifierError::EmptyKeySet(url.to_string()));
    }
    Ok(keys)
}
