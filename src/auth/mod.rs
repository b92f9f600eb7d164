pub mod verifier;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

pub use verifier::{TokenVerifier, VerifierError};

/// Token payload segments are base64url; identity providers differ on padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a bearer token is refused. Every variant surfaces as 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must use Bearer token format")]
    InvalidHeader,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token payload")]
    InvalidPayload,

    #[error("Token expired")]
    Expired,

    #[error("Token does not identify a user")]
    MissingSubject,

    #[error("Token signing key not recognised")]
    UnknownKey,

    #[error("Invalid token: {0}")]
    Rejected(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Claims read from the middle token segment. Only the identity-related
/// claims are modelled; anything else the provider sends is ignored.
/// `exp` and `iat` are NumericDates and may carry a fractional part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(
        default,
        deserialize_with = "subject_from_json",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<Number>,
}

impl Claims {
    /// Claims for a locally issued token valid for `ttl_hours`.
    pub fn new(sub: impl Into<String>, email: Option<String>, name: Option<String>, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: Some(sub.into()),
            email,
            name,
            exp: Some((now + Duration::hours(ttl_hours)).timestamp().into()),
            iat: Some(now.timestamp().into()),
            ..Self::default()
        }
    }

    /// A missing `exp` never expires.
    pub fn check_expiry(&self, now: i64) -> Result<(), AuthError> {
        match self.exp.as_ref().and_then(Number::as_f64) {
            Some(exp) if exp < now as f64 => Err(AuthError::Expired),
            _ => Ok(()),
        }
    }

    /// `exp` truncated to whole seconds
    pub fn expires_at(&self) -> Option<i64> {
        self.exp.as_ref().and_then(Number::as_f64).map(|exp| exp as i64)
    }
}

/// Providers send `sub` as a string, a few as a number.
fn subject_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(sub)) => Ok(Some(sub)),
        Some(Value::Number(sub)) => Ok(Some(sub.to_string())),
        Some(other) => Err(D::Error::custom(format!("invalid subject claim: {other}"))),
    }
}

/// Identity of the caller, attached to request extensions by the auth middleware
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or(AuthError::MissingSubject)?;

        let email = claims.email.filter(|email| !email.is_empty());

        let composed = format!(
            "{} {}",
            claims.given_name.as_deref().unwrap_or_default(),
            claims.family_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();

        let name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| (!composed.is_empty()).then_some(composed))
            .or_else(|| email.clone())
            .unwrap_or_default();

        Ok(Self { id, email, name })
    }
}

/// Split a bearer token into its three segments.
pub(crate) fn split_token(token: &str) -> Result<[&str; 3], AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    match segments.as_slice() {
        [header, payload, signature] => Ok([*header, *payload, *signature]),
        _ => Err(AuthError::Malformed),
    }
}

/// Structural decode: checks the shape and expiry of a token but NOT its
/// signature. Anyone can mint a token this accepts.
pub fn decode_unverified(token: &str, now: i64) -> Result<Claims, AuthError> {
    let [_, payload, _] = split_token(token)?;

    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|_| AuthError::InvalidPayload)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidPayload)?;
    if !value.is_object() {
        return Err(AuthError::InvalidPayload);
    }
    let claims: Claims = serde_json::from_value(value).map_err(|_| AuthError::InvalidPayload)?;

    claims.check_expiry(now)?;
    Ok(claims)
}

/// Issue a token for local testing. Signs with HS256 when a secret is
/// given, otherwise emits an unsigned token with an empty signature segment.
pub fn generate_token(claims: &Claims, secret: Option<&str>) -> Result<String, AuthError> {
    match secret {
        Some(secret) => {
            let encoding_key = EncodingKey::from_secret(secret.as_bytes());
            encode(&Header::default(), claims, &encoding_key)
                .map_err(|e| AuthError::Signing(e.to_string()))
        }
        None => {
            let header = serde_json::json!({ "alg": "none", "typ": "JWT" });
            let header = serde_json::to_vec(&header).map_err(|e| AuthError::Signing(e.to_string()))?;
            let payload = serde_json::to_vec(claims).map_err(|e| AuthError::Signing(e.to_string()))?;
            Ok(format!(
                "{}.{}.",
                PAYLOAD_ENGINE.encode(header),
                PAYLOAD_ENGINE.encode(payload)
            ))
        }
    }
}
