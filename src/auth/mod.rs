use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user the token was issued to
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(JwtError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            sub: user_id.into(),
            exp: Some(exp.timestamp()),
            iat: Some(now.timestamp()),
        })
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("token lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("unexpected signing method: {0:?}")]
    UnexpectedSigningMethod(Algorithm),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Which signing algorithms the guard accepts.
///
/// Deliberate deviation: the default is the working HMAC check, not the inverted check
/// observed in the deployed gateway (which rejects every HMAC token). The inverted check
/// is reproduced only when `AUTH_LEGACY_INVERTED_ALG_CHECK` opts into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningPolicy {
    /// Accept HMAC-signed tokens (HS256/384/512) verified against the shared secret
    #[default]
    RequireHmac,
    /// Reject HMAC-signed tokens and try to verify anything else against the shared
    /// secret. Matches a known-defective deployment in which no token can pass; kept
    /// only behind `AUTH_LEGACY_INVERTED_ALG_CHECK`.
    LegacyInverted,
}

impl SigningPolicy {
    fn permits(&self, algorithm: Algorithm) -> bool {
        let hmac = HMAC_ALGORITHMS.contains(&algorithm);
        match self {
            SigningPolicy::RequireHmac => hmac,
            SigningPolicy::LegacyInverted => !hmac,
        }
    }
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Check a token's signing method and signature against `secret`.
///
/// `exp` is enforced when present but not required.
pub fn verify_jwt(token: &str, secret: &str, policy: SigningPolicy) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let header = decode_header(token).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
    if !policy.permits(header.alg) {
        return Err(JwtError::UnexpectedSigningMethod(header.alg));
    }

    let mut validation = Validation::new(header.alg);
    validation.required_spec_claims.clear();

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}
