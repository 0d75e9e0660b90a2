use axum::{
    extract::Request,
    http::HeaderMap,
    response::IntoResponse,
};

use super::chain::{Flow, Stage};
use crate::auth::{verify_jwt, Claims, SigningPolicy};
use crate::error::ApiError;

/// Authenticated caller, attached to the request after a token verifies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.sub }
    }
}

/// Bearer-token guard. Verifies HMAC signatures against one process-wide secret.
#[derive(Debug, Clone)]
pub struct AuthenticationGuard {
    secret: String,
    policy: SigningPolicy,
}

impl AuthenticationGuard {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            policy: SigningPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SigningPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
        let token = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;

        let claims = verify_jwt(&token, &self.secret, self.policy).map_err(|e| {
            tracing::warn!("Rejected bearer token: {}", e);
            ApiError::unauthorized("Invalid token")
        })?;

        Ok(AuthUser::from(claims))
    }
}

impl Stage for AuthenticationGuard {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn apply(&self, request: &mut Request) -> Flow {
        match self.authenticate(request.headers()) {
            Ok(user) => {
                tracing::debug!(user_id = %user.user_id, "Request authenticated");
                request.extensions_mut().insert(user);
                Flow::Continue
            }
            Err(err) => Flow::Respond(err.into_response()),
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid authorization header".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty bearer token".to_string()),
        None => Err("Invalid authorization header".to_string()),
    }
}
