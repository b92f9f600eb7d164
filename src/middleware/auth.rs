use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::app::AppState;
use crate::auth::{AuthError, AuthUser};
use crate::error::ApiError;

/// Bearer token middleware: verifies the token and injects the caller's
/// `AuthUser` into request extensions for downstream handlers.
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers()).map_err(|e| {
        tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::from(e)
    })?;

    tracing::debug!("Authenticated user {}", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let token = extract_bearer_token(headers)?;
    let claims = state.verifier.verify(token, Utc::now().timestamp())?;
    AuthUser::try_from(claims)
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidHeader)?;

    if token.is_empty() {
        return Err(AuthError::InvalidHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer a.b.c")).unwrap(), "a.b.c");
    }

    #[test]
    fn rejects_missing_or_non_bearer_headers() {
        assert!(matches!(extract_bearer_token(&HeaderMap::new()), Err(AuthError::MissingHeader)));
        assert!(matches!(extract_bearer_token(&headers("Basic dTpw")), Err(AuthError::InvalidHeader)));
        assert!(matches!(extract_bearer_token(&headers("Bearer ")), Err(AuthError::InvalidHeader)));
        assert!(matches!(extract_bearer_token(&headers("bearer a.b.c")), Err(AuthError::InvalidHeader)));
    }
}
