use axum::{http::header::AUTHORIZATION, http::HeaderMap, response::Json};
use serde_json::{json, Value};

/// Characters of the Authorization header echoed back by `auth_check`
const ECHO_CHARS: usize = 20;

/// GET /api/test
pub async fn ping() -> Json<Value> {
    Json(json!({
        "message": "Test route working!",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// GET /api/test/auth-check - reports whether an Authorization header arrived,
/// echoing only its first few characters.
pub async fn auth_check(headers: HeaderMap) -> Json<Value> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let preview = match header {
        Some(value) => format!("{}...", value.chars().take(ECHO_CHARS).collect::<String>()),
        None => "none".to_string(),
    };

    Json(json!({
        "message": "Auth check",
        "hasAuthHeader": headers.contains_key(AUTHORIZATION),
        "authHeader": preview
    }))
}
