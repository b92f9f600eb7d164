use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use crate::app::{router, AppState};
use crate::auth::{generate_token, Claims, TokenVerifier};
use crate::config::AppConfig;
use crate::database::{DatabaseError, Expense, ExpenseStore, NewExpense};

/// In-test stand-in for the Postgres store with the same owner scoping.
/// `failing()` makes every call error like an unreachable database.
#[derive(Default)]
pub struct MemoryExpenseStore {
    inner: Mutex<Inner>,
    failing: bool,
}

#[derive(Default)]
struct Inner {
    rows: Vec<Expense>,
    next_id: i32,
}

impl MemoryExpenseStore {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn rows_for(&self, user_id: &str) -> Vec<Expense> {
        let inner = self.inner.lock().unwrap();
        inner.rows.iter().filter(|e| e.user_id == user_id).cloned().collect()
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.failing {
            Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Expense>, DatabaseError> {
        self.check()?;
        Ok(self.rows_for(user_id))
    }

    async fn total(&self, user_id: &str) -> Result<Decimal, DatabaseError> {
        self.check()?;
        Ok(self.rows_for(user_id).iter().map(|e| e.amount).sum())
    }

    async fn find(&self, user_id: &str, id: i32) -> Result<Option<Expense>, DatabaseError> {
        self.check()?;
        Ok(self.rows_for(user_id).into_iter().find(|e| e.id == id))
    }

    async fn insert(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, DatabaseError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let now = Utc::now();
        let row = Expense {
            id: inner.next_id,
            title: expense.title.clone(),
            amount: expense.amount,
            date: expense.date,
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        user_id: &str,
        id: i32,
        expense: &NewExpense,
    ) -> Result<Option<Expense>, DatabaseError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.rows.iter_mut().find(|e| e.id == id && e.user_id == user_id) else {
            return Ok(None);
        };
        row.title = expense.title.clone();
        row.amount = expense.amount;
        row.date = expense.date;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, user_id: &str, id: i32) -> Result<bool, DatabaseError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(inner.rows.len() < before)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.check()
    }
}

/// Router over `store` trusting unsigned tokens
pub fn test_app(store: Arc<MemoryExpenseStore>) -> Router {
    let state = AppState::new(store, TokenVerifier::Unverified);
    router(state, &AppConfig::development())
}

/// Unsigned token for `sub`, valid for an hour
pub fn bearer(sub: &str) -> String {
    generate_token(&Claims::new(sub, None, None, 1), None).unwrap()
}

pub fn expired_bearer(sub: &str) -> String {
    let claims = Claims {
        sub: Some(sub.to_string()),
        exp: Some((Utc::now().timestamp() - 60).into()),
        ..Claims::default()
    };
    generate_token(&claims, None).unwrap()
}

/// Unsigned token carrying `payload` verbatim
pub fn unsigned_token(payload: &Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = body.map(|b| b.to_string()).unwrap_or_default();
    send_raw(app, method, uri, token, &body).await
}

pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if !body.is_empty() {
        request = request.header(header::CONTENT_TYPE, "application/json");
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
