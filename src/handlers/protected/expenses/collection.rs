// handlers/protected/expenses/collection.rs - /api/expenses and /api/expenses/total

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::ExpensePayload;

use super::utils::{today, ExpenseBody, ExpenseList, ExpenseTotal};

/// GET /api/expenses - every expense owned by the caller
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<ExpenseList> {
    let expenses = state.store.list(&user.id).await?;
    Ok(ApiResponse::success(ExpenseList { expenses }))
}

/// GET /api/expenses/total - sum of the caller's amounts, 0 when empty
pub async fn total(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<ExpenseTotal> {
    let total = state.store.total(&user.id).await?;
    Ok(ApiResponse::success(ExpenseTotal { total }))
}

/// POST /api/expenses - create an expense owned by the caller
///
/// Expected Input:
/// ```json
/// { "title": "Coffee", "amount": 4.5, "date": "2024-01-01" }
/// ```
/// `date` is optional and defaults to today (UTC).
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ExpensePayload>, JsonRejection>,
) -> ApiResult<ExpenseBody> {
    let Json(payload) = payload?;
    let new_expense = payload.validate(today())?;

    let expense = state.store.insert(&user.id, &new_expense).await?;
    tracing::info!("User {} created expense {}", user.id, expense.id);

    Ok(ApiResponse::created(ExpenseBody {
        expense,
        message: Some("Expense created"),
    }))
}
