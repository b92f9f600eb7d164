// handlers/protected/expenses/record.rs - /api/expenses/:id

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::ExpensePayload;

use super::utils::{expense_not_found, parse_expense_id, today, ExpenseBody, ExpensesWithMessage};

/// GET /api/expenses/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ExpenseBody> {
    let id = parse_expense_id(&id)?;

    let expense = state
        .store
        .find(&user.id, id)
        .await?
        .ok_or_else(expense_not_found)?;

    Ok(ApiResponse::success(ExpenseBody { expense, message: None }))
}

/// PUT /api/expenses/:id - replace title, amount and date
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<ExpensePayload>, JsonRejection>,
) -> ApiResult<ExpenseBody> {
    let Json(payload) = payload?;
    let changes = payload.validate(today())?;
    let id = parse_expense_id(&id)?;

    let expense = state
        .store
        .update(&user.id, id, &changes)
        .await?
        .ok_or_else(expense_not_found)?;
    tracing::info!("User {} updated expense {}", user.id, expense.id);

    Ok(ApiResponse::success(ExpenseBody {
        expense,
        message: Some("Expense updated"),
    }))
}

/// DELETE /api/expenses/:id - returns the caller's remaining expenses
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ExpensesWithMessage> {
    let id = parse_expense_id(&id)?;

    if !state.store.delete(&user.id, id).await? {
        return Err(expense_not_found());
    }
    tracing::info!("User {} deleted expense {}", user.id, id);

    let expenses = state.store.list(&user.id).await?;
    Ok(ApiResponse::success(ExpensesWithMessage {
        expenses,
        message: "Expense deleted",
    }))
}
