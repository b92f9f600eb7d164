use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::Expense;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseTotal {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ExpenseBody {
    pub expense: Expense,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ExpensesWithMessage {
    pub expenses: Vec<Expense>,
    pub message: &'static str,
}

/// Parse the `:id` path segment. Anything that is not a positive integer
/// cannot name a row, so it is reported as not found.
pub fn parse_expense_id(raw: &str) -> Result<i32, ApiError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(expense_not_found()),
    }
}

pub fn expense_not_found() -> ApiError {
    ApiError::not_found("Expense not found")
}

/// Default date for payloads without one
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
