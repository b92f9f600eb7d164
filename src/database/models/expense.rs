use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `expenses` table, rendered with camelCase keys on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i32,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, client-editable fields of an expense. Owner and id are never
/// part of this; they come from the caller's identity and the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}
