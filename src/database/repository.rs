use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Expense, NewExpense};

/// Owner-scoped access to expense records. Every method takes the caller's
/// user id and never touches rows owned by anyone else.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn list(&self, user_id: &str) -> Result<Vec<Expense>, DatabaseError>;

    /// Sum of `amount` over the user's rows, zero when there are none
    async fn total(&self, user_id: &str) -> Result<Decimal, DatabaseError>;

    async fn find(&self, user_id: &str, id: i32) -> Result<Option<Expense>, DatabaseError>;

    async fn insert(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, DatabaseError>;

    /// `None` when no row with `id` is owned by `user_id`
    async fn update(
        &self,
        user_id: &str,
        id: i32,
        expense: &NewExpense,
    ) -> Result<Option<Expense>, DatabaseError>;

    /// `false` when no row with `id` is owned by `user_id`
    async fn delete(&self, user_id: &str, id: i32) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

const COLUMNS: &str = "id, title, amount, date, user_id, created_at, updated_at";

/// Postgres-backed store over the `expenses` table
#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseStore for ExpenseRepository {
    async fn list(&self, user_id: &str) -> Result<Vec<Expense>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM expenses WHERE user_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, Expense>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn total(&self, user_id: &str) -> Result<Decimal, DatabaseError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn find(&self, user_id: &str, id: i32) -> Result<Option<Expense>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM expenses WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, user_id: &str, expense: &NewExpense) -> Result<Expense, DatabaseError> {
        let sql = format!(
            "INSERT INTO expenses (title, amount, date, user_id) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, Expense>(&sql)
            .bind(&expense.title)
            .bind(expense.amount)
            .bind(expense.date)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        user_id: &str,
        id: i32,
        expense: &NewExpense,
    ) -> Result<Option<Expense>, DatabaseError> {
        let sql = format!(
            "UPDATE expenses SET title = $1, amount = $2, date = $3, updated_at = now() \
             WHERE id = $4 AND user_id = $5 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, Expense>(&sql)
            .bind(&expense.title)
            .bind(expense.amount)
            .bind(expense.date)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, user_id: &str, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
