// Payload checks for expense create/update
use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::NewExpense;
use crate::error::ApiError;

pub const MIN_TITLE_CHARS: usize = 3;

/// Exclusive upper bound of a `NUMERIC(10, 2)` column
const MAX_AMOUNT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Body of POST and PUT. Must be a JSON object; unknown keys such as
/// `userId` or `id` are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ExpensePayload {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
}

#[derive(Deserialize)]
struct PayloadFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    date: Option<String>,
}

// Going through a map keeps serde from reading a JSON array positionally.
impl TryFrom<Map<String, Value>> for ExpensePayload {
    type Error = serde_json::Error;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let PayloadFields { title, amount, date } = serde_json::from_value(Value::Object(object))?;
        Ok(Self { title, amount, date })
    }
}

impl ExpensePayload {
    /// Check every field and report all problems at once. `today` fills in a
    /// missing date.
    pub fn validate(self, today: NaiveDate) -> Result<NewExpense, ApiError> {
        let mut field_errors = HashMap::new();

        let title = match self.title {
            Some(title) if title.chars().count() >= MIN_TITLE_CHARS => Some(title),
            Some(_) => {
                field_errors.insert("title".to_string(), "Title must be at least 3 characters".to_string());
                None
            }
            None => {
                field_errors.insert("title".to_string(), "Title is required".to_string());
                None
            }
        };

        let amount = match self.amount.map(parse_amount) {
            Some(Ok(amount)) => Some(amount),
            Some(Err(msg)) => {
                field_errors.insert("amount".to_string(), msg.to_string());
                None
            }
            None => {
                field_errors.insert("amount".to_string(), "Amount is required".to_string());
                None
            }
        };

        let date = match self.date.as_deref() {
            None => Some(today),
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    field_errors.insert("date".to_string(), "must be a valid date".to_string());
                    None
                }
            },
        };

        match (title, amount, date) {
            (Some(title), Some(amount), Some(date)) if field_errors.is_empty() => {
                Ok(NewExpense { title, amount, date })
            }
            _ => Err(ApiError::validation_error("Invalid expense", Some(field_errors))),
        }
    }
}

/// Round to cents the way the column stores it, then range-check.
fn parse_amount(raw: f64) -> Result<Decimal, &'static str> {
    let amount = Decimal::from_f64(raw)
        .ok_or("Amount is out of range")?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if amount <= Decimal::ZERO {
        return Err("Amount must be positive");
    }
    if amount >= MAX_AMOUNT {
        return Err("Amount must be less than 100000000");
    }
    Ok(amount)
}
