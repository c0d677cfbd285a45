use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{into_result, optional_text, require_positive, require_text, text_enum, FieldErrors};

text_enum!(ExpenseCategory, "expense category", {
    Food => "food",
    Medical => "medical",
    Supplies => "supplies",
    Facilities => "facilities",
    Staff => "staff",
    Other => "other",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub vendor: Option<String>,
    pub animal_id: Option<Uuid>,
    pub incurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub animal_id: Option<Uuid>,
    #[serde(default)]
    pub incurred_on: Option<NaiveDate>,
}

impl ExpenseInput {
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "description", &mut self.description, 500);
        require_positive(&mut errors, "amount", self.amount);
        optional_text(&mut self.vendor);
        self.amount = self.amount.round_dp(2);
        into_result(errors)
    }

    pub fn incurred_on(&self) -> NaiveDate {
        self.incurred_on.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    pub animal_id: Option<Uuid>,
}
