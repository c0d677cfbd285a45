use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_email, into_result, require_positive, require_text, FieldErrors};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sponsorship {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub sponsor_name: String,
    pub sponsor_email: String,
    pub monthly_amount: Decimal,
    pub started_on: NaiveDate,
    pub ended_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Sponsorship {
    /// Active on `day` when it has started and has not ended before it.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.started_on <= day && self.ended_on.map_or(true, |end| end >= day)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SponsorshipInput {
    pub animal_id: Uuid,
    pub sponsor_name: String,
    pub sponsor_email: String,
    pub monthly_amount: Decimal,
    #[serde(default)]
    pub started_on: Option<NaiveDate>,
    #[serde(default)]
    pub ended_on: Option<NaiveDate>,
}

impl SponsorshipInput {
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "sponsor_name", &mut self.sponsor_name, 200);
        check_email(&mut errors, "sponsor_email", &mut self.sponsor_email);
        require_positive(&mut errors, "monthly_amount", self.monthly_amount);
        self.monthly_amount = self.monthly_amount.round_dp(2);

        if let Some(ended_on) = self.ended_on {
            if ended_on < self.started_on() {
                errors.insert("ended_on".to_string(), "Cannot be before the start date".to_string());
            }
        }
        into_result(errors)
    }

    pub fn started_on(&self) -> NaiveDate {
        self.started_on.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SponsorshipFilter {
    pub active: Option<bool>,
    pub animal_id: Option<Uuid>,
}
