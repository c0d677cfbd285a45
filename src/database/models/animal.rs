use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{into_result, optional_text, require_text, text_enum, FieldErrors};

text_enum!(AnimalStatus, "animal status", {
    Available => "available",
    Pending => "pending",
    Adopted => "adopted",
    Fostered => "fostered",
    Medical => "medical",
});

text_enum!(Sex, "sex", {
    Male => "male",
    Female => "female",
    Unknown => "unknown",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Animal {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    #[sqlx(try_from = "String")]
    pub sex: Sex,
    pub age_months: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: AnimalStatus,
    pub intake_date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of the create and replace forms.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimalInput {
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub age_months: Option<i32>,
    #[serde(default)]
    pub status: Option<AnimalStatus>,
    #[serde(default)]
    pub intake_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AnimalInput {
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &mut self.name, 100);
        require_text(&mut errors, "species", &mut self.species, 50);
        optional_text(&mut self.breed);
        optional_text(&mut self.description);

        if let Some(age) = self.age_months {
            if !(0..=600).contains(&age) {
                errors.insert("age_months".to_string(), "Must be between 0 and 600".to_string());
            }
        }
        if let Some(date) = self.intake_date {
            if date > Utc::now().date_naive() {
                errors.insert("intake_date".to_string(), "Cannot be in the future".to_string());
            }
        }
        into_result(errors)
    }

    pub fn sex(&self) -> Sex {
        self.sex.unwrap_or(Sex::Unknown)
    }

    pub fn status(&self) -> AnimalStatus {
        self.status.unwrap_or(AnimalStatus::Available)
    }

    pub fn intake_date(&self) -> NaiveDate {
        self.intake_date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimalFilter {
    pub status: Option<AnimalStatus>,
}
