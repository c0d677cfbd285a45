use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_email, into_result, optional_text, require_text, text_enum, FieldErrors};

text_enum!(AdoptionStatus, "adoption status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Withdrawn => "withdrawn",
});

impl AdoptionStatus {
    /// Only pending requests can be reviewed, and never back to pending.
    pub fn can_transition_to(&self, next: AdoptionStatus) -> bool {
        *self == AdoptionStatus::Pending && next != AdoptionStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdoptionRequest {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: Option<String>,
    pub message: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AdoptionStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptionRequestInput {
    pub animal_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    #[serde(default)]
    pub applicant_phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AdoptionRequestInput {
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "applicant_name", &mut self.applicant_name, 200);
        check_email(&mut errors, "applicant_email", &mut self.applicant_email);
        optional_text(&mut self.applicant_phone);
        optional_text(&mut self.message);
        into_result(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptionReview {
    pub status: AdoptionStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdoptionFilter {
    pub status: Option<AdoptionStatus>,
    pub animal_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_transitions() {
        use AdoptionStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Withdrawn));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Withdrawn.can_transition_to(Approved));
    }

    #[test]
    fn validates_applicant() {
        let mut input = AdoptionRequestInput {
            animal_id: Uuid::new_v4(),
            applicant_name: "".to_string(),
            applicant_email: "nope".to_string(),
            applicant_phone: Some("".to_string()),
            message: None,
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(input.applicant_phone, None);
    }
}
