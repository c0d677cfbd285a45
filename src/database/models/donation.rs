use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_email, into_result, optional_text, require_positive, require_text, text_enum, FieldErrors};

text_enum!(DonationMethod, "donation method", {
    Cash => "cash",
    Card => "card",
    BankTransfer => "bank_transfer",
    Check => "check",
    Other => "other",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_email: Option<String>,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub method: DonationMethod,
    pub note: Option<String>,
    pub donated_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationInput {
    pub donor_name: String,
    #[serde(default)]
    pub donor_email: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub method: Option<DonationMethod>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub donated_on: Option<NaiveDate>,
}

impl DonationInput {
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "donor_name", &mut self.donor_name, 200);
        optional_text(&mut self.donor_email);
        if let Some(email) = self.donor_email.as_mut() {
            check_email(&mut errors, "donor_email", email);
        }
        require_positive(&mut errors, "amount", self.amount);
        optional_text(&mut self.note);
        self.amount = self.amount.round_dp(2);
        into_result(errors)
    }

    pub fn method(&self) -> DonationMethod {
        self.method.unwrap_or(DonationMethod::Other)
    }

    pub fn donated_on(&self) -> NaiveDate {
        self.donated_on.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn amount_must_be_positive() {
        let mut input = DonationInput {
            donor_name: "Ada".to_string(),
            donor_email: Some("   ".to_string()),
            amount: Decimal::ZERO,
            method: None,
            note: None,
            donated_on: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.contains_key("amount"));
        assert_eq!(input.donor_email, None);
        assert_eq!(input.method(), DonationMethod::Other);
    }

    #[test]
    fn amount_is_rounded_to_cents() {
        let mut input = DonationInput {
            donor_name: "Ada".to_string(),
            donor_email: Some("ada@example.org".to_string()),
            amount: Decimal::from_str("25.005").unwrap(),
            method: Some(DonationMethod::BankTransfer),
            note: None,
            donated_on: None,
        };
        input.validate().unwrap();
        assert_eq!(input.amount, Decimal::from_str("25.00").unwrap());
    }
}
