pub use adoption::{AdoptionFilter, AdoptionRequest, AdoptionRequestInput, AdoptionReview, AdoptionStatus};
pub use animal::{Animal, AnimalFilter, AnimalInput, AnimalStatus, Sex};
pub use donation::{Donation, DonationInput, DonationMethod};
pub use expense::{Expense, ExpenseCategory, ExpenseFilter, ExpenseInput};
pub use sponsorship::{Sponsorship, SponsorshipFilter, SponsorshipInput};
pub use user::{NewUser, User};

use rust_decimal::Decimal;
use std::collections::HashMap;

/// Field name -> message, reported back to the form that submitted it.
pub type FieldErrors = HashMap<String, String>;

/// A stored text value that does not name any variant of the enum.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Enums persisted as lowercase TEXT columns.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::database::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::database::models::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::database::models::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use text_enum;

pub mod adoption;
pub mod animal;
pub mod donation;
pub mod expense;
pub mod sponsorship;
pub mod user;

/// Trim a required text field, recording an error when it is blank.
pub(crate) fn require_text(errors: &mut FieldErrors, field: &str, value: &mut String, max_len: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.insert(field.to_string(), "This field is required".to_string());
    } else if trimmed.chars().count() > max_len {
        errors.insert(field.to_string(), format!("Must be at most {} characters", max_len));
    }
    *value = trimmed.to_string();
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn optional_text(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

pub(crate) fn require_positive(errors: &mut FieldErrors, field: &str, amount: Decimal) {
    if amount <= Decimal::ZERO {
        errors.insert(field.to_string(), "Must be greater than zero".to_string());
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

pub(crate) fn check_email(errors: &mut FieldErrors, field: &str, email: &mut String) {
    *email = email.trim().to_string();
    if email.is_empty() {
        errors.insert(field.to_string(), "This field is required".to_string());
    } else if !is_valid_email(email) {
        errors.insert(field.to_string(), "Invalid email format".to_string());
    }
}

pub(crate) fn into_result(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
