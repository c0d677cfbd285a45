use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::handle::DatabaseError;
use crate::database::models::*;

/// Totals shown on the dashboard landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_animals: i64,
    pub animals_by_status: BTreeMap<String, i64>,
    pub pending_adoptions: i64,
    pub donations_total: Decimal,
    pub expenses_total: Decimal,
    pub balance: Decimal,
    pub active_sponsorships: i64,
    pub monthly_sponsorship_income: Decimal,
}

impl DashboardSummary {
    /// Fill `balance` and zero counts for statuses with no animals.
    pub fn finish(mut self) -> Self {
        for status in AnimalStatus::ALL {
            self.animals_by_status.entry(status.as_str().to_string()).or_insert(0);
        }
        self.total_animals = self.animals_by_status.values().sum();
        self.balance = self.donations_total - self.expenses_total;
        self
    }
}

/// The queries the dashboard pages and the admin CLI issue.
///
/// Inputs are validated by the caller. Missing rows on update/delete come
/// back as [`DatabaseError::NotFound`]; references to missing animals as
/// [`DatabaseError::InvalidReference`].
#[async_trait]
pub trait ShelterStore: Send + Sync {
    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> Result<(), DatabaseError>;

    // Users
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    // Dashboard
    async fn dashboard_summary(&self) -> Result<DashboardSummary, DatabaseError>;

    // Animals
    async fn list_animals(&self, filter: &AnimalFilter) -> Result<Vec<Animal>, DatabaseError>;
    async fn get_animal(&self, id: Uuid) -> Result<Option<Animal>, DatabaseError>;
    async fn create_animal(&self, input: &AnimalInput) -> Result<Animal, DatabaseError>;
    async fn update_animal(&self, id: Uuid, input: &AnimalInput) -> Result<Animal, DatabaseError>;
    async fn delete_animal(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Adoption requests
    async fn list_adoption_requests(&self, filter: &AdoptionFilter) -> Result<Vec<AdoptionRequest>, DatabaseError>;
    async fn get_adoption_request(&self, id: Uuid) -> Result<Option<AdoptionRequest>, DatabaseError>;
    async fn create_adoption_request(&self, input: &AdoptionRequestInput) -> Result<AdoptionRequest, DatabaseError>;
    /// Set a pending request's status. Approval also marks the animal adopted.
    async fn review_adoption_request(&self, id: Uuid, status: AdoptionStatus) -> Result<AdoptionRequest, DatabaseError>;
    async fn delete_adoption_request(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Donations
    async fn list_donations(&self) -> Result<Vec<Donation>, DatabaseError>;
    async fn get_donation(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError>;
    async fn create_donation(&self, input: &DonationInput) -> Result<Donation, DatabaseError>;
    async fn update_donation(&self, id: Uuid, input: &DonationInput) -> Result<Donation, DatabaseError>;
    async fn delete_donation(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Expenses
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, DatabaseError>;
    async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, DatabaseError>;
    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense, DatabaseError>;
    async fn update_expense(&self, id: Uuid, input: &ExpenseInput) -> Result<Expense, DatabaseError>;
    async fn delete_expense(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Sponsorships
    async fn list_sponsorships(&self, filter: &SponsorshipFilter) -> Result<Vec<Sponsorship>, DatabaseError>;
    async fn get_sponsorship(&self, id: Uuid) -> Result<Option<Sponsorship>, DatabaseError>;
    async fn create_sponsorship(&self, input: &SponsorshipInput) -> Result<Sponsorship, DatabaseError>;
    async fn update_sponsorship(&self, id: Uuid, input: &SponsorshipInput) -> Result<Sponsorship, DatabaseError>;
    async fn delete_sponsorship(&self, id: Uuid) -> Result<(), DatabaseError>;
}
