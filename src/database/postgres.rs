use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::handle::{DatabaseError, LazyDatabase};
use crate::database::models::user::normalize_email;
use crate::database::models::*;
use crate::database::store::{DashboardSummary, ShelterStore};

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";
const ANIMAL_COLUMNS: &str =
    "id, name, species, breed, sex, age_months, status, intake_date, description, created_at, updated_at";
const ADOPTION_COLUMNS: &str =
    "id, animal_id, applicant_name, applicant_email, applicant_phone, message, status, created_at, reviewed_at";
const DONATION_COLUMNS: &str = "id, donor_name, donor_email, amount, method, note, donated_on, created_at";
const EXPENSE_COLUMNS: &str = "id, category, description, amount, vendor, animal_id, incurred_on, created_at";
const SPONSORSHIP_COLUMNS: &str =
    "id, animal_id, sponsor_name, sponsor_email, monthly_amount, started_on, ended_on, created_at";

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// [`ShelterStore`] backed by PostgreSQL through the lazy handle.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: Arc<LazyDatabase>,
}

impl PgStore {
    pub fn new(db: Arc<LazyDatabase>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<LazyDatabase> {
        &self.db
    }

    async fn pool(&self) -> Result<&PgPool, DatabaseError> {
        self.db.pool().await
    }
}

/// Translate constraint violations into errors the pages can explain.
fn write_error(err: sqlx::Error, what: &str) -> DatabaseError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => {
                return DatabaseError::InvalidReference(format!("{} refers to an animal that does not exist", what))
            }
            Some(UNIQUE_VIOLATION) => return DatabaseError::Conflict(format!("{} already exists", what)),
            _ => {}
        }
    }
    DatabaseError::Sqlx(err)
}

fn not_found(what: &str, id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", what, id))
}

fn expect_deleted(rows: u64, what: &str, id: Uuid) -> Result<(), DatabaseError> {
    if rows == 0 {
        return Err(not_found(what, id));
    }
    debug!("Deleted {} {}", what, id);
    Ok(())
}

#[async_trait]
impl ShelterStore for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.health_check().await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let pool = self.pool().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let pool = self.pool().await?;
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(normalize_email(&user.email))
        .bind(user.name.trim())
        .bind(&user.password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| write_error(e, "user"))?;
        info!("Created user {}", created.email);
        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let pool = self.pool().await?;
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY email"))
            .fetch_all(pool)
            .await?;
        Ok(users)
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, DatabaseError> {
        let pool = self.pool().await?;

        let by_status = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM animals GROUP BY status",
        )
        .fetch_all(pool);

        let totals = sqlx::query_as::<_, (i64, Decimal, Decimal, i64, Decimal)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM adoption_requests WHERE status = 'pending'),
                (SELECT COALESCE(SUM(amount), 0) FROM donations),
                (SELECT COALESCE(SUM(amount), 0) FROM expenses),
                (SELECT COUNT(*) FROM sponsorships
                  WHERE started_on <= CURRENT_DATE AND (ended_on IS NULL OR ended_on >= CURRENT_DATE)),
                (SELECT COALESCE(SUM(monthly_amount), 0) FROM sponsorships
                  WHERE started_on <= CURRENT_DATE AND (ended_on IS NULL OR ended_on >= CURRENT_DATE))
            "#,
        )
        .fetch_one(pool);

        let (by_status, totals) = futures::try_join!(by_status, totals)?;
        let (pending_adoptions, donations_total, expenses_total, active_sponsorships, monthly_sponsorship_income) =
            totals;

        Ok(DashboardSummary {
            animals_by_status: by_status.into_iter().collect(),
            pending_adoptions,
            donations_total,
            expenses_total,
            active_sponsorships,
            monthly_sponsorship_income,
            ..Default::default()
        }
        .finish())
    }

    // ========================================================================
    // Animals
    // ========================================================================

    async fn list_animals(&self, filter: &AnimalFilter) -> Result<Vec<Animal>, DatabaseError> {
        let pool = self.pool().await?;
        let animals = sqlx::query_as::<_, Animal>(&format!(
            "SELECT {ANIMAL_COLUMNS} FROM animals
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY intake_date DESC, name"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;
        Ok(animals)
    }

    async fn get_animal(&self, id: Uuid) -> Result<Option<Animal>, DatabaseError> {
        let pool = self.pool().await?;
        let animal = sqlx::query_as::<_, Animal>(&format!("SELECT {ANIMAL_COLUMNS} FROM animals WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(animal)
    }

    async fn create_animal(&self, input: &AnimalInput) -> Result<Animal, DatabaseError> {
        let pool = self.pool().await?;
        let animal = sqlx::query_as::<_, Animal>(&format!(
            "INSERT INTO animals (name, species, breed, sex, age_months, status, intake_date, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ANIMAL_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.species)
        .bind(&input.breed)
        .bind(input.sex().as_str())
        .bind(input.age_months)
        .bind(input.status().as_str())
        .bind(input.intake_date())
        .bind(&input.description)
        .fetch_one(pool)
        .await?;
        info!("Created animal {} ({})", animal.name, animal.id);
        Ok(animal)
    }

    async fn update_animal(&self, id: Uuid, input: &AnimalInput) -> Result<Animal, DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, Animal>(&format!(
            "UPDATE animals
             SET name = $2, species = $3, breed = $4, sex = $5, age_months = $6, status = $7,
                 intake_date = $8, description = $9, updated_at = now()
             WHERE id = $1
             RETURNING {ANIMAL_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.species)
        .bind(&input.breed)
        .bind(input.sex().as_str())
        .bind(input.age_months)
        .bind(input.status().as_str())
        .bind(input.intake_date())
        .bind(&input.description)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found("animal", id))
    }

    async fn delete_animal(&self, id: Uuid) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM animals WHERE id = $1").bind(id).execute(pool).await?;
        expect_deleted(result.rows_affected(), "animal", id)
    }

    // ========================================================================
    // Adoption requests
    // ========================================================================

    async fn list_adoption_requests(&self, filter: &AdoptionFilter) -> Result<Vec<AdoptionRequest>, DatabaseError> {
        let pool = self.pool().await?;
        let requests = sqlx::query_as::<_, AdoptionRequest>(&format!(
            "SELECT {ADOPTION_COLUMNS} FROM adoption_requests
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::uuid IS NULL OR animal_id = $2)
             ORDER BY created_at DESC"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.animal_id)
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    async fn get_adoption_request(&self, id: Uuid) -> Result<Option<AdoptionRequest>, DatabaseError> {
        let pool = self.pool().await?;
        let request = sqlx::query_as::<_, AdoptionRequest>(&format!(
            "SELECT {ADOPTION_COLUMNS} FROM adoption_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(request)
    }

    async fn create_adoption_request(&self, input: &AdoptionRequestInput) -> Result<AdoptionRequest, DatabaseError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        // FOR SHARE waits out an approval holding the animal FOR UPDATE
        let animal_status: Option<String> = sqlx::query_scalar("SELECT status FROM animals WHERE id = $1 FOR SHARE")
            .bind(input.animal_id)
            .fetch_optional(&mut *tx)
            .await?;
        match animal_status.as_deref() {
            None => {
                return Err(DatabaseError::InvalidReference(format!(
                    "animal {} does not exist",
                    input.animal_id
                )))
            }
            Some(status) if status == AnimalStatus::Adopted.as_str() => {
                return Err(DatabaseError::Conflict("animal has already been adopted".to_string()))
            }
            Some(_) => {}
        }

        let request = sqlx::query_as::<_, AdoptionRequest>(&format!(
            "INSERT INTO adoption_requests (animal_id, applicant_name, applicant_email, applicant_phone, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ADOPTION_COLUMNS}"
        ))
        .bind(input.animal_id)
        .bind(&input.applicant_name)
        .bind(&input.applicant_email)
        .bind(&input.applicant_phone)
        .bind(&input.message)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "adoption request"))?;

        tx.commit().await?;
        info!("Created adoption request {} for animal {}", request.id, request.animal_id);
        Ok(request)
    }

    async fn review_adoption_request(&self, id: Uuid, status: AdoptionStatus) -> Result<AdoptionRequest, DatabaseError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, AdoptionRequest>(&format!(
            "SELECT {ADOPTION_COLUMNS} FROM adoption_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found("adoption request", id))?;

        if !current.status.can_transition_to(status) {
            return Err(DatabaseError::Conflict(format!(
                "adoption request is {} and cannot become {}",
                current.status, status
            )));
        }

        if status == AdoptionStatus::Approved {
            let animal_status: String = sqlx::query_scalar("SELECT status FROM animals WHERE id = $1 FOR UPDATE")
                .bind(current.animal_id)
                .fetch_one(&mut *tx)
                .await?;
            if animal_status == AnimalStatus::Adopted.as_str() {
                return Err(DatabaseError::Conflict("animal has already been adopted".to_string()));
            }

            sqlx::query("UPDATE animals SET status = 'adopted', updated_at = now() WHERE id = $1")
                .bind(current.animal_id)
                .execute(&mut *tx)
                .await?;

            let rejected = sqlx::query(
                "UPDATE adoption_requests SET status = 'rejected', reviewed_at = now()
                 WHERE animal_id = $1 AND id <> $2 AND status = 'pending'",
            )
            .bind(current.animal_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            if rejected.rows_affected() > 0 {
                info!(
                    "Rejected {} competing adoption request(s) for animal {}",
                    rejected.rows_affected(),
                    current.animal_id
                );
            }
        }

        let updated = sqlx::query_as::<_, AdoptionRequest>(&format!(
            "UPDATE adoption_requests SET status = $2, reviewed_at = now()
             WHERE id = $1
             RETURNING {ADOPTION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Adoption request {} is now {}", id, status);
        Ok(updated)
    }

    async fn delete_adoption_request(&self, id: Uuid) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM adoption_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        expect_deleted(result.rows_affected(), "adoption request", id)
    }

    // ========================================================================
    // Donations
    // ========================================================================

    async fn list_donations(&self) -> Result<Vec<Donation>, DatabaseError> {
        let pool = self.pool().await?;
        let donations = sqlx::query_as::<_, Donation>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations ORDER BY donated_on DESC, created_at DESC"
        ))
        .fetch_all(pool)
        .await?;
        Ok(donations)
    }

    async fn get_donation(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError> {
        let pool = self.pool().await?;
        let donation = sqlx::query_as::<_, Donation>(&format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(donation)
    }

    async fn create_donation(&self, input: &DonationInput) -> Result<Donation, DatabaseError> {
        let pool = self.pool().await?;
        let donation = sqlx::query_as::<_, Donation>(&format!(
            "INSERT INTO donations (donor_name, donor_email, amount, method, note, donated_on)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {DONATION_COLUMNS}"
        ))
        .bind(&input.donor_name)
        .bind(&input.donor_email)
        .bind(input.amount)
        .bind(input.method().as_str())
        .bind(&input.note)
        .bind(input.donated_on())
        .fetch_one(pool)
        .await?;
        info!("Recorded donation {} of {}", donation.id, donation.amount);
        Ok(donation)
    }

    async fn update_donation(&self, id: Uuid, input: &DonationInput) -> Result<Donation, DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, Donation>(&format!(
            "UPDATE donations
             SET donor_name = $2, donor_email = $3, amount = $4, method = $5, note = $6, donated_on = $7
             WHERE id = $1
             RETURNING {DONATION_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.donor_name)
        .bind(&input.donor_email)
        .bind(input.amount)
        .bind(input.method().as_str())
        .bind(&input.note)
        .bind(input.donated_on())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found("donation", id))
    }

    async fn delete_donation(&self, id: Uuid) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM donations WHERE id = $1").bind(id).execute(pool).await?;
        expect_deleted(result.rows_affected(), "donation", id)
    }

    // ========================================================================
    // Expenses
    // ========================================================================

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, DatabaseError> {
        let pool = self.pool().await?;
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE ($1::text IS NULL OR category = $1)
               AND ($2::uuid IS NULL OR animal_id = $2)
             ORDER BY incurred_on DESC, created_at DESC"
        ))
        .bind(filter.category.map(|c| c.as_str()))
        .bind(filter.animal_id)
        .fetch_all(pool)
        .await?;
        Ok(expenses)
    }

    async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, DatabaseError> {
        let pool = self.pool().await?;
        let expense = sqlx::query_as::<_, Expense>(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(expense)
    }

    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense, DatabaseError> {
        let pool = self.pool().await?;
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "INSERT INTO expenses (category, description, amount, vendor, animal_id, incurred_on)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(input.category.as_str())
        .bind(&input.description)
        .bind(input.amount)
        .bind(&input.vendor)
        .bind(input.animal_id)
        .bind(input.incurred_on())
        .fetch_one(pool)
        .await
        .map_err(|e| write_error(e, "expense"))?;
        info!("Recorded {} expense {} of {}", expense.category, expense.id, expense.amount);
        Ok(expense)
    }

    async fn update_expense(&self, id: Uuid, input: &ExpenseInput) -> Result<Expense, DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, Expense>(&format!(
            "UPDATE expenses
             SET category = $2, description = $3, amount = $4, vendor = $5, animal_id = $6, incurred_on = $7
             WHERE id = $1
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(id)
        .bind(input.category.as_str())
        .bind(&input.description)
        .bind(input.amount)
        .bind(&input.vendor)
        .bind(input.animal_id)
        .bind(input.incurred_on())
        .fetch_optional(pool)
        .await
        .map_err(|e| write_error(e, "expense"))?
        .ok_or_else(|| not_found("expense", id))
    }

    async fn delete_expense(&self, id: Uuid) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1").bind(id).execute(pool).await?;
        expect_deleted(result.rows_affected(), "expense", id)
    }

    // ========================================================================
    // Sponsorships
    // ========================================================================

    async fn list_sponsorships(&self, filter: &SponsorshipFilter) -> Result<Vec<Sponsorship>, DatabaseError> {
        let pool = self.pool().await?;
        let sponsorships = sqlx::query_as::<_, Sponsorship>(&format!(
            "SELECT {SPONSORSHIP_COLUMNS} FROM sponsorships
             WHERE ($1::bool IS NULL
                    OR $1 = (started_on <= CURRENT_DATE AND (ended_on IS NULL OR ended_on >= CURRENT_DATE)))
               AND ($2::uuid IS NULL OR animal_id = $2)
             ORDER BY started_on DESC, created_at DESC"
        ))
        .bind(filter.active)
        .bind(filter.animal_id)
        .fetch_all(pool)
        .await?;
        Ok(sponsorships)
    }

    async fn get_sponsorship(&self, id: Uuid) -> Result<Option<Sponsorship>, DatabaseError> {
        let pool = self.pool().await?;
        let sponsorship = sqlx::query_as::<_, Sponsorship>(&format!(
            "SELECT {SPONSORSHIP_COLUMNS} FROM sponsorships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(sponsorship)
    }

    async fn create_sponsorship(&self, input: &SponsorshipInput) -> Result<Sponsorship, DatabaseError> {
        let pool = self.pool().await?;
        let sponsorship = sqlx::query_as::<_, Sponsorship>(&format!(
            "INSERT INTO sponsorships (animal_id, sponsor_name, sponsor_email, monthly_amount, started_on, ended_on)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SPONSORSHIP_COLUMNS}"
        ))
        .bind(input.animal_id)
        .bind(&input.sponsor_name)
        .bind(&input.sponsor_email)
        .bind(input.monthly_amount)
        .bind(input.started_on())
        .bind(input.ended_on)
        .fetch_one(pool)
        .await
        .map_err(|e| write_error(e, "sponsorship"))?;
        info!("Created sponsorship {} for animal {}", sponsorship.id, sponsorship.animal_id);
        Ok(sponsorship)
    }

    async fn update_sponsorship(&self, id: Uuid, input: &SponsorshipInput) -> Result<Sponsorship, DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, Sponsorship>(&format!(
            "UPDATE sponsorships
             SET animal_id = $2, sponsor_name = $3, sponsor_email = $4, monthly_amount = $5,
                 started_on = $6, ended_on = $7
             WHERE id = $1
             RETURNING {SPONSORSHIP_COLUMNS}"
        ))
        .bind(id)
        .bind(input.animal_id)
        .bind(&input.sponsor_name)
        .bind(&input.sponsor_email)
        .bind(input.monthly_amount)
        .bind(input.started_on())
        .bind(input.ended_on)
        .fetch_optional(pool)
        .await
        .map_err(|e| write_error(e, "sponsorship"))?
        .ok_or_else(|| not_found("sponsorship", id))
    }

    async fn delete_sponsorship(&self, id: Uuid) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM sponsorships WHERE id = $1").bind(id).execute(pool).await?;
        expect_deleted(result.rows_affected(), "sponsorship", id)
    }
}
