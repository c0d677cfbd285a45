//! Fixtures for exercising the router and the database handle without a
//! running PostgreSQL server.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::JwtSessions;
use crate::config::AppConfig;
use crate::database::handle::{DatabaseError, EnvLookup, LazyDatabase, PoolConnector, PoolSettings};
use crate::database::postgres::PgStore;
use crate::database::models::user::normalize_email;
use crate::database::models::*;
use crate::database::store::{DashboardSummary, ShelterStore};
use crate::state::AppState;

pub const TEST_SECRET: &str = "openshelter-test-secret";

/// Lookup over a fixed set of pairs instead of the process environment.
pub fn env_lookup(pairs: &[(&str, &str)]) -> EnvLookup {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(move |key: &str| map.get(key).cloned())
}

/// Connector that counts constructions and never touches the network.
///
/// The returned pool is lazy, so it is only an error to actually query it.
#[derive(Debug, Default)]
pub struct CountingConnector {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingConnector {
    /// Hold each construction open for `delay`, to widen race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolConnector for CountingConnector {
    async fn connect(&self, url: &str, settings: &PoolSettings) -> Result<PgPool, DatabaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_lazy(url)?;
        Ok(pool)
    }
}

/// Connector handing out an already-open pool, such as the one `#[sqlx::test]` provides.
#[derive(Debug)]
pub struct ExistingPool(pub PgPool);

#[async_trait]
impl PoolConnector for ExistingPool {
    async fn connect(&self, _url: &str, _settings: &PoolSettings) -> Result<PgPool, DatabaseError> {
        Ok(self.0.clone())
    }
}

/// `PgStore` over an open pool.
pub fn pg_store(pool: PgPool) -> PgStore {
    let db = LazyDatabase::new(
        env_lookup(&[("DATABASE_URL", "postgres://existing-pool")]),
        Arc::new(ExistingPool(pool)),
        PoolSettings::default(),
    );
    PgStore::new(Arc::new(db))
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    animals: Vec<Animal>,
    adoptions: Vec<AdoptionRequest>,
    donations: Vec<Donation>,
    expenses: Vec<Expense>,
    sponsorships: Vec<Sponsorship>,
}

/// [`ShelterStore`] kept in memory, with the same referential rules as the
/// PostgreSQL schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Add a staff account with a freshly hashed password.
    pub fn with_user(self, email: &str, name: &str, password: &str) -> Self {
        let password_hash =
            hash_password(password).unwrap_or_else(|e| panic!("hashing fixture password: {e}"));
        self.lock_uncounted().users.push(User {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            name: name.to_string(),
            password_hash,
            created_at: Utc::now(),
        });
        self
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.lock_uncounted()
    }

    fn lock_uncounted(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn not_found(what: &str, id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", what, id))
}

fn missing_animal(what: &str) -> DatabaseError {
    DatabaseError::InvalidReference(format!("{} refers to an animal that does not exist", what))
}

fn replace<T>(rows: &mut [T], matches: impl Fn(&T) -> bool, update: impl FnOnce(&mut T)) -> Option<&T> {
    let row = rows.iter_mut().find(|row| matches(&**row))?;
    update(&mut *row);
    Some(&*row)
}

fn remove<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool, what: &str, id: Uuid) -> Result<(), DatabaseError> {
    let before = rows.len();
    rows.retain(|row| !matches(row));
    if rows.len() == before {
        return Err(not_found(what, id));
    }
    Ok(())
}

#[async_trait]
impl ShelterStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = normalize_email(email);
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.lock();
        let email = normalize_email(&user.email);
        if tables.users.iter().any(|u| u.email == email) {
            return Err(DatabaseError::Conflict("user already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: user.name.trim().to_string(),
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut users = self.lock().users.clone();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, DatabaseError> {
        let tables = self.lock();
        let today = Utc::now().date_naive();

        let mut summary = DashboardSummary::default();
        for animal in &tables.animals {
            *summary
                .animals_by_status
                .entry(animal.status.as_str().to_string())
                .or_insert(0) += 1;
        }
        summary.pending_adoptions = tables
            .adoptions
            .iter()
            .filter(|r| r.status == AdoptionStatus::Pending)
            .count() as i64;
        summary.donations_total = tables.donations.iter().map(|d| d.amount).sum();
        summary.expenses_total = tables.expenses.iter().map(|e| e.amount).sum();

        let active: Vec<&Sponsorship> = tables.sponsorships.iter().filter(|s| s.is_active_on(today)).collect();
        summary.active_sponsorships = active.len() as i64;
        summary.monthly_sponsorship_income = active.iter().map(|s| s.monthly_amount).sum::<Decimal>();

        Ok(summary.finish())
    }

    async fn list_animals(&self, filter: &AnimalFilter) -> Result<Vec<Animal>, DatabaseError> {
        let mut animals: Vec<Animal> = self
            .lock()
            .animals
            .iter()
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        animals.sort_by(|a, b| b.intake_date.cmp(&a.intake_date).then_with(|| a.name.cmp(&b.name)));
        Ok(animals)
    }

    async fn get_animal(&self, id: Uuid) -> Result<Option<Animal>, DatabaseError> {
        Ok(self.lock().animals.iter().find(|a| a.id == id).cloned())
    }

    async fn create_animal(&self, input: &AnimalInput) -> Result<Animal, DatabaseError> {
        let now = Utc::now();
        let animal = Animal {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            species: input.species.clone(),
            breed: input.breed.clone(),
            sex: input.sex(),
            age_months: input.age_months,
            status: input.status(),
            intake_date: input.intake_date(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().animals.push(animal.clone());
        Ok(animal)
    }

    async fn update_animal(&self, id: Uuid, input: &AnimalInput) -> Result<Animal, DatabaseError> {
        let mut tables = self.lock();
        replace(&mut tables.animals, |a| a.id == id, |a| {
            a.name = input.name.clone();
            a.species = input.species.clone();
            a.breed = input.breed.clone();
            a.sex = input.sex();
            a.age_months = input.age_months;
            a.status = input.status();
            a.intake_date = input.intake_date();
            a.description = input.description.clone();
            a.updated_at = Utc::now();
        })
        .cloned()
        .ok_or_else(|| not_found("animal", id))
    }

    async fn delete_animal(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.lock();
        remove(&mut tables.animals, |a| a.id == id, "animal", id)?;
        // ON DELETE CASCADE / SET NULL
        tables.adoptions.retain(|r| r.animal_id != id);
        tables.sponsorships.retain(|s| s.animal_id != id);
        for expense in tables.expenses.iter_mut().filter(|e| e.animal_id == Some(id)) {
            expense.animal_id = None;
        }
        Ok(())
    }

    async fn list_adoption_requests(&self, filter: &AdoptionFilter) -> Result<Vec<AdoptionRequest>, DatabaseError> {
        let mut requests: Vec<AdoptionRequest> = self
            .lock()
            .adoptions
            .iter()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.animal_id.map_or(true, |id| r.animal_id == id))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn get_adoption_request(&self, id: Uuid) -> Result<Option<AdoptionRequest>, DatabaseError> {
        Ok(self.lock().adoptions.iter().find(|r| r.id == id).cloned())
    }

    async fn create_adoption_request(&self, input: &AdoptionRequestInput) -> Result<AdoptionRequest, DatabaseError> {
        let mut tables = self.lock();
        match tables.animals.iter().find(|a| a.id == input.animal_id) {
            None => return Err(missing_animal("adoption request")),
            Some(animal) if animal.status == AnimalStatus::Adopted => {
                return Err(DatabaseError::Conflict("animal has already been adopted".to_string()))
            }
            Some(_) => {}
        }
        let request = AdoptionRequest {
            id: Uuid::new_v4(),
            animal_id: input.animal_id,
            applicant_name: input.applicant_name.clone(),
            applicant_email: input.applicant_email.clone(),
            applicant_phone: input.applicant_phone.clone(),
            message: input.message.clone(),
            status: AdoptionStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        tables.adoptions.push(request.clone());
        Ok(request)
    }

    async fn review_adoption_request(&self, id: Uuid, status: AdoptionStatus) -> Result<AdoptionRequest, DatabaseError> {
        let mut tables = self.lock();
        let current = tables
            .adoptions
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found("adoption request", id))?;

        if !current.status.can_transition_to(status) {
            return Err(DatabaseError::Conflict(format!(
                "adoption request is {} and cannot become {}",
                current.status, status
            )));
        }

        let now = Utc::now();
        if status == AdoptionStatus::Approved {
            let animal = tables
                .animals
                .iter_mut()
                .find(|a| a.id == current.animal_id)
                .ok_or_else(|| not_found("animal", current.animal_id))?;
            if animal.status == AnimalStatus::Adopted {
                return Err(DatabaseError::Conflict("animal has already been adopted".to_string()));
            }
            animal.status = AnimalStatus::Adopted;
            animal.updated_at = now;

            for other in tables
                .adoptions
                .iter_mut()
                .filter(|r| r.animal_id == current.animal_id && r.id != id && r.status == AdoptionStatus::Pending)
            {
                other.status = AdoptionStatus::Rejected;
                other.reviewed_at = Some(now);
            }
        }

        replace(&mut tables.adoptions, |r| r.id == id, |r| {
            r.status = status;
            r.reviewed_at = Some(now);
        })
        .cloned()
        .ok_or_else(|| not_found("adoption request", id))
    }

    async fn delete_adoption_request(&self, id: Uuid) -> Result<(), DatabaseError> {
        remove(&mut self.lock().adoptions, |r| r.id == id, "adoption request", id)
    }

    async fn list_donations(&self) -> Result<Vec<Donation>, DatabaseError> {
        let mut donations = self.lock().donations.clone();
        donations.sort_by(|a, b| b.donated_on.cmp(&a.donated_on).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(donations)
    }

    async fn get_donation(&self, id: Uuid) -> Result<Option<Donation>, DatabaseError> {
        Ok(self.lock().donations.iter().find(|d| d.id == id).cloned())
    }

    async fn create_donation(&self, input: &DonationInput) -> Result<Donation, DatabaseError> {
        let donation = Donation {
            id: Uuid::new_v4(),
            donor_name: input.donor_name.clone(),
            donor_email: input.donor_email.clone(),
            amount: input.amount,
            method: input.method(),
            note: input.note.clone(),
            donated_on: input.donated_on(),
            created_at: Utc::now(),
        };
        self.lock().donations.push(donation.clone());
        Ok(donation)
    }

    async fn update_donation(&self, id: Uuid, input: &DonationInput) -> Result<Donation, DatabaseError> {
        let mut tables = self.lock();
        replace(&mut tables.donations, |d| d.id == id, |d| {
            d.donor_name = input.donor_name.clone();
            d.donor_email = input.donor_email.clone();
            d.amount = input.amount;
            d.method = input.method();
            d.note = input.note.clone();
            d.donated_on = input.donated_on();
        })
        .cloned()
        .ok_or_else(|| not_found("donation", id))
    }

    async fn delete_donation(&self, id: Uuid) -> Result<(), DatabaseError> {
        remove(&mut self.lock().donations, |d| d.id == id, "donation", id)
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, DatabaseError> {
        let mut expenses: Vec<Expense> = self
            .lock()
            .expenses
            .iter()
            .filter(|e| filter.category.map_or(true, |c| e.category == c))
            .filter(|e| filter.animal_id.map_or(true, |id| e.animal_id == Some(id)))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.incurred_on.cmp(&a.incurred_on).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(expenses)
    }

    async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, DatabaseError> {
        Ok(self.lock().expenses.iter().find(|e| e.id == id).cloned())
    }

    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense, DatabaseError> {
        let mut tables = self.lock();
        if let Some(animal_id) = input.animal_id {
            if !tables.animals.iter().any(|a| a.id == animal_id) {
                return Err(missing_animal("expense"));
            }
        }
        let expense = Expense {
            id: Uuid::new_v4(),
            category: input.category,
            description: input.description.clone(),
            amount: input.amount,
            vendor: input.vendor.clone(),
            animal_id: input.animal_id,
            incurred_on: input.incurred_on(),
            created_at: Utc::now(),
        };
        tables.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn update_expense(&self, id: Uuid, input: &ExpenseInput) -> Result<Expense, DatabaseError> {
        let mut tables = self.lock();
        if let Some(animal_id) = input.animal_id {
            if !tables.animals.iter().any(|a| a.id == animal_id) {
                return Err(missing_animal("expense"));
            }
        }
        replace(&mut tables.expenses, |e| e.id == id, |e| {
            e.category = input.category;
            e.description = input.description.clone();
            e.amount = input.amount;
            e.vendor = input.vendor.clone();
            e.animal_id = input.animal_id;
            e.incurred_on = input.incurred_on();
        })
        .cloned()
        .ok_or_else(|| not_found("expense", id))
    }

    async fn delete_expense(&self, id: Uuid) -> Result<(), DatabaseError> {
        remove(&mut self.lock().expenses, |e| e.id == id, "expense", id)
    }

    async fn list_sponsorships(&self, filter: &SponsorshipFilter) -> Result<Vec<Sponsorship>, DatabaseError> {
        let today = Utc::now().date_naive();
        let mut sponsorships: Vec<Sponsorship> = self
            .lock()
            .sponsorships
            .iter()
            .filter(|s| filter.active.map_or(true, |active| s.is_active_on(today) == active))
            .filter(|s| filter.animal_id.map_or(true, |id| s.animal_id == id))
            .cloned()
            .collect();
        sponsorships.sort_by(|a, b| b.started_on.cmp(&a.started_on).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(sponsorships)
    }

    async fn get_sponsorship(&self, id: Uuid) -> Result<Option<Sponsorship>, DatabaseError> {
        Ok(self.lock().sponsorships.iter().find(|s| s.id == id).cloned())
    }

    async fn create_sponsorship(&self, input: &SponsorshipInput) -> Result<Sponsorship, DatabaseError> {
        let mut tables = self.lock();
        if !tables.animals.iter().any(|a| a.id == input.animal_id) {
            return Err(missing_animal("sponsorship"));
        }
        let sponsorship = Sponsorship {
            id: Uuid::new_v4(),
            animal_id: input.animal_id,
            sponsor_name: input.sponsor_name.clone(),
            sponsor_email: input.sponsor_email.clone(),
            monthly_amount: input.monthly_amount,
            started_on: input.started_on(),
            ended_on: input.ended_on,
            created_at: Utc::now(),
        };
        tables.sponsorships.push(sponsorship.clone());
        Ok(sponsorship)
    }

    async fn update_sponsorship(&self, id: Uuid, input: &SponsorshipInput) -> Result<Sponsorship, DatabaseError> {
        let mut tables = self.lock();
        if !tables.animals.iter().any(|a| a.id == input.animal_id) {
            return Err(missing_animal("sponsorship"));
        }
        replace(&mut tables.sponsorships, |s| s.id == id, |s| {
            s.animal_id = input.animal_id;
            s.sponsor_name = input.sponsor_name.clone();
            s.sponsor_email = input.sponsor_email.clone();
            s.monthly_amount = input.monthly_amount;
            s.started_on = input.started_on();
            s.ended_on = input.ended_on;
        })
        .cloned()
        .ok_or_else(|| not_found("sponsorship", id))
    }

    async fn delete_sponsorship(&self, id: Uuid) -> Result<(), DatabaseError> {
        remove(&mut self.lock().sponsorships, |s| s.id == id, "sponsorship", id)
    }
}

/// Application state over `store` with JWT sessions signed by [`TEST_SECRET`].
pub fn test_state(store: Arc<dyn ShelterStore>) -> AppState {
    let mut config = AppConfig::default();
    config.security.session_secret = TEST_SECRET.to_string();
    let sessions = JwtSessions::from_config(&config.security)
        .unwrap_or_else(|e| panic!("test session provider: {}", e));
    AppState::new(store, Arc::new(sessions), config)
}
