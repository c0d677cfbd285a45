// PgStore and the migration runner against a real PostgreSQL server.
// Each test gets a fresh database from #[sqlx::test].
// Run with: DATABASE_URL=postgres://... cargo test --test 70_postgres_store -- --ignored

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use openshelter::database::models::*;
use openshelter::database::{DatabaseError, ShelterStore};
use openshelter::migrate::run_migrations;
use openshelter::testing::{env_lookup, pg_store};

fn animal(name: &str, status: AnimalStatus) -> AnimalInput {
    AnimalInput {
        name: name.to_string(),
        species: "dog".to_string(),
        breed: None,
        sex: None,
        age_months: None,
        status: Some(status),
        intake_date: None,
        description: None,
    }
}

fn application(animal_id: Uuid, name: &str) -> AdoptionRequestInput {
    AdoptionRequestInput {
        animal_id,
        applicant_name: name.to_string(),
        applicant_email: format!("{}@example.org", name.to_lowercase()),
        applicant_phone: None,
        message: None,
    }
}

fn sponsorship(animal_id: Uuid, started_days_ago: i64, ended_days_ago: Option<i64>) -> SponsorshipInput {
    let today = Utc::now().date_naive();
    SponsorshipInput {
        animal_id,
        sponsor_name: "Sam".to_string(),
        sponsor_email: "sam@example.org".to_string(),
        monthly_amount: Decimal::new(1_500, 2),
        started_on: Some(today - Duration::days(started_days_ago)),
        ended_on: ended_days_ago.map(|days| today - Duration::days(days)),
    }
}

#[sqlx::test(migrator = "openshelter::migrate::MIGRATOR")]
#[ignore = "requires database"]
async fn approval_adopts_the_animal_and_rejects_competitors(pool: PgPool) -> anyhow::Result<()> {
    let store = pg_store(pool);
    let biscuit = store.create_animal(&animal("Biscuit", AnimalStatus::Available)).await?;

    let first = store.create_adoption_request(&application(biscuit.id, "Ada")).await?;
    let second = store.create_adoption_request(&application(biscuit.id, "Grace")).await?;
    assert_eq!(first.status, AdoptionStatus::Pending);

    let approved = store.review_adoption_request(first.id, AdoptionStatus::Approved).await?;
    assert_eq!(approved.status, AdoptionStatus::Approved);
    assert!(approved.reviewed_at.is_some());

    let biscuit = store.get_animal(biscuit.id).await?.unwrap();
    assert_eq!(biscuit.status, AnimalStatus::Adopted);
    let second = store.get_adoption_request(second.id).await?.unwrap();
    assert_eq!(second.status, AdoptionStatus::Rejected);
    assert!(second.reviewed_at.is_some());

    let err = store
        .review_adoption_request(second.id, AdoptionStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");

    let err = store
        .create_adoption_request(&application(biscuit.id, "Linus"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");
    Ok(())
}

#[sqlx::test(migrator = "openshelter::migrate::MIGRATOR")]
#[ignore = "requires database"]
async fn approval_of_an_already_adopted_animal_conflicts(pool: PgPool) -> anyhow::Result<()> {
    let store = pg_store(pool);
    let pepper = store.create_animal(&animal("Pepper", AnimalStatus::Available)).await?;
    let request = store.create_adoption_request(&application(pepper.id, "Ada")).await?;
    store.update_animal(pepper.id, &animal("Pepper", AnimalStatus::Adopted)).await?;

    let err = store
        .review_adoption_request(request.id, AdoptionStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");

    let request = store.get_adoption_request(request.id).await?.unwrap();
    assert_eq!(request.status, AdoptionStatus::Pending);
    assert!(request.reviewed_at.is_none());
    Ok(())
}

#[sqlx::test(migrator = "openshelter::migrate::MIGRATOR")]
#[ignore = "requires database"]
async fn constraint_violations_map_to_store_errors(pool: PgPool) -> anyhow::Result<()> {
    let store = pg_store(pool);
    let missing = Uuid::new_v4();

    let err = store.create_adoption_request(&application(missing, "Ada")).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidReference(_)), "{err:?}");

    let err = store.create_sponsorship(&sponsorship(missing, 0, None)).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidReference(_)), "{err:?}");

    let expense = ExpenseInput {
        category: ExpenseCategory::Medical,
        description: "Vaccines".to_string(),
        amount: Decimal::new(4_025, 2),
        vendor: None,
        animal_id: Some(missing),
        incurred_on: None,
    };
    let err = store.create_expense(&expense).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidReference(_)), "{err:?}");

    let user = NewUser {
        email: "Staff@Shelter.org".to_string(),
        name: "Staff".to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    };
    let created = store.create_user(user.clone()).await?;
    assert_eq!(created.email, "staff@shelter.org");
    let err = store
        .create_user(NewUser {
            email: "staff@shelter.org".to_string(),
            ..user
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");
    Ok(())
}

#[sqlx::test(migrator = "openshelter::migrate::MIGRATOR")]
#[ignore = "requires database"]
async fn sponsorships_filter_on_whether_they_are_running_today(pool: PgPool) -> anyhow::Result<()> {
    let store = pg_store(pool);
    let rex = store.create_animal(&animal("Rex", AnimalStatus::Available)).await?;

    let running = store.create_sponsorship(&sponsorship(rex.id, 30, None)).await?;
    let ended = store.create_sponsorship(&sponsorship(rex.id, 60, Some(10))).await?;
    let upcoming = store.create_sponsorship(&sponsorship(rex.id, -10, None)).await?;

    let ids = |list: Vec<Sponsorship>| {
        let mut ids: Vec<Uuid> = list.into_iter().map(|s| s.id).collect();
        ids.sort();
        ids
    };
    let sorted = |mut ids: Vec<Uuid>| {
        ids.sort();
        ids
    };

    let active = store
        .list_sponsorships(&SponsorshipFilter { active: Some(true), ..Default::default() })
        .await?;
    assert_eq!(ids(active), vec![running.id]);

    let inactive = store
        .list_sponsorships(&SponsorshipFilter { active: Some(false), ..Default::default() })
        .await?;
    assert_eq!(ids(inactive), sorted(vec![ended.id, upcoming.id]));

    let all = store.list_sponsorships(&SponsorshipFilter::default()).await?;
    assert_eq!(all.len(), 3);

    let other = store.create_animal(&animal("Other", AnimalStatus::Available)).await?;
    let for_other = store
        .list_sponsorships(&SponsorshipFilter { animal_id: Some(other.id), ..Default::default() })
        .await?;
    assert!(for_other.is_empty());
    Ok(())
}

#[sqlx::test(migrator = "openshelter::migrate::MIGRATOR")]
#[ignore = "requires database"]
async fn dashboard_summary_totals_every_table(pool: PgPool) -> anyhow::Result<()> {
    let store = pg_store(pool);

    let empty = store.dashboard_summary().await?;
    assert_eq!(empty.total_animals, 0);
    assert_eq!(empty.animals_by_status.len(), AnimalStatus::ALL.len());
    assert_eq!(empty.balance, Decimal::ZERO);

    let rex = store.create_animal(&animal("Rex", AnimalStatus::Available)).await?;
    store.create_animal(&animal("Biscuit", AnimalStatus::Available)).await?;
    store.create_animal(&animal("Mittens", AnimalStatus::Medical)).await?;
    store.create_adoption_request(&application(rex.id, "Ada")).await?;

    for (donor, cents) in [("Ada", 10_000), ("Grace", 2_550)] {
        store
            .create_donation(&DonationInput {
                donor_name: donor.to_string(),
                donor_email: None,
                amount: Decimal::new(cents, 2),
                method: None,
                note: None,
                donated_on: None,
            })
            .await?;
    }
    store
        .create_expense(&ExpenseInput {
            category: ExpenseCategory::Food,
            description: "Kibble".to_string(),
            amount: Decimal::new(4_025, 2),
            vendor: None,
            animal_id: None,
            incurred_on: None,
        })
        .await?;
    store.create_sponsorship(&sponsorship(rex.id, 5, None)).await?;
    store.create_sponsorship(&sponsorship(rex.id, 60, Some(10))).await?;

    let summary = store.dashboard_summary().await?;
    assert_eq!(summary.total_animals, 3);
    assert_eq!(summary.animals_by_status["available"], 2);
    assert_eq!(summary.animals_by_status["medical"], 1);
    assert_eq!(summary.animals_by_status["adopted"], 0);
    assert_eq!(summary.pending_adoptions, 1);
    assert_eq!(summary.donations_total, Decimal::new(12_550, 2));
    assert_eq!(summary.expenses_total, Decimal::new(4_025, 2));
    assert_eq!(summary.balance, Decimal::new(8_525, 2));
    assert_eq!(summary.active_sponsorships, 1);
    assert_eq!(summary.monthly_sponsorship_income, Decimal::new(1_500, 2));
    Ok(())
}

#[sqlx::test(migrations = false)]
#[ignore = "requires database"]
async fn migrations_apply_once_and_then_report_nothing_new(pool: PgPool) -> anyhow::Result<()> {
    // Point the runner at the empty database this test was given
    let name: String = sqlx::query_scalar("SELECT current_database()").fetch_one(&pool).await?;
    let mut url = url::Url::parse(&std::env::var("DATABASE_URL")?)?;
    url.set_path(&name);
    let lookup = env_lookup(&[("DATABASE_URL", url.as_str())]);

    let first = run_migrations(&*lookup).await?;
    assert!(first.known > 0);
    assert_eq!(first.newly_applied, first.known);

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_name IN ('users', 'animals', 'adoption_requests', 'donations', 'expenses', 'sponsorships')",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(tables, 6);

    let second = run_migrations(&*lookup).await?;
    assert_eq!(second.known, first.known);
    assert_eq!(second.newly_applied, 0);
    Ok(())
}
