mod common;

use std::str::FromStr;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::*;
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn donation_crud_and_validation() {
    let app = spawn_app();
    let cookie = app.sign_in().await;

    let (status, body) = app
        .post(
            "/dashboard/donations",
            &cookie,
            json!({ "donor_name": "Ada", "amount": "25.456", "method": "card" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(money(&body["data"]["amount"]), dec("25.46"));
    assert_eq!(body["data"]["method"], "card");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put(
            &format!("/dashboard/donations/{id}"),
            &cookie,
            json!({ "donor_name": "Ada Lovelace", "amount": 40 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["donor_name"], "Ada Lovelace");
    assert_eq!(body["data"]["method"], "other");

    for amount in [json!(0), json!("-5")] {
        let (status, body) = app
            .post("/dashboard/donations", &cookie, json!({ "donor_name": "Ada", "amount": amount }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["amount"].is_string());
    }

    let (_, body) = app.get("/dashboard/donations", &cookie).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    assert_eq!(app.delete(&format!("/dashboard/donations/{id}"), &cookie).await, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/dashboard/donations/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expenses_filter_and_keep_history_when_animal_leaves() {
    let app = spawn_app();
    let cookie = app.sign_in().await;
    let animal = app.create_animal(&cookie, json!({ "name": "Biscuit", "species": "dog" })).await;

    let (status, body) = app
        .post(
            "/dashboard/expenses",
            &cookie,
            json!({ "category": "medical", "description": "Vaccines", "amount": "80.00", "animal_id": animal }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let vet = body["data"]["id"].as_str().unwrap().to_string();

    app.post(
        "/dashboard/expenses",
        &cookie,
        json!({ "category": "food", "description": "Kibble", "amount": "35.50", "vendor": "Feed & Co" }),
    )
    .await;

    let (_, body) = app.get("/dashboard/expenses?category=food", &cookie).await;
    let food = body["data"].as_array().unwrap();
    assert_eq!(food.len(), 1);
    assert_eq!(food[0]["vendor"], "Feed & Co");

    let (_, body) = app.get(&format!("/dashboard/expenses?animal_id={animal}"), &cookie).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(
            "/dashboard/expenses",
            &cookie,
            json!({
                "category": "medical",
                "description": "Surgery",
                "amount": "300",
                "animal_id": "00000000-0000-4000-8000-000000000000"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.delete(&format!("/dashboard/animals/{animal}"), &cookie).await;
    let (status, body) = app.get(&format!("/dashboard/expenses/{vet}"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["animal_id"].is_null());
}

#[tokio::test]
async fn sponsorships_track_their_active_window() {
    let app = spawn_app();
    let cookie = app.sign_in().await;
    let animal = app.create_animal(&cookie, json!({ "name": "Mittens", "species": "cat" })).await;
    let today = Utc::now().date_naive();

    let (status, body) = app
        .post(
            "/dashboard/sponsorships",
            &cookie,
            json!({
                "animal_id": animal,
                "sponsor_name": "Grace",
                "sponsor_email": "grace@example.org",
                "monthly_amount": "15"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["started_on"], today.to_string());
    let active = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            "/dashboard/sponsorships",
            &cookie,
            json!({
                "animal_id": animal,
                "sponsor_name": "Linus",
                "sponsor_email": "linus@example.org",
                "monthly_amount": "10",
                "started_on": (today - Duration::days(90)).to_string(),
                "ended_on": (today - Duration::days(30)).to_string()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/dashboard/sponsorships?active=true", &cookie).await;
    let current = body["data"].as_array().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["id"], active.as_str());

    let (_, body) = app.get("/dashboard/sponsorships?active=false", &cookie).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .put(
            &format!("/dashboard/sponsorships/{active}"),
            &cookie,
            json!({
                "animal_id": animal,
                "sponsor_name": "Grace",
                "sponsor_email": "grace@example.org",
                "monthly_amount": "15",
                "started_on": today.to_string(),
                "ended_on": (today - Duration::days(1)).to_string()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["ended_on"].is_string());

    assert_eq!(app.delete(&format!("/dashboard/sponsorships/{active}"), &cookie).await, StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&format!("/dashboard/sponsorships/{active}"), &cookie).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_summary_adds_up() {
    let app = spawn_app();
    let cookie = app.sign_in().await;

    let (_, body) = app.get("/dashboard", &cookie).await;
    let empty = &body["data"]["summary"];
    assert_eq!(empty["total_animals"], 0);
    assert_eq!(empty["animals_by_status"]["available"], 0);
    assert_eq!(money(&empty["balance"]), Decimal::ZERO);

    let biscuit = app.create_animal(&cookie, json!({ "name": "Biscuit", "species": "dog" })).await;
    app.create_animal(&cookie, json!({ "name": "Mittens", "species": "cat", "status": "medical" }))
        .await;
    app.post(
        "/dashboard/adoptions",
        &cookie,
        json!({ "animal_id": biscuit, "applicant_name": "Ada", "applicant_email": "ada@example.org" }),
    )
    .await;
    app.post("/dashboard/donations", &cookie, json!({ "donor_name": "Ada", "amount": "100.00" }))
        .await;
    app.post("/dashboard/donations", &cookie, json!({ "donor_name": "Grace", "amount": "20.50" }))
        .await;
    app.post(
        "/dashboard/expenses",
        &cookie,
        json!({ "category": "food", "description": "Kibble", "amount": "45.25" }),
    )
    .await;
    app.post(
        "/dashboard/sponsorships",
        &cookie,
        json!({
            "animal_id": biscuit,
            "sponsor_name": "Linus",
            "sponsor_email": "linus@example.org",
            "monthly_amount": "12.00"
        }),
    )
    .await;

    let (status, body) = app.get("/dashboard", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"]["summary"];
    assert_eq!(summary["total_animals"], 2);
    assert_eq!(summary["animals_by_status"]["available"], 1);
    assert_eq!(summary["animals_by_status"]["medical"], 1);
    assert_eq!(summary["animals_by_status"]["adopted"], 0);
    assert_eq!(summary["pending_adoptions"], 1);
    assert_eq!(money(&summary["donations_total"]), dec("120.50"));
    assert_eq!(money(&summary["expenses_total"]), dec("45.25"));
    assert_eq!(money(&summary["balance"]), dec("75.25"));
    assert_eq!(summary["active_sponsorships"], 1);
    assert_eq!(money(&summary["monthly_sponsorship_income"]), dec("12.00"));
}
