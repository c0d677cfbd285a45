mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::*;

#[tokio::test]
async fn sign_in_sets_cookie_and_follows_callback() {
    let app = spawn_app();

    let response = app
        .submit_sign_in(STAFF_EMAIL, STAFF_PASSWORD, Some("/dashboard/animals?status=medical"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/animals?status=medical");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn email_is_matched_case_insensitively() {
    let app = spawn_app();
    let response = app.submit_sign_in("  STAFF@OpenShelter.test ", STAFF_PASSWORD, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn bad_credentials_get_the_same_401() {
    let app = spawn_app();

    for (email, password) in [(STAFF_EMAIL, "wrong-password"), ("nobody@openshelter.test", STAFF_PASSWORD)] {
        let response = app.submit_sign_in(email, password, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(session_cookie(&response).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn off_site_callbacks_are_replaced() {
    let app = spawn_app();

    for callback in ["https://evil.example/", "//evil.example/x", "/\\evil.example"] {
        let response = app.submit_sign_in(STAFF_EMAIL, STAFF_PASSWORD, Some(callback)).await;
        assert_eq!(location(&response), "/dashboard", "{callback}");
    }
}

#[tokio::test]
async fn sign_in_page_carries_callback_and_skips_when_signed_in() {
    let app = spawn_app();

    let response = app
        .send(
            Request::builder()
                .uri("/signin?callbackUrl=%2Fdashboard%2Fdonations")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="callbackUrl" value="/dashboard/donations""#));

    let cookie = app.sign_in().await;
    let response = app
        .send(
            Request::builder()
                .uri("/signin?callbackUrl=%2Fdashboard%2Fdonations")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/donations");
}

#[tokio::test]
async fn sign_out_clears_the_cookie() {
    let app = spawn_app();
    let cookie = app.sign_in().await;

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/signout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/signin");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("openshelter_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}
