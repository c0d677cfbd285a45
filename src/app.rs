use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{dashboard, public};
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Public
        .merge(public_routes())
        // Guarded pages
        .merge(dashboard_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/signin", get(public::signin_page).post(public::signin_submit))
        .route("/signout", post(public::signout))
}

fn dashboard_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        // Animals
        .route(
            "/dashboard/animals",
            get(dashboard::animal_list).post(dashboard::animal_create),
        )
        .route(
            "/dashboard/animals/:id",
            get(dashboard::animal_get)
                .put(dashboard::animal_update)
                .delete(dashboard::animal_delete),
        )
        // Adoption requests
        .route(
            "/dashboard/adoptions",
            get(dashboard::adoption_list).post(dashboard::adoption_create),
        )
        .route(
            "/dashboard/adoptions/:id",
            get(dashboard::adoption_get).delete(dashboard::adoption_delete),
        )
        .route("/dashboard/adoptions/:id/status", put(dashboard::adoption_review))
        // Donations
        .route(
            "/dashboard/donations",
            get(dashboard::donation_list).post(dashboard::donation_create),
        )
        .route(
            "/dashboard/donations/:id",
            get(dashboard::donation_get)
                .put(dashboard::donation_update)
                .delete(dashboard::donation_delete),
        )
        // Expenses
        .route(
            "/dashboard/expenses",
            get(dashboard::expense_list).post(dashboard::expense_create),
        )
        .route(
            "/dashboard/expenses/:id",
            get(dashboard::expense_get)
                .put(dashboard::expense_update)
                .delete(dashboard::expense_delete),
        )
        // Sponsorships
        .route(
            "/dashboard/sponsorships",
            get(dashboard::sponsorship_list).post(dashboard::sponsorship_create),
        )
        .route(
            "/dashboard/sponsorships/:id",
            get(dashboard::sponsorship_get)
                .put(dashboard::sponsorship_update)
                .delete(dashboard::sponsorship_delete),
        )
        // Page guard runs before any handler above
        .route_layer(middleware::from_fn_with_state(state, crate::middleware::require_session))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let security = &state.config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
