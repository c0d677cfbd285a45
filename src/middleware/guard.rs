use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::state::AppState;

/// Where unauthenticated visitors are sent.
pub const SIGN_IN_PATH: &str = "/signin";

/// Landing page after signing in without a callback.
pub const DEFAULT_CALLBACK: &str = "/dashboard";

/// Page guard for every dashboard route.
///
/// Asks the session provider for the current session. Without one the
/// request never reaches the page: the visitor is redirected to the sign-in
/// route with the original path as `callbackUrl`. With one, the session is
/// inserted into request extensions for the handler.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match state.sessions.current_session(request.headers()).await {
        Some(session) => {
            tracing::debug!("Session for {} on {}", session.email, request.uri().path());
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            let callback = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(DEFAULT_CALLBACK);
            tracing::debug!("No session for {}, redirecting to sign-in", callback);
            Redirect::to(&sign_in_url(callback)).into_response()
        }
    }
}

pub fn sign_in_url(callback: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(callback.as_bytes()).collect();
    format!("{}?callbackUrl={}", SIGN_IN_PATH, encoded)
}

/// Accept only same-site paths as post sign-in destinations.
pub fn safe_callback(callback: Option<&str>) -> &str {
    match callback {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => DEFAULT_CALLBACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_url_encodes_callback() {
        assert_eq!(
            sign_in_url("/dashboard/animals?status=available"),
            "/signin?callbackUrl=%2Fdashboard%2Fanimals%3Fstatus%3Davailable"
        );
    }

    #[test]
    fn callback_must_be_local() {
        assert_eq!(safe_callback(Some("/dashboard/donations")), "/dashboard/donations");
        assert_eq!(safe_callback(Some("https://evil.example")), DEFAULT_CALLBACK);
        assert_eq!(safe_callback(Some("//evil.example")), DEFAULT_CALLBACK);
        assert_eq!(safe_callback(Some("/\\evil.example")), DEFAULT_CALLBACK);
        assert_eq!(safe_callback(None), DEFAULT_CALLBACK);
    }
}
