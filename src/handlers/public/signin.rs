// handlers/public/signin.rs - GET/POST /signin, POST /signout
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::auth::password::verify_password;
use crate::error::ApiError;
use crate::middleware::extract::{Form, Query};
use crate::middleware::guard::{safe_callback, SIGN_IN_PATH};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

/// GET /signin - sign-in form, or straight through when already signed in
pub async fn signin_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SignInQuery>,
) -> Response {
    let callback = safe_callback(query.callback_url.as_deref());

    if state.sessions.current_session(&headers).await.is_some() {
        return Redirect::to(callback).into_response();
    }

    Html(render_form(callback)).into_response()
}

/// POST /signin - check credentials, set the session cookie, go to the callback
///
/// Unknown emails and wrong passwords get the same 401 so the form does not
/// reveal which accounts exist.
pub async fn signin_submit(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Result<Response, ApiError> {
    let user = state.store.find_user_by_email(&form.email).await?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => {
            tracing::warn!("Failed sign-in for '{}'", form.email.trim());
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    let cookie = state.sessions.start_session(&user)?;
    tracing::info!("Signed in {}", user.email);

    let target = safe_callback(form.callback_url.as_deref());
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response())
}

/// POST /signout - clear the session cookie
pub async fn signout(State(state): State<AppState>) -> Response {
    ([(header::SET_COOKIE, state.sessions.end_session())], Redirect::to(SIGN_IN_PATH)).into_response()
}

fn render_form(callback: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in - OpenShelter</title></head>
<body>
<main>
<h1>OpenShelter</h1>
<form method="post" action="{action}">
<input type="hidden" name="callbackUrl" value="{callback}">
<label>Email <input type="email" name="email" required autofocus></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Sign in</button>
</form>
</main>
</body>
</html>
"#,
        action = SIGN_IN_PATH,
        callback = escape_html(callback),
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_escapes_callback() {
        let html = render_form("/dashboard?q=\"><script>");
        assert!(html.contains(r#"value="/dashboard?q=&quot;&gt;&lt;script&gt;""#));
        assert!(!html.contains("<script>"));
    }
}
