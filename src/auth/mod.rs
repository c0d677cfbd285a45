pub mod password;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_SESSION_EXPIRY_HOURS};
use crate::database::models::User;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "openshelter_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();
        let exp = (now + lifetime).timestamp();

        Self {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Signed-in staff member, as seen by the pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            expires_at: Utc.timestamp_opt(claims.exp, 0).single().unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Session secret not configured")]
    InvalidSecret,

    #[error("Session lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Establishes and recognizes sessions. Pages only ever ask "is there a
/// session for this request"; signing, expiry and transport are internal.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Session for the request, or `None` when absent, expired or forged.
    async fn current_session(&self, headers: &HeaderMap) -> Option<Session>;

    /// `Set-Cookie` value that signs `user` in.
    fn start_session(&self, user: &User) -> Result<String, AuthError>;

    /// `Set-Cookie` value that signs the browser out.
    fn end_session(&self) -> String;
}

/// HS256 session tokens carried in a cookie or a Bearer header.
pub struct JwtSessions {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
    cookie_secure: bool,
}

impl JwtSessions {
    pub fn new(secret: &str, expiry_hours: u64, cookie_secure: bool) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        let lifetime = session_lifetime(expiry_hours).ok_or(AuthError::InvalidExpiry(expiry_hours))?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
            cookie_secure,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(
            &security.session_secret,
            security.session_expiry_hours,
            security.cookie_secure,
        )
    }

    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, String> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| format!("Invalid session token: {}", e))?;
        Ok(token_data.claims)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, value, max_age
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[async_trait]
impl SessionProvider for JwtSessions {
    async fn current_session(&self, headers: &HeaderMap) -> Option<Session> {
        let token = extract_token(headers)?;
        match self.validate_token(&token) {
            Ok(claims) => Some(Session::from(claims)),
            Err(msg) => {
                tracing::debug!("Ignoring session token: {}", msg);
                None
            }
        }
    }

    fn start_session(&self, user: &User) -> Result<String, AuthError> {
        let token = self.generate_token(&Claims::new(user, self.lifetime))?;
        Ok(self.cookie(&token, self.lifetime.num_seconds()))
    }

    fn end_session(&self) -> String {
        self.cookie("", 0)
    }
}

/// Session lifetime for a configured hour count, `None` outside `1..=MAX_SESSION_EXPIRY_HOURS`.
fn session_lifetime(hours: u64) -> Option<Duration> {
    if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&hours) {
        return None;
    }
    Duration::try_hours(i64::try_from(hours).ok()?)
}

/// Session token from the session cookie, falling back to a Bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, SESSION_COOKIE) {
        return Some(token);
    }

    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
