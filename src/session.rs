//! Login sessions.
//!
//! The session cookie holds an HS256 JWT whose subject is the operator id.
//! The operator row is re-read on every request, so role changes and
//! deletions take effect immediately.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jwt_simple::prelude::{Claims, Duration, HS256Key, MACLike, NoCustomClaims};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Operator, OperatorRole};

pub const SESSION_COOKIE: &str = "session";

/// The logged-in operator, as exposed to handlers and templates.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub user_name: String,
    pub role: OperatorRole,
}

impl From<&Operator> for SessionUser {
    fn from(operator: &Operator) -> Self {
        Self {
            id: operator.id,
            user_name: operator.user_name.clone(),
            role: operator.role,
        }
    }
}

/// Identity injected by the session middleware. Absent (`None`) for
/// anonymous requests or routes mounted without the middleware.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    key: HS256Key,
    ttl_hours: u64,
    secure: bool,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_hours: u64, secure: bool) -> Self {
        Self {
            key: HS256Key::from_bytes(secret),
            ttl_hours,
            secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let key = match &config.session_secret {
            Some(secret) => HS256Key::from_bytes(secret.as_bytes()),
            None => {
                tracing::warn!("SESSION_SECRET not set, sessions will not survive a restart");
                HS256Key::generate()
            }
        };
        Self {
            key,
            ttl_hours: config.session_ttl_hours,
            secure: config.secure_cookies,
        }
    }

    pub fn issue(&self, operator: &Operator) -> Result<String> {
        let claims = Claims::create(Duration::from_hours(self.ttl_hours))
            .with_subject(operator.id.to_string());
        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))
    }

    /// Operator id from a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<i64> {
        let claims = self.key.verify_token::<NoCustomClaims>(token, None).ok()?;
        claims.subject?.parse().ok()
    }

    /// Operator id from the request's session cookie, if valid.
    pub fn operator_id(&self, jar: &CookieJar) -> Option<i64> {
        jar.get(SESSION_COOKIE).and_then(|c| self.verify(c.value()))
    }

    pub fn login(&self, jar: CookieJar, operator: &Operator) -> Result<CookieJar> {
        let token = self.issue(operator)?;
        Ok(jar.add(
            Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .secure(self.secure)
                .same_site(SameSite::Lax),
        ))
    }

    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }
}
