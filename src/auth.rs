use std::{collections::BTreeSet, convert::Infallible};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    identity::{IdentityProvider, IdentityState},
    models::{AuthState, Principal},
};

/// Name of the cookie holding the session token for browser navigation.
pub const SESSION_COOKIE: &str = "hr_session";

/// AuthProvider
///
/// The read-only view of authentication the route guards depend on. Guards take it as an
/// explicit argument, so tests can hand them a fake.
pub trait AuthProvider {
    /// The provider has finished its asynchronous start-up.
    fn initialized(&self) -> bool;
    /// A principal is signed in.
    fn authenticated(&self) -> bool;
    /// The principal holds at least one of `roles`.
    fn has_any_role(&self, roles: &BTreeSet<String>) -> bool;

    fn state(&self) -> AuthState {
        AuthState {
            initialized: self.initialized(),
            authenticated: self.authenticated(),
        }
    }
}

/// AuthSession
///
/// The authentication state of a single request: whether the identity provider was ready
/// and, if a valid token (or local bypass header) was presented, who is signed in.
///
/// As an extractor it never rejects. Deciding what an anonymous visitor may see is the
/// guards' job, not the extractor's.
#[derive(Debug, Clone)]
pub struct AuthSession {
    initialized: bool,
    principal: Option<Principal>,
}

impl AuthSession {
    pub fn new(initialized: bool, principal: Option<Principal>) -> Self {
        Self {
            initialized,
            principal,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// resolve
    ///
    /// Builds the session from request headers.
    ///
    /// 1. Not initialized: anonymous and pending, nothing else is inspected.
    /// 2. Local bypass: in `Env::Local` only, `x-user-id` (+ optional `x-user-roles`).
    /// 3. Token: `Authorization: Bearer` first, then the session cookie. A rejected bearer
    ///    token does not hide a valid cookie.
    pub fn resolve(headers: &HeaderMap, config: &AppConfig, identity: &IdentityProvider) -> Self {
        if !identity.initialized() {
            return Self::new(false, None);
        }

        if config.env == Env::Local {
            if let Some(principal) = local_bypass(headers) {
                return Self::new(true, Some(principal));
            }
        }

        let principal = session_tokens(headers)
            .into_iter()
            .find_map(|token| match identity.validate(&token) {
                Ok(principal) => Some(principal),
                Err(e) => {
                    tracing::debug!(error = %e, "Session token rejected.");
                    None
                }
            });

        Self::new(true, principal)
    }
}

impl AuthProvider for AuthSession {
    fn initialized(&self) -> bool {
        self.initialized
    }

    fn authenticated(&self) -> bool {
        self.principal.is_some()
    }

    fn has_any_role(&self, roles: &BTreeSet<String>) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|principal| !principal.roles.is_disjoint(roles))
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    IdentityState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let identity = IdentityState::from_ref(state);
        Ok(Self::resolve(&parts.headers, &config, &identity))
    }
}

/// Candidate tokens in the order they are tried: bearer header, then session cookie.
fn session_tokens(headers: &HeaderMap) -> Vec<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    let cookie = CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.into_iter().chain(cookie).collect()
}

/// Development shortcut: trust `x-user-id` / `x-user-roles` headers.
fn local_bypass(headers: &HeaderMap) -> Option<Principal> {
    let id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())?;

    let roles = headers
        .get("x-user-roles")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    tracing::debug!(user_id = %id, "Local header bypass used.");

    Some(Principal {
        id,
        username: None,
        roles,
        expires_at: Utc::now() + Duration::hours(1),
    })
}
