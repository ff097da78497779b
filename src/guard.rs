use std::collections::BTreeSet;

use serde::Serialize;

use crate::auth::AuthProvider;

/// Default target for protected routes when the visitor is not signed in.
pub const LOGIN_PATH: &str = "/login";
/// Default target for public routes when the visitor is already signed in.
pub const HOME_PATH: &str = "/";
/// Fixed target for authenticated visitors lacking every required role.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// RouteGuardConfig
///
/// Per-route access rules, fixed when the route is registered.
///
/// * `roles`: any one of these grants access. Empty means "no role restriction".
/// * `redirect_to`: where to send a visitor the guard turns away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuardConfig {
    pub roles: BTreeSet<String>,
    pub redirect_to: String,
}

impl RouteGuardConfig {
    /// Protected-route defaults: no role restriction, unauthenticated visitors go to `/login`.
    pub fn protected() -> Self {
        Self {
            roles: BTreeSet::new(),
            redirect_to: LOGIN_PATH.to_string(),
        }
    }

    /// Public-route defaults: authenticated visitors go to `/`.
    pub fn public() -> Self {
        Self {
            roles: BTreeSet::new(),
            redirect_to: HOME_PATH.to_string(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }
}

/// Denial
///
/// The two user-visible reasons a protected route turns a visitor away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// No signed-in principal. Sent to the route's `redirect_to`.
    Unauthenticated,
    /// Signed in, but holding none of the required roles. Sent to `/unauthorized`.
    Forbidden,
}

/// GuardOutcome
///
/// What the router should do with the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Serve the route's content.
    Render,
    /// The identity provider has not finished initializing; show a loading placeholder.
    Pending,
    /// Navigate elsewhere. `replace` keeps the guarded route out of history.
    Redirect {
        to: String,
        replace: bool,
        denial: Option<Denial>,
    },
}

impl GuardOutcome {
    fn redirect(to: impl Into<String>, denial: Option<Denial>) -> Self {
        GuardOutcome::Redirect {
            to: to.into(),
            replace: true,
            denial,
        }
    }
}

/// evaluate_protected
///
/// Decides access to a route that requires a signed-in principal.
///
/// With `auth_enabled` false the provider is never consulted and content always renders.
/// Otherwise: an uninitialized provider yields `Pending`; an anonymous visitor is sent to
/// `config.redirect_to`; a principal holding none of a non-empty `config.roles` is sent to
/// `/unauthorized`; everyone else gets the content.
pub fn evaluate_protected<P>(auth_enabled: bool, provider: &P, config: &RouteGuardConfig) -> GuardOutcome
where
    P: AuthProvider + ?Sized,
{
    if !auth_enabled {
        return GuardOutcome::Render;
    }
    if !provider.initialized() {
        return GuardOutcome::Pending;
    }
    if !provider.authenticated() {
        return GuardOutcome::redirect(&config.redirect_to, Some(Denial::Unauthenticated));
    }
    // An empty role set is "no restriction", so the provider's role check is skipped.
    if !config.roles.is_empty() && !provider.has_any_role(&config.roles) {
        return GuardOutcome::redirect(UNAUTHORIZED_PATH, Some(Denial::Forbidden));
    }
    GuardOutcome::Render
}

/// evaluate_public
///
/// Decides access to a route meant for anonymous visitors (login, sign-up).
/// A signed-in visitor is sent to `config.redirect_to`. `config.roles` is ignored.
pub fn evaluate_public<P>(auth_enabled: bool, provider: &P, config: &RouteGuardConfig) -> GuardOutcome
where
    P: AuthProvider + ?Sized,
{
    if auth_enabled && provider.authenticated() {
        return GuardOutcome::redirect(&config.redirect_to, None);
    }
    GuardOutcome::Render
}
