use crate::{AppState, guard::RouteGuardConfig, handlers, middleware};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Two kinds of routes live here:
///
/// * Open routes, served to everyone with no guard: landing page, health check, the
///   unauthorized page, logout and the session endpoint used by the web client.
/// * Guest-only routes behind the public-route guard: a visitor who is already signed in
///   is redirected to `/` instead of seeing the login flow again.
pub fn public_routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/", get(handlers::landing))
        .route("/health", get(handlers::health))
        .route("/unauthorized", get(handlers::unauthorized))
        .route("/logout", post(handlers::logout))
        .route("/api/session", get(handlers::session_info));

    let guest = Router::new()
        .route("/login", get(handlers::login_page))
        // The login action: redirect to the external identity provider.
        .route("/login/start", get(handlers::login_start))
        // Return leg of the login action; stores the session cookie.
        .route("/auth/callback", get(handlers::auth_callback));

    open.merge(middleware::guest_only(guest, state, RouteGuardConfig::public()))
}
