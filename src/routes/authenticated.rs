use crate::{AppState, guard::RouteGuardConfig, handlers, middleware};
use axum::{Router, routing::get};

/// Roles allowed to configure CV matching.
pub const HR_ROLES: [&str; 2] = ["admin", "hr"];

/// Authenticated Router Module
///
/// Employee self-service pages need only a signed-in user. Anonymous visitors are sent to
/// `/login`.
///
/// CV-matching configuration additionally needs one of `HR_ROLES`; anyone else ends up
/// on `/unauthorized`.
pub fn authenticated_routes(state: &AppState) -> Router<AppState> {
    let employee = Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route("/expenses", get(handlers::expenses))
        .route("/timesheets", get(handlers::timesheets));

    let hr = Router::new().route("/cv-matching", get(handlers::cv_matching));

    middleware::protect(employee, state, RouteGuardConfig::protected()).merge(middleware::protect(
        hr,
        state,
        RouteGuardConfig::protected().with_roles(HR_ROLES),
    ))
}
