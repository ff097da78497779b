use crate::{AppState, guard::RouteGuardConfig, handlers, middleware};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Administration pages, nested under `/admin` by `create_router`. The whole router sits
/// behind a protected-route guard requiring the `admin` role.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        // GET /admin/settings
        .route("/settings", get(handlers::admin_settings));

    middleware::protect(routes, state, RouteGuardConfig::protected().with_roles(["admin"]))
}
