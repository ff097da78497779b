use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::AuthSession,
    guard::{self, GuardOutcome, RouteGuardConfig},
    handlers,
};

/// GuardState
///
/// State captured by a guard layer: the shared application state plus the access rules of
/// the routes the layer wraps.
#[derive(Clone)]
pub struct GuardState {
    app: AppState,
    route: Arc<RouteGuardConfig>,
}

impl GuardState {
    pub fn new(app: &AppState, route: RouteGuardConfig) -> Self {
        Self {
            app: app.clone(),
            route: Arc::new(route),
        }
    }
}

/// protect
///
/// Wraps every route of `router` with the protected-route guard.
pub fn protect(router: Router<AppState>, state: &AppState, config: RouteGuardConfig) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        GuardState::new(state, config),
        protected_route,
    ))
}

/// guest_only
///
/// Wraps every route of `router` with the public-route guard (signed-in visitors are
/// sent away).
pub fn guest_only(router: Router<AppState>, state: &AppState, config: RouteGuardConfig) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        GuardState::new(state, config),
        public_route,
    ))
}

/// protected_route
///
/// Middleware form of `guard::evaluate_protected`. The authentication state is resolved
/// only when the feature flag is on.
pub async fn protected_route(State(layer): State<GuardState>, request: Request, next: Next) -> Response {
    let auth_enabled = layer.app.config.auth_enabled;
    let outcome = if auth_enabled {
        let session = AuthSession::resolve(request.headers(), &layer.app.config, &layer.app.identity);
        guard::evaluate_protected(true, &session, &layer.route)
    } else {
        GuardOutcome::Render
    };

    apply(outcome, request, next).await
}

/// public_route
///
/// Middleware form of `guard::evaluate_public`.
pub async fn public_route(State(layer): State<GuardState>, request: Request, next: Next) -> Response {
    let auth_enabled = layer.app.config.auth_enabled;
    let outcome = if auth_enabled {
        let session = AuthSession::resolve(request.headers(), &layer.app.config, &layer.app.identity);
        guard::evaluate_public(true, &session, &layer.route)
    } else {
        GuardOutcome::Render
    };

    apply(outcome, request, next).await
}

/// Turns a guard decision into the HTTP response for `request`.
async fn apply(outcome: GuardOutcome, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match outcome {
        GuardOutcome::Render => {
            tracing::debug!(%path, "Route access granted.");
            next.run(request).await
        }
        GuardOutcome::Pending => {
            tracing::debug!(%path, "Identity provider pending, serving loading page.");
            loading_response()
        }
        // A 303 never leaves the guarded URL in the browser's history.
        GuardOutcome::Redirect { to, denial, .. } => {
            tracing::info!(%path, redirect_to = %to, ?denial, "Route access redirected.");
            Redirect::to(&to).into_response()
        }
    }
}

fn loading_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, "1"), (header::CACHE_CONTROL, "no-store")],
        Html(handlers::loading_page()),
    )
        .into_response()
}
