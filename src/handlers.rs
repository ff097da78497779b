use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    AppState,
    auth::{AuthProvider, AuthSession, SESSION_COOKIE},
    guard::LOGIN_PATH,
    models::{CallbackParams, SessionInfo},
};

/// Where a fresh login lands.
const AFTER_LOGIN_PATH: &str = "/dashboard";

// --- Page Shell ---

/// Wraps page content in the shared document shell. Presentation stays in the web client;
/// these documents only mark which page was served.
fn page(title: &str, body: &str) -> Html<String> {
    let title = escape_html(title);
    Html(format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title} · HR Portal</title></head>\
         <body><main data-page=\"{title}\">{body}</main></body></html>"
    ))
}

fn greeting(session: &AuthSession) -> String {
    match session.principal().and_then(|p| p.username.as_deref()) {
        Some(name) => format!("<p>Signed in as {}</p>", escape_html(name)),
        None => String::new(),
    }
}

/// Escapes text taken from token claims before it is interpolated into a document.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Neutral placeholder served while the identity provider is still initializing.
/// It reloads itself so the guard is evaluated again.
pub fn loading_page() -> String {
    "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
     <meta http-equiv=\"refresh\" content=\"1\"><title>Loading · HR Portal</title></head>\
     <body><div role=\"progressbar\" aria-busy=\"true\" data-state=\"loading\"></div></body></html>"
        .to_string()
}

// --- Open Pages ---

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> &'static str {
    "ok"
}

pub async fn landing() -> Html<String> {
    page(
        "Home",
        "<h1>HR Portal</h1><nav><a href=\"/dashboard\">Dashboard</a> <a href=\"/login\">Sign in</a></nav>",
    )
}

pub async fn unauthorized() -> Response {
    (
        StatusCode::FORBIDDEN,
        page(
            "Unauthorized",
            "<h1>Access denied</h1><p>Your account does not have access to this page.</p>",
        ),
    )
        .into_response()
}

/// session_info
///
/// Reports the feature flag and the caller's authentication state.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = SessionInfo))
)]
pub async fn session_info(State(state): State<AppState>, session: AuthSession) -> Json<SessionInfo> {
    Json(SessionInfo {
        auth_enabled: state.config.auth_enabled,
        state: session.state(),
        principal: session.principal().cloned(),
    })
}

/// logout
///
/// Clears the session cookie. Token revocation at the identity provider is not attempted.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    // Always emit the expiring cookie, whether or not the browser sent one.
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    (jar.add(cookie), Redirect::to(LOGIN_PATH))
}

// --- Guest Pages ---

pub async fn login_page() -> Html<String> {
    page(
        "Login",
        "<h1>Sign in</h1><a href=\"/login/start\" role=\"button\">Continue with company account</a>",
    )
}

/// login_start
///
/// The login action: sends the browser to the external identity provider.
pub async fn login_start(State(state): State<AppState>) -> Response {
    if !state.config.auth_enabled {
        return Redirect::to(AFTER_LOGIN_PATH).into_response();
    }

    let callback = format!("{}/auth/callback", state.config.public_base_url.trim_end_matches('/'));
    match state.identity.login_url(&callback) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Cannot build login url.");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// auth_callback
///
/// Landing point after a successful external login. A valid token becomes the session
/// cookie; anything else goes back to the login page.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Response {
    match state.identity.validate(&params.token) {
        Ok(principal) => {
            tracing::info!(user_id = %principal.id, "Session established.");
            let cookie = Cookie::build((SESSION_COOKIE, params.token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.config.public_base_url.starts_with("https://"));
            (jar.add(cookie), Redirect::to(AFTER_LOGIN_PATH)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login callback carried an unusable token.");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

// --- Authenticated Pages ---

pub async fn dashboard(session: AuthSession) -> Html<String> {
    page("Dashboard", &format!("<h1>Dashboard</h1>{}", greeting(&session)))
}

pub async fn expenses(session: AuthSession) -> Html<String> {
    page("Expenses", &format!("<h1>Expenses</h1>{}", greeting(&session)))
}

pub async fn timesheets(session: AuthSession) -> Html<String> {
    page("Timesheets", &format!("<h1>Timesheets</h1>{}", greeting(&session)))
}

pub async fn cv_matching(session: AuthSession) -> Html<String> {
    page("CV Matching", &format!("<h1>CV matching configuration</h1>{}", greeting(&session)))
}

// --- Admin Pages ---

pub async fn admin_settings(session: AuthSession) -> Html<String> {
    page("Settings", &format!("<h1>Administration settings</h1>{}", greeting(&session)))
}
