use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// AuthState
///
/// The two lifecycle bits the guards read from the authentication provider.
/// Exported to TypeScript so the web UI shares the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthState {
    /// Provider has finished loading its key material.
    pub initialized: bool,
    pub authenticated: bool,
}

/// Principal
///
/// The signed-in user as resolved from a validated session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub id: Uuid,
    pub username: Option<String>,
    pub roles: BTreeSet<String>,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// SessionInfo
///
/// Response of `GET /api/session`. Lets the UI decide which navigation entries to show
/// without duplicating the guard rules.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionInfo {
    pub auth_enabled: bool,
    #[serde(flatten)]
    pub state: AuthState,
    pub principal: Option<Principal>,
}

/// CallbackParams
///
/// Query string of `GET /auth/callback`, sent back by the identity provider after login.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    pub token: String,
}
