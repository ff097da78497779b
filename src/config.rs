use std::{env, net::SocketAddr};

use thiserror::Error;

/// Fallback HS256 secret used only when running locally without `AUTH_JWT_SECRET`.
pub const LOCAL_JWT_SECRET: &str = "hr-portal-local-development-secret";

const LOCAL_LOGIN_URL: &str = "http://localhost:8080/realms/hr/protocol/openid-connect/auth";

/// ConfigError
///
/// Raised by `AppConfig::load` when the environment is incomplete or malformed.
/// The binary treats any of these as fatal at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set when running in production with authentication enabled")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and never
/// mutated afterwards; handlers and middleware receive it through `AppState`.
///
/// `auth_enabled` is the process-wide `AUTH_ENABLED` feature flag. When it is false the
/// route guards never consult the authentication state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local header bypass and log format.
    pub env: Env,
    pub auth_enabled: bool,
    pub bind_addr: SocketAddr,
    // Where the identity provider gets its verification key from.
    pub key: KeyConfig,
    // Authorization endpoint of the external identity provider (Keycloak realm).
    pub login_url: String,
    pub client_id: String,
    // Externally visible origin of this service, used to build login callback URLs.
    pub public_base_url: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (header bypass, pretty logs) and production behaviour.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// KeyConfig
///
/// Source of the key material used to verify session tokens.
#[derive(Clone, PartialEq, Debug)]
pub enum KeyConfig {
    /// HS256 shared secret, available immediately.
    SharedSecret(String),
    /// URL serving the realm's RSA public key as PEM, fetched at startup.
    RemotePublicKey(String),
}

impl Default for AppConfig {
    /// Test scaffolding: a local configuration with authentication enforced and a known
    /// shared secret, so no environment variables are needed.
    fn default() -> Self {
        Self {
            env: Env::Local,
            auth_enabled: true,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            key: KeyConfig::SharedSecret(LOCAL_JWT_SECRET.to_string()),
            login_url: LOCAL_LOGIN_URL.to_string(),
            client_id: "hr-portal".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from process environment variables (after `.env` has
    /// been applied by the caller).
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// from_lookup
    ///
    /// Builds the configuration from an arbitrary key lookup. `load` delegates here with
    /// `std::env`; tests pass a map.
    ///
    /// Production with authentication enabled requires an explicit key source and login
    /// URL. Local mode falls back to development defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV").as_deref() {
            Some("production") => Env::Production,
            _ => Env::Local,
        };

        // Enforced by default in production, open by default locally.
        let auth_enabled = match lookup("AUTH_ENABLED") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: "AUTH_ENABLED",
                value: raw,
            })?,
            None => env == Env::Production,
        };

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: raw,
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let strict = env == Env::Production && auth_enabled;

        // A remote public key takes precedence over a shared secret.
        let key = match (lookup("AUTH_PUBLIC_KEY_URL"), lookup("AUTH_JWT_SECRET")) {
            (Some(url), _) => KeyConfig::RemotePublicKey(url),
            (None, Some(secret)) => KeyConfig::SharedSecret(secret),
            (None, None) if strict => return Err(ConfigError::Missing("AUTH_JWT_SECRET")),
            (None, None) => KeyConfig::SharedSecret(LOCAL_JWT_SECRET.to_string()),
        };

        let login_url = match lookup("AUTH_LOGIN_URL") {
            Some(url) => url,
            None if strict => return Err(ConfigError::Missing("AUTH_LOGIN_URL")),
            None => LOCAL_LOGIN_URL.to_string(),
        };

        Ok(Self {
            env,
            auth_enabled,
            bind_addr,
            key,
            login_url,
            client_id: lookup("AUTH_CLIENT_ID").unwrap_or_else(|| "hr-portal".to_string()),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
