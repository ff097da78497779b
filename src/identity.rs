use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    config::{AppConfig, KeyConfig},
    models::Principal,
};

/// AuthError
///
/// Failures while loading key material or validating a session token. The guards never
/// see these: a session whose token fails validation is simply unauthenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session token has expired")]
    Expired,
    #[error("invalid session token: {0}")]
    InvalidToken(String),
    #[error("identity provider has not finished initializing")]
    NotInitialized,
    #[error("verification key unavailable: {0}")]
    KeyUnavailable(String),
    #[error("invalid login url: {0}")]
    LoginUrl(String),
}

/// Claims
///
/// Payload of a session token. Roles may arrive flat (`roles`) or Keycloak style
/// (`realm_access.roles`); both are merged into the principal's role set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID.
    pub sub: Uuid,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    pub fn into_principal(self) -> Principal {
        let mut roles: BTreeSet<String> = self.roles.into_iter().collect();
        if let Some(realm) = self.realm_access {
            roles.extend(realm.roles);
        }

        Principal {
            id: self.sub,
            username: self.preferred_username,
            roles,
            expires_at: DateTime::<Utc>::from_timestamp(self.exp as i64, 0).unwrap_or_default(),
        }
    }
}

/// VerificationKey
///
/// A decoding key paired with the only algorithm it is accepted for.
pub struct VerificationKey {
    key: DecodingKey,
    algorithm: Algorithm,
}

impl VerificationKey {
    pub fn shared_secret(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn rsa_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key =
            DecodingKey::from_rsa_pem(pem).map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;
        Ok(Self {
            key,
            algorithm: Algorithm::RS256,
        })
    }
}

/// KeySource
///
/// Where the identity provider obtains its verification key. Loading may take a network
/// round trip, which is why the provider starts out uninitialized.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn load(&self) -> Result<VerificationKey, AuthError>;
}

/// SharedSecret
///
/// HS256 secret from configuration. Resolves immediately.
pub struct SharedSecret(pub String);

#[async_trait]
impl KeySource for SharedSecret {
    async fn load(&self) -> Result<VerificationKey, AuthError> {
        Ok(VerificationKey::shared_secret(&self.0))
    }
}

/// RemotePublicKey
///
/// Fetches the realm's RSA public key over HTTP. Accepts either a raw PEM document or a
/// Keycloak realm descriptor (`{"public_key": "<base64 DER>"}`).
pub struct RemotePublicKey {
    url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RealmDescriptor {
    public_key: String,
}

impl RemotePublicKey {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl KeySource for RemotePublicKey {
    async fn load(&self) -> Result<VerificationKey, AuthError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?
            .text()
            .await
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        let pem = match serde_json::from_str::<RealmDescriptor>(&body) {
            Ok(realm) => format!(
                "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n",
                realm.public_key
            ),
            Err(_) => body,
        };

        VerificationKey::rsa_pem(pem.as_bytes())
    }
}

/// IdentityProvider
///
/// Server-side stand-in for the browser's authentication provider. It owns the key used to
/// validate session tokens and knows where the external login page lives.
///
/// The key sits in a `watch` channel: empty until `initialize` succeeds, then written once.
/// `initialized()` is a synchronous read so the guards never block on it.
pub struct IdentityProvider {
    key: watch::Sender<Option<Arc<VerificationKey>>>,
    login_url: String,
    client_id: String,
}

/// IdentityState
///
/// The shared handle stored in `AppState`.
pub type IdentityState = Arc<IdentityProvider>;

impl IdentityProvider {
    pub fn new(login_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        let (key, _) = watch::channel(None);
        Self {
            key,
            login_url: login_url.into(),
            client_id: client_id.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.login_url, &config.client_id)
    }

    /// Picks the key source matching the configuration.
    pub fn key_source(config: &AppConfig) -> Box<dyn KeySource> {
        match &config.key {
            KeyConfig::SharedSecret(secret) => Box::new(SharedSecret(secret.clone())),
            KeyConfig::RemotePublicKey(url) => Box::new(RemotePublicKey::new(url)),
        }
    }

    pub fn initialized(&self) -> bool {
        self.key.borrow().is_some()
    }

    /// initialize
    ///
    /// Loads the key from `source` and marks the provider initialized. On failure the
    /// provider stays uninitialized; there is no retry.
    pub async fn initialize(&self, source: &dyn KeySource) -> Result<(), AuthError> {
        let key = source.load().await?;
        self.install(key);
        Ok(())
    }

    /// Marks the provider initialized with an already loaded key.
    pub fn install(&self, key: VerificationKey) {
        self.key.send_replace(Some(Arc::new(key)));
        tracing::info!("Identity provider initialized.");
    }

    /// Resolves once the provider is initialized.
    pub async fn wait_initialized(&self) {
        let mut rx = self.key.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(Option::is_some).await;
    }

    /// validate
    ///
    /// Checks the token's signature and expiry and returns the principal it names.
    pub fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let key = self.key.borrow().clone().ok_or(AuthError::NotInitialized)?;

        let mut validation = Validation::new(key.algorithm);
        validation.validate_exp = true;
        // Realm tokens carry an audience this service does not pin.
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, &key.key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        Ok(token_data.claims.into_principal())
    }

    /// login_url
    ///
    /// The `login()` action: the external provider's authorization URL, asking it to send
    /// the browser back to `redirect_uri` with a token in the query string.
    pub fn login_url(&self, redirect_uri: &str) -> Result<reqwest::Url, AuthError> {
        reqwest::Url::parse_with_params(
            &self.login_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "token"),
                ("response_mode", "query"),
            ],
        )
        .map_err(|e| AuthError::LoginUrl(e.to_string()))
    }
}
