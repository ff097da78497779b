#![allow(dead_code)]

use hr_portal::{
    AppConfig, AppState,
    config::{Env, KeyConfig},
    identity::{Claims, IdentityProvider, RealmAccess, VerificationKey},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
pub const TEST_USER_ID: Uuid = Uuid::from_u128(1);

pub const REALM_PRIVATE_KEY: &str = include_str!("../fixtures/realm_private.pem");
pub const REALM_PUBLIC_KEY: &str = include_str!("../fixtures/realm_public.pem");

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn claims(user_id: Uuid, roles: &[&str], exp: u64) -> Claims {
    Claims {
        sub: user_id,
        iat: now() as usize,
        exp: exp as usize,
        preferred_username: Some("jdoe".to_string()),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        realm_access: None,
    }
}

pub fn realm_claims(user_id: Uuid, realm_roles: &[&str]) -> Claims {
    Claims {
        roles: vec![],
        realm_access: Some(RealmAccess {
            roles: realm_roles.iter().map(|r| r.to_string()).collect(),
        }),
        ..claims(user_id, &[], now() + 3600)
    }
}

/// HS256 token signed with `secret`.
pub fn sign(claims: &Claims, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).unwrap()
}

/// Valid HS256 token for `TEST_USER_ID` holding `roles`, expiring in an hour.
pub fn create_token(roles: &[&str]) -> String {
    sign(&claims(TEST_USER_ID, roles, now() + 3600), TEST_JWT_SECRET)
}

/// RS256 token signed with the realm fixture key.
pub fn sign_rs256(claims: &Claims) -> String {
    let key = EncodingKey::from_rsa_pem(REALM_PRIVATE_KEY.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
}

pub fn test_config(env: Env, auth_enabled: bool) -> AppConfig {
    AppConfig {
        env,
        auth_enabled,
        key: KeyConfig::SharedSecret(TEST_JWT_SECRET.to_string()),
        ..AppConfig::default()
    }
}

/// Provider initialized with the test secret.
pub fn ready_identity(config: &AppConfig) -> Arc<IdentityProvider> {
    let identity = IdentityProvider::from_config(config);
    identity.install(VerificationKey::shared_secret(TEST_JWT_SECRET));
    Arc::new(identity)
}

/// Provider that never finished initializing.
pub fn pending_identity(config: &AppConfig) -> Arc<IdentityProvider> {
    Arc::new(IdentityProvider::from_config(config))
}

pub fn create_app_state(env: Env, auth_enabled: bool, initialized: bool) -> AppState {
    let config = test_config(env, auth_enabled);
    let identity = if initialized {
        ready_identity(&config)
    } else {
        pending_identity(&config)
    };
    AppState { config, identity }
}
