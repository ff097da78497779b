use chrono::{TimeZone, Utc};
use hr_portal::{
    auth::AuthProvider,
    guard::Denial,
    models::{AuthState, Principal, SessionInfo},
};
use std::collections::BTreeSet;
use uuid::Uuid;

fn principal() -> Principal {
    Principal {
        id: Uuid::from_u128(7),
        username: Some("jdoe".to_string()),
        roles: ["hr", "admin"].iter().map(|r| r.to_string()).collect(),
        expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn test_session_info_flattens_auth_state() {
    let info = SessionInfo {
        auth_enabled: true,
        state: AuthState {
            initialized: true,
            authenticated: true,
        },
        principal: Some(principal()),
    };

    let json = serde_json::to_value(&info).unwrap();

    // The web client reads the two flags at the top level, not under "state".
    assert_eq!(json["initialized"], true);
    assert_eq!(json["authenticated"], true);
    assert!(json.get("state").is_none());
    assert_eq!(json["principal"]["roles"], serde_json::json!(["admin", "hr"]));
}

#[test]
fn test_session_info_round_trips_anonymous() {
    let raw = r#"{"auth_enabled":false,"initialized":false,"authenticated":false,"principal":null}"#;

    let info: SessionInfo = serde_json::from_str(raw).unwrap();

    assert!(!info.auth_enabled);
    assert_eq!(info.state, AuthState::default());
    assert!(info.principal.is_none());
}

#[test]
fn test_denial_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&Denial::Unauthenticated).unwrap(),
        r#""unauthenticated""#
    );
    assert_eq!(serde_json::to_string(&Denial::Forbidden).unwrap(), r#""forbidden""#);
}

#[test]
fn test_auth_provider_state_default_method() {
    struct Fixed;
    impl AuthProvider for Fixed {
        fn initialized(&self) -> bool {
            true
        }
        fn authenticated(&self) -> bool {
            false
        }
        fn has_any_role(&self, _roles: &BTreeSet<String>) -> bool {
            false
        }
    }

    assert_eq!(
        Fixed.state(),
        AuthState {
            initialized: true,
            authenticated: false
        }
    );
}
