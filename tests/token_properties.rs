//! Behavioural properties of the token authority through its public API

use std::sync::Arc;

use token_authority::auth::{
    InMemoryRevocationStore, ManualClock, RevocationStore, TokenAuthority, TokenClaims,
};
use token_authority::configuration::TokenSettings;
use token_authority::error::TokenError;

fn authority(secret: &str, max_age: i64, clock: Arc<ManualClock>) -> TokenAuthority {
    TokenAuthority::new(&TokenSettings::new(secret, max_age))
        .expect("Failed to build authority")
        .with_clock(clock)
}

#[test]
fn round_trip_for_many_identities() {
    let clock = Arc::new(ManualClock::new(1000));
    let authority = authority("k1", 3600, clock);

    let identities = [
        "alice",
        "bob@example.com",
        "user.with.dots",
        "42",
        "名前",
        "contains \"quotes\" and \\ slashes",
    ];

    for identity in identities {
        let token = authority.issue(identity).expect("Failed to issue");
        assert_eq!(authority.validate(&token), Ok(identity.to_string()));
    }
}

#[test]
fn validation_survives_authority_restart() {
    let clock = Arc::new(ManualClock::new(1000));
    let token = authority("k1", 3600, clock.clone()).issue("alice").unwrap();

    let restarted = authority("k1", 3600, clock);
    assert_eq!(restarted.validate(&token), Ok("alice".to_string()));
}

#[test]
fn different_secrets_reject_each_other() {
    let clock = Arc::new(ManualClock::new(1000));
    let first = authority("k1", 3600, clock.clone());
    let second = authority("k2", 3600, clock);

    let from_first = first.issue("alice").unwrap();
    let from_second = second.issue("alice").unwrap();

    assert_eq!(second.validate(&from_first), Err(TokenError::BadSignature));
    assert_eq!(first.validate(&from_second), Err(TokenError::BadSignature));
}

#[test]
fn forged_payload_with_reused_signature_is_rejected() {
    let clock = Arc::new(ManualClock::new(1000));
    let authority = authority("k1", 3600, clock);

    let token = authority.issue("alice").unwrap();
    let (_, signature) = token.split_once('.').unwrap();
    let forged_payload = TokenClaims::new("admin", 1000).unwrap().encode().unwrap();
    let forged = format!("{}.{}", forged_payload, signature);

    assert_eq!(authority.validate(&forged), Err(TokenError::BadSignature));
}

#[test]
fn revoked_wins_within_max_age_and_expired_wins_after() {
    let clock = Arc::new(ManualClock::new(1000));
    let authority = authority("k1", 3600, clock.clone());
    let token = authority.issue("alice").unwrap();

    clock.set(1500);
    assert_eq!(authority.validate(&token), Ok("alice".to_string()));
    assert_eq!(authority.revoke(&token), Ok(true));
    assert_eq!(authority.validate(&token), Err(TokenError::Revoked));

    clock.set(4700);
    assert_eq!(authority.validate(&token), Err(TokenError::Expired));
}

#[test]
fn injected_revocation_store_is_shared() {
    let clock = Arc::new(ManualClock::new(1000));
    let store: Arc<dyn RevocationStore> = Arc::new(InMemoryRevocationStore::new());

    let first = authority("k1", 3600, clock.clone()).with_revocation_store(store.clone());
    let second = authority("k1", 3600, clock).with_revocation_store(store.clone());

    let token = first.issue("alice").unwrap();
    first.revoke(&token).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(second.validate(&token), Err(TokenError::Revoked));
}

#[test]
fn invalid_settings_are_rejected() {
    assert!(TokenAuthority::new(&TokenSettings::new("", 3600)).is_err());
    assert!(TokenAuthority::new(&TokenSettings::new("k1", 0)).is_err());
}

#[test]
fn arbitrary_bytes_never_validate() {
    let clock = Arc::new(ManualClock::new(1000));
    let authority = authority("k1", 3600, clock);

    let inputs = [
        "\0",
        "....",
        "e30.e30",
        "eyJzdWIiOiJhbGljZSIsImlhdCI6MTAwMH0.",
        "eyJzdWIiOiJhbGljZSIsImlhdCI6MTAwMH0.AAAA",
        "🦀.🦀",
    ];

    for input in inputs {
        let result = authority.validate(input);
        assert!(
            matches!(
                result,
                Err(TokenError::MalformedToken) | Err(TokenError::BadSignature)
            ),
            "input {:?} produced {:?}",
            input,
            result
        );
    }
}

#[test]
fn non_base64_payload_is_malformed_not_forged() {
    let clock = Arc::new(ManualClock::new(1000));
    let authority = authority("k1", 3600, clock);
    let token = authority.issue("alice").unwrap();
    let (_, signature) = token.split_once('.').unwrap();

    for payload in ["@@@", "!!!!", "a b c", "e30="] {
        let input = format!("{}.{}", payload, signature);
        assert_eq!(authority.validate(&input), Err(TokenError::MalformedToken), "{:?}", input);
        assert_eq!(authority.revoke(&input), Err(TokenError::MalformedToken), "{:?}", input);
    }
    assert_eq!(authority.validate("@@@.AAAA"), Err(TokenError::MalformedToken));
    assert!(authority.revocations().is_empty());
}
