//! Structural decode and expiry check of bearer tokens.
//!
//! All failure paths return `None`/`true` rather than erroring so callers
//! stay branch-free: a token that cannot be decoded is simply treated as
//! absent (for user extraction) or expired (for validity).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, Utc};

use madrasti_core::UserProfile;

use crate::Claims;

/// Decode the payload segment of a three-segment bearer token.
///
/// Splits on `.`, pads the middle segment with `=` to a multiple of four,
/// base64-decodes it, and parses the result as JSON claims. Returns `None`
/// on wrong segment count, malformed base64, or invalid JSON. Never errors.
pub fn decode(token: &str) -> Option<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let mut payload = segments[1].to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let bytes = URL_SAFE.decode(payload.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Whether the token is expired at `now`.
///
/// A token that fails to decode, or whose claims lack `exp`, counts as
/// expired. Expired means `exp < now` (a token expiring exactly now is
/// still accepted).
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode(token).and_then(|c| c.exp) {
        Some(exp) => exp < now.timestamp(),
        None => true,
    }
}

/// Whether the token is expired right now.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

/// Extract the user identity embedded in the token.
///
/// The token is the source of truth for identity: on session restore this
/// wins over whatever user copy was persisted. Returns `None` if the token
/// does not decode or carries no user id.
pub fn extract_user(token: &str) -> Option<UserProfile> {
    decode(token)?.into_user()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    /// Build an unsigned token with the given JSON payload.
    fn token_with_payload(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.signature")
    }

    fn teacher_token(exp: i64) -> String {
        token_with_payload(&json!({
            "user_id": 42,
            "email": "t@x.com",
            "full_name": "Test Teacher",
            "first_name": "Test",
            "last_name": "Teacher",
            "role": "TEACHER",
            "permissions": ["assignments.grade"],
            "exp": exp,
            "iat": exp - 3600,
        }))
    }

    #[test]
    fn decode_reads_claims() {
        let claims = decode(&teacher_token(2_000_000_000)).unwrap();
        assert_eq!(claims.user_id, Some(42));
        assert_eq!(claims.role.as_deref(), Some("TEACHER"));
        assert_eq!(claims.exp, Some(2_000_000_000));
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        assert!(decode("only-one-segment").is_none());
        assert!(decode("two.segments").is_none());
        assert!(decode("a.b.c.d").is_none());
    }

    #[test]
    fn decode_rejects_bad_base64_and_bad_json() {
        assert!(decode("h.!!!not-base64!!!.s").is_none());

        let not_json = URL_SAFE_NO_PAD.encode(b"definitely not json");
        assert!(decode(&format!("h.{not_json}.s")).is_none());
    }

    #[test]
    fn decode_tolerates_missing_padding() {
        // {"user_id":1} encodes to 17 base64 chars, i.e. needs 3 pad chars.
        let body = URL_SAFE_NO_PAD.encode(br#"{"user_id":1}"#);
        assert!(body.len() % 4 != 0);
        let claims = decode(&format!("h.{body}.s")).unwrap();
        assert_eq!(claims.user_id, Some(1));
    }

    #[test]
    fn expiry_compares_epoch_seconds() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        assert!(is_expired_at(&teacher_token(1_699_999_999), now));
        assert!(!is_expired_at(&teacher_token(1_700_000_000), now));
        assert!(!is_expired_at(&teacher_token(1_700_000_001), now));
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        let token = token_with_payload(&json!({"user_id": 1}));
        assert!(is_expired_at(&token, Utc::now()));
    }

    #[test]
    fn undecodable_token_counts_as_expired() {
        assert!(is_expired_at("garbage", Utc::now()));
    }

    #[test]
    fn extract_user_maps_claims() {
        let user = extract_user(&teacher_token(2_000_000_000)).unwrap();
        assert_eq!(user.id.as_i64(), 42);
        assert_eq!(user.role.as_str(), "TEACHER");
        assert_eq!(user.full_name, "Test Teacher");
        assert_eq!(user.permissions.len(), 1);
        assert!(!user.force_password_change);
    }

    #[test]
    fn extract_user_defaults_role_and_permissions() {
        let token = token_with_payload(&json!({"user_id": 5, "exp": 2_000_000_000}));
        let user = extract_user(&token).unwrap();
        assert_eq!(user.role.as_str(), "STUDENT");
        assert!(user.permissions.is_empty());
    }

    #[test]
    fn extract_user_requires_user_id() {
        let token = token_with_payload(&json!({"email": "x@x.com"}));
        assert!(extract_user(&token).is_none());
        assert!(extract_user("garbage").is_none());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: decode never panics, whatever the input.
            #[test]
            fn decode_never_panics(input in ".{0,256}") {
                let _ = decode(&input);
                let _ = is_expired_at(&input, Utc::now());
                let _ = extract_user(&input);
            }

            /// Property: any JSON object payload decodes structurally.
            #[test]
            fn arbitrary_object_payloads_decode(id in any::<i64>(), exp in any::<i64>()) {
                let token = token_with_payload(&serde_json::json!({
                    "user_id": id,
                    "exp": exp,
                }));
                let claims = decode(&token).unwrap();
                prop_assert_eq!(claims.user_id, Some(id));
                prop_assert_eq!(claims.exp, Some(exp));
            }
        }
    }
}
