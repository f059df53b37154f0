/// Token Claims
///
/// The signed payload of a token: the asserted identity and the issue time.
/// Serialized as JSON and base64url-encoded (no padding) to form the first
/// segment of the token string.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TokenError;

/// Longest identity a token may carry, in bytes
pub const MAX_IDENTITY_LENGTH: usize = 256;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (identity asserted by the token)
    pub sub: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
}

impl TokenClaims {
    /// Build claims for `identity` issued at `issued_at`
    ///
    /// # Errors
    /// Returns `InvalidIdentity` if the identity is empty, longer than
    /// `MAX_IDENTITY_LENGTH` bytes, or contains control characters.
    pub fn new(identity: &str, issued_at: i64) -> Result<Self, TokenError> {
        if identity.is_empty()
            || identity.len() > MAX_IDENTITY_LENGTH
            || identity.chars().any(char::is_control)
        {
            return Err(TokenError::InvalidIdentity);
        }

        Ok(Self {
            sub: identity.to_string(),
            iat: issued_at,
        })
    }

    /// Unix time after which the token is no longer valid
    pub fn expires_at(&self, max_age: i64) -> i64 {
        self.iat.saturating_add(max_age)
    }

    /// Expiry check, inclusive at exactly `iat + max_age`
    pub fn is_expired(&self, now: i64, max_age: i64) -> bool {
        now.saturating_sub(self.iat) > max_age
    }

    /// Encode into the payload segment of a token
    pub fn encode(&self) -> Result<String, TokenError> {
        let json = serde_json::to_vec(self).map_err(|_| TokenError::InvalidIdentity)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode from the base64url-decoded bytes of a payload segment
    pub fn decode(json: &[u8]) -> Result<Self, TokenError> {
        let claims: TokenClaims =
            serde_json::from_slice(json).map_err(|_| TokenError::MalformedToken)?;

        if claims.sub.is_empty() {
            return Err(TokenError::MalformedToken);
        }
        Ok(claims)
    }
}

/// Stable revocation id for a payload segment (SHA-256, hex)
///
/// The raw token is never kept server-side.
pub fn token_id(payload_segment: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload_segment.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_segment(segment: &str) -> Result<TokenClaims, TokenError> {
        let json = URL_SAFE_NO_PAD.decode(segment).expect("segment is base64url");
        TokenClaims::decode(&json)
    }

    #[test]
    fn test_claims_creation() {
        let claims = TokenClaims::new("alice", 1000).expect("valid identity");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, 1000);
        assert_eq!(claims.expires_at(3600), 4600);
    }

    #[test]
    fn test_empty_identity_rejected() {
        assert_eq!(TokenClaims::new("", 1000), Err(TokenError::InvalidIdentity));
    }

    #[test]
    fn test_control_characters_rejected() {
        assert_eq!(
            TokenClaims::new("alice\nadmin", 1000),
            Err(TokenError::InvalidIdentity)
        );
    }

    #[test]
    fn test_overlong_identity_rejected() {
        let identity = "a".repeat(MAX_IDENTITY_LENGTH + 1);
        assert_eq!(TokenClaims::new(&identity, 1000), Err(TokenError::InvalidIdentity));
    }

    #[test]
    fn test_delimiter_in_identity_survives_encoding() {
        let claims = TokenClaims::new("first.last@example.com", 7).unwrap();
        let segment = claims.encode().unwrap();

        assert!(!segment.contains('.'));
        assert_eq!(decode_segment(&segment).unwrap(), claims);
    }

    #[test]
    fn test_unicode_identity_survives_encoding() {
        let claims = TokenClaims::new("유저", 7).unwrap();
        let segment = claims.encode().unwrap();
        assert_eq!(decode_segment(&segment).unwrap().sub, "유저");
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let claims = TokenClaims::new("alice", 0).unwrap();

        assert!(!claims.is_expired(59, 60));
        assert!(!claims.is_expired(60, 60));
        assert!(claims.is_expired(61, 60));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(TokenClaims::decode(b"not json"), Err(TokenError::MalformedToken));
        assert_eq!(TokenClaims::decode(b"{}"), Err(TokenError::MalformedToken));
        assert_eq!(
            TokenClaims::decode(br#"{"sub":"","iat":1}"#),
            Err(TokenError::MalformedToken)
        );
    }

    #[test]
    fn test_token_id_is_stable_hex() {
        let id1 = token_id("payload");
        let id2 = token_id("payload");

        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 64);
        assert_ne!(id1, token_id("other"));
    }
}
