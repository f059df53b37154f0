/// Token Issuance and Validation
///
/// Issues signed, expiring tokens bound to an identity and validates them
/// statelessly. A token has the form
/// `base64url(json{sub, iat}) "." base64url(hmac_sha256)`.
///
/// Validation order:
/// 1. Structure (two non-empty base64url segments)
/// 2. Signature (constant-time MAC comparison)
/// 3. Payload decoding
/// 4. Expiry (`now - iat <= max_age`, inclusive)
/// 5. Revocation

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::auth::claims::{token_id, TokenClaims};
use crate::auth::clock::{Clock, SystemClock};
use crate::auth::revocation::{InMemoryRevocationStore, RevocationStore};
use crate::auth::signer::TokenSigner;
use crate::configuration::TokenSettings;
use crate::error::{ConfigError, TokenError};

/// A token whose structure and signature have been checked.
struct VerifiedToken {
    id: String,
    claims: TokenClaims,
}

pub struct TokenAuthority {
    signer: TokenSigner,
    max_age: i64,
    clock: Arc<dyn Clock>,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenAuthority {
    /// Build an authority on the system clock with an in-memory revocation store
    ///
    /// # Errors
    /// Returns error if the secret is empty or `max_age_seconds` is not positive
    pub fn new(settings: &TokenSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        Ok(Self {
            signer: TokenSigner::new(settings.secret_key.as_bytes(), settings.salt.as_bytes())?,
            max_age: settings.max_age_seconds,
            clock: Arc::new(SystemClock),
            revocations: Arc::new(InMemoryRevocationStore::new()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_revocation_store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.revocations = store;
        self
    }

    /// Token lifetime in seconds
    pub fn max_age(&self) -> i64 {
        self.max_age
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn revocations(&self) -> Arc<dyn RevocationStore> {
        self.revocations.clone()
    }

    /// Issue a token asserting `identity`
    ///
    /// # Errors
    /// Returns `InvalidIdentity` if the identity is empty or malformed
    pub fn issue(&self, identity: &str) -> Result<String, TokenError> {
        let claims = TokenClaims::new(identity, self.clock.now())?;
        let payload = claims.encode()?;
        let signature = URL_SAFE_NO_PAD.encode(self.signer.sign(payload.as_bytes()));

        tracing::debug!(identity = %claims.sub, issued_at = claims.iat, "Token issued");

        Ok(format!("{}.{}", payload, signature))
    }

    /// Validate a presented token and return the identity it asserts
    ///
    /// # Errors
    /// Returns `MalformedToken`, `BadSignature`, `Expired` or `Revoked`
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let verified = self.verify(token)?;

        if verified.claims.is_expired(self.clock.now(), self.max_age) {
            return Err(TokenError::Expired);
        }

        if self.revocations.is_revoked(&verified.id) {
            tracing::warn!(identity = %verified.claims.sub, "Revoked token presented");
            return Err(TokenError::Revoked);
        }

        Ok(verified.claims.sub)
    }

    /// Revoke a token ahead of its natural expiry (logout)
    ///
    /// Returns `Ok(true)` when the token was newly revoked and `Ok(false)`
    /// when it was already revoked or has already expired.
    ///
    /// # Errors
    /// Returns `MalformedToken` or `BadSignature`; forged tokens are never recorded
    pub fn revoke(&self, token: &str) -> Result<bool, TokenError> {
        let verified = self.verify(token)?;

        if verified.claims.is_expired(self.clock.now(), self.max_age) {
            return Ok(false);
        }

        let expires_at = verified.claims.expires_at(self.max_age);
        let inserted = self.revocations.revoke(&verified.id, expires_at);
        if inserted {
            tracing::info!(
                identity = %verified.claims.sub,
                expires_at = expires_at,
                "Token revoked"
            );
        }

        Ok(inserted)
    }

    fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::MalformedToken)?;
        if payload.is_empty() || signature.is_empty() || signature.contains('.') {
            return Err(TokenError::MalformedToken);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::MalformedToken)?;

        if !self.signer.verify(payload.as_bytes(), &signature) {
            tracing::warn!("Token signature mismatch");
            return Err(TokenError::BadSignature);
        }

        let claims = TokenClaims::decode(&json)?;

        Ok(VerifiedToken {
            id: token_id(payload),
            claims,
        })
    }
}
