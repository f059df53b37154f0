/// Session Management
///
/// Ties credential verification, token issuance and cookie persistence
/// together. The validated identity is returned to the caller; nothing is
/// kept in ambient state.

use std::sync::Arc;

use crate::auth::{CredentialVerifier, TokenAuthority};
use crate::cookies::CookieStore;
use crate::error::{AppError, AuthError};

pub struct SessionManager {
    authority: Arc<TokenAuthority>,
    credentials: Arc<dyn CredentialVerifier>,
    cookie_name: String,
}

impl SessionManager {
    pub fn new(
        authority: Arc<TokenAuthority>,
        credentials: Arc<dyn CredentialVerifier>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            authority,
            credentials,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        &self.authority
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Verify credentials, issue a token and store it in `cookies`
    ///
    /// # Errors
    /// - `InvalidCredentials` if the identity store rejects the pair
    /// - Database errors from the identity store
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        cookies: &mut dyn CookieStore,
    ) -> Result<String, AppError> {
        let identity = self
            .credentials
            .verify(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.authority.issue(&identity)?;
        cookies.set(&self.cookie_name, &token);

        tracing::info!(identity = %identity, "User logged in");
        Ok(identity)
    }

    /// Identity asserted by the token in `cookies`
    ///
    /// # Errors
    /// `MissingToken` when no cookie is present, otherwise the token outcome
    pub fn current_identity(&self, cookies: &dyn CookieStore) -> Result<String, AppError> {
        let token = cookies
            .get(&self.cookie_name)
            .ok_or(AuthError::MissingToken)?;

        Ok(self.authority.validate(&token)?)
    }

    /// Revoke the stored token and delete the cookie
    ///
    /// Returns whether a token was revoked. The cookie is deleted even when
    /// the token was already expired or unreadable.
    pub fn logout(&self, cookies: &mut dyn CookieStore) -> bool {
        let revoked = self.revoke_stored(cookies);

        cookies.delete(&self.cookie_name);
        tracing::info!(revoked = revoked, "User logged out");
        revoked
    }

    /// Revoke the stored token and clear every cookie in the store
    pub fn logout_all(&self, cookies: &mut dyn CookieStore) -> bool {
        let revoked = self.revoke_stored(cookies);

        cookies.clear();
        tracing::info!(revoked = revoked, "User logged out, cookies cleared");
        revoked
    }

    fn revoke_stored(&self, cookies: &dyn CookieStore) -> bool {
        match cookies.get(&self.cookie_name) {
            Some(token) => match self.authority.revoke(&token) {
                Ok(revoked) => revoked,
                Err(e) => {
                    tracing::warn!(error = %e, "Logout with unusable token");
                    false
                }
            },
            None => false,
        }
    }
}
