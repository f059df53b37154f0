/// Authentication module
///
/// Handles signed token issuance/validation, revocation, credential
/// verification and password hashing.

mod authority;
mod claims;
mod clock;
mod credentials;
mod password;
mod revocation;
mod signer;

pub use authority::TokenAuthority;
pub use claims::{token_id, TokenClaims, MAX_IDENTITY_LENGTH};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialVerifier, InMemoryCredentialStore, PgCredentialStore};
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use revocation::{spawn_revocation_sweeper, InMemoryRevocationStore, RevocationStore};
pub use signer::TokenSigner;
