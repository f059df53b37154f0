/// HMAC-SHA256 signing for token payloads.
///
/// The signing key is derived as `HMAC(secret_key, salt)` so that tokens
/// minted under one salt never verify under another, even with the same
/// secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl TokenSigner {
    pub fn new(secret_key: &[u8], salt: &[u8]) -> Result<Self, ConfigError> {
        if secret_key.is_empty() {
            return Err(ConfigError::MissingRequired("token.secret_key".to_string()));
        }

        let mut derive = HmacSha256::new_from_slice(secret_key)
            .map_err(|e| ConfigError::InvalidValue(format!("token.secret_key: {}", e)))?;
        derive.update(salt);
        let derived = derive.finalize().into_bytes();

        let mac = HmacSha256::new_from_slice(&derived)
            .map_err(|e| ConfigError::InvalidValue(format!("derived key: {}", e)))?;

        Ok(Self { mac })
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time comparison against the expected MAC
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSigner { .. }")
    }
}
