//! Signed upload tokens for backends without native presigning.
//!
//! Token = `{expiry_ts}.{hex(HMAC-SHA256(secret, bucket || 0 || path || 0 || expiry_ts))}`.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Unix expiry encoded in a token, if it has one
pub fn token_expiry(token: &str) -> Option<i64> {
    token.split_once('.')?.0.parse().ok()
}

#[derive(Clone)]
pub struct UploadTokenSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for UploadTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadTokenSigner").finish_non_exhaustive()
    }
}

impl UploadTokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> StorageResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Upload signing secret must not be empty".to_string(),
            ));
        }
        Ok(Self { secret })
    }

    fn mac(&self, bucket: &str, path: &str, expiry_ts: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))?;
        mac.update(bucket.as_bytes());
        mac.update(&[0]);
        mac.update(path.as_bytes());
        mac.update(&[0]);
        mac.update(&expiry_ts.to_be_bytes());
        Ok(mac)
    }

    /// Issue a token for `bucket`/`path` expiring `expires_in` from now
    pub fn sign(&self, bucket: &str, path: &str, expires_in: Duration) -> StorageResult<String> {
        let ttl = chrono::Duration::from_std(expires_in)
            .map_err(|e| StorageError::ConfigError(format!("Invalid expiry: {}", e)))?;
        let expiry_ts = (Utc::now() + ttl).timestamp();
        let tag = self.mac(bucket, path, expiry_ts)?.finalize().into_bytes();
        Ok(format!("{}.{}", expiry_ts, hex::encode(tag)))
    }

    /// Check a token against `bucket`/`path` and the current time
    pub fn verify(&self, bucket: &str, path: &str, token: &str) -> StorageResult<()> {
        let invalid = || StorageError::SignatureRejected("Invalid upload token".to_string());

        let expiry_ts = token_expiry(token).ok_or_else(invalid)?;
        let (_, tag_hex) = token.split_once('.').ok_or_else(invalid)?;
        let tag = hex::decode(tag_hex).map_err(|_| invalid())?;

        self.mac(bucket, path, expiry_ts)?
            .verify_slice(&tag)
            .map_err(|_| invalid())?;

        if Utc::now().timestamp() > expiry_ts {
            return Err(StorageError::SignatureRejected(
                "Upload token has expired".to_string(),
            ));
        }

        Ok(())
    }
}
