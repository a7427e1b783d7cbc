//! Signed, expiring download links for stores without native presigning.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use filestore_core::error::AppError;
use filestore_core::result::AppResult;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer over `(key, expires)` pairs.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Creates a signer from a shared secret.
    pub fn new(secret: &[u8]) -> AppResult<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| AppError::configuration(format!("Invalid signing secret: {e}")))?;
        Ok(Self { mac })
    }

    fn tag(&self, key: &str, expires: i64) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(format!("{key}\n{expires}").as_bytes());
        mac.finalize().into_bytes().into()
    }

    /// Signature for `key` valid until the unix timestamp `expires`.
    pub fn sign(&self, key: &str, expires: i64) -> String {
        URL_SAFE_NO_PAD.encode(self.tag(key, expires))
    }

    /// Check a signature and its expiry against `now`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> AppResult<()> {
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::forbidden("Invalid download signature"))?;
        let expected = self.tag(key, expires);

        if !bool::from(provided.as_slice().ct_eq(expected.as_slice())) {
            return Err(AppError::forbidden("Invalid download signature"));
        }
        if now.timestamp() >= expires {
            return Err(AppError::forbidden("Download link has expired"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestore_core::error::ErrorKind;

    #[test]
    fn test_sign_then_verify() {
        let signer = UrlSigner::new(b"local-secret").unwrap();
        let now = Utc::now();
        let expires = now.timestamp() + 60;
        let sig = signer.sign("u1/20240101/x_a.txt", expires);
        assert!(signer.verify("u1/20240101/x_a.txt", expires, &sig, now).is_ok());
    }

    #[test]
    fn test_rejects_other_key_and_expired() {
        let signer = UrlSigner::new(b"local-secret").unwrap();
        let now = Utc::now();
        let expires = now.timestamp() + 60;
        let sig = signer.sign("a", expires);

        let err = signer.verify("b", expires, &sig, now).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert!(signer.verify("a", expires + 1, &sig, now).is_err());

        let later = DateTime::from_timestamp(expires, 0).unwrap();
        assert_eq!(
            signer.verify("a", expires, &sig, later).unwrap_err().message,
            "Download link has expired"
        );
    }

    #[test]
    fn test_known_signature() {
        let signer = UrlSigner::new(b"local-secret").unwrap();
        assert_eq!(
            signer.sign("u1/a.txt", 1_700_000_000),
            "xKxHCnLwvk4cpzwr0f7zHCw2CySUeFlei3pyUDe1eoQ"
        );
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let signer = UrlSigner::new(b"local-secret").unwrap();
        let now = Utc::now();
        let expires = now.timestamp() + 60;
        let sig = signer.sign("a", expires);
        assert!(signer.verify("a", expires, &sig[..sig.len() - 4], now).is_err());
        assert!(signer.verify("a", expires, "", now).is_err());
    }

    #[test]
    fn test_different_secrets_disagree() {
        let a = UrlSigner::new(b"secret-a").unwrap();
        let b = UrlSigner::new(b"secret-b").unwrap();
        assert_ne!(a.sign("k", 1), b.sign("k", 1));
    }
}
