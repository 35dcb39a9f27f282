//! crypto/mac.rs
//! HMAC-SHA-256 over V2 header bytes.
//!
//! Verification goes through `Mac::verify_slice`, which compares in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::HMAC_LEN;
use crate::crypto::types::{EngineError, SymmetricKey};
use crate::types::{AuthFailure, CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

fn keyed(key: &SymmetricKey) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::Cipher(EngineError::Failure("HMAC key rejected".into())))
}

/// Compute the 32-byte header tag over `data`.
#[inline]
pub fn header_mac(key: &SymmetricKey, data: &[u8]) -> Result<[u8; HMAC_LEN]> {
    let mut mac = keyed(key)?;
    mac.update(data);
    let mut out = [0u8; HMAC_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Check a carried tag against `data`. Any difference is an authentication failure.
#[inline]
pub fn verify_header_mac(key: &SymmetricKey, data: &[u8], tag: &[u8]) -> Result<()> {
    let mut mac = keyed(key)?;
    mac.update(data);
    mac.verify_slice(tag)
        .map_err(|_| CryptoError::Authentication(AuthFailure::HeaderMac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_verifies_and_rejects() {
        let key = SymmetricKey::new(vec![3u8; 16]);
        let tag = header_mac(&key, b"header bytes").unwrap();
        verify_header_mac(&key, b"header bytes", &tag).unwrap();

        let err = verify_header_mac(&key, b"header bytez", &tag).unwrap_err();
        assert!(matches!(err, CryptoError::Authentication(AuthFailure::HeaderMac)));

        let other = SymmetricKey::new(vec![4u8; 16]);
        assert!(verify_header_mac(&other, b"header bytes", &tag).is_err());
    }

    #[test]
    fn short_tag_is_rejected() {
        let key = SymmetricKey::new(vec![3u8; 16]);
        let tag = header_mac(&key, b"x").unwrap();
        assert!(verify_header_mac(&key, b"x", &tag[..31]).is_err());
    }
}
