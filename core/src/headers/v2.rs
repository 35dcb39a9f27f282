//! headers/v2.rs
//!
//! Authenticated header:
//!
//! ```text
//! [version:4 = -2][key_name UTF-8][0x00][nonce_len:1][nonce][hmac_sha256:32]
//! ```
//!
//! Design notes:
//! - The key name is mandatory; the HMAC key is whatever the name resolves to.
//! - Decoding is a probe: a leading tag other than `-2` is reported as `V2Probe::NotV2`,
//!   which is the dispatcher's signal to retry as V1. Every other failure is fatal.
//! - The resolver travels with the decoded header so `encode()` can rebuild identical bytes.

use std::fmt;

use crate::constants::{HEADER_V2_TAG, HMAC_LEN, KEY_NAME_TERMINATOR, MAX_KEY_NAME_LEN, MAX_NONCE_LEN, VERSION_TAG_LEN};
use crate::crypto::keys::SharedKeyResolver;
use crate::crypto::mac::{header_mac, verify_header_mac};
use crate::crypto::types::{KeyError, SymmetricKey};
use crate::headers::cursor::ByteSource;
use crate::headers::types::HeaderError;
use crate::types::{CryptoError, Result};

#[derive(Clone)]
pub struct HeaderV2 {
    nonce: Vec<u8>,
    key_name: String,
    resolver: Option<SharedKeyResolver>,
}

/// Outcome of attempting to read a V2 header.
#[derive(Debug)]
pub enum V2Probe {
    Parsed(HeaderV2),
    /// Leading tag was not the V2 marker; the source should be rewound and read as V1.
    NotV2 { tag: i32 },
}

impl HeaderV2 {
    pub fn new(nonce: impl Into<Vec<u8>>, key_name: &str) -> Result<Self> {
        let nonce = nonce.into();
        validate_key_name(key_name)?;
        if nonce.len() > MAX_NONCE_LEN {
            return Err(HeaderError::InvalidNonceLength { len: nonce.len() as i64 }.into());
        }
        Ok(Self { nonce, key_name: key_name.to_owned(), resolver: None })
    }

    pub fn with_key_resolver(mut self, resolver: SharedKeyResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn set_key_resolver(&mut self, resolver: SharedKeyResolver) {
        self.resolver = Some(resolver);
    }

    pub fn has_key_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn length(&self) -> usize {
        self.body_len() + HMAC_LEN
    }

    fn body_len(&self) -> usize {
        VERSION_TAG_LEN + self.key_name.len() + 1 + 1 + self.nonce.len()
    }

    /// Every byte the HMAC covers.
    fn body(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        out.extend_from_slice(&HEADER_V2_TAG.to_be_bytes());
        out.extend_from_slice(self.key_name.as_bytes());
        out.push(KEY_NAME_TERMINATOR);
        // `new` caps the nonce at 255.
        out.push(self.nonce.len() as u8);
        out.extend_from_slice(&self.nonce);
        out
    }

    /// Serialize, authenticating with `key`.
    pub fn encode_with_key(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        let mut out = self.body();
        let tag = header_mac(key, &out)?;
        out.extend_from_slice(&tag);
        Ok(out)
    }

    /// Serialize, resolving the HMAC key through the attached resolver.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| CryptoError::State("no key resolver attached to V2 header".into()))?;
        let key = resolver
            .resolve(&self.key_name)
            .ok_or_else(|| KeyError::NotFound { name: self.key_name.clone() })?;
        self.encode_with_key(&key)
    }

    /// Try to read a V2 header. Only the version tag decides `NotV2`.
    pub fn probe<S: ByteSource>(src: &mut S, resolver: &SharedKeyResolver) -> Result<V2Probe> {
        let tag = src.read_i32()?;
        if tag != HEADER_V2_TAG {
            return Ok(V2Probe::NotV2 { tag });
        }

        let mut covered = Vec::with_capacity(64);
        covered.extend_from_slice(&tag.to_be_bytes());

        let mut name = Vec::new();
        loop {
            let b = src.read_u8()?;
            if b == KEY_NAME_TERMINATOR {
                break;
            }
            if name.len() == MAX_KEY_NAME_LEN {
                return Err(HeaderError::KeyNameTooLong { max: MAX_KEY_NAME_LEN }.into());
            }
            name.push(b);
        }
        if name.is_empty() {
            return Err(HeaderError::MissingKeyName.into());
        }
        covered.extend_from_slice(&name);
        covered.push(KEY_NAME_TERMINATOR);
        let key_name = String::from_utf8(name).map_err(|_| HeaderError::InvalidKeyName)?;

        let key = resolver
            .resolve(&key_name)
            .ok_or_else(|| KeyError::NotFound { name: key_name.clone() })?;

        let nonce_len = src.read_u8()?;
        covered.push(nonce_len);
        let nonce = src.read_bytes(nonce_len as usize)?;
        covered.extend_from_slice(&nonce);

        let carried = src.read_bytes(HMAC_LEN)?;
        verify_header_mac(&key, &covered, &carried)?;

        Ok(V2Probe::Parsed(Self { nonce, key_name, resolver: Some(resolver.clone()) }))
    }

    /// Read a V2 header; a foreign tag is `HeaderError::VersionMismatch`.
    pub fn decode<S: ByteSource>(src: &mut S, resolver: &SharedKeyResolver) -> Result<Self> {
        match Self::probe(src, resolver)? {
            V2Probe::Parsed(h) => Ok(h),
            V2Probe::NotV2 { tag } => Err(HeaderError::VersionMismatch { found: tag }.into()),
        }
    }
}

fn validate_key_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(HeaderError::MissingKeyName.into());
    }
    if name.len() > MAX_KEY_NAME_LEN {
        return Err(HeaderError::KeyNameTooLong { max: MAX_KEY_NAME_LEN }.into());
    }
    if name.as_bytes().contains(&KEY_NAME_TERMINATOR) {
        return Err(HeaderError::KeyNameContainsNul.into());
    }
    Ok(())
}

impl PartialEq for HeaderV2 {
    fn eq(&self, other: &Self) -> bool {
        self.nonce == other.nonce && self.key_name == other.key_name
    }
}

impl Eq for HeaderV2 {}

impl fmt::Debug for HeaderV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderV2")
            .field("key_name", &self.key_name)
            .field("nonce", &self.nonce)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::crypto::keys::KeyRing;
    use crate::headers::cursor::SliceCursor;

    fn ring() -> SharedKeyResolver {
        Arc::new(KeyRing::new().with_key("k1", [9u8; 16]))
    }

    #[test]
    fn layout_and_length() {
        let h = HeaderV2::new(vec![7u8; 12], "k1").unwrap();
        let bytes = h.encode_with_key(&SymmetricKey::new(vec![9u8; 16])).unwrap();
        assert_eq!(bytes.len(), h.length());
        assert_eq!(&bytes[..4], &[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(&bytes[4..7], b"k1\0");
        assert_eq!(bytes[7], 12);
        assert_eq!(bytes.len(), 4 + 3 + 1 + 12 + 32);
    }

    #[test]
    fn decoded_header_reencodes_identically() {
        let resolver = ring();
        let bytes = HeaderV2::new(vec![1u8; 12], "k1")
            .unwrap()
            .with_key_resolver(resolver.clone())
            .encode()
            .unwrap();
        let h = HeaderV2::decode(&mut SliceCursor::new(&bytes), &resolver).unwrap();
        assert!(h.has_key_resolver());
        assert_eq!(h.encode().unwrap(), bytes);
    }

    #[test]
    fn encode_without_resolver_is_state_error() {
        let h = HeaderV2::new(vec![1u8; 12], "k1").unwrap();
        assert!(matches!(h.encode(), Err(CryptoError::State(_))));
    }

    #[test]
    fn construction_rejects_bad_names() {
        assert!(matches!(
            HeaderV2::new(vec![0u8; 12], ""),
            Err(CryptoError::Encoding(HeaderError::MissingKeyName))
        ));
        assert!(matches!(
            HeaderV2::new(vec![0u8; 12], "a\0b"),
            Err(CryptoError::Encoding(HeaderError::KeyNameContainsNul))
        ));
    }

    #[test]
    fn probe_reports_foreign_tag() {
        let bytes = [0u8, 0, 0, 20, 0, 0, 0, 12];
        let mut c = SliceCursor::new(&bytes);
        match HeaderV2::probe(&mut c, &ring()).unwrap() {
            V2Probe::NotV2 { tag } => assert_eq!(tag, 20),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_key_name_is_key_error() {
        let bytes = HeaderV2::new(vec![1u8; 12], "nope")
            .unwrap()
            .encode_with_key(&SymmetricKey::new(vec![0u8; 16]))
            .unwrap();
        let err = HeaderV2::decode(&mut SliceCursor::new(&bytes), &ring()).unwrap_err();
        assert!(matches!(err, CryptoError::Key(KeyError::NotFound { .. })));
    }
}
