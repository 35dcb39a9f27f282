//! headers/v1.rs
//!
//! Legacy length-prefixed header, all integers big-endian:
//!
//! ```text
//! [total_len:4][nonce_len:4][nonce]([key_len:4][key_name])?
//! ```
//!
//! Design notes:
//! - No version marker. A V1 header is recognised by the absence of the V2 tag; its
//!   leading length is always non-negative.
//! - No authentication. Decoding exists so ciphertext written by older producers stays
//!   readable; it never touches a key resolver.
//! - The declared total must match the fields exactly. Anything else is malformed.

use crate::constants::{HEADER_V1_FIXED_LEN, HEADER_V1_KEY_LEN_FIELD, MAX_KEY_NAME_LEN, MAX_NONCE_LEN};
use crate::headers::cursor::ByteSource;
use crate::headers::types::HeaderError;
use crate::types::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderV1 {
    length: usize,
    nonce: Vec<u8>,
    key_name: Option<String>,
}

impl HeaderV1 {
    /// Build a header; the total length is computed here.
    pub fn new(nonce: impl Into<Vec<u8>>, key_name: Option<&str>) -> Result<Self> {
        let nonce = nonce.into();
        if nonce.len() > MAX_NONCE_LEN {
            return Err(HeaderError::InvalidNonceLength { len: nonce.len() as i64 }.into());
        }
        if let Some(name) = key_name {
            if name.len() > MAX_KEY_NAME_LEN {
                return Err(HeaderError::KeyNameTooLong { max: MAX_KEY_NAME_LEN }.into());
            }
        }

        let length = HEADER_V1_FIXED_LEN
            + nonce.len()
            + key_name.map_or(0, |n| HEADER_V1_KEY_LEN_FIELD + n.len());
        Ok(Self { length, nonce, key_name: key_name.map(str::to_owned) })
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn key_name(&self) -> Option<&str> {
        self.key_name.as_deref()
    }

    /// Self-reported total length, equal to the encoded size.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length);
        // Caps enforced in `new` keep every field well inside i32.
        out.extend_from_slice(&(self.length as u32).to_be_bytes());
        out.extend_from_slice(&(self.nonce.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.nonce);
        if let Some(name) = &self.key_name {
            out.extend_from_slice(&(name.len() as u32).to_be_bytes());
            out.extend_from_slice(name.as_bytes());
        }
        debug_assert_eq!(out.len(), self.length);
        out
    }

    /// Parse a V1 header from the current source position.
    pub fn decode<S: ByteSource>(src: &mut S) -> Result<Self> {
        let raw_total = src.read_i32()?;
        if raw_total < 0 {
            return Err(HeaderError::NegativeLength { raw: raw_total }.into());
        }
        let total = raw_total as usize;

        let raw_nonce_len = src.read_i32()?;
        if raw_nonce_len < 0
            || raw_nonce_len as usize > MAX_NONCE_LEN
            || HEADER_V1_FIXED_LEN + raw_nonce_len as usize > total
        {
            return Err(HeaderError::InvalidNonceLength { len: raw_nonce_len as i64 }.into());
        }
        let nonce = src.read_bytes(raw_nonce_len as usize)?;

        let fixed = HEADER_V1_FIXED_LEN + nonce.len();
        if total == fixed {
            return Ok(Self { length: total, nonce, key_name: None });
        }

        let raw_key_len = src.read_i32()?;
        if raw_key_len < 0
            || raw_key_len as usize > MAX_KEY_NAME_LEN
            || fixed + HEADER_V1_KEY_LEN_FIELD + raw_key_len as usize != total
        {
            return Err(HeaderError::InvalidKeyNameLength { len: raw_key_len as i64 }.into());
        }
        let name = src.read_bytes(raw_key_len as usize)?;
        let name = String::from_utf8(name).map_err(|_| HeaderError::InvalidKeyName)?;

        Ok(Self { length: total, nonce, key_name: Some(name) })
    }
}
