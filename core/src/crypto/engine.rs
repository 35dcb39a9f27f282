//! crypto/engine.rs
//! Cipher engine capability and the registry of shipped engines.
//!
//! Design notes:
//! - An engine is single-use state: `init` once, any number of `update`, one `finish`.
//!   Engines are not shared between calls or threads; beans build one per call
//!   through an `EngineFactory`.
//! - Output buffers are sized by the caller from the engine's bounds, never from the input
//!   length: padded ciphers both grow (encrypt) and shrink (decrypt) the data.
//!   `max_output_len` covers a whole message; streaming callers size one buffer from
//!   `update_output_len(chunk)` and grow it once to `finish_output_len()` at the end.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{key_lens, nonce_lens};
use crate::crypto::aead::{AeadAlgorithm, AeadEngine};
use crate::crypto::block::{CbcEngine, CbcKeySize};
use crate::crypto::types::{Direction, EngineError, SymmetricKey};

/// Symmetric cipher with incremental processing.
pub trait CipherEngine {
    /// Human-readable algorithm name for logs and errors.
    fn algorithm(&self) -> &'static str;

    /// Required nonce/IV length in bytes.
    fn nonce_len(&self) -> usize;

    /// AEAD engines authenticate the header as associated data.
    fn is_aead(&self) -> bool;

    /// False when the mode needs the total length up front (CCM).
    fn supports_streaming(&self) -> bool {
        true
    }

    /// Key the engine for one message. `aad` is only meaningful for AEAD engines.
    fn init(
        &mut self,
        direction: Direction,
        key: &SymmetricKey,
        nonce: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<(), EngineError>;

    /// Upper bound on bytes produced by `update(input_len)` followed by `finish`.
    fn max_output_len(&self, input_len: usize) -> usize;

    /// Upper bound on bytes produced by a single `update(input_len)`, in any state.
    fn update_output_len(&self, input_len: usize) -> usize;

    /// Bytes `finish` will need given what has been fed so far.
    fn finish_output_len(&self) -> usize;

    /// Process `input`, writing produced bytes to `out`. Returns the count written.
    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, EngineError>;

    /// Flush buffered state (padding, tag). Returns the count written.
    fn finish(&mut self, out: &mut [u8]) -> Result<usize, EngineError>;
}

/// Builds a fresh engine for each encrypt/decrypt call.
pub trait EngineFactory {
    fn create(&self) -> Box<dyn CipherEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn() -> Box<dyn CipherEngine>,
{
    fn create(&self) -> Box<dyn CipherEngine> {
        self()
    }
}

/// Cipher suites shipped with the crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherSuite {
    Aes128Gcm,
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
    Aes128Ccm,
    Aes128Eax,
    Aes128CbcPkcs7,
    Aes256CbcPkcs7,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 7] = [
        CipherSuite::Aes128Gcm,
        CipherSuite::Aes256Gcm,
        CipherSuite::ChaCha20Poly1305,
        CipherSuite::Aes128Ccm,
        CipherSuite::Aes128Eax,
        CipherSuite::Aes128CbcPkcs7,
        CipherSuite::Aes256CbcPkcs7,
    ];

    pub fn is_aead(self) -> bool {
        !matches!(self, CipherSuite::Aes128CbcPkcs7 | CipherSuite::Aes256CbcPkcs7)
    }

    pub fn nonce_len(self) -> usize {
        match self {
            CipherSuite::Aes128Gcm | CipherSuite::Aes256Gcm => nonce_lens::GCM,
            CipherSuite::ChaCha20Poly1305 => nonce_lens::CHACHA20_POLY1305,
            CipherSuite::Aes128Ccm => nonce_lens::CCM,
            CipherSuite::Aes128Eax => nonce_lens::EAX,
            CipherSuite::Aes128CbcPkcs7 | CipherSuite::Aes256CbcPkcs7 => nonce_lens::CBC,
        }
    }

    pub fn key_len(self) -> usize {
        match self {
            CipherSuite::Aes128Gcm
            | CipherSuite::Aes128Ccm
            | CipherSuite::Aes128Eax
            | CipherSuite::Aes128CbcPkcs7 => key_lens::AES128,
            CipherSuite::Aes256Gcm | CipherSuite::Aes256CbcPkcs7 => key_lens::AES256,
            CipherSuite::ChaCha20Poly1305 => key_lens::CHACHA20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Aes128Gcm => "AES-128-GCM",
            CipherSuite::Aes256Gcm => "AES-256-GCM",
            CipherSuite::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            CipherSuite::Aes128Ccm => "AES-128-CCM",
            CipherSuite::Aes128Eax => "AES-128-EAX",
            CipherSuite::Aes128CbcPkcs7 => "AES-128-CBC/PKCS7",
            CipherSuite::Aes256CbcPkcs7 => "AES-256-CBC/PKCS7",
        }
    }

    /// New, uninitialized engine for this suite.
    pub fn engine(self) -> Box<dyn CipherEngine> {
        match self {
            CipherSuite::Aes128Gcm => Box::new(AeadEngine::new(AeadAlgorithm::Aes128Gcm)),
            CipherSuite::Aes256Gcm => Box::new(AeadEngine::new(AeadAlgorithm::Aes256Gcm)),
            CipherSuite::ChaCha20Poly1305 => {
                Box::new(AeadEngine::new(AeadAlgorithm::ChaCha20Poly1305))
            }
            CipherSuite::Aes128Ccm => Box::new(AeadEngine::new(AeadAlgorithm::Aes128Ccm)),
            CipherSuite::Aes128Eax => Box::new(AeadEngine::new(AeadAlgorithm::Aes128Eax)),
            CipherSuite::Aes128CbcPkcs7 => Box::new(CbcEngine::new(CbcKeySize::Aes128)),
            CipherSuite::Aes256CbcPkcs7 => Box::new(CbcEngine::new(CbcKeySize::Aes256)),
        }
    }
}

impl EngineFactory for CipherSuite {
    fn create(&self) -> Box<dyn CipherEngine> {
        self.engine()
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check a caller-provided output buffer against the engine's bound.
#[inline]
pub(crate) fn ensure_capacity(need: usize, out: &[u8]) -> Result<(), EngineError> {
    if out.len() < need {
        return Err(EngineError::OutputTooSmall { need, have: out.len() });
    }
    Ok(())
}
