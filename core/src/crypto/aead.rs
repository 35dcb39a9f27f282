//! crypto/aead.rs
//! AEAD engines: AES-GCM, ChaCha20-Poly1305, AES-CCM, AES-EAX.
//!
//! Design notes:
//! - The RustCrypto AEADs are one-shot, so `update` only buffers and `finish` seals or opens
//!   the whole message. `update` therefore never produces output.
//! - On decrypt nothing is released until the tag has verified, which keeps the streaming
//!   decrypt path fail-closed: tampered input yields an error and zero plaintext bytes.
//! - Caller provides nonce and AAD (the encoded ciphertext header) at `init`.
//! - CCM needs the message length before it starts, so it refuses streaming.

use aes::Aes128;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use ccm::consts::{U12, U16};
use ccm::Ccm;
use chacha20poly1305::ChaCha20Poly1305;
use eax::Eax;

use crate::constants::{key_lens, nonce_lens, AEAD_TAG_LEN};
use crate::crypto::engine::{ensure_capacity, CipherEngine};
use crate::crypto::types::{Direction, EngineError, SymmetricKey};

type Aes128Ccm = Ccm<Aes128, U16, U12>;
type Aes128Eax = Eax<Aes128>;

/// AEAD algorithms backed by `AeadEngine`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AeadAlgorithm {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
    Aes128Ccm,
    Aes128Eax,
}

impl AeadAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::Aes128Gcm => "AES-128-GCM",
            AeadAlgorithm::Aes256Gcm => "AES-256-GCM",
            AeadAlgorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            AeadAlgorithm::Aes128Ccm => "AES-128-CCM",
            AeadAlgorithm::Aes128Eax => "AES-128-EAX",
        }
    }

    pub fn nonce_len(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm | AeadAlgorithm::Aes256Gcm => nonce_lens::GCM,
            AeadAlgorithm::ChaCha20Poly1305 => nonce_lens::CHACHA20_POLY1305,
            AeadAlgorithm::Aes128Ccm => nonce_lens::CCM,
            AeadAlgorithm::Aes128Eax => nonce_lens::EAX,
        }
    }

    fn key_lens(self) -> &'static [usize] {
        match self {
            AeadAlgorithm::Aes256Gcm => &[key_lens::AES256],
            AeadAlgorithm::ChaCha20Poly1305 => &[key_lens::CHACHA20],
            AeadAlgorithm::Aes128Gcm | AeadAlgorithm::Aes128Ccm | AeadAlgorithm::Aes128Eax => {
                &[key_lens::AES128]
            }
        }
    }
}

/// Keyed AEAD instance selected by algorithm.
enum AeadImpl {
    Aes128Gcm(Aes128Gcm),
    Aes256Gcm(Aes256Gcm),
    ChaCha(ChaCha20Poly1305),
    Aes128Ccm(Aes128Ccm),
    Aes128Eax(Aes128Eax),
}

impl AeadImpl {
    fn new(algorithm: AeadAlgorithm, key: &[u8]) -> Result<Self, EngineError> {
        let invalid = |_| EngineError::InvalidKeyLength {
            expected: algorithm.key_lens(),
            actual: key.len(),
        };
        Ok(match algorithm {
            AeadAlgorithm::Aes128Gcm => Self::Aes128Gcm(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            AeadAlgorithm::Aes256Gcm => Self::Aes256Gcm(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
            AeadAlgorithm::ChaCha20Poly1305 => {
                Self::ChaCha(ChaCha20Poly1305::new_from_slice(key).map_err(invalid)?)
            }
            AeadAlgorithm::Aes128Ccm => Self::Aes128Ccm(Aes128Ccm::new_from_slice(key).map_err(invalid)?),
            AeadAlgorithm::Aes128Eax => Self::Aes128Eax(Aes128Eax::new_from_slice(key).map_err(invalid)?),
        })
    }

    fn seal(&self, nonce: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, EngineError> {
        match self {
            AeadImpl::Aes128Gcm(c) => seal_with(c, nonce, aad, msg),
            AeadImpl::Aes256Gcm(c) => seal_with(c, nonce, aad, msg),
            AeadImpl::ChaCha(c) => seal_with(c, nonce, aad, msg),
            AeadImpl::Aes128Ccm(c) => seal_with(c, nonce, aad, msg),
            AeadImpl::Aes128Eax(c) => seal_with(c, nonce, aad, msg),
        }
    }

    fn open(&self, nonce: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, EngineError> {
        match self {
            AeadImpl::Aes128Gcm(c) => open_with(c, nonce, aad, msg),
            AeadImpl::Aes256Gcm(c) => open_with(c, nonce, aad, msg),
            AeadImpl::ChaCha(c) => open_with(c, nonce, aad, msg),
            AeadImpl::Aes128Ccm(c) => open_with(c, nonce, aad, msg),
            AeadImpl::Aes128Eax(c) => open_with(c, nonce, aad, msg),
        }
    }
}

// Nonce length is checked in `init`, so `from_slice` cannot panic here.
fn seal_with<A: Aead>(cipher: &A, nonce: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, EngineError> {
    cipher
        .encrypt(GenericArray::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| EngineError::Failure("AEAD seal failed".into()))
}

fn open_with<A: Aead>(cipher: &A, nonce: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, EngineError> {
    cipher
        .decrypt(GenericArray::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| EngineError::TagMismatch)
}

struct AeadState {
    cipher: AeadImpl,
    direction: Direction,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    buffer: Vec<u8>,
}

/// Buffered AEAD engine.
pub struct AeadEngine {
    algorithm: AeadAlgorithm,
    state: Option<AeadState>,
}

impl AeadEngine {
    pub fn new(algorithm: AeadAlgorithm) -> Self {
        Self { algorithm, state: None }
    }

    fn buffered(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.buffer.len())
    }
}

impl std::fmt::Debug for AeadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeadEngine")
            .field("algorithm", &self.algorithm)
            .field("initialized", &self.state.is_some())
            .field("buffered", &self.buffered())
            .finish()
    }
}

impl CipherEngine for AeadEngine {
    fn algorithm(&self) -> &'static str {
        self.algorithm.name()
    }

    fn nonce_len(&self) -> usize {
        self.algorithm.nonce_len()
    }

    fn is_aead(&self) -> bool {
        true
    }

    fn supports_streaming(&self) -> bool {
        self.algorithm != AeadAlgorithm::Aes128Ccm
    }

    fn init(
        &mut self,
        direction: Direction,
        key: &SymmetricKey,
        nonce: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<(), EngineError> {
        if nonce.len() != self.nonce_len() {
            return Err(EngineError::InvalidNonceLength {
                expected: self.nonce_len(),
                actual: nonce.len(),
            });
        }
        let cipher = AeadImpl::new(self.algorithm, key.as_bytes())?;
        self.state = Some(AeadState {
            cipher,
            direction,
            nonce: nonce.to_vec(),
            aad: aad.map(<[u8]>::to_vec).unwrap_or_default(),
            buffer: Vec::new(),
        });
        Ok(())
    }

    fn max_output_len(&self, input_len: usize) -> usize {
        let total = self.buffered() + input_len;
        match self.state.as_ref().map(|s| s.direction) {
            Some(Direction::Decrypt) => total.saturating_sub(AEAD_TAG_LEN),
            _ => total + AEAD_TAG_LEN,
        }
    }

    fn update_output_len(&self, _input_len: usize) -> usize {
        0
    }

    fn finish_output_len(&self) -> usize {
        self.max_output_len(0)
    }

    fn update(&mut self, input: &[u8], _out: &mut [u8]) -> Result<usize, EngineError> {
        let state = self.state.as_mut().ok_or(EngineError::NotInitialized)?;
        state.buffer.extend_from_slice(input);
        Ok(0)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        let state = self.state.take().ok_or(EngineError::NotInitialized)?;
        let produced = match state.direction {
            Direction::Encrypt => state.cipher.seal(&state.nonce, &state.aad, &state.buffer)?,
            Direction::Decrypt => {
                if state.buffer.len() < AEAD_TAG_LEN {
                    return Err(EngineError::InvalidCiphertextLength { len: state.buffer.len() });
                }
                state.cipher.open(&state.nonce, &state.aad, &state.buffer)?
            }
        };
        ensure_capacity(produced.len(), out)?;
        out[..produced.len()].copy_from_slice(&produced);
        Ok(produced.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &mut AeadEngine, input: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut out = vec![0u8; engine.max_output_len(input.len())];
        let mut n = engine.update(input, &mut out)?;
        n += engine.finish(&mut out[n..])?;
        out.truncate(n);
        Ok(out)
    }

    #[test]
    fn gcm_roundtrip_with_aad() {
        let key = SymmetricKey::new(vec![0u8; 16]);
        let nonce = [0u8; 12];
        let mut enc = AeadEngine::new(AeadAlgorithm::Aes128Gcm);
        enc.init(Direction::Encrypt, &key, &nonce, Some(b"hdr")).unwrap();
        let ct = run(&mut enc, b"hello").unwrap();
        assert_eq!(ct.len(), 5 + AEAD_TAG_LEN);

        let mut dec = AeadEngine::new(AeadAlgorithm::Aes128Gcm);
        dec.init(Direction::Decrypt, &key, &nonce, Some(b"hdr")).unwrap();
        assert_eq!(run(&mut dec, &ct).unwrap(), b"hello");

        let mut wrong_aad = AeadEngine::new(AeadAlgorithm::Aes128Gcm);
        wrong_aad.init(Direction::Decrypt, &key, &nonce, Some(b"HDR")).unwrap();
        assert_eq!(run(&mut wrong_aad, &ct).unwrap_err(), EngineError::TagMismatch);
    }

    #[test]
    fn update_produces_nothing_until_finish() {
        let key = SymmetricKey::new(vec![1u8; 32]);
        let mut enc = AeadEngine::new(AeadAlgorithm::ChaCha20Poly1305);
        enc.init(Direction::Encrypt, &key, &[9u8; 12], None).unwrap();
        let mut out = vec![0u8; enc.max_output_len(64)];
        assert_eq!(enc.update(&[7u8; 64], &mut out).unwrap(), 0);
        assert_eq!(enc.finish(&mut out).unwrap(), 64 + AEAD_TAG_LEN);
    }

    #[test]
    fn chunked_updates_need_no_output_until_finish() {
        let key = SymmetricKey::new(vec![4u8; 16]);
        let mut enc = AeadEngine::new(AeadAlgorithm::Aes128Gcm);
        enc.init(Direction::Encrypt, &key, &[3u8; 12], None).unwrap();
        let chunk = [0x42u8; 8192];
        for _ in 0..4 {
            assert_eq!(enc.update_output_len(chunk.len()), 0);
            assert_eq!(enc.update(&chunk, &mut []).unwrap(), 0);
        }
        assert_eq!(enc.finish_output_len(), 4 * 8192 + AEAD_TAG_LEN);
        let mut out = vec![0u8; enc.finish_output_len()];
        let ct_len = enc.finish(&mut out).unwrap();
        assert_eq!(ct_len, out.len());

        let mut dec = AeadEngine::new(AeadAlgorithm::Aes128Gcm);
        dec.init(Direction::Decrypt, &key, &[3u8; 12], None).unwrap();
        for part in out.chunks(8192) {
            assert_eq!(dec.update(part, &mut []).unwrap(), 0);
        }
        assert_eq!(dec.finish_output_len(), 4 * 8192);
        let mut pt = vec![0u8; dec.finish_output_len()];
        assert_eq!(dec.finish(&mut pt).unwrap(), 4 * 8192);
        assert!(pt.iter().all(|&b| b == 0x42));
    }

    #[test]
    fn rejects_bad_key_and_nonce() {
        let mut e = AeadEngine::new(AeadAlgorithm::Aes256Gcm);
        let err = e.init(Direction::Encrypt, &SymmetricKey::new(vec![0u8; 16]), &[0u8; 12], None);
        assert!(matches!(err, Err(EngineError::InvalidKeyLength { actual: 16, .. })));

        let err = e.init(Direction::Encrypt, &SymmetricKey::new(vec![0u8; 32]), &[0u8; 16], None);
        assert!(matches!(err, Err(EngineError::InvalidNonceLength { expected: 12, actual: 16 })));
    }

    #[test]
    fn finish_without_init_fails() {
        let mut e = AeadEngine::new(AeadAlgorithm::Aes128Eax);
        assert_eq!(e.finish(&mut []).unwrap_err(), EngineError::NotInitialized);
    }

    #[test]
    fn short_ciphertext_rejected() {
        let mut e = AeadEngine::new(AeadAlgorithm::Aes128Ccm);
        e.init(Direction::Decrypt, &SymmetricKey::new(vec![0u8; 16]), &[0u8; 12], None).unwrap();
        let err = run(&mut e, &[0u8; 5]).unwrap_err();
        assert_eq!(err, EngineError::InvalidCiphertextLength { len: 5 });
    }
}
