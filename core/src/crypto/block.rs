//! crypto/block.rs
//! AES-CBC with PKCS#7 padding as an incremental engine.
//!
//! Encrypt emits every complete block as soon as it has one; the final block is padded
//! in `finish`. Decrypt always holds back the last complete block, since it may carry
//! the padding, and strips it in `finish`.

use aes::{Aes128, Aes256};
use cbc::cipher::block_padding::{Pkcs7, RawPadding};
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::constants::{key_lens, nonce_lens, AES_BLOCK_LEN};
use crate::crypto::engine::{ensure_capacity, CipherEngine};
use crate::crypto::types::{Direction, EngineError, SymmetricKey};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CbcKeySize {
    Aes128,
    Aes256,
}

impl CbcKeySize {
    fn key_len(self) -> usize {
        match self {
            CbcKeySize::Aes128 => key_lens::AES128,
            CbcKeySize::Aes256 => key_lens::AES256,
        }
    }

    fn expected(self) -> &'static [usize] {
        match self {
            CbcKeySize::Aes128 => &[key_lens::AES128],
            CbcKeySize::Aes256 => &[key_lens::AES256],
        }
    }
}

enum CbcMode {
    Enc128(cbc::Encryptor<Aes128>),
    Enc256(cbc::Encryptor<Aes256>),
    Dec128(cbc::Decryptor<Aes128>),
    Dec256(cbc::Decryptor<Aes256>),
}

impl CbcMode {
    fn new(size: CbcKeySize, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self, EngineError> {
        let invalid = |_| EngineError::InvalidKeyLength { expected: size.expected(), actual: key.len() };
        Ok(match (size, direction) {
            (CbcKeySize::Aes128, Direction::Encrypt) => {
                Self::Enc128(cbc::Encryptor::new_from_slices(key, iv).map_err(invalid)?)
            }
            (CbcKeySize::Aes256, Direction::Encrypt) => {
                Self::Enc256(cbc::Encryptor::new_from_slices(key, iv).map_err(invalid)?)
            }
            (CbcKeySize::Aes128, Direction::Decrypt) => {
                Self::Dec128(cbc::Decryptor::new_from_slices(key, iv).map_err(invalid)?)
            }
            (CbcKeySize::Aes256, Direction::Decrypt) => {
                Self::Dec256(cbc::Decryptor::new_from_slices(key, iv).map_err(invalid)?)
            }
        })
    }

    fn direction(&self) -> Direction {
        match self {
            CbcMode::Enc128(_) | CbcMode::Enc256(_) => Direction::Encrypt,
            CbcMode::Dec128(_) | CbcMode::Dec256(_) => Direction::Decrypt,
        }
    }

    /// Transform one block in place. `block` is exactly `AES_BLOCK_LEN` bytes.
    fn apply(&mut self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            CbcMode::Enc128(c) => c.encrypt_block_mut(block),
            CbcMode::Enc256(c) => c.encrypt_block_mut(block),
            CbcMode::Dec128(c) => c.decrypt_block_mut(block),
            CbcMode::Dec256(c) => c.decrypt_block_mut(block),
        }
    }
}

struct CbcState {
    mode: CbcMode,
    pending: Vec<u8>,
}

/// Incremental AES-CBC/PKCS7 engine.
pub struct CbcEngine {
    size: CbcKeySize,
    state: Option<CbcState>,
}

impl CbcEngine {
    pub fn new(size: CbcKeySize) -> Self {
        Self { size, state: None }
    }

    fn pending(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.pending.len())
    }
}

impl std::fmt::Debug for CbcEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CbcEngine")
            .field("size", &self.size)
            .field("initialized", &self.state.is_some())
            .field("pending", &self.pending())
            .finish()
    }
}

impl CipherEngine for CbcEngine {
    fn algorithm(&self) -> &'static str {
        match self.size {
            CbcKeySize::Aes128 => "AES-128-CBC/PKCS7",
            CbcKeySize::Aes256 => "AES-256-CBC/PKCS7",
        }
    }

    fn nonce_len(&self) -> usize {
        nonce_lens::CBC
    }

    fn is_aead(&self) -> bool {
        false
    }

    fn init(
        &mut self,
        direction: Direction,
        key: &SymmetricKey,
        nonce: &[u8],
        _aad: Option<&[u8]>,
    ) -> Result<(), EngineError> {
        if key.len() != self.size.key_len() {
            return Err(EngineError::InvalidKeyLength {
                expected: self.size.expected(),
                actual: key.len(),
            });
        }
        if nonce.len() != nonce_lens::CBC {
            return Err(EngineError::InvalidNonceLength {
                expected: nonce_lens::CBC,
                actual: nonce.len(),
            });
        }
        let mode = CbcMode::new(self.size, direction, key.as_bytes(), nonce)?;
        self.state = Some(CbcState { mode, pending: Vec::with_capacity(AES_BLOCK_LEN * 2) });
        Ok(())
    }

    fn max_output_len(&self, input_len: usize) -> usize {
        let total = self.pending() + input_len;
        match self.state.as_ref().map(|s| s.mode.direction()) {
            Some(Direction::Decrypt) => total,
            _ => total / AES_BLOCK_LEN * AES_BLOCK_LEN + AES_BLOCK_LEN,
        }
    }

    // At most one block is ever pending between calls.
    fn update_output_len(&self, input_len: usize) -> usize {
        (input_len / AES_BLOCK_LEN + 1) * AES_BLOCK_LEN
    }

    fn finish_output_len(&self) -> usize {
        match self.state.as_ref().map(|s| s.mode.direction()) {
            Some(Direction::Decrypt) => self.pending(),
            _ => AES_BLOCK_LEN,
        }
    }

    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, EngineError> {
        let state = self.state.as_mut().ok_or(EngineError::NotInitialized)?;
        state.pending.extend_from_slice(input);

        let ready = match state.mode.direction() {
            Direction::Encrypt => state.pending.len() / AES_BLOCK_LEN * AES_BLOCK_LEN,
            // Keep the last complete block back for unpadding.
            Direction::Decrypt => {
                state.pending.len().saturating_sub(1) / AES_BLOCK_LEN * AES_BLOCK_LEN
            }
        };
        if ready == 0 {
            return Ok(0);
        }
        ensure_capacity(ready, out)?;

        out[..ready].copy_from_slice(&state.pending[..ready]);
        for block in out[..ready].chunks_exact_mut(AES_BLOCK_LEN) {
            state.mode.apply(block);
        }
        state.pending.drain(..ready);
        Ok(ready)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        let mut state = self.state.take().ok_or(EngineError::NotInitialized)?;
        let mut block = [0u8; AES_BLOCK_LEN];

        match state.mode.direction() {
            Direction::Encrypt => {
                let pos = state.pending.len();
                block[..pos].copy_from_slice(&state.pending);
                Pkcs7::raw_pad(&mut block, pos);
                state.mode.apply(&mut block);
                ensure_capacity(AES_BLOCK_LEN, out)?;
                out[..AES_BLOCK_LEN].copy_from_slice(&block);
                Ok(AES_BLOCK_LEN)
            }
            Direction::Decrypt => {
                if state.pending.len() != AES_BLOCK_LEN {
                    return Err(EngineError::InvalidCiphertextLength { len: state.pending.len() });
                }
                block.copy_from_slice(&state.pending);
                state.mode.apply(&mut block);
                let plain = Pkcs7::raw_unpad(&block).map_err(|_| EngineError::BadPadding)?;
                ensure_capacity(plain.len(), out)?;
                out[..plain.len()].copy_from_slice(plain);
                Ok(plain.len())
            }
        }
    }
}
