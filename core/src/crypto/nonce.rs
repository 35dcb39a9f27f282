//! crypto/nonce.rs
//! Nonce/IV generation strategies.
//!
//! Design:
//! - `NonceSource` has a fixed output length; cipher beans check it against the engine
//!   at construction so a mismatch fails early rather than per call.
//! - `RandomNonce` draws from the OS RNG (standard for GCM/CBC with modest volumes per key).
//! - `CounterNonce` keeps a fixed prefix and a big-endian 64-bit counter in the low 8 bytes,
//!   so distinct calls never repeat a nonce until the counter is exhausted.
//!
//! Security notes:
//! - Never share a `CounterNonce` prefix between two processes using the same key.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::MAX_NONCE_LEN;
use crate::types::{CryptoError, Result};

/// Counter bytes at the tail of a `CounterNonce`.
pub const COUNTER_LEN: usize = 8;

/// Produces one nonce per encryption call.
pub trait NonceSource {
    fn generate(&self) -> Result<Vec<u8>>;

    /// Length of every nonce `generate` returns.
    fn length(&self) -> usize;
}

/// Summary: Validate a nonce length against the header formats.
/// Returns Ok(()) for 1..=255 bytes.
#[inline]
pub fn validate_nonce_len(len: usize) -> Result<()> {
    if len == 0 || len > MAX_NONCE_LEN {
        return Err(CryptoError::Config(format!(
            "nonce length must be 1..={MAX_NONCE_LEN}, got {len}"
        )));
    }
    Ok(())
}

/// Random nonces from the operating system RNG.
#[derive(Debug, Clone)]
pub struct RandomNonce {
    len: usize,
}

impl RandomNonce {
    pub fn new(len: usize) -> Result<Self> {
        validate_nonce_len(len)?;
        Ok(Self { len })
    }
}

impl NonceSource for RandomNonce {
    fn generate(&self) -> Result<Vec<u8>> {
        let mut nonce = vec![0u8; self.len];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| CryptoError::State(format!("system RNG unavailable: {e}")))?;
        Ok(nonce)
    }

    fn length(&self) -> usize {
        self.len
    }
}

/// Fixed prefix followed by a big-endian 64-bit counter.
///
/// The counter is atomic so one source can back concurrent encrypt calls.
#[derive(Debug)]
pub struct CounterNonce {
    prefix: Vec<u8>,
    counter: AtomicU64,
}

impl CounterNonce {
    /// Counter starts at zero.
    pub fn new(prefix: impl Into<Vec<u8>>) -> Result<Self> {
        Self::starting_at(prefix, 0)
    }

    pub fn starting_at(prefix: impl Into<Vec<u8>>, start: u64) -> Result<Self> {
        let prefix = prefix.into();
        validate_nonce_len(prefix.len() + COUNTER_LEN)?;
        Ok(Self { prefix, counter: AtomicU64::new(start) })
    }

    /// Next counter value that `generate` will use.
    pub fn peek(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl NonceSource for CounterNonce {
    fn generate(&self) -> Result<Vec<u8>> {
        let value = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_add(1))
            .map_err(|_| CryptoError::State("nonce counter exhausted".into()))?;

        let mut nonce = Vec::with_capacity(self.length());
        nonce.extend_from_slice(&self.prefix);
        nonce.extend_from_slice(&value.to_be_bytes());
        Ok(nonce)
    }

    fn length(&self) -> usize {
        self.prefix.len() + COUNTER_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_nonce_has_declared_length() {
        let src = RandomNonce::new(12).unwrap();
        let a = src.generate().unwrap();
        let b = src.generate().unwrap();
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_length_bounds() {
        assert!(RandomNonce::new(0).is_err());
        assert!(RandomNonce::new(256).is_err());
        assert!(RandomNonce::new(255).is_ok());
    }

    #[test]
    fn counter_nonce_layout() {
        let src = CounterNonce::starting_at([0xAA; 4], 0x0102).unwrap();
        assert_eq!(src.length(), 12);
        let n = src.generate().unwrap();
        assert_eq!(&n[..4], &[0xAA; 4]);
        assert_eq!(&n[4..], &0x0102u64.to_be_bytes());
        assert_eq!(src.peek(), 0x0103);
    }

    #[test]
    fn counter_nonce_exhaustion_fails() {
        let src = CounterNonce::starting_at([0u8; 4], u64::MAX).unwrap();
        assert!(matches!(src.generate(), Err(CryptoError::State(_))));
    }
}
