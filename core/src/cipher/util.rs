//! cipher/util.rs
//! Encrypt/decrypt with key material in hand, no alias or resolver.
//!
//! Encryption writes a V1 header without a key name. Decryption accepts any header;
//! a V2 header is verified against the supplied key whatever name it carries.

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::debug;

use crate::cipher::io::{init_engine, transform_buffer, transform_stream};
use crate::crypto::{CipherEngine, Direction, NonceSource, SharedKeyResolver, SymmetricKey};
use crate::headers::{self, HeaderV1};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{CryptoError, Result};

/// Resolver answering every name with `key`.
fn fixed_resolver(key: &SymmetricKey) -> SharedKeyResolver {
    let key = key.clone();
    Arc::new(move |_: &str| Some(key.clone()))
}

fn ensure_streaming(engine: &dyn CipherEngine) -> Result<()> {
    if engine.supports_streaming() {
        Ok(())
    } else {
        Err(CryptoError::Unsupported(format!("{} cannot stream", engine.algorithm())))
    }
}

pub fn encrypt_with_key(
    engine: &mut dyn CipherEngine,
    key: &SymmetricKey,
    nonces: &dyn NonceSource,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let header = HeaderV1::new(nonces.generate()?, None)?;
    let mut out = header.encode();
    let header_len = out.len();

    init_engine(engine, Direction::Encrypt, key, header.nonce(), &out[..header_len])?;
    transform_buffer(engine, plaintext, &mut out)?;
    debug!(algorithm = engine.algorithm(), total = out.len(), "encrypted with explicit key");
    Ok(out)
}

pub fn decrypt_with_key(
    engine: &mut dyn CipherEngine,
    key: &SymmetricKey,
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let (header, used) = headers::decode_slice(ciphertext, &fixed_resolver(key))?;

    init_engine(engine, Direction::Decrypt, key, header.nonce(), &ciphertext[..used])?;
    let mut out = Vec::new();
    transform_buffer(engine, &ciphertext[used..], &mut out)?;
    debug!(algorithm = engine.algorithm(), plaintext = out.len(), "decrypted with explicit key");
    Ok(out)
}

pub fn encrypt_stream_with_key<R: Read, W: Write>(
    engine: &mut dyn CipherEngine,
    key: &SymmetricKey,
    nonces: &dyn NonceSource,
    mut input: R,
    mut output: W,
    chunk_size: usize,
) -> Result<TelemetrySnapshot> {
    ensure_streaming(engine)?;
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    let header = timer.time(Stage::Header, || -> Result<_> {
        Ok(HeaderV1::new(nonces.generate()?, None)?)
    })?;
    let header_bytes = header.encode();

    init_engine(engine, Direction::Encrypt, key, header.nonce(), &header_bytes)?;
    timer.time(Stage::Write, || output.write_all(&header_bytes))?;
    counters.add_header(header_bytes.len());

    transform_stream(engine, &mut input, &mut output, chunk_size.max(1), &mut counters, &mut timer)?;
    timer.finish();
    Ok(TelemetrySnapshot::from(&counters, &timer))
}

pub fn decrypt_stream_with_key<R: Read, W: Write>(
    engine: &mut dyn CipherEngine,
    key: &SymmetricKey,
    input: R,
    mut output: W,
    chunk_size: usize,
) -> Result<TelemetrySnapshot> {
    ensure_streaming(engine)?;
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    let resolver = fixed_resolver(key);
    let (header, mut body) = timer.time(Stage::Header, || headers::decode_reader(input, &resolver))?;
    let header_bytes = header.encode_with_key(key)?;
    counters.add_header(header_bytes.len());

    init_engine(engine, Direction::Decrypt, key, header.nonce(), &header_bytes)?;
    transform_stream(engine, &mut body, &mut output, chunk_size.max(1), &mut counters, &mut timer)?;
    timer.finish();
    Ok(TelemetrySnapshot::from(&counters, &timer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherSuite, RandomNonce};

    #[test]
    fn key_direct_roundtrip_without_key_name() {
        let key = SymmetricKey::new(vec![4u8; 32]);
        let nonces = RandomNonce::new(16).unwrap();
        let suite = CipherSuite::Aes256CbcPkcs7;

        let ct = encrypt_with_key(suite.engine().as_mut(), &key, &nonces, b"direct").unwrap();
        let (header, _) = headers::decode_slice(&ct, &fixed_resolver(&key)).unwrap();
        assert_eq!(header.key_name(), None);

        let pt = decrypt_with_key(suite.engine().as_mut(), &key, &ct).unwrap();
        assert_eq!(pt, b"direct");
    }

    #[test]
    fn ccm_refuses_key_direct_streaming() {
        let key = SymmetricKey::new(vec![4u8; 16]);
        let nonces = RandomNonce::new(12).unwrap();
        let mut out = Vec::new();
        let err = encrypt_stream_with_key(
            CipherSuite::Aes128Ccm.engine().as_mut(),
            &key,
            &nonces,
            &b"data"[..],
            &mut out,
            16,
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::Unsupported(_)));
        assert!(out.is_empty());
    }
}
