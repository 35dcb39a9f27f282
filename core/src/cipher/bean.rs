//! cipher/bean.rs
//!
//! `CipherBean`: key resolver + nonce source + header codec + cipher engine.
//!
//! Design notes:
//! - Stateless across calls. Every call builds its own header, resolves its own key and
//!   creates its own engine; nothing resolved is cached, so key rotation under a name
//!   applies to the next call.
//! - Per call: header built or parsed, key resolved, cipher initialized, body processed.
//!   Any step fails the whole call with one typed error and no partial result.
//! - AEAD engines get the exact header bytes as associated data, binding the header to
//!   the body. Padded block engines do not authenticate the header.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::cipher::config::{BeanConfig, HeaderPolicy};
use crate::cipher::io::{init_engine, transform_buffer, transform_stream};
use crate::crypto::{
    validate_nonce_len, CipherEngine, Direction, EngineFactory, KeyError,
    NonceSource, SharedKeyResolver, SymmetricKey,
};
use crate::headers::{self, CiphertextHeader, HeaderV1, HeaderV2};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{CryptoError, Result};

pub type SharedNonceSource = Arc<dyn NonceSource + Send + Sync>;
pub type SharedEngineFactory = Arc<dyn EngineFactory + Send + Sync>;

/// Configured encrypt/decrypt front end.
pub struct CipherBean {
    config: BeanConfig,
    engines: SharedEngineFactory,
    resolver: SharedKeyResolver,
    nonces: SharedNonceSource,
    algorithm: &'static str,
}

impl CipherBean {
    /// Build a bean around an explicit engine factory.
    ///
    /// Fails when the config is invalid or the nonce source does not produce the
    /// nonce length the engine expects.
    pub fn new(
        engines: SharedEngineFactory,
        resolver: SharedKeyResolver,
        nonces: SharedNonceSource,
        config: BeanConfig,
    ) -> Result<Self> {
        config.validate()?;
        validate_nonce_len(nonces.length())?;

        let probe = engines.create();
        if probe.nonce_len() != nonces.length() {
            return Err(CryptoError::Config(format!(
                "{} needs a {}-byte nonce, nonce source produces {}",
                probe.algorithm(),
                probe.nonce_len(),
                nonces.length()
            )));
        }

        debug!(
            alias = %config.key_alias,
            algorithm = probe.algorithm(),
            policy = ?config.header_policy,
            chunk_size = config.chunk_size,
            "cipher bean ready"
        );
        Ok(Self { algorithm: probe.algorithm(), config, engines, resolver, nonces })
    }

    /// Build a bean for `config.suite`.
    pub fn from_config(
        config: BeanConfig,
        resolver: SharedKeyResolver,
        nonces: SharedNonceSource,
    ) -> Result<Self> {
        let suite = config
            .suite
            .ok_or_else(|| CryptoError::Config("no cipher suite configured".into()))?;
        Self::new(Arc::new(suite), resolver, nonces, config)
    }

    pub fn config(&self) -> &BeanConfig {
        &self.config
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    fn resolve(&self, name: &str) -> Result<SymmetricKey> {
        let key = self
            .resolver
            .resolve(name)
            .ok_or_else(|| KeyError::NotFound { name: name.to_owned() })?;
        trace!(key = name, "key resolved");
        Ok(key)
    }

    /// New header for one encryption, per the configured policy.
    fn build_header(&self) -> Result<CiphertextHeader> {
        let nonce = self.nonces.generate()?;
        let alias = self.config.key_alias.as_str();
        let header: CiphertextHeader = match self.config.header_policy {
            HeaderPolicy::Plain => HeaderV1::new(nonce, Some(alias))?.into(),
            HeaderPolicy::Authenticated => HeaderV2::new(nonce, alias)?
                .with_key_resolver(self.resolver.clone())
                .into(),
        };
        trace!(version = %header.version(), "header built");
        Ok(header)
    }

    /// Key for a parsed header. The header must name its key.
    fn key_for(&self, header: &CiphertextHeader) -> Result<SymmetricKey> {
        let name = header
            .key_name()
            .filter(|n| !n.is_empty())
            .ok_or(KeyError::MissingKeyName)?;
        self.resolve(name)
    }

    fn streaming_engine(&self) -> Result<Box<dyn CipherEngine>> {
        let engine = self.engines.create();
        if !engine.supports_streaming() {
            return Err(CryptoError::Unsupported(format!(
                "{} needs the message length up front and cannot stream",
                engine.algorithm()
            )));
        }
        Ok(engine)
    }

    /// Encrypt a whole buffer. Output is `header || cipher output`.
    #[instrument(level = "debug", skip_all, fields(alias = %self.config.key_alias, algorithm = self.algorithm, len = plaintext.len()))]
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let header = self.build_header()?;
        let key = self.resolve(&self.config.key_alias)?;
        let mut out = header.encode_with_key(&key)?;
        let header_len = out.len();

        let mut engine = self.engines.create();
        init_engine(engine.as_mut(), Direction::Encrypt, &key, header.nonce(), &out[..header_len])?;
        transform_buffer(engine.as_mut(), plaintext, &mut out)?;

        debug!(header = header_len, total = out.len(), "encrypted");
        Ok(out)
    }

    /// Decrypt a whole `header || body` buffer.
    #[instrument(level = "debug", skip_all, fields(algorithm = self.algorithm, len = ciphertext.len()))]
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let (header, used) = headers::decode_slice(ciphertext, &self.resolver)?;
        trace!(%header, "header parsed");
        let key = self.key_for(&header)?;

        let mut engine = self.engines.create();
        init_engine(engine.as_mut(), Direction::Decrypt, &key, header.nonce(), &ciphertext[..used])?;

        let body = &ciphertext[used..];
        let mut out = Vec::new();
        transform_buffer(engine.as_mut(), body, &mut out)?;

        debug!(header = used, plaintext = out.len(), "decrypted");
        Ok(out)
    }

    /// Encrypt `input` to `output` in `chunk_size` pieces.
    ///
    /// Engines that cannot stream are rejected before anything is read or written.
    #[instrument(level = "debug", skip_all, fields(alias = %self.config.key_alias, algorithm = self.algorithm))]
    pub fn encrypt_stream<R: Read, W: Write>(&self, mut input: R, mut output: W) -> Result<TelemetrySnapshot> {
        let mut engine = self.streaming_engine()?;
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        let header = timer.time(Stage::Header, || self.build_header())?;
        let key = timer.time(Stage::KeyResolve, || self.resolve(&self.config.key_alias))?;
        let header_bytes = timer.time(Stage::Header, || header.encode_with_key(&key))?;

        init_engine(engine.as_mut(), Direction::Encrypt, &key, header.nonce(), &header_bytes)?;
        timer.time(Stage::Write, || output.write_all(&header_bytes))?;
        counters.add_header(header_bytes.len());

        transform_stream(
            engine.as_mut(),
            &mut input,
            &mut output,
            self.config.chunk_size,
            &mut counters,
            &mut timer,
        )?;

        timer.finish();
        let snapshot = TelemetrySnapshot::from(&counters, &timer);
        debug!(chunks = snapshot.chunks, bytes_in = snapshot.bytes_in, bytes_out = snapshot.output_bytes(), "stream encrypted");
        Ok(snapshot)
    }

    /// Decrypt a `header || body` stream to `output` in `chunk_size` pieces.
    ///
    /// With AEAD engines nothing reaches `output` until the tag has verified.
    #[instrument(level = "debug", skip_all, fields(algorithm = self.algorithm))]
    pub fn decrypt_stream<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<TelemetrySnapshot> {
        let mut engine = self.streaming_engine()?;
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        let (header, mut body) = timer.time(Stage::Header, || headers::decode_reader(input, &self.resolver))?;
        trace!(%header, "header parsed");
        let key = timer.time(Stage::KeyResolve, || self.key_for(&header))?;

        // Re-encoding reproduces the consumed bytes exactly: V1 lengths are checked
        // on decode and the V2 HMAC is deterministic.
        let header_bytes = header.encode_with_key(&key)?;
        counters.add_header(header_bytes.len());
        init_engine(engine.as_mut(), Direction::Decrypt, &key, header.nonce(), &header_bytes)?;

        transform_stream(
            engine.as_mut(),
            &mut body,
            &mut output,
            self.config.chunk_size,
            &mut counters,
            &mut timer,
        )?;

        timer.finish();
        let snapshot = TelemetrySnapshot::from(&counters, &timer);
        debug!(chunks = snapshot.chunks, bytes_in = snapshot.bytes_in, bytes_out = snapshot.bytes_out, "stream decrypted");
        Ok(snapshot)
    }
}

impl fmt::Debug for CipherBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherBean")
            .field("config", &self.config)
            .field("algorithm", &self.algorithm)
            .field("nonce_len", &self.nonces.length())
            .finish_non_exhaustive()
    }
}
