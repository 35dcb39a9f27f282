//! ciphertext-core
//!
//! Self-describing ciphertext: a versioned header carrying the nonce and the symbolic
//! key name, followed by the cipher output. Pure Rust, synchronous, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod crypto;
pub mod headers;
pub mod telemetry;

// Orchestration
pub mod cipher;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::cipher::{BeanConfig, CipherBean, HeaderPolicy};
    pub use crate::crypto::{
        CipherEngine, CipherSuite, CounterNonce, EngineFactory, KeyResolver, KeyRing,
        NonceSource, RandomNonce, SharedKeyResolver, SymmetricKey,
    };
    pub use crate::headers::{CiphertextHeader, HeaderV1, HeaderV2, HeaderVersion};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{AuthFailure, CryptoError, Result};
}
