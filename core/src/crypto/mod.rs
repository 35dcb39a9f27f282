//! crypto/mod.rs
//! Key material, nonce sources, header MAC and the cipher engines.

pub mod types;
pub mod keys;
pub mod nonce;
pub mod mac;
pub mod engine;
pub mod aead;
pub mod block;

pub use types::*;
pub use keys::*;
pub use nonce::*;
pub use mac::*;
pub use engine::*;
pub use aead::{AeadAlgorithm, AeadEngine};
pub use block::{CbcEngine, CbcKeySize};
