//! cipher/mod.rs
//! Header-prefixed encryption and decryption of buffers and streams.

pub mod config;
pub mod bean;
pub mod util;
mod io;

pub use config::{BeanConfig, HeaderPolicy};
pub use bean::{CipherBean, SharedEngineFactory, SharedNonceSource};
pub use util::{decrypt_stream_with_key, decrypt_with_key, encrypt_stream_with_key, encrypt_with_key};
