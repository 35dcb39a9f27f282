//! headers/mod.rs
//! Self-describing ciphertext headers.
//!
//! Two wire formats, both big-endian:
//! - V1: length-prefixed, optional key name, unauthenticated. Read for compatibility.
//! - V2: tagged `-2`, mandatory key name, trailing HMAC-SHA-256 keyed by the named key.
//!
//! Decoders are written once against `cursor::ByteSource` and run over slices and streams.
//! `codec::decode` picks the version.

pub mod cursor;
pub mod types;
pub mod v1;
pub mod v2;
pub mod codec;

pub use cursor::{ByteSource, Rewind, SliceCursor, StreamCursor};
pub use types::*;
pub use v1::HeaderV1;
pub use v2::{HeaderV2, V2Probe};
pub use codec::{decode, decode_reader, decode_slice, encode};
