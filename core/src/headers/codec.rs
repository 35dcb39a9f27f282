//! headers/codec.rs
//!
//! Version dispatch over both header formats.
//!
//! `decode` marks the source, probes for V2, and only on `V2Probe::NotV2` rewinds and
//! reads V1. Truncation, oversized names, unknown keys and HMAC failures all propagate;
//! a failed V2 header is never reinterpreted as V1.

use std::io::Read;

use tracing::trace;

use crate::crypto::keys::SharedKeyResolver;
use crate::headers::cursor::{ByteSource, Rewind, SliceCursor, StreamCursor};
use crate::headers::types::CiphertextHeader;
use crate::headers::v1::HeaderV1;
use crate::headers::v2::{HeaderV2, V2Probe};
use crate::types::Result;

/// Decode a header of either version from any rewindable source.
pub fn decode<S>(src: &mut S, resolver: &SharedKeyResolver) -> Result<CiphertextHeader>
where
    S: ByteSource + Rewind,
{
    src.mark();
    match HeaderV2::probe(src, resolver)? {
        V2Probe::Parsed(h) => {
            trace!(key = h.key_name(), "decoded v2 header");
            Ok(CiphertextHeader::V2(h))
        }
        V2Probe::NotV2 { tag } => {
            trace!(tag, "no v2 tag, retrying as v1");
            src.reset()?;
            let h = HeaderV1::decode(src)?;
            trace!(len = h.length(), "decoded v1 header");
            Ok(CiphertextHeader::V1(h))
        }
    }
}

/// Decode the header at the start of `bytes`.
/// Returns the header and the number of bytes it occupies.
pub fn decode_slice(bytes: &[u8], resolver: &SharedKeyResolver) -> Result<(CiphertextHeader, usize)> {
    let mut cursor = SliceCursor::new(bytes);
    let header = decode(&mut cursor, resolver)?;
    Ok((header, cursor.position()))
}

/// Decode the header at the head of `reader`.
/// The returned cursor is positioned at the first body byte and implements `Read`.
pub fn decode_reader<R: Read>(
    reader: R,
    resolver: &SharedKeyResolver,
) -> Result<(CiphertextHeader, StreamCursor<R>)> {
    let mut cursor = StreamCursor::new(reader);
    let header = decode(&mut cursor, resolver)?;
    Ok((header, cursor))
}

/// Serialize either header version.
#[inline]
pub fn encode(header: &CiphertextHeader) -> Result<Vec<u8>> {
    header.encode()
}
