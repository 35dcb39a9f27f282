//! headers/cursor.rs
//!
//! Byte sources the header decoders are written against.
//!
//! Design notes:
//! - `ByteSource` is the whole read surface (`read_u8`, `read_u32`, `read_i32`, `read_bytes`);
//!   V1 and V2 decoding exist once and run against any implementation.
//! - Truncation surfaces as `HeaderError::Truncated` (encoding error), transport failure as
//!   `CryptoError::Stream` so callers can tell malformed input from a broken pipe.
//! - `Rewind` is what the version dispatcher needs for V1 fallback. Slices rewind anywhere;
//!   streams keep a look-back window of `VERSION_TAG_LEN` bytes and refuse anything larger.

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder};

use crate::constants::VERSION_TAG_LEN;
use crate::headers::types::HeaderError;
use crate::types::{CryptoError, Result};

/// Sequential reader of big-endian header fields.
pub trait ByteSource {
    /// Fill `buf` completely or fail.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Bytes handed out so far (rewinds subtract).
    fn consumed(&self) -> usize;

    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_into(&mut b)?;
        Ok(b[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_into(&mut b)?;
        Ok(BigEndian::read_u32(&b))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut b = [0u8; 4];
        self.read_into(&mut b)?;
        Ok(BigEndian::read_i32(&b))
    }

    /// Read exactly `n` bytes. Callers bound `n` before calling.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        self.read_into(&mut out)?;
        Ok(out)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_into(buf)
    }

    fn consumed(&self) -> usize {
        (**self).consumed()
    }
}

/// Return to a previously marked position.
pub trait Rewind {
    /// Remember the current position.
    fn mark(&mut self);

    /// Go back to the last mark.
    fn reset(&mut self) -> Result<()>;
}

impl<S: Rewind + ?Sized> Rewind for &mut S {
    fn mark(&mut self) {
        (**self).mark()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

// ================= Slice backend =================

/// Position-based cursor over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    mark: usize,
}

impl<'a> SliceCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, mark: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unread tail of the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

impl ByteSource for SliceCursor<'_> {
    fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let available = self.buf.len() - self.pos;
        if available < out.len() {
            return Err(HeaderError::Truncated { wanted: out.len() - available }.into());
        }
        out.copy_from_slice(&self.buf[self.pos..self.pos + out.len()]);
        self.pos += out.len();
        Ok(())
    }

    fn consumed(&self) -> usize {
        self.pos
    }
}

impl Rewind for SliceCursor<'_> {
    fn mark(&mut self) {
        self.mark = self.pos;
    }

    fn reset(&mut self) -> Result<()> {
        self.pos = self.mark;
        Ok(())
    }
}

// ================= Stream backend =================

/// Read-based cursor over a non-seekable stream.
///
/// Bytes served after `mark()` are kept in a look-back buffer of `VERSION_TAG_LEN` bytes.
/// `reset()` queues them for replay; if more than the window was consumed it fails
/// instead of handing back a partial (garbled) prefix.
///
/// After header parsing the cursor doubles as the body reader via `std::io::Read`,
/// serving any replayed bytes first.
#[derive(Debug)]
pub struct StreamCursor<R> {
    inner: R,
    replay: Vec<u8>,
    replay_pos: usize,
    lookback: Vec<u8>,
    marked: bool,
    since_mark: usize,
    consumed: usize,
}

impl<R: Read> StreamCursor<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            replay: Vec::new(),
            replay_pos: 0,
            lookback: Vec::with_capacity(VERSION_TAG_LEN),
            marked: false,
            since_mark: 0,
            consumed: 0,
        }
    }

    /// Give back the wrapped reader. Replay bytes not yet served are dropped.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn take_replay(&mut self, out: &mut [u8]) -> usize {
        let available = self.replay.len() - self.replay_pos;
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.replay[self.replay_pos..self.replay_pos + n]);
        self.replay_pos += n;
        if self.replay_pos == self.replay.len() {
            self.replay.clear();
            self.replay_pos = 0;
        }
        n
    }

    fn fill_from_inner(&mut self, out: &mut [u8]) -> Result<()> {
        let mut off = 0;
        while off < out.len() {
            match self.inner.read(&mut out[off..]) {
                Ok(0) => {
                    return Err(HeaderError::Truncated { wanted: out.len() - off }.into());
                }
                Ok(n) => off += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CryptoError::Stream(e)),
            }
        }
        Ok(())
    }
}

impl<R: Read> ByteSource for StreamCursor<R> {
    fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let from_replay = self.take_replay(out);
        if from_replay < out.len() {
            self.fill_from_inner(&mut out[from_replay..])?;
        }

        if self.marked {
            if self.lookback.len() + out.len() <= VERSION_TAG_LEN {
                self.lookback.extend_from_slice(out);
            }
            self.since_mark += out.len();
        }
        self.consumed += out.len();
        Ok(())
    }

    fn consumed(&self) -> usize {
        self.consumed
    }
}

impl<R: Read> Rewind for StreamCursor<R> {
    fn mark(&mut self) {
        self.marked = true;
        self.lookback.clear();
        self.since_mark = 0;
    }

    fn reset(&mut self) -> Result<()> {
        if !self.marked || self.since_mark > VERSION_TAG_LEN {
            return Err(HeaderError::RewindUnsupported {
                consumed: self.since_mark,
                window: VERSION_TAG_LEN,
            }
            .into());
        }

        let mut replay = std::mem::take(&mut self.lookback);
        replay.extend_from_slice(&self.replay[self.replay_pos..]);
        self.replay = replay;
        self.replay_pos = 0;
        self.consumed -= self.since_mark;
        self.since_mark = 0;
        Ok(())
    }
}

impl<R: Read> Read for StreamCursor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = match self.take_replay(buf) {
            0 => self.inner.read(buf)?,
            n => n,
        };
        self.consumed += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reads_big_endian_fields() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFE, 0x2A, 0x00, 0x00, 0x01, 0x00];
        let mut c = SliceCursor::new(&bytes);
        assert_eq!(c.read_i32().unwrap(), -2);
        assert_eq!(c.read_u8().unwrap(), 0x2A);
        assert_eq!(c.read_u32().unwrap(), 0x0000_0100);
        assert_eq!(c.consumed(), 9);
    }

    #[test]
    fn slice_truncation_does_not_advance() {
        let bytes = [1u8, 2, 3];
        let mut c = SliceCursor::new(&bytes);
        let err = c.read_u32().unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(HeaderError::Truncated { wanted: 1 })));
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn stream_reset_replays_marked_bytes() {
        let data = vec![9u8, 8, 7, 6, 5, 4];
        let mut c = StreamCursor::new(data.as_slice());
        c.mark();
        assert_eq!(c.read_bytes(4).unwrap(), vec![9, 8, 7, 6]);
        c.reset().unwrap();
        assert_eq!(c.consumed(), 0);
        assert_eq!(c.read_bytes(6).unwrap(), data);
    }

    #[test]
    fn stream_into_inner_returns_unread_tail() {
        let data = [0xAAu8, 0xBB, 0xCC, 0xDD, 0xEE];
        let mut c = StreamCursor::new(&data[..]);
        assert_eq!(c.read_bytes(2).unwrap(), vec![0xAA, 0xBB]);
        let rest = c.into_inner();
        assert_eq!(rest, &data[2..]);
    }

    #[test]
    fn stream_reset_beyond_window_fails() {
        let data = [0u8; 16];
        let mut c = StreamCursor::new(&data[..]);
        c.mark();
        c.read_bytes(5).unwrap();
        let err = c.reset().unwrap_err();
        assert!(matches!(
            err,
            CryptoError::Encoding(HeaderError::RewindUnsupported { consumed: 5, window: 4 })
        ));
    }

    #[test]
    fn stream_read_serves_replay_first() {
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let mut c = StreamCursor::new(&data[..]);
        c.mark();
        c.read_u32().unwrap();
        c.reset().unwrap();
        let mut rest = Vec::new();
        c.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, data);
    }

    #[test]
    fn stream_io_failure_is_not_truncation() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
            }
        }
        let mut c = StreamCursor::new(Broken);
        assert!(matches!(c.read_u8().unwrap_err(), CryptoError::Stream(_)));
    }
}
