//! cipher/io.rs
//! Engine driving shared by the bean and the key-direct helpers.
//!
//! Output buffers are always sized from the engine's bounds, never from the input length.
//! The stream path allocates its chunk buffer once and grows it at most once, for `finish`.

use std::io::{self, Read, Write};
use std::time::Instant;

use tracing::trace;

use crate::crypto::{CipherEngine, Direction, EngineError, KeyError, SymmetricKey};
use crate::telemetry::{Stage, TelemetryCounters, TelemetryTimer};
use crate::types::{CryptoError, Result};

/// Key and nonce an engine, passing `header` as associated data to AEAD engines.
/// A key the engine cannot use is a key error, not a cipher error.
pub(crate) fn init_engine(
    engine: &mut dyn CipherEngine,
    direction: Direction,
    key: &SymmetricKey,
    nonce: &[u8],
    header: &[u8],
) -> Result<()> {
    let algorithm = engine.algorithm();
    let aad = engine.is_aead().then_some(header);
    engine.init(direction, key, nonce, aad).map_err(|e| match e {
        EngineError::InvalidKeyLength { actual, .. } => {
            CryptoError::Key(KeyError::InvalidLength { algorithm, actual })
        }
        other => other.into(),
    })?;
    trace!(%direction, algorithm, aead = engine.is_aead(), "cipher initialized");
    Ok(())
}

/// Run all of `input` through an initialized engine, appending the result to `out`.
pub(crate) fn transform_buffer(
    engine: &mut dyn CipherEngine,
    input: &[u8],
    out: &mut Vec<u8>,
) -> Result<()> {
    let start = out.len();
    out.resize(start + engine.max_output_len(input.len()), 0);

    let written = engine.update(input, &mut out[start..])?;
    let last = engine.finish(&mut out[start + written..])?;

    // Padded ciphers report an upper bound; keep only what was produced.
    out.truncate(start + written + last);
    trace!(input = input.len(), output = written + last, "body processed");
    Ok(())
}

/// Fill `buf` from `r` until it is full or the reader reports EOF.
/// Returns the number of bytes read; 0 means EOF.
pub(crate) fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}

/// Stream the body through an initialized engine in `chunk_size` pieces.
///
/// Each chunk's output is written as soon as `update` returns it. Whatever `finish`
/// releases is written last, then the writer is flushed.
pub(crate) fn transform_stream<R: Read, W: Write>(
    engine: &mut dyn CipherEngine,
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<()> {
    let mut in_buf = vec![0u8; chunk_size];
    let mut out_buf = vec![0u8; engine.update_output_len(chunk_size)];

    loop {
        let t = Instant::now();
        let n = read_exact_or_eof(reader, &mut in_buf)?;
        timer.add_stage_time(Stage::Read, t.elapsed());
        if n == 0 {
            break;
        }

        let t = Instant::now();
        let written = engine.update(&in_buf[..n], &mut out_buf)?;
        timer.add_stage_time(Stage::Cipher, t.elapsed());

        let t = Instant::now();
        writer.write_all(&out_buf[..written])?;
        timer.add_stage_time(Stage::Write, t.elapsed());

        counters.add_chunk(n, written);
        trace!(chunk = counters.chunks, read = n, written, "chunk processed");
    }

    let need = engine.finish_output_len();
    if out_buf.len() < need {
        out_buf.resize(need, 0);
    }
    let t = Instant::now();
    let last = engine.finish(&mut out_buf)?;
    timer.add_stage_time(Stage::Cipher, t.elapsed());

    let t = Instant::now();
    writer.write_all(&out_buf[..last])?;
    writer.flush()?;
    timer.add_stage_time(Stage::Write, t.elapsed());

    counters.add_final(last);
    trace!(written = last, "stream finished");
    Ok(())
}
