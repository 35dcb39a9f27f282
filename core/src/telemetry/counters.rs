//! telemetry/counters.rs
//! Mutable counters collected during one encrypt/decrypt stream call.
//!
//! Converted into an immutable `TelemetrySnapshot` when the call completes.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Body chunks pushed through the engine.
    pub chunks: u64,
    /// Header bytes written (encrypt) or parsed (decrypt).
    pub bytes_header: u64,
    /// Body bytes read from the input.
    pub bytes_in: u64,
    /// Body bytes written to the output, excluding the header.
    pub bytes_out: u64,
}

impl TelemetryCounters {
    pub fn add_header(&mut self, header_len: usize) {
        self.bytes_header += header_len as u64;
    }

    /// Record one body chunk: `read_len` consumed, `written_len` produced by `update`.
    pub fn add_chunk(&mut self, read_len: usize, written_len: usize) {
        self.chunks += 1;
        self.bytes_in += read_len as u64;
        self.bytes_out += written_len as u64;
    }

    /// Bytes released by `finish` (padding block, AEAD output).
    pub fn add_final(&mut self, written_len: usize) {
        self.bytes_out += written_len as u64;
    }

    /// Everything written for an encrypt call, header included.
    pub fn total_written(&self) -> u64 {
        self.bytes_header + self.bytes_out
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.bytes_header += other.bytes_header;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
