/// Hex rendering for diagnostics. Long inputs are elided in the middle.
pub fn fmt_bytes(bytes: &[u8]) -> String {
    const KEEP: usize = 16;
    if bytes.len() <= KEEP * 2 {
        return hex::encode(bytes);
    }
    format!(
        "{}..{} ({} bytes)",
        hex::encode(&bytes[..KEEP]),
        hex::encode(&bytes[bytes.len() - KEEP..]),
        bytes.len()
    )
}
