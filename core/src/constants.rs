/// Version marker written at offset 0 of a V2 header.
/// V1 headers start with a non-negative length, so a negative tag is unambiguous.
pub const HEADER_V2_TAG: i32 = -2;

/// Bytes occupied by the V2 version tag; also the look-back window a
/// stream cursor must keep for V1 fallback.
pub const VERSION_TAG_LEN: usize = 4;

/// Upper bound for key names in both header formats.
pub const MAX_KEY_NAME_LEN: usize = 500;

/// Upper bound for nonces in both header formats (V2 stores the length in one byte).
pub const MAX_NONCE_LEN: usize = 255;

/// V1 fixed prefix: total length + nonce length.
pub const HEADER_V1_FIXED_LEN: usize = 8;

/// V1 key-name length prefix.
pub const HEADER_V1_KEY_LEN_FIELD: usize = 4;

/// HMAC-SHA-256 output carried at the end of a V2 header.
pub const HMAC_LEN: usize = 32;

/// Key-name terminator in V2 headers.
pub const KEY_NAME_TERMINATOR: u8 = 0x00;

/// Defaults when the bean config leaves the chunk size unset.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024; // 8 KiB
/// Max chunk size sanity bound (32 MiB).
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// AES block size, shared by the CBC engines.
pub const AES_BLOCK_LEN: usize = 16;

/// Full-length AEAD tag produced by every shipped AEAD engine.
pub const AEAD_TAG_LEN: usize = 16;

/// Nonce sizes per engine family.
pub mod nonce_lens {
    pub const GCM: usize = 12;
    pub const CHACHA20_POLY1305: usize = 12;
    pub const CCM: usize = 12;
    pub const EAX: usize = 16;
    pub const CBC: usize = 16;
}

/// Accepted symmetric key sizes in bytes.
pub mod key_lens {
    pub const AES128: usize = 16;
    pub const AES256: usize = 32;
    pub const CHACHA20: usize = 32;
}
