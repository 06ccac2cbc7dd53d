//! Non-password hashing helpers: content digests and cache-key hashing.

use sha1::Sha1;
use sha2::{Digest, Sha256};

const FNV32_OFFSET: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;
const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Lowercase hex SHA-1 digest. Not for anything security sensitive.
#[must_use]
pub fn sha1_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha1::digest(data.as_ref()))
}

#[must_use]
pub fn fnv1a_32(data: impl AsRef<[u8]>) -> u32 {
    data.as_ref().iter().fold(FNV32_OFFSET, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV32_PRIME)
    })
}

#[must_use]
pub fn fnv1a_64(data: impl AsRef<[u8]>) -> u64 {
    data.as_ref().iter().fold(FNV64_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV64_PRIME)
    })
}
