//! BLAKE2b hashing, shared by both suites.
//!
//! The wire format's digests are 32 bytes (`crypto_generichash`'s default
//! output length), not the 64-byte "BLAKE2b-512" the name might suggest —
//! see `DESIGN.md` for how this was pinned down from the known-answer vectors.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

pub fn blake2b32(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_32_bytes_and_deterministic() {
        let a = blake2b32(b"hello");
        let b = blake2b32(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn distinct_inputs_differ() {
        assert_ne!(blake2b32(b"hello"), blake2b32(b"world"));
    }
}
