//! Unpadded Base64URL, matching the wire encoding used across every envelope.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::CryptoError;

/// Encode raw bytes as unpadded Base64URL.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded (or padded) Base64URL back to raw bytes.
pub fn decode(s: impl AsRef<[u8]>) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(CryptoError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_round_trips() {
        assert_eq!(decode(encode(b"")).unwrap(), b"");
    }

    #[test]
    fn no_padding_characters_emitted() {
        // A length whose base64 would normally need `=` padding.
        let encoded = encode(b"abc");
        assert!(!encoded.contains('='));
    }

    proptest! {
        #[test]
        fn round_trips_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode(&bytes);
            let decoded = decode(&encoded).unwrap();
            prop_assert_eq!(decoded, bytes);
        }
    }
}
