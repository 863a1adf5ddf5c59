//! Crypto-layer error taxonomy.
//!
//! Every failure in this crate collapses to [`CryptoError`]. Variants name the
//! *kind* of failure, not the component that raised it, since callers match on
//! kind (malformed wire data vs. a failed MAC) rather than call site.

use core::fmt;

/// Something went wrong encoding, decoding, or operating on envelope bytes.
#[derive(Debug)]
pub enum CryptoError {
    /// An encrypted-field envelope did not have exactly four `.`-separated segments.
    InvalidEnvelope,
    /// An EAK envelope did not have exactly two `.`-separated segments.
    InvalidAccessKeyFormat,
    /// A segment was present but decoded to zero bytes.
    EmptySegment,
    /// Base64URL decoding failed.
    Base64(base64::DecodeError),
    /// Symmetric decryption (secret box / AES-GCM) failed its authentication tag.
    DecryptionFailed,
    /// Public-key box wrap/unwrap failed (EAK sealing or opening).
    AccessKeyUnwrapFailed,
    /// Ed25519 signature verification failed.
    SignatureInvalid,
    /// A key or nonce did not have the expected byte length.
    InvalidKeyLength { expected: usize, actual: usize },
    /// A PEM/PKCS#8/SPKI key encoding was malformed (NIST suite only).
    InvalidKeyEncoding(String),
    /// The file envelope's leading version byte did not match the one supported version.
    UnsupportedFileVersion,
    /// A file stream chunk carried a tag other than `MESSAGE` or `FINAL`.
    UnexpectedStreamTag,
    /// File streaming was attempted under a suite that has no streaming file mode.
    FileModeUnsupportedForSuite,
    /// Underlying I/O failure while streaming a file envelope.
    Io(std::io::Error),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvelope => write!(f, "invalid encrypted field envelope"),
            Self::InvalidAccessKeyFormat => write!(f, "invalid access key format"),
            Self::EmptySegment => write!(f, "envelope segment decoded to empty bytes"),
            Self::Base64(e) => write!(f, "base64 decode failed: {e}"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
            Self::AccessKeyUnwrapFailed => write!(f, "access key unwrap failed"),
            Self::SignatureInvalid => write!(f, "signature verification failed"),
            Self::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {expected}, got {actual}")
            }
            Self::InvalidKeyEncoding(detail) => write!(f, "invalid key encoding: {detail}"),
            Self::UnsupportedFileVersion => write!(f, "unsupported file envelope version"),
            Self::UnexpectedStreamTag => write!(f, "unexpected file stream chunk tag"),
            Self::FileModeUnsupportedForSuite => {
                write!(f, "file streaming is not supported under this crypto suite")
            }
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for CryptoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for CryptoError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

impl From<std::io::Error> for CryptoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
