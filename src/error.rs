//! The facade-level error enum callers of [`crate::Client`] actually see.

use core::fmt;

use citadel_auth::AuthError;
use citadel_keystore::KeystoreError;

#[derive(Debug)]
pub enum CoreError {
    Keystore(KeystoreError),
    Auth(AuthError),
    /// The stored configuration itself was malformed (bad key encoding,
    /// missing signing keys for an operation that needs them).
    InvalidConfig(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keystore(e) => write!(f, "{e}"),
            Self::Auth(e) => write!(f, "{e}"),
            Self::InvalidConfig(detail) => write!(f, "invalid client configuration: {detail}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Keystore(e) => Some(e),
            Self::Auth(e) => Some(e),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<KeystoreError> for CoreError {
    fn from(e: KeystoreError) -> Self {
        Self::Keystore(e)
    }
}

impl From<AuthError> for CoreError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}
