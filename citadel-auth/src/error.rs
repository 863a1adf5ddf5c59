//! Error taxonomy for request signing, token refresh, and identity login.

use core::fmt;

use citadel_crypto::CryptoError;
use citadel_keystore::{ApiError, UnsupportedApiResponse};

/// The HTTP collaborator itself failed (connection, timeout, malformed body).
#[derive(Debug)]
pub struct TransportError {
    pub detail: String,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.detail)
    }
}

impl std::error::Error for TransportError {}

/// Umbrella error for everything this crate can raise.
#[derive(Debug)]
pub enum AuthError {
    Crypto(CryptoError),
    Api(ApiError),
    Transport(TransportError),
    UnsupportedApiResponse(UnsupportedApiResponse),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crypto(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Transport(e) => write!(f, "{e}"),
            Self::UnsupportedApiResponse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Crypto(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::UnsupportedApiResponse(e) => Some(e),
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}

impl From<ApiError> for AuthError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<TransportError> for AuthError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<UnsupportedApiResponse> for AuthError {
    fn from(e: UnsupportedApiResponse) -> Self {
        Self::UnsupportedApiResponse(e)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(TransportError { detail: e.to_string() })
    }
}
