//! Error taxonomy for access-key management, record/note crypto, and sharing.

use core::fmt;

use citadel_crypto::CryptoError;

/// An unrecoverable server response.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Http(u16),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Http(status) => write!(f, "http error: {status}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// A `not-found` surfaced explicitly where semantically meaningful.
#[derive(Debug)]
pub struct LookupError {
    pub what: String,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not found: {}", self.what)
    }
}

impl std::error::Error for LookupError {}

/// The server rejected an update/delete because `version` did not match, or a
/// writer-chosen note name was already taken.
#[derive(Debug)]
pub struct ConflictError {
    pub detail: String,
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conflict: {}", self.detail)
    }
}

impl std::error::Error for ConflictError {}

/// The server rejected the query shape.
#[derive(Debug)]
pub struct QueryError {
    pub detail: String,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid query: {}", self.detail)
    }
}

impl std::error::Error for QueryError {}

/// A note's signature was missing, or failed to verify.
#[derive(Debug)]
pub enum NoteValidationError {
    MissingSignature,
    SignatureInvalid { field: String },
}

impl fmt::Display for NoteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSignature => write!(f, "note signature missing"),
            Self::SignatureInvalid { field } => {
                write!(f, "note signature invalid for field '{field}'")
            }
        }
    }
}

impl std::error::Error for NoteValidationError {}

/// The login flow received an unexpected `type` at a step.
#[derive(Debug)]
pub struct UnsupportedApiResponse {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for UnsupportedApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported api response: expected '{}', got '{}'",
            self.expected, self.got
        )
    }
}

impl std::error::Error for UnsupportedApiResponse {}

/// Umbrella error for everything this crate can raise.
#[derive(Debug)]
pub enum KeystoreError {
    Crypto(CryptoError),
    Api(ApiError),
    Lookup(LookupError),
    Conflict(ConflictError),
    Query(QueryError),
    NoteValidation(NoteValidationError),
    UnsupportedApiResponse(UnsupportedApiResponse),
}

impl fmt::Display for KeystoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crypto(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Lookup(e) => write!(f, "{e}"),
            Self::Conflict(e) => write!(f, "{e}"),
            Self::Query(e) => write!(f, "{e}"),
            Self::NoteValidation(e) => write!(f, "{e}"),
            Self::UnsupportedApiResponse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for KeystoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Crypto(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Lookup(e) => Some(e),
            Self::Conflict(e) => Some(e),
            Self::Query(e) => Some(e),
            Self::NoteValidation(e) => Some(e),
            Self::UnsupportedApiResponse(e) => Some(e),
        }
    }
}

impl From<CryptoError> for KeystoreError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}

impl From<ApiError> for KeystoreError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<LookupError> for KeystoreError {
    fn from(e: LookupError) -> Self {
        Self::Lookup(e)
    }
}

impl From<ConflictError> for KeystoreError {
    fn from(e: ConflictError) -> Self {
        Self::Conflict(e)
    }
}

impl From<QueryError> for KeystoreError {
    fn from(e: QueryError) -> Self {
        Self::Query(e)
    }
}

impl From<NoteValidationError> for KeystoreError {
    fn from(e: NoteValidationError) -> Self {
        Self::NoteValidation(e)
    }
}

impl From<UnsupportedApiResponse> for KeystoreError {
    fn from(e: UnsupportedApiResponse) -> Self {
        Self::UnsupportedApiResponse(e)
    }
}
