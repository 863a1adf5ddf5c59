//! Access-key lifecycle, record/note encryption, and sharing policy for
//! end-to-end encrypted storage.
//!
//! This crate is deliberately transport-agnostic: [`StorageApi`] is the seam
//! a concrete HTTP client implements. Everything here is written against
//! [`citadel_crypto::CryptoSuite`] and never branches on which suite is active.

mod access_key;
mod audit;
mod error;
mod memory_storage;
mod note;
mod record;
mod sharing;
mod timestamp;
mod types;
mod storage;

pub use access_key::AccessKeyManager;
pub use audit::{AuditEvent, AuditSinkSync, InMemoryAuditSink, TracingAuditSink};
pub use error::{
    ApiError, ConflictError, KeystoreError, LookupError, NoteValidationError, QueryError,
    UnsupportedApiResponse,
};
pub use memory_storage::InMemoryStorageApi;
pub use note::{NoteCrypto, SIGNATURE_VERSION};
pub use record::RecordCrypto;
pub use sharing::SharingEngine;
pub use storage::{ClientPublicKey, EncryptedAccessKey, StorageApi};
pub use types::{
    FileMeta, Note, NoteKeys, NoteOptions, Record, RecordMeta, SharingPolicy,
};
