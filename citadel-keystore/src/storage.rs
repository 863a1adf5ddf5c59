//! The HTTP collaborator's interface, as seen by the crypto/access-control core.
//!
//! Nothing in this crate talks HTTP directly — `StorageApi` is the seam the
//! real `reqwest`-backed client (outside this crate) and the in-memory test
//! double both implement.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ConflictError, LookupError};
use crate::types::{Note, Record};

/// The ciphertext half of an EAK plus the authorizer's public key needed to unwrap it.
#[derive(Clone, Debug)]
pub struct EncryptedAccessKey {
    /// `Base64URL(ciphertext) "." Base64URL(nonce)`.
    pub eak: String,
    pub authorizer_public_key: String,
    pub authorizer_mode: citadel_crypto::Mode,
}

/// A reader's public key, tagged with the suite it was generated under.
#[derive(Clone, Debug)]
pub struct ClientPublicKey {
    pub public_key: String,
    pub mode: citadel_crypto::Mode,
}

#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn get_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<Option<EncryptedAccessKey>, ApiError>;

    async fn put_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        eak: EncryptedAccessKey,
    ) -> Result<(), ApiError>;

    async fn delete_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), ApiError>;

    async fn client_public_key(&self, client_id: Uuid) -> Result<ClientPublicKey, LookupError>;

    async fn put_policy(
        &self,
        user_id: Uuid,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        policy: Value,
    ) -> Result<(), ApiError>;

    async fn create_record(&self, record: Record) -> Result<Record, ApiError>;
    async fn read_record(&self, record_id: Uuid) -> Result<Record, ApiError>;
    async fn update_record(&self, record: Record) -> Result<Record, ConflictError>;
    async fn delete_record(&self, record_id: Uuid, version: &str) -> Result<(), ConflictError>;

    async fn create_note(&self, note: Note) -> Result<Note, ApiError>;
    async fn read_note_by_id(&self, note_id: Uuid) -> Result<Note, LookupError>;
    async fn read_note_by_name(&self, id_string: &str) -> Result<Note, LookupError>;
}
