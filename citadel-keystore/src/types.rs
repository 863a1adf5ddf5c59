//! Record, file descriptor, note, and sharing-policy data types (spec §3).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `{ recordId, writerId, userId, recordType, plain, created, lastModified, version, fileMeta }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub record_id: Option<Uuid>,
    pub writer_id: Uuid,
    pub user_id: Uuid,
    pub record_type: String,
    #[serde(default)]
    pub plain: BTreeMap<String, String>,
    #[serde(with = "crate::timestamp", default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(with = "crate::timestamp", default)]
    pub last_modified: Option<DateTime<Utc>>,
    pub version: Option<String>,
    pub file_meta: Option<FileMeta>,
}

/// `data` holds encrypted-field wire strings on the wire, plaintext strings
/// in memory pre-encrypt / post-decrypt. The type is the same either way;
/// which state a given `Record` is in is tracked by the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub meta: RecordMeta,
    pub data: BTreeMap<String, String>,
}

/// Large-file descriptor. `checksum` is the Base64 MD5 of the entire on-disk
/// encrypted file, as produced by `FileStreamCodec::encrypt`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub checksum: String,
    pub size: u64,
    #[serde(default = "raw_compression")]
    pub compression: String,
    pub record_type: String,
    pub writer_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub plain: BTreeMap<String, String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub record_id: Option<Uuid>,
    #[serde(with = "crate::timestamp", default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(with = "crate::timestamp", default)]
    pub last_modified: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

fn raw_compression() -> String {
    "raw".to_string()
}

/// `{ mode, recipientSigningKey, writerSigningKey, writerEncryptionKey, encryptedAccessKey }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteKeys {
    pub mode: String,
    pub recipient_signing_key: String,
    pub writer_signing_key: String,
    pub writer_encryption_key: String,
    pub encrypted_access_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub id_string: Option<String>,
    #[serde(default = "unlimited_views")]
    pub max_views: i64,
    #[serde(with = "crate::timestamp", default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    #[serde(default)]
    pub plain: BTreeMap<String, String>,
    pub file_meta: Option<FileMeta>,
    /// Opaque server-side access-control policy; not interpreted by the core.
    pub eacp: Option<serde_json::Value>,
}

fn unlimited_views() -> i64 {
    -1
}

impl Default for NoteOptions {
    fn default() -> Self {
        Self {
            id_string: None,
            max_views: unlimited_views(),
            expiration: None,
            note_type: None,
            plain: BTreeMap::new(),
            file_meta: None,
            eacp: None,
        }
    }
}

/// A self-contained, anonymously-readable encrypted payload signed by its writer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub data: BTreeMap<String, String>,
    pub note_keys: NoteKeys,
    pub note_options: NoteOptions,
    pub signature: String,
    pub note_id: Option<Uuid>,
    #[serde(with = "crate::timestamp", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Expressed through AK distribution, not through server-side access lists alone.
#[derive(Clone, Debug)]
pub enum SharingPolicy {
    Incoming {
        writer_id: Uuid,
        writer_name: String,
        record_type: String,
    },
    Outgoing {
        reader_id: Uuid,
        reader_name: String,
        record_type: String,
    },
    Authorizer {
        authorizer_id: Uuid,
        writer_id: Uuid,
        user_id: Uuid,
        record_type: String,
        authorized_by: Uuid,
    },
}
