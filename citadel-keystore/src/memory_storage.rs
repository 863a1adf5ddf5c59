//! An in-memory `StorageApi` double. Stands in for the real HTTP collaborator
//! in tests so sharing/revoke/conflict scenarios run without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ConflictError, LookupError};
use crate::storage::{ClientPublicKey, EncryptedAccessKey, StorageApi};
use crate::types::{Note, Record};

#[derive(Clone, Hash, Eq, PartialEq)]
struct AkKey {
    writer_id: Uuid,
    user_id: Uuid,
    reader_id: Uuid,
    record_type: String,
}

#[derive(Default)]
struct State {
    access_keys: HashMap<AkKey, EncryptedAccessKey>,
    policies: HashMap<(Uuid, Uuid, Uuid, String), Value>,
    client_keys: HashMap<Uuid, ClientPublicKey>,
    records: HashMap<Uuid, Record>,
    notes_by_id: HashMap<Uuid, Note>,
    notes_by_name: HashMap<String, Uuid>,
}

pub struct InMemoryStorageApi {
    state: Mutex<State>,
}

impl Default for InMemoryStorageApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorageApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn register_client_key(&self, client_id: Uuid, key: ClientPublicKey) {
        self.state.lock().unwrap().client_keys.insert(client_id, key);
    }
}

#[async_trait]
impl StorageApi for InMemoryStorageApi {
    async fn get_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<Option<EncryptedAccessKey>, ApiError> {
        let key = AkKey {
            writer_id,
            user_id,
            reader_id,
            record_type: record_type.to_string(),
        };
        Ok(self.state.lock().unwrap().access_keys.get(&key).cloned())
    }

    async fn put_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        eak: EncryptedAccessKey,
    ) -> Result<(), ApiError> {
        let key = AkKey {
            writer_id,
            user_id,
            reader_id,
            record_type: record_type.to_string(),
        };
        self.state.lock().unwrap().access_keys.insert(key, eak);
        Ok(())
    }

    async fn delete_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), ApiError> {
        let key = AkKey {
            writer_id,
            user_id,
            reader_id,
            record_type: record_type.to_string(),
        };
        self.state.lock().unwrap().access_keys.remove(&key);
        Ok(())
    }

    async fn client_public_key(&self, client_id: Uuid) -> Result<ClientPublicKey, LookupError> {
        self.state
            .lock()
            .unwrap()
            .client_keys
            .get(&client_id)
            .cloned()
            .ok_or_else(|| LookupError {
                what: format!("client {client_id}"),
            })
    }

    async fn put_policy(
        &self,
        user_id: Uuid,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        policy: Value,
    ) -> Result<(), ApiError> {
        self.state.lock().unwrap().policies.insert(
            (user_id, writer_id, reader_id, record_type.to_string()),
            policy,
        );
        Ok(())
    }

    async fn create_record(&self, mut record: Record) -> Result<Record, ApiError> {
        let id = Uuid::new_v4();
        record.meta.record_id = Some(id);
        record.meta.version = Some(Uuid::new_v4().to_string());
        self.state.lock().unwrap().records.insert(id, record.clone());
        Ok(record)
    }

    async fn read_record(&self, record_id: Uuid) -> Result<Record, ApiError> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(&record_id)
            .cloned()
            .ok_or(ApiError::Http(404))
    }

    async fn update_record(&self, record: Record) -> Result<Record, ConflictError> {
        let id = record.meta.record_id.ok_or_else(|| ConflictError {
            detail: "record has no id".to_string(),
        })?;
        let mut state = self.state.lock().unwrap();
        let current = state.records.get(&id).ok_or_else(|| ConflictError {
            detail: "record not found".to_string(),
        })?;
        if current.meta.version != record.meta.version {
            return Err(ConflictError {
                detail: "version mismatch".to_string(),
            });
        }
        let mut updated = record;
        updated.meta.version = Some(Uuid::new_v4().to_string());
        state.records.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_record(&self, record_id: Uuid, version: &str) -> Result<(), ConflictError> {
        let mut state = self.state.lock().unwrap();
        let current = state.records.get(&record_id).ok_or_else(|| ConflictError {
            detail: "record not found".to_string(),
        })?;
        if current.meta.version.as_deref() != Some(version) {
            return Err(ConflictError {
                detail: "version mismatch".to_string(),
            });
        }
        state.records.remove(&record_id);
        Ok(())
    }

    async fn create_note(&self, mut note: Note) -> Result<Note, ApiError> {
        let id = Uuid::new_v4();
        note.note_id = Some(id);
        let mut state = self.state.lock().unwrap();
        if let Some(id_string) = note.note_options.id_string.clone() {
            if state.notes_by_name.contains_key(&id_string) {
                return Err(ApiError::Http(409));
            }
            state.notes_by_name.insert(id_string, id);
        }
        state.notes_by_id.insert(id, note.clone());
        Ok(note)
    }

    async fn read_note_by_id(&self, note_id: Uuid) -> Result<Note, LookupError> {
        self.state
            .lock()
            .unwrap()
            .notes_by_id
            .get(&note_id)
            .cloned()
            .ok_or_else(|| LookupError {
                what: format!("note {note_id}"),
            })
    }

    async fn read_note_by_name(&self, id_string: &str) -> Result<Note, LookupError> {
        let state = self.state.lock().unwrap();
        let id = state.notes_by_name.get(id_string).ok_or_else(|| LookupError {
            what: format!("note named {id_string}"),
        })?;
        state
            .notes_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| LookupError {
                what: format!("note named {id_string}"),
            })
    }
}
