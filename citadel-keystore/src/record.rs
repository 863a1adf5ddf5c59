//! Turns a plaintext record into an encrypted one and back (spec §4.5).

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use citadel_crypto::{CryptoSuite, FieldEnvelope, SymmetricKey};

use crate::access_key::AccessKeyManager;
use crate::error::KeystoreError;
use crate::types::Record;

pub struct RecordCrypto {
    suite: Arc<dyn CryptoSuite>,
    access_keys: Arc<AccessKeyManager>,
}

impl RecordCrypto {
    pub fn new(suite: Arc<dyn CryptoSuite>, access_keys: Arc<AccessKeyManager>) -> Self {
        Self { suite, access_keys }
    }

    /// Acquires/creates the writer's own AK for `record.meta.record_type` and
    /// seals every field under it. `meta` is copied unchanged.
    pub async fn encrypt(&self, record: Record) -> Result<Record, KeystoreError> {
        let ak = self
            .access_keys
            .get_or_create_self_access_key(&record.meta.record_type)
            .await?;

        let mut data = BTreeMap::new();
        for (field, value) in record.data {
            data.insert(field, self.seal_field(&ak, &value)?);
        }

        Ok(Record {
            meta: record.meta,
            data,
        })
    }

    /// Acquires the AK for `(writerId, userId, self, recordType)` and opens
    /// every field. Any malformed field or failed MAC abandons the whole
    /// record.
    pub async fn decrypt(&self, record: Record) -> Result<Record, KeystoreError> {
        let ak = self
            .access_keys
            .get_access_key(
                record.meta.writer_id,
                record.meta.user_id,
                self.access_keys.self_id(),
                &record.meta.record_type,
            )
            .await?
            .ok_or_else(|| {
                KeystoreError::Lookup(crate::error::LookupError {
                    what: format!(
                        "access key for writer {} type {}",
                        record.meta.writer_id, record.meta.record_type
                    ),
                })
            })?;

        let mut data = BTreeMap::new();
        for (field, wire) in record.data {
            data.insert(field, self.open_field(&ak, &wire)?);
        }

        Ok(Record {
            meta: record.meta,
            data,
        })
    }

    fn seal_field(&self, ak: &SymmetricKey, value: &str) -> Result<String, KeystoreError> {
        let dk = self.suite.random_key();
        let ef_nonce = self.suite.random_nonce();
        let edk_nonce = self.suite.random_nonce();

        let ef = self.suite.encrypt_secret(&dk, value.as_bytes(), &ef_nonce)?;
        let edk = self.suite.encrypt_secret(ak, &*dk.0, &edk_nonce)?;

        Ok(FieldEnvelope {
            edk,
            edk_nonce,
            ef,
            ef_nonce,
        }
        .encode())
    }

    fn open_field(&self, ak: &SymmetricKey, wire: &str) -> Result<String, KeystoreError> {
        let envelope = FieldEnvelope::decode(wire)?;
        let dk_bytes = self
            .suite
            .decrypt_secret(ak, &envelope.edk, &envelope.edk_nonce)?;
        if dk_bytes.len() != 32 {
            return Err(citadel_crypto::CryptoError::InvalidKeyLength {
                expected: 32,
                actual: dk_bytes.len(),
            }
            .into());
        }
        let mut dk_arr = [0u8; 32];
        dk_arr.copy_from_slice(&dk_bytes);
        let dk = SymmetricKey::from(dk_arr);

        let plaintext = self.suite.decrypt_secret(&dk, &envelope.ef, &envelope.ef_nonce)?;
        String::from_utf8(plaintext)
            .map_err(|_| citadel_crypto::CryptoError::InvalidEnvelope.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::InMemoryStorageApi;
    use citadel_crypto::SodiumSuite;

    #[tokio::test]
    async fn encrypted_record_round_trips() {
        let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
        let (public, private) = suite.generate_keypair();
        let self_id = Uuid::new_v4();
        let storage = Arc::new(InMemoryStorageApi::new());

        let manager = Arc::new(AccessKeyManager::new(
            suite.clone(),
            storage.clone(),
            self_id,
            public,
            private,
        ));
        let crypto = RecordCrypto::new(suite, manager);

        let mut data = BTreeMap::new();
        data.insert("temp".to_string(), "72.1".to_string());
        let record = Record {
            meta: crate::types::RecordMeta {
                record_id: None,
                writer_id: self_id,
                user_id: self_id,
                record_type: "measurement".to_string(),
                plain: BTreeMap::new(),
                created: None,
                last_modified: None,
                version: None,
                file_meta: None,
            },
            data,
        };

        let encrypted = crypto.encrypt(record.clone()).await.unwrap();
        assert_ne!(encrypted.data["temp"], "72.1");

        let decrypted = crypto.decrypt(encrypted).await.unwrap();
        assert_eq!(decrypted.data["temp"], "72.1");
    }
}
