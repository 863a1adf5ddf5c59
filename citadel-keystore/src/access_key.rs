//! Per-`(writer, user, type)` Access Key acquisition, creation, and caching
//! (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use citadel_crypto::{AccessKeyEnvelope, CryptoSuite, PrivateKey, PublicKey, SymmetricKey};

use crate::audit::{AuditEvent, AuditSinkSync, TracingAuditSink};
use crate::error::KeystoreError;
use crate::storage::{ClientPublicKey, EncryptedAccessKey, StorageApi};

#[derive(Clone, Hash, Eq, PartialEq)]
struct AkKey {
    writer_id: Uuid,
    user_id: Uuid,
    record_type: String,
}

/// Caches AKs this client is already authorized to read. Only ever caches
/// entries where `self` is the reader — keys held only to re-share on behalf
/// of someone else are never cached.
pub struct AccessKeyManager {
    suite: Arc<dyn CryptoSuite>,
    storage: Arc<dyn StorageApi>,
    self_id: Uuid,
    self_public_key: PublicKey,
    self_private_key: PrivateKey,
    cache: RwLock<HashMap<AkKey, SymmetricKey>>,
    audit: Arc<dyn AuditSinkSync>,
}

impl AccessKeyManager {
    pub fn new(
        suite: Arc<dyn CryptoSuite>,
        storage: Arc<dyn StorageApi>,
        self_id: Uuid,
        self_public_key: PublicKey,
        self_private_key: PrivateKey,
    ) -> Self {
        Self {
            suite,
            storage,
            self_id,
            self_public_key,
            self_private_key,
            cache: RwLock::new(HashMap::new()),
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSinkSync>) -> Self {
        self.audit = audit;
        self
    }

    pub fn self_id(&self) -> Uuid {
        self.self_id
    }

    /// Returns `None` on a clean not-found (caller may then create one).
    pub async fn get_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<Option<SymmetricKey>, KeystoreError> {
        let key = AkKey {
            writer_id,
            user_id,
            record_type: record_type.to_string(),
        };

        if reader_id == self.self_id {
            if let Some(ak) = self.cache.read().await.get(&key) {
                return Ok(Some(ak.clone()));
            }
        }

        let Some(eak) = self
            .storage
            .get_access_key(writer_id, user_id, reader_id, record_type)
            .await?
        else {
            return Ok(None);
        };

        let envelope = AccessKeyEnvelope::decode(&eak.eak)?;
        let authorizer_pub = self.suite.decode_public_key(&eak.authorizer_public_key)?;
        let ak = self.suite.decrypt_eak(
            &self.self_private_key,
            &authorizer_pub,
            &envelope.ciphertext,
            &envelope.nonce,
        )?;

        if reader_id == self.self_id {
            self.cache.write().await.insert(key, ak.clone());
        }

        self.audit.record(AuditEvent {
            operation: "get_access_key",
            writer_id: writer_id.to_string(),
            user_id: user_id.to_string(),
            reader_id: reader_id.to_string(),
            record_type: record_type.to_string(),
            outcome: "unwrapped",
        });

        Ok(Some(ak))
    }

    /// Wraps `ak` for `reader_id` and uploads it. Caches locally only when
    /// `reader_id == self`.
    pub async fn put_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        ak: &SymmetricKey,
    ) -> Result<(), KeystoreError> {
        let reader_pub = self.resolve_public_key(reader_id).await?;
        let decoded_reader_pub = self.suite.decode_public_key(&reader_pub.public_key)?;
        let nonce = self.suite.random_nonce();
        let ciphertext =
            self.suite
                .encrypt_ak(&self.self_private_key, &decoded_reader_pub, ak, &nonce)?;

        let wire = AccessKeyEnvelope { ciphertext, nonce }.encode();
        self.storage
            .put_access_key(
                writer_id,
                user_id,
                reader_id,
                record_type,
                EncryptedAccessKey {
                    eak: wire,
                    authorizer_public_key: self.suite.encode_public_key(&self.self_public_key),
                    authorizer_mode: self.suite.mode(),
                },
            )
            .await?;

        if reader_id == self.self_id {
            let key = AkKey {
                writer_id,
                user_id,
                record_type: record_type.to_string(),
            };
            self.cache.write().await.insert(key, ak.clone());
        }

        self.audit.record(AuditEvent {
            operation: "put_access_key",
            writer_id: writer_id.to_string(),
            user_id: user_id.to_string(),
            reader_id: reader_id.to_string(),
            record_type: record_type.to_string(),
            outcome: "wrapped",
        });

        Ok(())
    }

    /// Invalidates this process's cache entry before returning, per the
    /// eventually-consistent cache contract.
    pub async fn delete_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), KeystoreError> {
        self.storage
            .delete_access_key(writer_id, user_id, reader_id, record_type)
            .await?;

        if reader_id == self.self_id {
            let key = AkKey {
                writer_id,
                user_id,
                record_type: record_type.to_string(),
            };
            self.cache.write().await.remove(&key);
        }

        self.audit.record(AuditEvent {
            operation: "delete_access_key",
            writer_id: writer_id.to_string(),
            user_id: user_id.to_string(),
            reader_id: reader_id.to_string(),
            record_type: record_type.to_string(),
            outcome: "revoked",
        });

        Ok(())
    }

    /// Acquire the writer's own AK for `(self, self, type)`, generating and
    /// publishing a fresh one on a cache/server miss.
    pub async fn get_or_create_self_access_key(
        &self,
        record_type: &str,
    ) -> Result<SymmetricKey, KeystoreError> {
        if let Some(ak) = self
            .get_access_key(self.self_id, self.self_id, self.self_id, record_type)
            .await?
        {
            return Ok(ak);
        }
        let ak = self.suite.random_key();
        self.put_access_key(self.self_id, self.self_id, self.self_id, record_type, &ak)
            .await?;
        Ok(ak)
    }

    /// Checks whether an EAK record already exists for `(writer, user, reader,
    /// type)` without attempting to unwrap it. Unlike `get_access_key`, this
    /// never fails when `self` lacks the DH pair to decrypt the stored entry
    /// — callers that only need an idempotency check (e.g. "have I already
    /// placed this EAK for someone else?") must use this instead, since the
    /// authorizer tag on a self-placed EAK always records `self`'s own public
    /// key rather than the reader's.
    pub async fn access_key_exists(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<bool, KeystoreError> {
        Ok(self
            .storage
            .get_access_key(writer_id, user_id, reader_id, record_type)
            .await?
            .is_some())
    }

    pub async fn put_policy(
        &self,
        user_id: Uuid,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        policy: serde_json::Value,
    ) -> Result<(), KeystoreError> {
        Ok(self
            .storage
            .put_policy(user_id, writer_id, reader_id, record_type, policy)
            .await?)
    }

    async fn resolve_public_key(&self, reader_id: Uuid) -> Result<ClientPublicKey, KeystoreError> {
        if reader_id == self.self_id {
            return Ok(ClientPublicKey {
                public_key: self.suite.encode_public_key(&self.self_public_key),
                mode: self.suite.mode(),
            });
        }
        Ok(self.storage.client_public_key(reader_id).await?)
    }
}
