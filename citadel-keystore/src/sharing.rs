//! Translates `share`/`revoke`/authorizer operations into AK placements and
//! server policy calls (spec §4.7).

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::access_key::AccessKeyManager;
use crate::error::{KeystoreError, LookupError};

pub struct SharingEngine {
    access_keys: Arc<AccessKeyManager>,
}

impl SharingEngine {
    pub fn new(access_keys: Arc<AccessKeyManager>) -> Self {
        Self { access_keys }
    }

    /// Grants `reader_id` read access to `record_type`. No-op when
    /// `reader_id == self`.
    pub async fn share(&self, record_type: &str, reader_id: Uuid) -> Result<(), KeystoreError> {
        if reader_id == self.access_keys.self_id() {
            return Ok(());
        }
        let ak = self.access_keys.get_or_create_self_access_key(record_type).await?;
        self.access_keys
            .put_access_key(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                reader_id,
                record_type,
                &ak,
            )
            .await?;
        self.access_keys
            .put_policy(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                reader_id,
                record_type,
                json!({ "allow": [{ "read": {} }] }),
            )
            .await
    }

    pub async fn revoke(&self, record_type: &str, reader_id: Uuid) -> Result<(), KeystoreError> {
        self.access_keys
            .put_policy(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                reader_id,
                record_type,
                json!({ "deny": [{ "read": {} }] }),
            )
            .await?;
        self.access_keys
            .delete_access_key(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                reader_id,
                record_type,
            )
            .await
    }

    /// Idempotent: a second call for the same `(record_type, authorizer_id)`
    /// pair is a no-op, detected by an already-placed EAK.
    pub async fn add_authorizer(
        &self,
        record_type: &str,
        authorizer_id: Uuid,
    ) -> Result<(), KeystoreError> {
        // An EAK self places for an authorizer is sealed under DH(self, authorizer)
        // but the stored record always tags `authorizer_public_key` as self's own
        // key — self can never decrypt it back out, so idempotency is a presence
        // check, not a round trip through `get_access_key`.
        if self
            .access_keys
            .access_key_exists(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                authorizer_id,
                record_type,
            )
            .await?
        {
            return Ok(());
        }

        let ak = self.access_keys.get_or_create_self_access_key(record_type).await?;
        self.access_keys
            .put_access_key(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                authorizer_id,
                record_type,
                &ak,
            )
            .await?;
        self.access_keys
            .put_policy(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                authorizer_id,
                record_type,
                json!({ "allow": [{ "authorizer": {} }] }),
            )
            .await
    }

    pub async fn remove_authorizer(
        &self,
        record_type: &str,
        authorizer_id: Uuid,
    ) -> Result<(), KeystoreError> {
        self.access_keys
            .put_policy(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                authorizer_id,
                record_type,
                json!({ "deny": [{ "authorizer": {} }] }),
            )
            .await?;
        self.access_keys
            .delete_access_key(
                self.access_keys.self_id(),
                self.access_keys.self_id(),
                authorizer_id,
                record_type,
            )
            .await
    }

    /// Acting as an authorizer for `writer_id`: re-shares `writer_id`'s AK
    /// with `reader_id`. Fails with a lookup error if the authorization has
    /// since been revoked.
    pub async fn share_on_behalf_of(
        &self,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), KeystoreError> {
        let ak = self
            .access_keys
            .get_access_key(writer_id, writer_id, self.access_keys.self_id(), record_type)
            .await?
            .ok_or_else(|| {
                KeystoreError::Lookup(LookupError {
                    what: format!("access key for writer {writer_id} type {record_type}"),
                })
            })?;

        self.access_keys
            .put_access_key(writer_id, writer_id, reader_id, record_type, &ak)
            .await?;
        self.access_keys
            .put_policy(
                writer_id,
                writer_id,
                reader_id,
                record_type,
                json!({ "allow": [{ "read": {} }] }),
            )
            .await
    }

    pub async fn revoke_on_behalf_of(
        &self,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), KeystoreError> {
        self.access_keys
            .put_policy(
                writer_id,
                writer_id,
                reader_id,
                record_type,
                json!({ "deny": [{ "read": {} }] }),
            )
            .await?;
        self.access_keys
            .delete_access_key(writer_id, writer_id, reader_id, record_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::InMemoryStorageApi;
    use citadel_crypto::CryptoSuite;
    use citadel_crypto::SodiumSuite;

    fn manager(
        suite: Arc<dyn CryptoSuite>,
        storage: Arc<InMemoryStorageApi>,
        self_id: Uuid,
    ) -> Arc<AccessKeyManager> {
        let (public, private) = suite.generate_keypair();
        Arc::new(AccessKeyManager::new(suite, storage, self_id, public, private))
    }

    #[tokio::test]
    async fn share_then_revoke_round_trips() {
        let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
        let storage = Arc::new(InMemoryStorageApi::new());
        let owner_id = Uuid::new_v4();
        let reader_id = Uuid::new_v4();

        let owner = manager(suite.clone(), storage.clone(), owner_id);
        let (reader_pub, _reader_priv) = suite.generate_keypair();
        storage.register_client_key(
            reader_id,
            crate::storage::ClientPublicKey {
                public_key: suite.encode_public_key(&reader_pub),
                mode: suite.mode(),
            },
        );

        let sharing = SharingEngine::new(owner.clone());
        sharing.share("contact", reader_id).await.unwrap();

        let granted = owner
            .get_access_key(owner_id, owner_id, reader_id, "contact")
            .await
            .unwrap();
        assert!(granted.is_some());

        sharing.revoke("contact", reader_id).await.unwrap();
        let revoked = owner
            .get_access_key(owner_id, owner_id, reader_id, "contact")
            .await
            .unwrap();
        assert!(revoked.is_none());
    }

    #[tokio::test]
    async fn add_authorizer_is_idempotent() {
        let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
        let storage = Arc::new(InMemoryStorageApi::new());
        let owner_id = Uuid::new_v4();
        let authorizer_id = Uuid::new_v4();

        let owner = manager(suite.clone(), storage.clone(), owner_id);
        let (authorizer_pub, _) = suite.generate_keypair();
        storage.register_client_key(
            authorizer_id,
            crate::storage::ClientPublicKey {
                public_key: suite.encode_public_key(&authorizer_pub),
                mode: suite.mode(),
            },
        );

        let sharing = SharingEngine::new(owner);
        sharing.add_authorizer("contact", authorizer_id).await.unwrap();
        sharing.add_authorizer("contact", authorizer_id).await.unwrap();
    }
}
