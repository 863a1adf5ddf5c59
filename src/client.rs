//! The top-level facade: wires the HTTP collaborator, the three
//! authenticators, and the crypto/access-control core together behind a
//! small surface a caller actually calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use citadel_auth::TokenAuthenticator;
use citadel_crypto::{CryptoSuite, SigningPrivateKey, SigningPublicKey};
use citadel_keystore::{
    AccessKeyManager, Note, NoteCrypto, NoteOptions, Record, RecordCrypto, SharingEngine,
    StorageApi,
};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::storage_http::HttpStorageApi;

pub struct Client {
    suite: Arc<dyn CryptoSuite>,
    storage: Arc<HttpStorageApi>,
    access_keys: Arc<AccessKeyManager>,
    records: RecordCrypto,
    sharing: SharingEngine,
    client_id: Uuid,
    signing_keys: Option<(SigningPublicKey, SigningPrivateKey)>,
    encryption_private_key: citadel_crypto::PrivateKey,
    encryption_public_key: citadel_crypto::PublicKey,
}

impl Client {
    /// Builds a client from a persisted configuration. Crypto suite selection
    /// reads `CRYPTO_SUITE` from the environment, per §6's Environment contract.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let suite: Arc<dyn CryptoSuite> = Arc::from(citadel_crypto::suite_from_env());

        let public_key = suite
            .decode_public_key(&config.public_key)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        let private_key = suite
            .decode_private_key(&config.private_key)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;

        let signing_keys = match (&config.public_signing_key, &config.private_signing_key) {
            (Some(pub_b64), Some(priv_b64)) => Some(decode_signing_keypair(&suite, pub_b64, priv_b64)?),
            _ => None,
        };

        let http = reqwest::Client::new();
        let token_auth = Arc::new(TokenAuthenticator::new(
            http.clone(),
            format!("{}/v1/auth/token", config.api_url),
            config.api_key_id.clone(),
            config.api_secret.clone(),
        ));
        let storage = Arc::new(HttpStorageApi::new(http, config.api_url.clone(), token_auth));

        let access_keys = Arc::new(AccessKeyManager::new(
            suite.clone(),
            storage.clone(),
            config.client_id,
            public_key.clone(),
            private_key.clone(),
        ));
        let records = RecordCrypto::new(suite.clone(), access_keys.clone());
        let sharing = SharingEngine::new(access_keys.clone());

        Ok(Self {
            suite,
            storage,
            access_keys,
            records,
            sharing,
            client_id: config.client_id,
            signing_keys,
            encryption_private_key: private_key,
            encryption_public_key: public_key,
        })
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub async fn create_record(&self, record: Record) -> Result<Record, CoreError> {
        let encrypted = self.records.encrypt(record).await?;
        Ok(self
            .storage
            .create_record(encrypted)
            .await
            .map_err(citadel_keystore::KeystoreError::Api)?)
    }

    pub async fn read_record(&self, record_id: Uuid) -> Result<Record, CoreError> {
        let encrypted = self
            .storage
            .read_record(record_id)
            .await
            .map_err(citadel_keystore::KeystoreError::Api)?;
        Ok(self.records.decrypt(encrypted).await?)
    }

    pub async fn share(&self, record_type: &str, reader_id: Uuid) -> Result<(), CoreError> {
        Ok(self.sharing.share(record_type, reader_id).await?)
    }

    pub async fn revoke(&self, record_type: &str, reader_id: Uuid) -> Result<(), CoreError> {
        Ok(self.sharing.revoke(record_type, reader_id).await?)
    }

    pub async fn add_authorizer(&self, record_type: &str, authorizer_id: Uuid) -> Result<(), CoreError> {
        Ok(self.sharing.add_authorizer(record_type, authorizer_id).await?)
    }

    pub async fn remove_authorizer(&self, record_type: &str, authorizer_id: Uuid) -> Result<(), CoreError> {
        Ok(self.sharing.remove_authorizer(record_type, authorizer_id).await?)
    }

    pub async fn share_on_behalf_of(
        &self,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), CoreError> {
        Ok(self.sharing.share_on_behalf_of(writer_id, reader_id, record_type).await?)
    }

    pub async fn revoke_on_behalf_of(
        &self,
        writer_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), CoreError> {
        Ok(self.sharing.revoke_on_behalf_of(writer_id, reader_id, record_type).await?)
    }

    /// Builds and uploads a note. Requires a configured signing keypair.
    pub async fn create_note(
        &self,
        data: BTreeMap<String, String>,
        reader_public_key: &citadel_crypto::PublicKey,
        options: NoteOptions,
    ) -> Result<Note, CoreError> {
        let (sign_pub, sign_priv) = self
            .signing_keys
            .as_ref()
            .ok_or_else(|| CoreError::InvalidConfig("no signing keypair configured".to_string()))?;

        let note_crypto = NoteCrypto::new(self.suite.as_ref());
        let note = note_crypto.create(
            data,
            &self.encryption_private_key,
            &self.encryption_public_key,
            sign_priv,
            sign_pub,
            reader_public_key,
            options,
        )?;
        Ok(self
            .storage
            .create_note(note)
            .await
            .map_err(citadel_keystore::KeystoreError::Api)?)
    }

    pub async fn read_note_by_id(&self, note_id: Uuid, verify_signature: bool) -> Result<BTreeMap<String, String>, CoreError> {
        let note = self
            .storage
            .read_note_by_id(note_id)
            .await
            .map_err(citadel_keystore::KeystoreError::Lookup)?;
        let note_crypto = NoteCrypto::new(self.suite.as_ref());
        Ok(note_crypto.decrypt(&note, &self.encryption_private_key, verify_signature)?)
    }
}

fn decode_signing_keypair(
    suite: &Arc<dyn CryptoSuite>,
    pub_b64: &str,
    priv_b64: &str,
) -> Result<(SigningPublicKey, SigningPrivateKey), CoreError> {
    let pub_bytes = suite
        .base64_url_decode(pub_b64)
        .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
    let priv_bytes = suite
        .base64_url_decode(priv_b64)
        .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;

    if pub_bytes.len() != 32 || priv_bytes.len() != 64 {
        return Err(CoreError::InvalidConfig(
            "signing key has the wrong length".to_string(),
        ));
    }

    let mut pub_arr = [0u8; 32];
    pub_arr.copy_from_slice(&pub_bytes);
    let mut priv_arr = [0u8; 64];
    priv_arr.copy_from_slice(&priv_bytes);

    Ok((
        SigningPublicKey(pub_arr),
        SigningPrivateKey(zeroize::Zeroizing::new(priv_arr)),
    ))
}
