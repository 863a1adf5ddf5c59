//! Multi-client sharing scenarios against a shared in-memory storage
//! collaborator, exercising the whole write/share/revoke/authorizer lifecycle
//! without a network.

use std::collections::BTreeMap;
use std::sync::Arc;

use citadel_crypto::{CryptoSuite, SodiumSuite};
use citadel_keystore::{
    AccessKeyManager, ConflictError, InMemoryStorageApi, KeystoreError, Record, RecordCrypto,
    RecordMeta, SharingEngine, StorageApi,
};
use uuid::Uuid;

struct TestClient {
    id: Uuid,
    records: RecordCrypto,
    sharing: SharingEngine,
    access_keys: Arc<AccessKeyManager>,
}

fn new_client(suite: Arc<dyn CryptoSuite>, storage: Arc<InMemoryStorageApi>) -> TestClient {
    let (public, private) = suite.generate_keypair();
    let id = Uuid::new_v4();
    storage.register_client_key(
        id,
        citadel_keystore::ClientPublicKey {
            public_key: suite.encode_public_key(&public),
            mode: suite.mode(),
        },
    );
    let access_keys = Arc::new(AccessKeyManager::new(suite.clone(), storage, id, public, private));
    TestClient {
        id,
        records: RecordCrypto::new(suite, access_keys.clone()),
        sharing: SharingEngine::new(access_keys.clone()),
        access_keys,
    }
}

fn measurement(writer_id: Uuid, value: &str) -> Record {
    let mut data = BTreeMap::new();
    data.insert("temp".to_string(), value.to_string());
    Record {
        meta: RecordMeta {
            record_id: None,
            writer_id,
            user_id: writer_id,
            record_type: "measurement".to_string(),
            plain: BTreeMap::new(),
            created: None,
            last_modified: None,
            version: None,
            file_meta: None,
        },
        data,
    }
}

#[tokio::test]
async fn write_then_read_by_the_same_client() {
    let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
    let storage = Arc::new(InMemoryStorageApi::new());
    let writer = new_client(suite, storage.clone());

    let encrypted = writer.records.encrypt(measurement(writer.id, "72.1")).await.unwrap();
    let created = storage.create_record(encrypted).await.unwrap();
    assert!(created.meta.record_id.is_some());

    let fetched = storage.read_record(created.meta.record_id.unwrap()).await.unwrap();
    let decrypted = writer.records.decrypt(fetched).await.unwrap();
    assert_eq!(decrypted.data["temp"], "72.1");
}

#[tokio::test]
async fn share_then_read_from_a_second_client() {
    let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
    let storage = Arc::new(InMemoryStorageApi::new());
    let a = new_client(suite.clone(), storage.clone());
    let b = new_client(suite, storage.clone());

    let encrypted = a.records.encrypt(measurement(a.id, "x")).await.unwrap();
    let created = storage.create_record(encrypted).await.unwrap();
    let record_id = created.meta.record_id.unwrap();

    a.sharing.share("measurement", b.id).await.unwrap();

    let fetched = storage.read_record(record_id).await.unwrap();
    let decrypted = b.records.decrypt(fetched).await.unwrap();
    assert_eq!(decrypted.data["temp"], "x");
}

#[tokio::test]
async fn revoke_blocks_a_previously_shared_reader() {
    let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
    let storage = Arc::new(InMemoryStorageApi::new());
    let a = new_client(suite.clone(), storage.clone());
    let b = new_client(suite, storage.clone());

    a.sharing.share("measurement", b.id).await.unwrap();
    a.sharing.revoke("measurement", b.id).await.unwrap();

    let encrypted = a.records.encrypt(measurement(a.id, "y")).await.unwrap();
    let created = storage.create_record(encrypted).await.unwrap();
    let fetched = storage.read_record(created.meta.record_id.unwrap()).await.unwrap();

    let err = b.records.decrypt(fetched).await.unwrap_err();
    assert!(matches!(err, KeystoreError::Lookup(_)));
}

#[tokio::test]
async fn authorizer_chain_re_shares_and_can_be_revoked() {
    let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
    let storage = Arc::new(InMemoryStorageApi::new());
    let a = new_client(suite.clone(), storage.clone());
    let m = new_client(suite.clone(), storage.clone());
    let c = new_client(suite.clone(), storage.clone());
    let d = new_client(suite, storage.clone());

    let encrypted = a.records.encrypt(measurement(a.id, "z")).await.unwrap();
    let created = storage.create_record(encrypted).await.unwrap();
    let record_id = created.meta.record_id.unwrap();

    a.sharing.add_authorizer("measurement", m.id).await.unwrap();
    m.sharing.share_on_behalf_of(a.id, c.id, "measurement").await.unwrap();

    let fetched = storage.read_record(record_id).await.unwrap();
    let decrypted = c.records.decrypt(fetched).await.unwrap();
    assert_eq!(decrypted.data["temp"], "z");

    a.sharing.remove_authorizer("measurement", m.id).await.unwrap();
    let err = m
        .sharing
        .share_on_behalf_of(a.id, d.id, "measurement")
        .await
        .unwrap_err();
    assert!(matches!(err, KeystoreError::Lookup(_)));
}

#[tokio::test]
async fn conflicting_update_surfaces_a_conflict_error() {
    let suite: Arc<dyn CryptoSuite> = Arc::new(SodiumSuite);
    let storage = Arc::new(InMemoryStorageApi::new());
    let writer = new_client(suite, storage.clone());

    let encrypted = writer.records.encrypt(measurement(writer.id, "1")).await.unwrap();
    let created = storage.create_record(encrypted).await.unwrap();

    let copy_one = created.clone();
    let copy_two = created;

    storage.update_record(copy_one).await.unwrap();
    let err: ConflictError = storage.update_record(copy_two).await.unwrap_err();
    assert!(err.to_string().contains("version"));
}
