//! End-to-end encrypted record-storage client core.
//!
//! [`Client`] wires a `reqwest`-backed [`StorageApi`](citadel_keystore::StorageApi)
//! implementation, the three authenticators in `citadel-auth`, and the
//! crypto/access-control engine in `citadel-keystore` into a small facade:
//! construct it from a [`ClientConfig`], then read, write, and share records.

mod client;
mod config;
mod error;
mod storage_http;

pub use citadel_auth::{DerivedIdentity, IdentityLogin, RealmInfo};
pub use citadel_crypto::Mode;
pub use citadel_keystore::{FileMeta, Note, NoteOptions, Record, RecordMeta, SharingPolicy};

pub use client::Client;
pub use config::ClientConfig;
pub use error::CoreError;
pub use storage_http::HttpStorageApi;
