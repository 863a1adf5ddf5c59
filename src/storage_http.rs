//! The `reqwest`-backed [`StorageApi`] implementation: the concrete HTTP
//! collaborator the crypto/access-control core is written against (spec §6).

use std::sync::Arc;

use async_trait::async_trait;
use citadel_auth::{AuthError, TokenAuthenticator};
use citadel_crypto::Mode;
use citadel_keystore::{ApiError, ClientPublicKey, ConflictError, EncryptedAccessKey, LookupError};
use citadel_keystore::{Note, Record, StorageApi};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub struct HttpStorageApi {
    http: reqwest::Client,
    api_url: String,
    auth: Arc<TokenAuthenticator>,
}

impl HttpStorageApi {
    pub fn new(http: reqwest::Client, api_url: String, auth: Arc<TokenAuthenticator>) -> Self {
        Self { http, api_url, auth }
    }

    /// Sends a bearer-authorized request, with the propagation policy's one
    /// transparent refresh-and-retry on a 401 before surfacing `Unauthorized`.
    async fn execute(
        &self,
        build: impl Fn(&str) -> RequestBuilder,
    ) -> Result<Response, ApiError> {
        let header = self.auth.bearer_header().await.map_err(auth_to_api)?;
        let response = build(&header).send().await.map_err(|_| ApiError::Http(0))?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let header = self
            .auth
            .force_refresh_bearer_header()
            .await
            .map_err(auth_to_api)?;
        build(&header).send().await.map_err(|_| ApiError::Http(0))
    }

    /// Same retry policy as `execute`, for the two update/delete calls whose
    /// failure mode is `ConflictError` rather than `ApiError`.
    async fn execute_for_conflict(
        &self,
        build: impl Fn(&str) -> RequestBuilder,
    ) -> Result<Response, ConflictError> {
        let header = self.auth.bearer_header().await.map_err(auth_to_conflict)?;
        let response = build(&header)
            .send()
            .await
            .map_err(|e| ConflictError { detail: e.to_string() })?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let header = self
            .auth
            .force_refresh_bearer_header()
            .await
            .map_err(auth_to_conflict)?;
        build(&header)
            .send()
            .await
            .map_err(|e| ConflictError { detail: e.to_string() })
    }
}

#[derive(Serialize, Deserialize)]
struct AccessKeyWire {
    eak: String,
    authorizer_public_key: String,
    authorizer_mode: String,
}

#[derive(Serialize, Deserialize)]
struct ClientPublicKeyWire {
    public_key: String,
    mode: String,
}

fn mode_to_wire(mode: Mode) -> String {
    mode.as_str().to_string()
}

fn mode_from_wire(s: &str) -> Mode {
    if s.eq_ignore_ascii_case("nist") {
        Mode::Nist
    } else {
        Mode::Sodium
    }
}

fn auth_to_api(e: AuthError) -> ApiError {
    match e {
        AuthError::Api(api) => api,
        other => {
            tracing::warn!(error = %other, "token refresh failed ahead of storage call");
            ApiError::Http(0)
        }
    }
}

fn auth_to_conflict(e: AuthError) -> ConflictError {
    ConflictError {
        detail: format!("token refresh failed: {e}"),
    }
}

fn auth_to_lookup(what: String, e: AuthError) -> LookupError {
    tracing::warn!(error = %e, "token refresh failed ahead of storage lookup");
    LookupError { what }
}

fn status_to_api(status: StatusCode) -> ApiError {
    if status == StatusCode::UNAUTHORIZED {
        ApiError::Unauthorized
    } else {
        ApiError::Http(status.as_u16())
    }
}

#[async_trait]
impl StorageApi for HttpStorageApi {
    async fn get_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<Option<EncryptedAccessKey>, ApiError> {
        let url = format!(
            "{}/v1/storage/access_keys/{writer_id}/{user_id}/{reader_id}/{record_type}",
            self.api_url
        );
        let response = self
            .execute(|header| self.http.get(&url).header("Authorization", header))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_to_api(response.status()));
        }
        let wire: AccessKeyWire = response.json().await.map_err(|_| ApiError::Http(0))?;
        Ok(Some(EncryptedAccessKey {
            eak: wire.eak,
            authorizer_public_key: wire.authorizer_public_key,
            authorizer_mode: mode_from_wire(&wire.authorizer_mode),
        }))
    }

    async fn put_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        eak: EncryptedAccessKey,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/v1/storage/access_keys/{writer_id}/{user_id}/{reader_id}/{record_type}",
            self.api_url
        );
        let wire = AccessKeyWire {
            eak: eak.eak,
            authorizer_public_key: eak.authorizer_public_key,
            authorizer_mode: mode_to_wire(eak.authorizer_mode),
        };
        let response = self
            .execute(|header| self.http.put(&url).header("Authorization", header).json(&wire))
            .await?;
        if !response.status().is_success() {
            return Err(status_to_api(response.status()));
        }
        Ok(())
    }

    async fn delete_access_key(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/v1/storage/access_keys/{writer_id}/{user_id}/{reader_id}/{record_type}",
            self.api_url
        );
        let response = self
            .execute(|header| self.http.delete(&url).header("Authorization", header))
            .await?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(status_to_api(response.status()));
        }
        Ok(())
    }

    async fn client_public_key(&self, client_id: Uuid) -> Result<ClientPublicKey, LookupError> {
        let url = format!("{}/v1/storage/clients/{client_id}", self.api_url);
        let request = self.http.get(&url);
        let request = match self.auth.bearer_header().await {
            Ok(header) => request.header("Authorization", header),
            Err(e) => return Err(auth_to_lookup(format!("client {client_id}"), e)),
        };
        let response = request.send().await.map_err(|_| LookupError {
            what: format!("client {client_id}"),
        })?;
        if !response.status().is_success() {
            return Err(LookupError {
                what: format!("client {client_id}"),
            });
        }
        let wire: ClientPublicKeyWire = response.json().await.map_err(|_| LookupError {
            what: format!("client {client_id}"),
        })?;
        Ok(ClientPublicKey {
            public_key: wire.public_key,
            mode: mode_from_wire(&wire.mode),
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
        let url = format!(
            "{}/v1/storage/policy/{user_id}/{writer_id}/{reader_id}/{record_type}",
            self.api_url
        );
        let response = self
            .execute(|header| self.http.put(&url).header("Authorization", header).json(&policy))
            .await?;
        if !response.status().is_success() {
            return Err(status_to_api(response.status()));
        }
        Ok(())
    }

    async fn create_record(&self, record: Record) -> Result<Record, ApiError> {
        let url = format!("{}/v1/storage/records", self.api_url);
        let response = self
            .execute(|header| self.http.post(&url).header("Authorization", header).json(&record))
            .await?;
        if !response.status().is_success() {
            return Err(status_to_api(response.status()));
        }
        response.json().await.map_err(|_| ApiError::Http(0))
    }

    async fn read_record(&self, record_id: Uuid) -> Result<Record, ApiError> {
        let url = format!("{}/v1/storage/records/{record_id}", self.api_url);
        let response = self
            .execute(|header| self.http.get(&url).header("Authorization", header))
            .await?;
        if !response.status().is_success() {
            return Err(status_to_api(response.status()));
        }
        response.json().await.map_err(|_| ApiError::Http(0))
    }

    async fn update_record(&self, record: Record) -> Result<Record, ConflictError> {
        let record_id = record.meta.record_id.ok_or_else(|| ConflictError {
            detail: "record has no id".to_string(),
        })?;
        let url = format!("{}/v1/storage/records/{record_id}", self.api_url);
        let response = self
            .execute_for_conflict(|header| {
                self.http.put(&url).header("Authorization", header).json(&record)
            })
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(ConflictError {
                detail: "version mismatch".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ConflictError {
                detail: format!("http {}", response.status().as_u16()),
            });
        }
        response.json().await.map_err(|e| ConflictError { detail: e.to_string() })
    }

    async fn delete_record(&self, record_id: Uuid, version: &str) -> Result<(), ConflictError> {
        let url = format!("{}/v1/storage/records/{record_id}?version={version}", self.api_url);
        let response = self
            .execute_for_conflict(|header| self.http.delete(&url).header("Authorization", header))
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(ConflictError {
                detail: "version mismatch".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ConflictError {
                detail: format!("http {}", response.status().as_u16()),
            });
        }
        Ok(())
    }

    async fn create_note(&self, note: Note) -> Result<Note, ApiError> {
        let url = format!("{}/v2/storage/notes", self.api_url);
        let response = self
            .http
            .post(&url)
            .json(&note)
            .send()
            .await
            .map_err(|_| ApiError::Http(0))?;
        if !response.status().is_success() {
            return Err(status_to_api(response.status()));
        }
        response.json().await.map_err(|_| ApiError::Http(0))
    }

    async fn read_note_by_id(&self, note_id: Uuid) -> Result<Note, LookupError> {
        let url = format!("{}/v2/storage/notes/{note_id}", self.api_url);
        let response = self.http.get(&url).send().await.map_err(|_| LookupError {
            what: format!("note {note_id}"),
        })?;
        if !response.status().is_success() {
            return Err(LookupError {
                what: format!("note {note_id}"),
            });
        }
        response.json().await.map_err(|_| LookupError {
            what: format!("note {note_id}"),
        })
    }

    async fn read_note_by_name(&self, id_string: &str) -> Result<Note, LookupError> {
        let url = format!("{}/v2/storage/notes?id_string={id_string}", self.api_url);
        let response = self.http.get(&url).send().await.map_err(|_| LookupError {
            what: format!("note named {id_string}"),
        })?;
        if !response.status().is_success() {
            return Err(LookupError {
                what: format!("note named {id_string}"),
            });
        }
        response.json().await.map_err(|_| LookupError {
            what: format!("note named {id_string}"),
        })
    }
}
