//! The persisted client configuration the core is handed at construction
//! time (spec §6, §10.3). Loading it — from a file, the environment, a
//! secret store — is an external collaborator's job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub version: u32,
    pub client_id: Uuid,
    pub api_key_id: String,
    pub api_secret: String,
    pub public_key: String,
    pub private_key: String,
    pub public_signing_key: Option<String>,
    pub private_signing_key: Option<String>,
    pub api_url: String,
}
