//! PKCE three-leg exchange that bootstraps a storage client for a human
//! user's `(username, password, realm)` (spec §4.10).

use std::collections::BTreeMap;

use citadel_crypto::{CryptoSuite, PrivateKey, PublicKey, SigningPrivateKey, SigningPublicKey};
use citadel_keystore::{Note, NoteCrypto};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AuthError;
use crate::tsv1::RequestSigner;

/// The key material and note address re-derivable at any time from the
/// user's own secret. No extra state lives on the user's side.
pub struct DerivedIdentity {
    pub note_name: String,
    pub enc_pub: PublicKey,
    pub enc_priv: PrivateKey,
    pub sign_pub: SigningPublicKey,
    pub sign_priv: SigningPrivateKey,
}

/// A realm's case-sensitive `(name, domain)` pair, resolved ahead of login.
#[derive(serde::Deserialize)]
pub struct RealmInfo {
    pub name: String,
    pub domain: String,
}

pub struct IdentityLogin<'a> {
    suite: &'a dyn CryptoSuite,
    http: reqwest::Client,
    api_url: String,
}

impl<'a> IdentityLogin<'a> {
    pub fn new(suite: &'a dyn CryptoSuite, http: reqwest::Client, api_url: String) -> Self {
        Self { suite, http, api_url }
    }

    /// Derives `(noteName, encryptionKeypair, signingKeypair)` from
    /// `(username, password, realm)`. Pure and deterministic.
    pub fn derive(&self, username: &str, password: &str, realm: &str) -> DerivedIdentity {
        let name = format!("{}@realm:{realm}", username.to_lowercase());
        let note_name = self.suite.base64_url_encode(&self.suite.hash_string(&name));

        let (enc_pub, enc_priv) = self
            .suite
            .derive_crypto_keypair(password.as_bytes(), name.as_bytes());

        let mut signing_salt = enc_pub.0.clone();
        signing_salt.extend_from_slice(&enc_priv.0);
        let (sign_pub, sign_priv) = self
            .suite
            .derive_signing_keypair(password.as_bytes(), &signing_salt);

        DerivedIdentity {
            note_name,
            enc_pub,
            enc_priv,
            sign_pub,
            sign_priv,
        }
    }

    /// Resolves a case-insensitive realm name to its case-sensitive
    /// `(name, domain)` pair.
    pub async fn get_public_realm_info(&self, realm: &str) -> Result<RealmInfo, AuthError> {
        let url = format!("{}/v1/identity/info/realm/{realm}", self.api_url);
        let response = self.http.get(&url).send().await?;
        expect_success(&response)?;
        Ok(response.json().await?)
    }

    /// Runs the full three-leg login and returns the decrypted credential
    /// note fields (JSON-serialized storage-client + identity configuration).
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        realm: &str,
        app: &str,
    ) -> Result<BTreeMap<String, String>, AuthError> {
        let realm_info = self.get_public_realm_info(realm).await?;
        let derived = self.derive(username, password, realm);

        let verifier = format!("{}{}", Uuid::new_v4(), Uuid::new_v4());
        let challenge = code_challenge(&verifier);

        let login_body = serde_json::json!({
            "username": username,
            "realm_name": realm_info.domain,
            "app": app,
            "login_style": "api",
            "code_challenge": challenge,
            "code_challenge_method": "S256",
        });
        let response = self
            .http
            .post(format!("{}/v1/identity/login", self.api_url))
            .json(&login_body)
            .send()
            .await?;
        expect_success(&response)?;
        let challenge_response: Value = response.json().await?;
        expect_type(&challenge_response, "continue")?;
        let action_url = challenge_response
            .get("action_url")
            .and_then(Value::as_str)
            .ok_or_else(|| unsupported("action_url", &challenge_response))?
            .to_string();

        let submit_body = serde_json::json!({
            "public_key": { "curve25519": self.suite.encode_public_key(&derived.enc_pub) },
            "public_signing_key": { "ed25519": self.suite.base64_url_encode(&derived.sign_pub.0) },
        });
        let response = self.http.post(&action_url).json(&submit_body).send().await?;
        expect_success(&response)?;
        let fetch_response: Value = response.json().await?;
        expect_type(&fetch_response, "fetch")?;
        let context = fetch_response
            .get("context")
            .cloned()
            .ok_or_else(|| unsupported("context", &fetch_response))?;

        let redeem_body = serde_json::json!({
            "context": context,
            "code_verifier": verifier,
        });
        let response = self
            .http
            .post(format!("{}/v1/identity/tozid/redirect", self.api_url))
            .json(&redeem_body)
            .send()
            .await?;
        expect_success(&response)?;
        let redeem_response: Value = response.json().await?;
        let access_token = redeem_response
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| unsupported("access_token", &redeem_response))?
            .to_string();

        self.fetch_credential_note(&derived, &access_token).await
    }

    async fn fetch_credential_note(
        &self,
        derived: &DerivedIdentity,
        access_token: &str,
    ) -> Result<BTreeMap<String, String>, AuthError> {
        let signer = RequestSigner::new(
            self.suite,
            Uuid::nil(),
            derived.sign_pub.clone(),
            derived.sign_priv.clone(),
        );
        let path = "/v2/storage/notes";
        let query = vec![("id_string".to_string(), derived.note_name.clone())];
        let auth_header = signer.sign("GET", path, &query);

        let url = format!("{}{path}?id_string={}", self.api_url, derived.note_name);
        let response = self
            .http
            .get(&url)
            .header("Authorization", auth_header)
            .header("X-TOZID-LOGIN-TOKEN", access_token)
            .send()
            .await?;
        expect_success(&response)?;
        let note: Note = response.json().await?;

        let note_crypto = NoteCrypto::new(self.suite);
        Ok(note_crypto.decrypt(&note, &derived.enc_priv, true)?)
    }
}

fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64_url_no_pad(&digest)
}

fn base64_url_no_pad(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn expect_success(response: &reqwest::Response) -> Result<(), AuthError> {
    let status = response.status();
    if status.as_u16() == 401 {
        return Err(AuthError::Api(citadel_keystore::ApiError::Unauthorized));
    }
    if !status.is_success() {
        return Err(AuthError::Api(citadel_keystore::ApiError::Http(status.as_u16())));
    }
    Ok(())
}

fn expect_type(value: &Value, expected: &'static str) -> Result<(), AuthError> {
    let got = value.get("type").and_then(Value::as_str).unwrap_or("");
    if got != expected {
        return Err(citadel_keystore::UnsupportedApiResponse {
            expected,
            got: got.to_string(),
        }
        .into());
    }
    Ok(())
}

fn unsupported(expected: &'static str, value: &Value) -> AuthError {
    citadel_keystore::UnsupportedApiResponse {
        expected,
        got: value.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use citadel_crypto::SodiumSuite;

    #[test]
    fn derive_is_deterministic_on_the_same_inputs() {
        let suite = SodiumSuite;
        let login = IdentityLogin::new(&suite, reqwest::Client::new(), "https://example.invalid".to_string());

        let a = login.derive("Fred", "hunter2", "widgets-inc");
        let b = login.derive("fred", "hunter2", "widgets-inc");

        assert_eq!(a.note_name, b.note_name);
        assert_eq!(a.enc_pub.0, b.enc_pub.0);
        assert_eq!(a.sign_pub.0, b.sign_pub.0);
    }

    #[test]
    fn derive_differs_across_realms() {
        let suite = SodiumSuite;
        let login = IdentityLogin::new(&suite, reqwest::Client::new(), "https://example.invalid".to_string());

        let a = login.derive("fred", "hunter2", "widgets-inc");
        let b = login.derive("fred", "hunter2", "other-realm");

        assert_ne!(a.note_name, b.note_name);
    }
}
