//! Self-contained, anonymously-readable encrypted+signed payloads (spec §4.6).
//!
//! Everything a legitimate reader needs — the wrapped AK, the writer's public
//! keys, and per-field signatures — travels with the note itself.

use std::collections::BTreeMap;

use citadel_crypto::{
    AccessKeyEnvelope, CryptoSuite, PrivateKey, PublicKey, SigningPrivateKey, SigningPublicKey,
};
use uuid::Uuid;

use crate::error::{KeystoreError, NoteValidationError};
use crate::types::{Note, NoteKeys, NoteOptions};

/// Fixed UUID v5-style constant identifying this signature scheme.
pub const SIGNATURE_VERSION: &str = "e7737e7c-1637-511e-8bab-93c4f3e26fd9";

pub struct NoteCrypto<'a> {
    pub suite: &'a dyn CryptoSuite,
}

impl<'a> NoteCrypto<'a> {
    pub fn new(suite: &'a dyn CryptoSuite) -> Self {
        Self { suite }
    }

    /// Builds a note carrying `data`, wrapped for `reader_public_key` and
    /// signed under `(writer_priv_sign, writer_pub_sign)`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        data: BTreeMap<String, String>,
        writer_priv_enc: &PrivateKey,
        writer_pub_enc: &PublicKey,
        writer_priv_sign: &SigningPrivateKey,
        writer_pub_sign: &SigningPublicKey,
        reader_public_key: &PublicKey,
        options: NoteOptions,
    ) -> Result<Note, KeystoreError> {
        let ak = self.suite.random_key();

        let wrap_nonce = self.suite.random_nonce();
        let ciphertext = self
            .suite
            .encrypt_ak(writer_priv_enc, reader_public_key, &ak, &wrap_nonce)?;
        let encrypted_access_key = AccessKeyEnvelope {
            ciphertext,
            nonce: wrap_nonce,
        }
        .encode();

        let salt = Uuid::new_v4().to_string();

        let mut encrypted_data = BTreeMap::new();
        for (key, value) in &data {
            let message = self.suite.hash_string(&format!("{salt}{key}{value}"));
            let sig = self.suite.sign(&message, writer_priv_sign);
            let sig_b64 = self.suite.base64_url_encode(&sig);
            let field_plaintext =
                format!("{SIGNATURE_VERSION};{salt};{};{sig_b64}{value}", sig_b64.len());

            let nonce = self.suite.random_nonce();
            let ct = self.suite.encrypt_secret(&ak, field_plaintext.as_bytes(), &nonce)?;
            let wire = AccessKeyEnvelope {
                ciphertext: ct,
                nonce,
            }
            .encode();
            encrypted_data.insert(key.clone(), wire);
        }

        let sig_message = self.suite.hash_string(&format!("{salt}signature"));
        let sig = self.suite.sign(&sig_message, writer_priv_sign);
        let sig_b64 = self.suite.base64_url_encode(&sig);
        let signature = format!("{SIGNATURE_VERSION};{salt};{};{sig_b64}", sig_b64.len());

        Ok(Note {
            data: encrypted_data,
            note_keys: NoteKeys {
                mode: self.suite.mode().as_str().to_string(),
                recipient_signing_key: String::new(),
                writer_signing_key: self.suite.base64_url_encode(&writer_pub_sign.0),
                writer_encryption_key: self.suite.encode_public_key(writer_pub_enc),
                encrypted_access_key,
            },
            note_options: options,
            signature,
            note_id: None,
            created_at: None,
        })
    }

    /// Decrypts `note` with `reader_priv_enc`, verifying every field's
    /// signature unless `verify_signature` is `false`.
    pub fn decrypt(
        &self,
        note: &Note,
        reader_priv_enc: &PrivateKey,
        verify_signature: bool,
    ) -> Result<BTreeMap<String, String>, KeystoreError> {
        let writer_pub_enc = self.suite.decode_public_key(&note.note_keys.writer_encryption_key)?;
        let envelope = AccessKeyEnvelope::decode(&note.note_keys.encrypted_access_key)?;
        let ak = self
            .suite
            .decrypt_eak(reader_priv_enc, &writer_pub_enc, &envelope.ciphertext, &envelope.nonce)?;

        let writer_sign_bytes = self
            .suite
            .base64_url_decode(&note.note_keys.writer_signing_key)?;
        if writer_sign_bytes.len() != 32 {
            return Err(citadel_crypto::CryptoError::InvalidKeyLength {
                expected: 32,
                actual: writer_sign_bytes.len(),
            }
            .into());
        }
        let mut writer_sign_arr = [0u8; 32];
        writer_sign_arr.copy_from_slice(&writer_sign_bytes);
        let writer_pub_sign = SigningPublicKey(writer_sign_arr);

        let mut out = BTreeMap::new();
        let mut note_salt: Option<String> = None;

        for (key, wire) in &note.data {
            let field_envelope = AccessKeyEnvelope::decode(wire)?;
            let plaintext = self.suite.decrypt_secret(
                &ak,
                &field_envelope.ciphertext,
                &field_envelope.nonce,
            )?;
            let plaintext = String::from_utf8(plaintext)
                .map_err(|_| citadel_crypto::CryptoError::InvalidEnvelope)?;

            let (salt, sig, value) = parse_signed_field(self.suite, &plaintext, true)?;

            if verify_signature {
                let message = self.suite.hash_string(&format!("{salt}{key}{value}"));
                if !self.suite.verify(&sig, &message, &writer_pub_sign) {
                    return Err(NoteValidationError::SignatureInvalid {
                        field: key.clone(),
                    }
                    .into());
                }
            }

            match &note_salt {
                None => note_salt = Some(salt),
                Some(existing) if *existing != salt => {
                    return Err(NoteValidationError::SignatureInvalid { field: key.clone() }.into());
                }
                _ => {}
            }

            out.insert(key.clone(), value);
        }

        if verify_signature {
            let (salt, sig, trailing) = parse_signed_field(self.suite, &note.signature, false)?;
            if !trailing.is_empty() {
                return Err(NoteValidationError::SignatureInvalid {
                    field: "signature".to_string(),
                }
                .into());
            }
            if let Some(existing) = &note_salt {
                if *existing != salt {
                    return Err(NoteValidationError::SignatureInvalid {
                        field: "signature".to_string(),
                    }
                    .into());
                }
            }
            let message = self.suite.hash_string(&format!("{salt}signature"));
            if !self.suite.verify(&sig, &message, &writer_pub_sign) {
                return Err(NoteValidationError::SignatureInvalid {
                    field: "signature".to_string(),
                }
                .into());
            }
        }

        Ok(out)
    }
}

/// Parses `<version>;<salt>;<lenOfB64Sig>;<B64Sig><value>` (or, with
/// `expect_value = false`, the trailing segment must be exactly the signature).
fn parse_signed_field(
    suite: &dyn CryptoSuite,
    s: &str,
    expect_value: bool,
) -> Result<(String, [u8; 64], String), KeystoreError> {
    let mut parts = s.splitn(4, ';');
    let _version = parts
        .next()
        .ok_or(NoteValidationError::MissingSignature)?;
    let salt = parts
        .next()
        .ok_or(NoteValidationError::MissingSignature)?
        .to_string();
    let len: usize = parts
        .next()
        .ok_or(NoteValidationError::MissingSignature)?
        .parse()
        .map_err(|_| NoteValidationError::MissingSignature)?;
    let remainder = parts.next().unwrap_or("");
    if remainder.len() < len {
        return Err(NoteValidationError::MissingSignature.into());
    }
    let (sig_b64, value) = remainder.split_at(len);
    if !expect_value && !value.is_empty() {
        return Err(NoteValidationError::MissingSignature.into());
    }

    let sig_bytes = suite
        .base64_url_decode(sig_b64)
        .map_err(|_| NoteValidationError::MissingSignature)?;
    if sig_bytes.len() != 64 {
        return Err(NoteValidationError::MissingSignature.into());
    }
    let mut sig = [0u8; 64];
    sig.copy_from_slice(&sig_bytes);

    Ok((salt, sig, value.to_string()))
}
