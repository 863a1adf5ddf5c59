//! The default suite: Curve25519 box, XSalsa20-Poly1305 secretbox, Ed25519,
//! BLAKE2b. Mirrors libsodium's `crypto_box`/`crypto_secretbox` primitives.

use crypto_box::aead::{Aead, AeadCore, KeyInit, OsRng as BoxOsRng};
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use crypto_secretbox::{Key as SecretBoxKey, Nonce as SecretBoxNonce, XSalsa20Poly1305};

use crate::error::CryptoError;
use crate::suite::{CryptoSuite, Mode, PrivateKey, PublicKey, SymmetricKey};

const NONCE_LEN: usize = 24;

pub struct SodiumSuite;

fn nonce_array(nonce: &[u8]) -> Result<[u8; NONCE_LEN], CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: NONCE_LEN,
            actual: nonce.len(),
        });
    }
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(nonce);
    Ok(out)
}

impl CryptoSuite for SodiumSuite {
    fn mode(&self) -> Mode {
        Mode::Sodium
    }

    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn generate_keypair(&self) -> (PublicKey, PrivateKey) {
        let secret = BoxSecretKey::generate(&mut BoxOsRng);
        let public = secret.public_key();
        (
            PublicKey(public.as_bytes().to_vec()),
            PrivateKey::new(secret.to_bytes().to_vec()),
        )
    }

    fn encrypt_secret(
        &self,
        key: &SymmetricKey,
        plaintext: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_array(nonce)?;
        let cipher = XSalsa20Poly1305::new(SecretBoxKey::from_slice(&*key.0));
        cipher
            .encrypt(SecretBoxNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn decrypt_secret(
        &self,
        key: &SymmetricKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_array(nonce)?;
        let cipher = XSalsa20Poly1305::new(SecretBoxKey::from_slice(&*key.0));
        cipher
            .decrypt(SecretBoxNonce::from_slice(&nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn encrypt_ak(
        &self,
        our_priv: &PrivateKey,
        their_pub: &PublicKey,
        ak: &SymmetricKey,
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_array(nonce)?;
        let secret = box_secret_key(our_priv)?;
        let public = box_public_key(their_pub)?;
        let salsa_box = SalsaBox::new(&public, &secret);
        salsa_box
            .encrypt(crypto_box::Nonce::from_slice(&nonce), &*ak.0 .0)
            .map_err(|_| CryptoError::AccessKeyUnwrapFailed)
    }

    fn decrypt_eak(
        &self,
        our_priv: &PrivateKey,
        their_pub: &PublicKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<SymmetricKey, CryptoError> {
        let nonce = nonce_array(nonce)?;
        let secret = box_secret_key(our_priv)?;
        let public = box_public_key(their_pub)?;
        let salsa_box = SalsaBox::new(&public, &secret);
        let plaintext = salsa_box
            .decrypt(crypto_box::Nonce::from_slice(&nonce), ciphertext)
            .map_err(|_| CryptoError::AccessKeyUnwrapFailed)?;
        if plaintext.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: plaintext.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&plaintext);
        Ok(SymmetricKey(zeroize::Zeroizing::new(bytes)))
    }

    fn encode_public_key(&self, key: &PublicKey) -> String {
        crate::base64url::encode(&key.0)
    }

    fn decode_public_key(&self, encoded: &str) -> Result<PublicKey, CryptoError> {
        let bytes = crate::base64url::decode(encoded)?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(PublicKey(bytes))
    }

    fn encode_private_key(&self, key: &PrivateKey) -> String {
        crate::base64url::encode(&*key.0)
    }

    fn decode_private_key(&self, encoded: &str) -> Result<PrivateKey, CryptoError> {
        let bytes = crate::base64url::decode(encoded)?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(PrivateKey::new(bytes))
    }

    fn derive_crypto_keypair(&self, password: &[u8], salt: &[u8]) -> (PublicKey, PrivateKey) {
        let seed = crate::signing::derive_symmetric_key(password, salt);
        let secret = BoxSecretKey::from(seed);
        let public = secret.public_key();
        (
            PublicKey(public.as_bytes().to_vec()),
            PrivateKey::new(secret.to_bytes().to_vec()),
        )
    }
}

fn box_secret_key(priv_key: &PrivateKey) -> Result<BoxSecretKey, CryptoError> {
    if priv_key.0.len() != 32 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 32,
            actual: priv_key.0.len(),
        });
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&priv_key.0);
    Ok(BoxSecretKey::from(bytes))
}

fn box_public_key(pub_key: &PublicKey) -> Result<BoxPublicKey, CryptoError> {
    if pub_key.0.len() != 32 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 32,
            actual: pub_key.0.len(),
        });
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&pub_key.0);
    Ok(BoxPublicKey::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secretbox_round_trips() {
        let suite = SodiumSuite;
        let key = suite.random_key();
        let nonce = suite.random_nonce();
        let ct = suite.encrypt_secret(&key, b"hello", &nonce).unwrap();
        let pt = suite.decrypt_secret(&key, &ct, &nonce).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn box_round_trips() {
        let suite = SodiumSuite;
        let (pub_a, priv_a) = suite.generate_keypair();
        let (pub_b, priv_b) = suite.generate_keypair();
        let ak = suite.random_key();
        let nonce = suite.random_nonce();

        let wrapped = suite.encrypt_ak(&priv_a, &pub_b, &ak, &nonce).unwrap();
        let unwrapped = suite.decrypt_eak(&priv_b, &pub_a, &wrapped, &nonce).unwrap();
        assert_eq!(*ak.0, *unwrapped.0);
    }

    #[test]
    fn key_encode_decode_round_trips() {
        let suite = SodiumSuite;
        let (public, private) = suite.generate_keypair();
        let decoded_pub = suite
            .decode_public_key(&suite.encode_public_key(&public))
            .unwrap();
        let decoded_priv = suite
            .decode_private_key(&suite.encode_private_key(&private))
            .unwrap();
        assert_eq!(decoded_pub.0, public.0);
        assert_eq!(*decoded_priv.0, *private.0);
    }
}
