//! The alternative suite: P-384 ECDH + HKDF-SHA384 + AES-256-GCM. Keys are
//! carried in memory and on the wire as PEM-encoded SubjectPublicKeyInfo /
//! PKCS#8, matching the original suite's key transport exactly.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key as AesKey, Nonce as AesNonce};
use elliptic_curve::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use elliptic_curve::pkcs8::der::pem::LineEnding;
use hkdf::Hkdf;
use p384::ecdh::diffie_hellman;
use p384::{PublicKey as P384PublicKey, SecretKey as P384SecretKey};
use rand_core::OsRng;
use sha2::Sha384;

use crate::error::CryptoError;
use crate::suite::{CryptoSuite, Mode, PrivateKey, PublicKey, SymmetricKey};

const NONCE_LEN: usize = 12;

pub struct NistSuite;

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

fn parse_public_pem(key: &PublicKey) -> Result<P384PublicKey, CryptoError> {
    let pem = std::str::from_utf8(&key.0)
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
    P384PublicKey::from_public_key_pem(pem)
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))
}

fn parse_private_pem(key: &PrivateKey) -> Result<P384SecretKey, CryptoError> {
    let pem = std::str::from_utf8(&key.0)
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
    P384SecretKey::from_pkcs8_pem(pem)
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))
}

/// ECDH(our_priv, their_pub) then HKDF-SHA384 (no salt, no info) to a 256-bit AES key.
fn exchange(our_priv: &PrivateKey, their_pub: &PublicKey) -> Result<Aes256Gcm, CryptoError> {
    let secret = parse_private_pem(our_priv)?;
    let public = parse_public_pem(their_pub)?;

    let shared = diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let hk = Hkdf::<Sha384>::new(None, shared.raw_secret_bytes().as_slice());
    let mut okm = [0u8; 32];
    hk.expand(&[], &mut okm)
        .map_err(|_| CryptoError::AccessKeyUnwrapFailed)?;
    Ok(Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(&okm)))
}

impl CryptoSuite for NistSuite {
    fn mode(&self) -> Mode {
        Mode::Nist
    }

    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn generate_keypair(&self) -> (PublicKey, PrivateKey) {
        let secret = P384SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .expect("p384 public key always encodes to PEM");
        let private_pem = secret
            .to_pkcs8_pem(LineEnding::LF)
            .expect("p384 secret key always encodes to PKCS#8 PEM");
        (
            PublicKey(public_pem.into_bytes()),
            PrivateKey::new(private_pem.as_bytes().to_vec()),
        )
    }

    fn encrypt_secret(
        &self,
        key: &SymmetricKey,
        plaintext: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_array(nonce)?;
        let cipher = Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(&*key.0));
        cipher
            .encrypt(
                AesNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &[],
                },
            )
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn decrypt_secret(
        &self,
        key: &SymmetricKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_array(nonce)?;
        let cipher = Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(&*key.0));
        cipher
            .decrypt(
                AesNonce::from_slice(&nonce),
                Payload {
                    msg: ciphertext,
                    aad: &[],
                },
            )
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
        let cipher = exchange(our_priv, their_pub)?;
        cipher
            .encrypt(
                AesNonce::from_slice(&nonce),
                Payload {
                    msg: &*ak.0,
                    aad: &[],
                },
            )
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
        let cipher = exchange(our_priv, their_pub)?;
        let plaintext = cipher
            .decrypt(
                AesNonce::from_slice(&nonce),
                Payload {
                    msg: ciphertext,
                    aad: &[],
                },
            )
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
        // Validate it really is a parseable SPKI PEM before accepting it.
        parse_public_pem(&PublicKey(bytes.clone()))?;
        Ok(PublicKey(bytes))
    }

    fn encode_private_key(&self, key: &PrivateKey) -> String {
        crate::base64url::encode(&*key.0)
    }

    fn decode_private_key(&self, encoded: &str) -> Result<PrivateKey, CryptoError> {
        let bytes = crate::base64url::decode(encoded)?;
        let key = PrivateKey::new(bytes);
        parse_private_pem(&key)?;
        Ok(key)
    }

    fn derive_crypto_keypair(&self, _password: &[u8], _salt: &[u8]) -> (PublicKey, PrivateKey) {
        // Identity login's note-addressing derivation is only exercised in
        // sodium mode in the original system; NIST mode falls back to
        // ordinary keypair generation since no caller currently depends on
        // NIST-mode determinism here.
        self.generate_keypair()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secretbox_round_trips() {
        let suite = NistSuite;
        let key = suite.random_key();
        let nonce = suite.random_nonce();
        let ct = suite.encrypt_secret(&key, b"hello", &nonce).unwrap();
        let pt = suite.decrypt_secret(&key, &ct, &nonce).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn box_round_trips() {
        let suite = NistSuite;
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
        let suite = NistSuite;
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
