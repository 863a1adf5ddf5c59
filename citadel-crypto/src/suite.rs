//! The capability set every crypto suite must provide.
//!
//! Everything above this layer (envelopes, records, notes, sharing) is
//! written against [`CryptoSuite`] and never branches on which concrete
//! suite is active. The two suites are chosen once, at process start, from
//! the `CRYPTO_SUITE` environment variable (see [`Mode::from_env`]).

use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Which concrete suite is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Curve25519 box + XSalsa20-Poly1305 secretbox + Ed25519 + BLAKE2b.
    Sodium,
    /// P-384 ECDH + HKDF-SHA384 + AES-256-GCM.
    Nist,
}

impl Mode {
    /// Reads `CRYPTO_SUITE` from the environment: `"NIST"` selects [`Mode::Nist`],
    /// anything else (including unset) selects [`Mode::Sodium`].
    pub fn from_env() -> Self {
        match std::env::var("CRYPTO_SUITE") {
            Ok(v) if v.eq_ignore_ascii_case("nist") => Mode::Nist,
            _ => Mode::Sodium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sodium => "sodium",
            Mode::Nist => "nist",
        }
    }
}

/// A public key, in the suite's canonical in-memory byte form.
///
/// For the sodium suite this is 32 raw Curve25519 bytes. For the NIST suite
/// this is the PEM encoding of a SubjectPublicKeyInfo structure. Only the
/// suite implementation interprets the bytes; everything above this layer
/// treats them opaquely.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub Vec<u8>);

/// A private key, in the suite's canonical in-memory byte form. Zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey(pub Zeroizing<Vec<u8>>);

impl PrivateKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }
}

/// An Ed25519 public signing key, 32 raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningPublicKey(pub [u8; 32]);

/// An Ed25519 private signing key, 64 raw bytes (seed || public key).
#[derive(Clone)]
pub struct SigningPrivateKey(pub Zeroizing<[u8; 64]>);

/// A 32-byte symmetric key: an Access Key or a per-field data key.
#[derive(Clone)]
pub struct SymmetricKey(pub Zeroizing<[u8; 32]>);

impl SymmetricKey {
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(Zeroizing::new(bytes))
    }
}

impl From<[u8; 32]> for SymmetricKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }
}

/// The capability set the rest of the system is polymorphic over (spec §4.1).
pub trait CryptoSuite: Send + Sync {
    fn mode(&self) -> Mode;

    /// Natural nonce length for this suite's symmetric box.
    fn nonce_len(&self) -> usize;

    fn generate_keypair(&self) -> (PublicKey, PrivateKey);

    fn random_nonce(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.nonce_len()];
        OsRng.fill_bytes(&mut bytes);
        bytes
    }

    fn encrypt_secret(
        &self,
        key: &SymmetricKey,
        plaintext: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    fn decrypt_secret(
        &self,
        key: &SymmetricKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Public-key authenticated box: wrap `ak` from `our_priv` to `their_pub`.
    fn encrypt_ak(
        &self,
        our_priv: &PrivateKey,
        their_pub: &PublicKey,
        ak: &SymmetricKey,
        nonce: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Public-key authenticated box: unwrap an EAK sent from `their_pub` to `our_priv`.
    fn decrypt_eak(
        &self,
        our_priv: &PrivateKey,
        their_pub: &PublicKey,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<SymmetricKey, CryptoError>;

    fn encode_public_key(&self, key: &PublicKey) -> String;
    fn decode_public_key(&self, encoded: &str) -> Result<PublicKey, CryptoError>;
    fn encode_private_key(&self, key: &PrivateKey) -> String;
    fn decode_private_key(&self, encoded: &str) -> Result<PrivateKey, CryptoError>;

    /// A fresh 32-byte AK or per-field data key. Suite-independent.
    fn random_key(&self) -> SymmetricKey {
        SymmetricKey::random()
    }

    /// Deterministic encryption keypair derivation for identity login (sodium only
    /// in practice, but exposed on the trait so the login flow stays suite-generic).
    fn derive_crypto_keypair(&self, password: &[u8], salt: &[u8]) -> (PublicKey, PrivateKey);

    /// Deterministic Ed25519 signing keypair derivation for identity login.
    fn derive_signing_keypair(&self, password: &[u8], salt: &[u8]) -> (SigningPublicKey, SigningPrivateKey) {
        crate::signing::derive_signing_keypair(password, salt)
    }

    /// Ed25519 signing keypair generation. Suite-independent; required by notes/TSV1
    /// regardless of which suite encrypts records.
    fn generate_signing_keypair(&self) -> (SigningPublicKey, SigningPrivateKey) {
        crate::signing::generate_signing_keypair()
    }

    fn sign(&self, message: &[u8], priv_sign: &SigningPrivateKey) -> [u8; 64] {
        crate::signing::sign(message, priv_sign)
    }

    fn verify(&self, sig: &[u8; 64], message: &[u8], pub_sign: &SigningPublicKey) -> bool {
        crate::signing::verify(sig, message, pub_sign)
    }

    /// BLAKE2b (32-byte digest) of UTF-8 bytes, raw. Suite-independent.
    fn hash_string(&self, s: &str) -> [u8; 32] {
        crate::hashing::blake2b32(s.as_bytes())
    }

    fn base64_url_encode(&self, bytes: &[u8]) -> String {
        crate::base64url::encode(bytes)
    }

    fn base64_url_decode(&self, s: &str) -> Result<Vec<u8>, CryptoError> {
        crate::base64url::decode(s)
    }
}
