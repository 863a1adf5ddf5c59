//! Ed25519 signing, shared by both suites. Always available regardless of
//! which suite is active — notes and TSV1 requests always sign with Ed25519.

use argon2::{Algorithm, Argon2, Params, Version};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::suite::{SigningPrivateKey, SigningPublicKey};

/// libsodium's `crypto_pwhash_SALTBYTES`.
const PWHASH_SALT_LEN: usize = 16;
/// `crypto_pwhash_OPSLIMIT_INTERACTIVE`.
const PWHASH_OPSLIMIT_INTERACTIVE: u32 = 2;
/// `crypto_pwhash_MEMLIMIT_INTERACTIVE`, in KiB (64 MiB).
const PWHASH_MEMLIMIT_INTERACTIVE_KIB: u32 = 64 * 1024;

pub fn generate_signing_keypair() -> (SigningPublicKey, SigningPrivateKey) {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    keypair_from_seed(seed)
}

/// Derives a 32-byte seed from `(password, salt)` via libsodium's default
/// password hash (`crypto_pwhash`, Argon2id, interactive ops/mem limits),
/// then seeds an Ed25519 keypair from it the same way `crypto_sign_seed_keypair`
/// would — the seed becomes the signing key's clamped scalar input directly.
pub fn derive_signing_keypair(password: &[u8], salt: &[u8]) -> (SigningPublicKey, SigningPrivateKey) {
    let seed = derive_symmetric_key(password, salt);
    keypair_from_seed(seed)
}

fn keypair_from_seed(seed: [u8; 32]) -> (SigningPublicKey, SigningPrivateKey) {
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();

    let mut private = Zeroizing::new([0u8; 64]);
    private[..32].copy_from_slice(&seed);
    private[32..].copy_from_slice(verifying_key.as_bytes());

    (
        SigningPublicKey(*verifying_key.as_bytes()),
        SigningPrivateKey(private),
    )
}

/// `crypto_pwhash(len=32, password, salt[..16], OPSLIMIT_INTERACTIVE,
/// MEMLIMIT_INTERACTIVE, ALG_ARGON2ID13)` — the seed both `derive_crypto_keypair`
/// and `derive_signing_keypair` expand into a keypair via their respective
/// `crypto_*_seed_keypair` construction. Salts shorter than the 16-byte
/// libsodium salt width are zero-padded, matching a truncating `slice(0, 16)`
/// on a longer buffer when the caller's salt happens to already be long enough.
pub(crate) fn derive_symmetric_key(password: &[u8], salt: &[u8]) -> [u8; 32] {
    let mut padded_salt = [0u8; PWHASH_SALT_LEN];
    let n = salt.len().min(PWHASH_SALT_LEN);
    padded_salt[..n].copy_from_slice(&salt[..n]);

    let params = Params::new(
        PWHASH_MEMLIMIT_INTERACTIVE_KIB,
        PWHASH_OPSLIMIT_INTERACTIVE,
        1,
        Some(32),
    )
    .expect("fixed interactive argon2id params are always valid");
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = [0u8; 32];
    argon2
        .hash_password_into(password, &padded_salt, &mut out)
        .expect("32-byte argon2id output never fails for fixed params");
    out
}

pub fn sign(message: &[u8], priv_sign: &SigningPrivateKey) -> [u8; 64] {
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&priv_sign.0[..32]);
    let signing_key = SigningKey::from_bytes(&seed);
    signing_key.sign(message).to_bytes()
}

pub fn verify(sig: &[u8; 64], message: &[u8], pub_sign: &SigningPublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pub_sign.0) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(sig);
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let (public, private) = generate_signing_keypair();
        let sig = sign(b"hello world", &private);
        assert!(verify(&sig, b"hello world", &public));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let (public, private) = generate_signing_keypair();
        let sig = sign(b"hello world", &private);
        assert!(!verify(&sig, b"hello mundo", &public));
    }

    #[test]
    fn derivation_is_deterministic() {
        let (p1, s1) = derive_signing_keypair(b"correcthorsebatterystaple", b"some-salt");
        let (p2, s2) = derive_signing_keypair(b"correcthorsebatterystaple", b"some-salt");
        assert_eq!(p1.0, p2.0);
        assert_eq!(*s1.0, *s2.0);
    }
}
