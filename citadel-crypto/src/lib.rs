//! Dual-suite envelope cryptography: keypairs, symmetric secret boxes,
//! signing, hashing, and the wire codecs built on top of them.
//!
//! Everything above this crate is written against [`CryptoSuite`] and never
//! branches on which concrete suite (`SodiumSuite` or `NistSuite`) is active.

mod base64url;
mod error;
mod envelope;
mod filestream;
mod hashing;
mod nist;
mod signing;
mod sodium;
mod suite;

pub use envelope::{AccessKeyEnvelope, FieldEnvelope};
pub use error::CryptoError;
pub use filestream::{FileEncryptOutcome, FileStreamCodec, CHUNK_SIZE, FILE_VERSION};
pub use nist::NistSuite;
pub use sodium::SodiumSuite;
pub use suite::{
    CryptoSuite, Mode, PrivateKey, PublicKey, SigningPrivateKey, SigningPublicKey, SymmetricKey,
};

/// Build the suite selected by the `CRYPTO_SUITE` environment variable.
pub fn suite_from_env() -> Box<dyn CryptoSuite> {
    match Mode::from_env() {
        Mode::Sodium => Box::new(SodiumSuite),
        Mode::Nist => Box::new(NistSuite),
    }
}

pub fn suite_for_mode(mode: Mode) -> Box<dyn CryptoSuite> {
    match mode {
        Mode::Sodium => Box::new(SodiumSuite),
        Mode::Nist => Box::new(NistSuite),
    }
}
