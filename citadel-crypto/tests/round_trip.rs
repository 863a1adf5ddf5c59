//! Integration-level round-trip and validation properties (spec-level testable properties).

use citadel_crypto::{
    AccessKeyEnvelope, CryptoSuite, FieldEnvelope, FileStreamCodec, NistSuite, SodiumSuite,
};
use proptest::prelude::*;

fn suites() -> Vec<Box<dyn CryptoSuite>> {
    vec![Box::new(SodiumSuite), Box::new(NistSuite)]
}

#[test]
fn secret_box_round_trips_for_every_suite() {
    for suite in suites() {
        let key = suite.random_key();
        let nonce = suite.random_nonce();
        let ct = suite.encrypt_secret(&key, b"a message", &nonce).unwrap();
        let pt = suite.decrypt_secret(&key, &ct, &nonce).unwrap();
        assert_eq!(pt, b"a message");
    }
}

#[test]
fn authenticated_box_round_trips_for_every_suite() {
    for suite in suites() {
        let (pub_a, priv_a) = suite.generate_keypair();
        let (pub_b, priv_b) = suite.generate_keypair();
        let ak = suite.random_key();
        let nonce = suite.random_nonce();

        let sealed = suite.encrypt_ak(&priv_a, &pub_b, &ak, &nonce).unwrap();
        let opened = suite.decrypt_eak(&priv_b, &pub_a, &sealed, &nonce).unwrap();
        assert_eq!(*ak.0, *opened.0);
    }
}

#[test]
fn record_field_round_trips_for_every_suite() {
    for suite in suites() {
        let ak = suite.random_key();
        for value in ["", "72.1", "multi\nline\nvalue", "unicode: \u{1F980}"] {
            let dk = suite.random_key();
            let ef_nonce = suite.random_nonce();
            let edk_nonce = suite.random_nonce();

            let ef = suite.encrypt_secret(&dk, value.as_bytes(), &ef_nonce).unwrap();
            let edk = suite.encrypt_secret(&ak, &*dk.0, &edk_nonce).unwrap();

            let wire = FieldEnvelope {
                edk,
                edk_nonce,
                ef,
                ef_nonce,
            }
            .encode();

            let decoded = FieldEnvelope::decode(&wire).unwrap();
            let dk_bytes = suite
                .decrypt_secret(&ak, &decoded.edk, &decoded.edk_nonce)
                .unwrap();
            let mut dk_arr = [0u8; 32];
            dk_arr.copy_from_slice(&dk_bytes);
            let dk_recovered = citadel_crypto::SymmetricKey::from(dk_arr);
            let plaintext = suite
                .decrypt_secret(&dk_recovered, &decoded.ef, &decoded.ef_nonce)
                .unwrap();
            assert_eq!(String::from_utf8(plaintext).unwrap(), value);
        }
    }
}

#[test]
fn file_round_trip_preserves_bytes_and_checksum() {
    let suite = SodiumSuite;
    let ak = suite.random_key();

    let mut plaintext = vec![0u8; 200_000];
    for (i, byte) in plaintext.iter_mut().enumerate() {
        *byte = (i * 7 % 256) as u8;
    }

    let mut ciphertext = Vec::new();
    let outcome = FileStreamCodec::encrypt(
        &suite,
        &ak,
        &mut std::io::Cursor::new(&plaintext),
        &mut ciphertext,
    )
    .unwrap();

    let mut recovered = Vec::new();
    FileStreamCodec::decrypt(
        &suite,
        &ak,
        &mut std::io::Cursor::new(&ciphertext),
        &mut recovered,
    )
    .unwrap();

    assert_eq!(recovered, plaintext);

    use md5::{Digest, Md5};
    let mut hasher = Md5::new();
    hasher.update(&ciphertext);
    let expected = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, hasher.finalize());
    assert_eq!(outcome.checksum_base64, expected);
}

#[test]
fn field_envelope_requires_exactly_four_segments() {
    assert!(FieldEnvelope::decode("a.b.c").is_err());
    assert!(FieldEnvelope::decode("a.b.c.d.e").is_err());
}

#[test]
fn access_key_envelope_requires_exactly_two_segments() {
    assert!(AccessKeyEnvelope::decode("a.b.c").is_err());
    assert!(AccessKeyEnvelope::decode("a").is_err());
}

proptest! {
    #[test]
    fn base64url_round_trips_arbitrary_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let suite = SodiumSuite;
        let encoded = suite.base64_url_encode(&bytes);
        let decoded = suite.base64_url_decode(&encoded).unwrap();
        prop_assert_eq!(decoded, bytes);
    }

    #[test]
    fn sodium_secret_box_round_trips_arbitrary_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let suite = SodiumSuite;
        let key = suite.random_key();
        let nonce = suite.random_nonce();
        let ct = suite.encrypt_secret(&key, &plaintext, &nonce).unwrap();
        let pt = suite.decrypt_secret(&key, &ct, &nonce).unwrap();
        prop_assert_eq!(pt, plaintext);
    }
}
