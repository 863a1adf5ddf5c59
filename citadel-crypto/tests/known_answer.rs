//! Known-answer vectors from the system's published test fixtures.

use citadel_crypto::{CryptoSuite, SodiumSuite};

/// BLAKE2b hash and Ed25519 signature over the TSV1 canonical string fixture.
#[test]
fn tsv1_canonical_string_hash_and_signature_match_fixture() {
    let suite = SodiumSuite;

    let priv_sign_b64 =
        "d55u6bLR9tkMVA4OwYIPepOOeXVSHHEit8VoXGRMQiaf5wKRk9gooP9pN3LBJ28BIW9fZ9-ZZPLVsHtuPqkRSQ";
    let priv_bytes = suite.base64_url_decode(priv_sign_b64).unwrap();
    assert_eq!(priv_bytes.len(), 64);
    let mut priv_arr = [0u8; 64];
    priv_arr.copy_from_slice(&priv_bytes);
    let priv_sign = citadel_crypto::SigningPrivateKey(zeroize::Zeroizing::new(priv_arr));

    let client_id = "0e8eb8c6-839f-46ca-9843-801c539e490f";
    let timestamp = "1000000000";
    let nonce = "59a7d5b6-35d2-41fd-99b2-066a07bd1632";
    let method = "POST";
    let path = "/x/y%2Fz";
    let canonical_query = "bar=baz&foo=quux";

    let mut pub_sign_seed = [0u8; 32];
    pub_sign_seed.copy_from_slice(&priv_bytes[32..]);
    let pub_sign_b64 = suite.base64_url_encode(&pub_sign_seed);

    let header_string =
        format!("TSV1-ED25519-BLAKE2B; {pub_sign_b64}; {timestamp}; {nonce}; uid:{client_id}");
    let canonical_string = format!("{path}; {canonical_query}; {method}; {header_string}");

    let hash = suite.hash_string(&canonical_string);
    assert_eq!(
        hex::encode(hash),
        "8e480794b093521ce2a1fa7e6f7afa394ff38b23869389f3165cdb15bfebfdc7"
    );

    let sig = suite.sign(&hash, &priv_sign);
    assert_eq!(
        suite.base64_url_encode(&sig),
        "Gz2ONHJF6kcUX-2yZdveMuSShDf709wciDhbifNBQeAaGqqMW7B6DbQYlZ7KykvIX1DHZ7tolTH6u-gXq_n5CQ"
    );
}
