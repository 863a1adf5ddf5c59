//! TSV1 request signing: an `Authorization` header for anonymous/identity
//! calls, built from an Ed25519 signature over a BLAKE2b hash of a canonical
//! request string (spec §4.8).

use std::time::{SystemTime, UNIX_EPOCH};

use citadel_crypto::{CryptoSuite, SigningPrivateKey, SigningPublicKey};
use uuid::Uuid;

const SCHEME: &str = "TSV1-ED25519-BLAKE2B";

/// Signs individual requests. Stateless beyond the pre-derived key material —
/// safe to share across threads and to call concurrently.
pub struct RequestSigner<'a> {
    suite: &'a dyn CryptoSuite,
    client_id: Uuid,
    pub_sign: SigningPublicKey,
    priv_sign: SigningPrivateKey,
}

impl<'a> RequestSigner<'a> {
    pub fn new(
        suite: &'a dyn CryptoSuite,
        client_id: Uuid,
        pub_sign: SigningPublicKey,
        priv_sign: SigningPrivateKey,
    ) -> Self {
        Self {
            suite,
            client_id,
            pub_sign,
            priv_sign,
        }
    }

    /// Builds the `Authorization` header value for a request to `path` with
    /// `query` parameters (unsorted, unencoded — this function sorts and
    /// encodes them).
    pub fn sign(&self, method: &str, path: &str, query: &[(String, String)]) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs();
        let nonce = Uuid::new_v4();

        let header_string = format!(
            "{SCHEME}; {}; {timestamp}; {nonce}; uid:{}",
            self.suite.base64_url_encode(&self.pub_sign.0),
            self.client_id
        );

        let canonical_query = canonical_query_string(query);
        let canonical_string = format!("{path}; {canonical_query}; {method}; {header_string}");

        let hash = self.suite.hash_string(&canonical_string);
        let sig = self.suite.sign(&hash, &self.priv_sign);
        let sig_b64 = self.suite.base64_url_encode(&sig);

        format!("{header_string}; {sig_b64}")
    }
}

/// Sorts `query` lexicographically by name, preserving blank values, and
/// percent-encodes each component.
fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = query.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
