//! Wire codecs for the two dotted-segment envelope formats: the four-segment
//! encrypted field `edk.edkN.ef.efN` and the two-segment EAK `eak.nonce`.

use crate::error::CryptoError;

/// The decoded four segments of an encrypted field envelope, each raw bytes.
pub struct FieldEnvelope {
    pub edk: Vec<u8>,
    pub edk_nonce: Vec<u8>,
    pub ef: Vec<u8>,
    pub ef_nonce: Vec<u8>,
}

impl FieldEnvelope {
    pub fn encode(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            crate::base64url::encode(&self.edk),
            crate::base64url::encode(&self.edk_nonce),
            crate::base64url::encode(&self.ef),
            crate::base64url::encode(&self.ef_nonce),
        )
    }

    pub fn decode(wire: &str) -> Result<Self, CryptoError> {
        let segments: Vec<&str> = wire.split('.').collect();
        let [edk, edk_nonce, ef, ef_nonce] = segments.as_slice() else {
            return Err(CryptoError::InvalidEnvelope);
        };
        Ok(Self {
            edk: decode_non_empty(edk)?,
            edk_nonce: decode_non_empty(edk_nonce)?,
            ef: decode_non_empty(ef)?,
            ef_nonce: decode_non_empty(ef_nonce)?,
        })
    }
}

/// The decoded two segments of an EAK envelope: ciphertext and nonce.
pub struct AccessKeyEnvelope {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl AccessKeyEnvelope {
    pub fn encode(&self) -> String {
        format!(
            "{}.{}",
            crate::base64url::encode(&self.ciphertext),
            crate::base64url::encode(&self.nonce),
        )
    }

    pub fn decode(wire: &str) -> Result<Self, CryptoError> {
        let segments: Vec<&str> = wire.split('.').collect();
        let [ciphertext, nonce] = segments.as_slice() else {
            return Err(CryptoError::InvalidAccessKeyFormat);
        };
        Ok(Self {
            ciphertext: decode_non_empty(ciphertext)?,
            nonce: decode_non_empty(nonce)?,
        })
    }
}

fn decode_non_empty(segment: &str) -> Result<Vec<u8>, CryptoError> {
    let bytes = crate::base64url::decode(segment)?;
    if bytes.is_empty() {
        return Err(CryptoError::EmptySegment);
    }
    Ok(bytes)
}
