//! Large-file streaming envelope: header `"3".edk.edkN.` followed by an
//! XChaCha20-Poly1305 STREAM construction, chunked at 64 KiB with a
//! two-element sliding window to place the final tag correctly.
//!
//! Sodium suite only — the original NIST suite never grew a file mode, and
//! this carries that gap forward rather than inventing one.

use std::io::{Cursor, Read, Write};

use chacha20poly1305::aead::generic_array::GenericArray;
use chacha20poly1305::aead::stream::{DecryptorBE32, EncryptorBE32};
use chacha20poly1305::aead::{KeyInit, OsRng as StreamOsRng};
use chacha20poly1305::{consts::U19, Key as StreamKey, XChaCha20Poly1305};
use md5::{Digest, Md5};
use rand_core::RngCore;

use crate::error::CryptoError;
use crate::suite::{CryptoSuite, Mode, SymmetricKey};

pub const FILE_VERSION: &str = "3";
pub const CHUNK_SIZE: usize = 65_536;
const HEADER_SCAN_WINDOW: usize = 4096;
const STREAM_NONCE_LEN: usize = 19;

pub struct FileEncryptOutcome {
    /// Base64 (standard, padded) MD5 over every byte written to the sink.
    pub checksum_base64: String,
    pub bytes_written: u64,
}

pub struct FileStreamCodec;

impl FileStreamCodec {
    pub fn encrypt<R: Read, W: Write>(
        suite: &dyn CryptoSuite,
        ak: &SymmetricKey,
        source: &mut R,
        sink: &mut W,
    ) -> Result<FileEncryptOutcome, CryptoError> {
        require_sodium(suite)?;

        let dk = suite.random_key();
        let edk_nonce = suite.random_nonce();
        let edk = suite.encrypt_secret(ak, &*dk.0, &edk_nonce)?;

        let mut md5 = Md5::new();
        let mut bytes_written: u64 = 0;

        let header = format!(
            "{FILE_VERSION}.{}.{}.",
            crate::base64url::encode(&edk),
            crate::base64url::encode(&edk_nonce)
        );
        write_tracked(sink, &mut md5, &mut bytes_written, header.as_bytes())?;

        let mut stream_nonce = [0u8; STREAM_NONCE_LEN];
        StreamOsRng.fill_bytes(&mut stream_nonce);
        write_tracked(sink, &mut md5, &mut bytes_written, &stream_nonce)?;

        let cipher = XChaCha20Poly1305::new(StreamKey::from_slice(&*dk.0));
        let mut encryptor = EncryptorBE32::from_aead(
            cipher,
            GenericArray::<u8, U19>::from_slice(&stream_nonce),
        );

        let mut window = [read_chunk(source)?, read_chunk(source)?];
        loop {
            let current = window[0].take().unwrap_or_default();
            let is_final = window[1].is_none();
            let sealed = if is_final {
                encryptor
                    .encrypt_last(current.as_slice())
                    .map_err(|_| CryptoError::DecryptionFailed)?
            } else {
                encryptor
                    .encrypt_next(current.as_slice())
                    .map_err(|_| CryptoError::DecryptionFailed)?
            };
            write_tracked(sink, &mut md5, &mut bytes_written, &sealed)?;
            if is_final {
                break;
            }
            window[0] = window[1].take();
            window[1] = read_chunk(source)?;
        }

        Ok(FileEncryptOutcome {
            checksum_base64: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                md5.finalize(),
            ),
            bytes_written,
        })
    }

    pub fn decrypt<R: Read, W: Write>(
        suite: &dyn CryptoSuite,
        ak: &SymmetricKey,
        source: &mut R,
        sink: &mut W,
    ) -> Result<(), CryptoError> {
        require_sodium(suite)?;

        let mut lookahead = vec![0u8; HEADER_SCAN_WINDOW];
        let filled = read_fill(source, &mut lookahead)?;
        lookahead.truncate(filled);

        let header_end = find_third_dot(&lookahead).ok_or(CryptoError::InvalidEnvelope)?;
        let header_str = std::str::from_utf8(&lookahead[..header_end])
            .map_err(|_| CryptoError::InvalidEnvelope)?;
        let mut fields = header_str.trim_end_matches('.').splitn(3, '.');
        let version = fields.next().ok_or(CryptoError::InvalidEnvelope)?;
        let edk_b64 = fields.next().ok_or(CryptoError::InvalidEnvelope)?;
        let edk_nonce_b64 = fields.next().ok_or(CryptoError::InvalidEnvelope)?;

        if version != FILE_VERSION {
            return Err(CryptoError::UnsupportedFileVersion);
        }

        let edk = crate::base64url::decode(edk_b64)?;
        let edk_nonce = crate::base64url::decode(edk_nonce_b64)?;
        let dk_bytes = suite.decrypt_secret(ak, &edk, &edk_nonce)?;
        if dk_bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: dk_bytes.len(),
            });
        }

        let mut reader = Cursor::new(lookahead[header_end..].to_vec()).chain(source);

        let mut stream_nonce = [0u8; STREAM_NONCE_LEN];
        reader.read_exact(&mut stream_nonce)?;

        let cipher = XChaCha20Poly1305::new(StreamKey::from_slice(&dk_bytes));
        let mut decryptor = DecryptorBE32::from_aead(
            cipher,
            GenericArray::<u8, U19>::from_slice(&stream_nonce),
        );

        let mut window = [
            read_chunk(&mut reader)?,
            read_chunk(&mut reader)?,
        ];
        loop {
            let current = window[0].take().unwrap_or_default();
            let is_final = window[1].is_none();
            // A sealed MESSAGE/FINAL chunk carries a 16-byte Poly1305 tag on top
            // of the plaintext chunk size.
            let opened = if is_final {
                decryptor
                    .decrypt_last(current.as_slice())
                    .map_err(|_| CryptoError::DecryptionFailed)?
            } else {
                decryptor
                    .decrypt_next(current.as_slice())
                    .map_err(|_| CryptoError::DecryptionFailed)?
            };
            sink.write_all(&opened)?;
            if is_final {
                break;
            }
            window[0] = window[1].take();
            window[1] = read_chunk(&mut reader)?;
        }

        Ok(())
    }
}

fn require_sodium(suite: &dyn CryptoSuite) -> Result<(), CryptoError> {
    if suite.mode() != Mode::Sodium {
        return Err(CryptoError::FileModeUnsupportedForSuite);
    }
    Ok(())
}

fn write_tracked<W: Write>(
    sink: &mut W,
    md5: &mut Md5,
    bytes_written: &mut u64,
    bytes: &[u8],
) -> Result<(), CryptoError> {
    sink.write_all(bytes)?;
    md5.update(bytes);
    *bytes_written += bytes.len() as u64;
    Ok(())
}

/// Read up to `CHUNK_SIZE` plaintext bytes. Returns `None` once the source is
/// exhausted — the sentinel the sliding window uses to place the FINAL tag.
fn read_chunk<R: Read>(source: &mut R) -> Result<Option<Vec<u8>>, CryptoError> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let n = read_fill(source, &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(buf))
}

/// Fill `buf` as much as possible before EOF (a single `Read::read` call may
/// return short reads well before the end of the stream).
fn read_fill<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize, CryptoError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn find_third_dot(bytes: &[u8]) -> Option<usize> {
    let mut seen = 0;
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'.' {
            seen += 1;
            if seen == 3 {
                return Some(i + 1);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sodium::SodiumSuite;

    fn round_trip(plaintext: &[u8]) {
        let suite = SodiumSuite;
        let ak = suite.random_key();

        let mut ciphertext = Vec::new();
        let outcome =
            FileStreamCodec::encrypt(&suite, &ak, &mut std::io::Cursor::new(plaintext), &mut ciphertext)
                .unwrap();
        assert_eq!(outcome.bytes_written as usize, ciphertext.len());

        let mut recovered = Vec::new();
        FileStreamCodec::decrypt(&suite, &ak, &mut std::io::Cursor::new(&ciphertext), &mut recovered)
            .unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn empty_file_round_trips() {
        round_trip(b"");
    }

    #[test]
    fn small_file_round_trips() {
        round_trip(b"hello, this is a small file");
    }

    #[test]
    fn exact_chunk_boundary_round_trips() {
        round_trip(&vec![0x42u8; CHUNK_SIZE]);
    }

    #[test]
    fn multi_chunk_file_round_trips() {
        let mut data = vec![0u8; CHUNK_SIZE * 2 + 1234];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        round_trip(&data);
    }

    #[test]
    fn wrong_version_is_rejected_before_any_plaintext_emitted() {
        let suite = SodiumSuite;
        let ak = suite.random_key();
        let bogus = b"9.AQ.AQ.rest-of-stream-does-not-matter".to_vec();
        let mut recovered = Vec::new();
        let err = FileStreamCodec::decrypt(&suite, &ak, &mut std::io::Cursor::new(&bogus), &mut recovered)
            .unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedFileVersion));
        assert!(recovered.is_empty());
    }
}
