use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::Mac;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = hmac::Hmac<Sha256>;

/// Static application salt for key derivation. Changing it invalidates every
/// stored ciphertext, so it is versioned into the constant.
const KEY_SALT: &[u8] = b"herald-credentials-v1";

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("master secret is not configured")]
    MissingSecret,
    #[error("malformed ciphertext: {0}")]
    Malformed(String),
    #[error("ciphertext failed authentication")]
    Authentication,
    #[error("encryption failed")]
    Encryption,
}

/// Symmetric encryption for credentials at rest.
///
/// The 256-bit key is stretched deterministically from the master secret via
/// HMAC-SHA256 with a static salt, so the same secret always yields the same
/// key. Output format is `iv_hex:cipher_hex:tag_hex`; each encryption draws a
/// fresh random IV, and the GCM tag makes any tampering fail `decrypt`.
pub struct CryptoBox {
    cipher: Aes256Gcm,
}

fn derive_key(master_secret: &str) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(KEY_SALT).expect("HMAC accepts any key length");
    mac.update(master_secret.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

impl CryptoBox {
    pub fn new(master_secret: &str) -> Result<Self, CryptoError> {
        if master_secret.is_empty() {
            return Err(CryptoError::MissingSecret);
        }
        let key = derive_key(master_secret);
        let cipher =
            Aes256Gcm::new_from_slice(&key).expect("32-byte key is valid for AES-256");
        Ok(Self { cipher })
    }

    /// Encrypt a plaintext value into `iv_hex:cipher_hex:tag_hex`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let iv: [u8; IV_LEN] = rand::random();
        let nonce = Nonce::from_slice(&iv);

        let sealed = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;

        // aes-gcm appends the tag to the ciphertext; carry it as its own segment.
        let (cipher_bytes, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(iv),
            hex::encode(cipher_bytes),
            hex::encode(tag)
        ))
    }

    /// Decrypt an `iv_hex:cipher_hex:tag_hex` value back to plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let segments: Vec<&str> = encoded.split(':').collect();
        if segments.len() != 3 {
            return Err(CryptoError::Malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let iv = hex::decode(segments[0])
            .map_err(|_| CryptoError::Malformed("iv segment is not hex".to_string()))?;
        let cipher_bytes = hex::decode(segments[1])
            .map_err(|_| CryptoError::Malformed("cipher segment is not hex".to_string()))?;
        let tag = hex::decode(segments[2])
            .map_err(|_| CryptoError::Malformed("tag segment is not hex".to_string()))?;

        if iv.len() != IV_LEN {
            return Err(CryptoError::Malformed(format!(
                "iv must be {} bytes, found {}",
                IV_LEN,
                iv.len()
            )));
        }
        if tag.len() != TAG_LEN {
            return Err(CryptoError::Malformed(format!(
                "tag must be {} bytes, found {}",
                TAG_LEN,
                tag.len()
            )));
        }

        let mut sealed = cipher_bytes;
        sealed.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
            .map_err(|_| CryptoError::Authentication)?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Malformed("plaintext is not utf-8".to_string()))
    }
}
