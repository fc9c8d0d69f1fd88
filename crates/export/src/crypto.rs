use crate::error::ExportError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// PBKDF2 rounds used when a payload does not say otherwise. Also the floor.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Upper bound accepted from a payload, so a hostile file can't pin the CPU.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Password-encrypted text, every binary field base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub salt: String,
    pub iv: String,
    /// AES-GCM output; the authentication tag is the trailing 16 bytes.
    pub ciphertext: String,
    /// PBKDF2 rounds, omitted when it is the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

impl EncryptedPayload {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(raw)?)
    }

    fn kdf_iterations(&self) -> Result<u32, ExportError> {
        let iterations = self.iterations.unwrap_or(DEFAULT_KDF_ITERATIONS);
        if !(DEFAULT_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&iterations) {
            return Err(ExportError::InvalidPayload(format!(
                "iteration count {iterations} is outside {DEFAULT_KDF_ITERATIONS}..={MAX_KDF_ITERATIONS}"
            )));
        }
        Ok(iterations)
    }
}

/// Encrypts text under a key derived from a password (PBKDF2-HMAC-SHA256 → AES-256-GCM).
///
/// Every call draws a fresh salt and IV, so encrypting the same text twice
/// never produces the same payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCipher {
    iterations: u32,
}

impl PasswordCipher {
    pub fn new(iterations: u32) -> Result<Self, ExportError> {
        if iterations < DEFAULT_KDF_ITERATIONS {
            return Err(ExportError::WeakKeyDerivation {
                requested: iterations,
                minimum: DEFAULT_KDF_ITERATIONS,
            });
        }
        if iterations > MAX_KDF_ITERATIONS {
            return Err(ExportError::InvalidPayload(format!(
                "iteration count {iterations} exceeds {MAX_KDF_ITERATIONS}"
            )));
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub async fn encrypt(&self, plain_text: &str, password: &str) -> Result<EncryptedPayload, ExportError> {
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let key = derive_key(password, salt.to_vec(), self.iterations).await?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plain_text.as_bytes())
            .map_err(|_| ExportError::Encryption)?;

        Ok(EncryptedPayload {
            salt: BASE64.encode(salt),
            iv: BASE64.encode(iv),
            ciphertext: BASE64.encode(ciphertext),
            iterations: (self.iterations != DEFAULT_KDF_ITERATIONS).then_some(self.iterations),
        })
    }

    /// Decrypts a payload produced by any `PasswordCipher`.
    ///
    /// The iteration count comes from the payload, not from `self`. A wrong
    /// password or any altered byte yields `ExportError::Authentication`.
    pub async fn decrypt(&self, payload: &EncryptedPayload, password: &str) -> Result<String, ExportError> {
        let salt = decode_field("salt", &payload.salt)?;
        let iv = decode_field("iv", &payload.iv)?;
        if iv.len() != IV_LEN {
            return Err(ExportError::InvalidPayload(format!(
                "iv must be {IV_LEN} bytes, got {}",
                iv.len()
            )));
        }
        let ciphertext = decode_field("ciphertext", &payload.ciphertext)?;

        let key = derive_key(password, salt, payload.kdf_iterations()?).await?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let plain = cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| ExportError::Authentication)?;

        String::from_utf8(plain).map_err(|_| ExportError::InvalidPayload("decrypted data is not UTF-8".to_string()))
    }
}

impl Default for PasswordCipher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

/// Encrypts `plain_text` with the default key-derivation cost.
pub async fn encrypt_string(plain_text: &str, password: &str) -> Result<EncryptedPayload, ExportError> {
    PasswordCipher::default().encrypt(plain_text, password).await
}

pub async fn decrypt_string(payload: &EncryptedPayload, password: &str) -> Result<String, ExportError> {
    PasswordCipher::default().decrypt(payload, password).await
}

/// Stretches the password on the blocking pool; PBKDF2 is deliberately slow.
async fn derive_key(password: &str, salt: Vec<u8>, iterations: u32) -> Result<[u8; KEY_LEN], ExportError> {
    let password = password.to_owned();
    let key = tokio::task::spawn_blocking(move || {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);
        key
    })
    .await?;
    Ok(key)
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, ExportError> {
    BASE64
        .decode(value)
        .map_err(|source| ExportError::Base64 { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_text() {
        let text = "{\"trades\":[]} – ünïcödé ✓";
        let payload = encrypt_string(text, "hunter2").await.unwrap();
        assert_eq!(decrypt_string(&payload, "hunter2").await.unwrap(), text);
    }

    #[tokio::test]
    async fn payload_fields_have_expected_sizes() {
        let payload = encrypt_string("abc", "pw").await.unwrap();
        assert_eq!(BASE64.decode(&payload.salt).unwrap().len(), SALT_LEN);
        assert_eq!(BASE64.decode(&payload.iv).unwrap().len(), IV_LEN);
        // 3 bytes of text + 16 byte tag.
        assert_eq!(BASE64.decode(&payload.ciphertext).unwrap().len(), 3 + 16);
        assert_eq!(payload.iterations, None);
    }

    #[tokio::test]
    async fn salt_and_iv_are_fresh_per_call() {
        let first = encrypt_string("same", "pw").await.unwrap();
        let second = encrypt_string("same", "pw").await.unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[tokio::test]
    async fn wrong_password_is_an_authentication_error() {
        let payload = encrypt_string("secret", "right").await.unwrap();
        let err = decrypt_string(&payload, "wrong").await.unwrap_err();
        assert!(matches!(err, ExportError::Authentication), "{err:?}");
    }

    #[tokio::test]
    async fn tampering_is_an_authentication_error() {
        let mut payload = encrypt_string("secret", "pw").await.unwrap();
        let mut bytes = BASE64.decode(&payload.ciphertext).unwrap();
        bytes[0] ^= 0x01;
        payload.ciphertext = BASE64.encode(bytes);

        let err = decrypt_string(&payload, "pw").await.unwrap_err();
        assert!(matches!(err, ExportError::Authentication), "{err:?}");
    }

    #[tokio::test]
    async fn malformed_fields_are_not_authentication_errors() {
        let mut payload = encrypt_string("secret", "pw").await.unwrap();
        payload.iv = "%%%".to_string();
        let err = decrypt_string(&payload, "pw").await.unwrap_err();
        assert!(matches!(err, ExportError::Base64 { field: "iv", .. }), "{err:?}");

        payload.iv = BASE64.encode([0u8; 8]);
        let err = decrypt_string(&payload, "pw").await.unwrap_err();
        assert!(matches!(err, ExportError::InvalidPayload(_)), "{err:?}");
    }

    #[tokio::test]
    async fn custom_iterations_travel_with_the_payload() {
        let cipher = PasswordCipher::new(120_000).unwrap();
        let payload = cipher.encrypt("hello", "pw").await.unwrap();
        assert_eq!(payload.iterations, Some(120_000));

        // A default cipher still decrypts it.
        assert_eq!(decrypt_string(&payload, "pw").await.unwrap(), "hello");

        let json = payload.to_json().unwrap();
        assert_eq!(EncryptedPayload::from_json(&json).unwrap(), payload);
    }

    #[test]
    fn weak_iteration_counts_are_rejected() {
        assert!(matches!(
            PasswordCipher::new(1_000),
            Err(ExportError::WeakKeyDerivation { requested: 1_000, minimum: DEFAULT_KDF_ITERATIONS })
        ));
    }

    #[tokio::test]
    async fn payload_iteration_bounds_are_enforced() {
        let mut payload = encrypt_string("x", "pw").await.unwrap();
        payload.iterations = Some(1);
        assert!(matches!(
            decrypt_string(&payload, "pw").await,
            Err(ExportError::InvalidPayload(_))
        ));
    }
}
