//! Payload encryption collaborators.
//!
//! Provides AES-256-GCM envelope encryption with a pre-shared key.

use crate::{
    error::{VaultError, VaultResult},
    models::{EncryptedEnvelope, EncryptedResponse},
};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Encrypts request bodies and decrypts response bodies.
pub trait PayloadEncryptor: Send + Sync {
    /// Whether the collaborator is usable at all.
    fn is_enabled(&self) -> bool;

    /// Wrap a serialized request body.
    ///
    /// # Errors
    ///
    /// Returns `Encryption` if the payload cannot be encrypted.
    fn encrypt(&self, plaintext: &[u8]) -> VaultResult<EncryptedEnvelope>;

    /// Unwrap an encrypted response body.
    ///
    /// # Errors
    ///
    /// Returns `Encryption` if decoding or authentication fails.
    fn decrypt(&self, response: &EncryptedResponse) -> VaultResult<Vec<u8>>;
}

/// Encryptor that is always disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEncryptor;

impl PayloadEncryptor for DisabledEncryptor {
    fn is_enabled(&self) -> bool {
        false
    }

    fn encrypt(&self, _plaintext: &[u8]) -> VaultResult<EncryptedEnvelope> {
        Err(VaultError::encryption("encryption is disabled"))
    }

    fn decrypt(&self, _response: &EncryptedResponse) -> VaultResult<Vec<u8>> {
        Err(VaultError::encryption("encryption is disabled"))
    }
}

/// AES-256-GCM with a key shared with the vault service.
pub struct AesGcmEncryptor {
    cipher: Aes256Gcm,
}

impl AesGcmEncryptor {
    /// Creates an encryptor from a raw 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the key is not 32 bytes.
    pub fn new(key: &[u8]) -> VaultResult<Self> {
        if key.len() != KEY_LEN {
            return Err(VaultError::invalid_config(
                "encryption key must be 32 bytes for AES-256",
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| VaultError::invalid_config("invalid encryption key"))?;
        Ok(Self { cipher })
    }

    /// Creates an encryptor from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the key is not valid base64 or not 32 bytes.
    pub fn from_base64_key(encoded: &str) -> VaultResult<Self> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::invalid_config(format!("encryption key: {e}")))?;
        Self::new(&key)
    }
}

impl std::fmt::Debug for AesGcmEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmEncryptor").finish_non_exhaustive()
    }
}

impl PayloadEncryptor for AesGcmEncryptor {
    fn is_enabled(&self) -> bool {
        true
    }

    fn encrypt(&self, plaintext: &[u8]) -> VaultResult<EncryptedEnvelope> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // Ciphertext carries the 16-byte tag appended.
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VaultError::encryption(format!("AES-GCM encrypt failed: {e}")))?;

        Ok(EncryptedEnvelope {
            payload: STANDARD.encode(ciphertext),
            session_key: None,
            iv: STANDARD.encode(nonce_bytes),
        })
    }

    fn decrypt(&self, response: &EncryptedResponse) -> VaultResult<Vec<u8>> {
        let iv = STANDARD
            .decode(&response.iv)
            .map_err(|e| VaultError::encryption(format!("invalid iv encoding: {e}")))?;
        if iv.len() != NONCE_LEN {
            return Err(VaultError::encryption("invalid iv length"));
        }
        let ciphertext = STANDARD
            .decode(&response.payload)
            .map_err(|e| VaultError::encryption(format!("invalid payload encoding: {e}")))?;

        self.cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| VaultError::encryption("AES-GCM decrypt failed: authentication failed"))
    }
}
