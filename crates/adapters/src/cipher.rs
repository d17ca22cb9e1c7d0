// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symmetric encryption for secret environment binding values at rest.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed")]
    Decrypt,
    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}

/// Encrypts and decrypts secret env binding values. Ciphertext returned by
/// `encrypt` is what gets stored in [`hub_core::RobotEnvBinding::value`].
pub trait Cipher: Send + Sync + 'static {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// AES-256-GCM cipher. Ciphertext is base64(nonce || tag || data).
pub struct AesGcmCipher {
    key: Aes256Gcm,
}

impl AesGcmCipher {
    /// Build a cipher from a 32-byte key.
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        Self {
            key: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key_bytes)),
        }
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .key
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut payload = Vec::with_capacity(nonce.len() + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let payload = BASE64
            .decode(ciphertext)
            .map_err(|e| CipherError::Malformed(e.to_string()))?;
        if payload.len() < 12 {
            return Err(CipherError::Malformed("ciphertext too short".to_string()));
        }
        let (nonce_bytes, data) = payload.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .key
            .decrypt(nonce, data)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|e| CipherError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "cipher_tests.rs"]
mod tests;
