// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn test_cipher() -> AesGcmCipher {
    AesGcmCipher::new(&[7u8; 32])
}

#[test]
fn encrypt_then_decrypt_roundtrips() {
    let cipher = test_cipher();
    let ciphertext = cipher.encrypt("super-secret-token").unwrap();
    assert_ne!(ciphertext, "super-secret-token");
    assert_eq!(cipher.decrypt(&ciphertext).unwrap(), "super-secret-token");
}

#[test]
fn encrypting_twice_produces_different_ciphertext() {
    let cipher = test_cipher();
    let a = cipher.encrypt("value").unwrap();
    let b = cipher.encrypt("value").unwrap();
    assert_ne!(a, b, "nonce must be fresh per encryption");
}

#[test]
fn decrypting_with_the_wrong_key_fails() {
    let cipher_a = AesGcmCipher::new(&[1u8; 32]);
    let cipher_b = AesGcmCipher::new(&[2u8; 32]);
    let ciphertext = cipher_a.encrypt("value").unwrap();
    assert!(cipher_b.decrypt(&ciphertext).is_err());
}

#[test]
fn decrypting_malformed_base64_fails() {
    let cipher = test_cipher();
    assert!(matches!(
        cipher.decrypt("not valid base64!!"),
        Err(CipherError::Malformed(_))
    ));
}

#[test]
fn decrypting_truncated_ciphertext_fails() {
    let cipher = test_cipher();
    let short = base64::engine::general_purpose::STANDARD.encode(b"short");
    assert!(matches!(
        cipher.decrypt(&short),
        Err(CipherError::Malformed(_))
    ));
}
