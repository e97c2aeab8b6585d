//! # Encrypted-Token Decryption
//!
//! Decrypts compact JWE tokens with the configured RSA private key. A token
//! is accepted when the content-encryption key unwraps and the AES-GCM tag
//! verifies; the plaintext is never inspected.
//!
//! Supported: `alg` RSA-OAEP / RSA-OAEP-256, `enc` A128GCM / A192GCM /
//! A256GCM. Everything else fails the same way as a bad tag.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use jwtgw_core::header::{GCM_IV_LEN, GCM_TAG_LEN};
use jwtgw_core::{ContentEncryption, DecryptionError, EncryptedToken, KeyManagementAlgorithm};
use rand_core::OsRng;
use rsa::Oaep;
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::keys::KeyMaterial;

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

const FAILED: DecryptionError = DecryptionError::DecryptionFailed;

/// Decrypt an encrypted token and discard the plaintext.
pub fn decrypt(token: &EncryptedToken<'_>, keys: &KeyMaterial) -> Result<(), DecryptionError> {
    let jwe = token.parse()?;

    let padding = match jwe.header.key_management() {
        KeyManagementAlgorithm::RsaOaep => Oaep::new::<Sha1>(),
        KeyManagementAlgorithm::RsaOaep256 => Oaep::new::<Sha256>(),
        KeyManagementAlgorithm::Unsupported(_) => return Err(FAILED),
    };
    let enc = jwe.header.content_encryption();
    let key_len = enc.key_len().ok_or(FAILED)?;
    if jwe.iv.len() != GCM_IV_LEN || jwe.tag.len() != GCM_TAG_LEN {
        return Err(FAILED);
    }

    let cek = Zeroizing::new(
        keys.rsa_decrypt_key()
            .decrypt_blinded(&mut OsRng, padding, &jwe.encrypted_key)
            .map_err(|_| FAILED)?,
    );
    if cek.len() != key_len {
        return Err(FAILED);
    }

    let mut sealed = Vec::with_capacity(jwe.ciphertext.len() + GCM_TAG_LEN);
    sealed.extend_from_slice(&jwe.ciphertext);
    sealed.extend_from_slice(&jwe.tag);

    let _plaintext = match enc {
        ContentEncryption::A128Gcm => open::<Aes128Gcm>(&cek, &jwe.iv, &sealed, jwe.aad),
        ContentEncryption::A192Gcm => open::<Aes192Gcm>(&cek, &jwe.iv, &sealed, jwe.aad),
        ContentEncryption::A256Gcm => open::<Aes256Gcm>(&cek, &jwe.iv, &sealed, jwe.aad),
        ContentEncryption::Unsupported(_) => Err(FAILED),
    }?;
    Ok(())
}

/// AES-GCM open. `iv` must already be [`GCM_IV_LEN`] bytes.
fn open<C>(
    cek: &[u8],
    iv: &[u8],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, DecryptionError>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(cek).map_err(|_| FAILED)?;
    let nonce = Nonce::<C>::from_slice(iv);
    cipher
        .decrypt(nonce, Payload { msg: sealed, aad })
        .map(Zeroizing::new)
        .map_err(|_| FAILED)
}
