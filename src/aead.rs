//! Authenticated symmetric stage — ChaCha20-Poly1305 (IETF) with detached tag.
//!
//! 32-byte key, 12-byte nonce, 16-byte tag. Ciphertext length always equals
//! plaintext length. A fresh nonce is drawn from the OS random source on
//! every seal; callers can never supply their own, since nonce reuse under
//! one key is a fatal protocol violation.

use chacha20poly1305::aead::AeadInPlace;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce, Tag};
use rand::RngCore;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::error::{BufferKind, EnvelopeError, Result};

pub const AEAD_KEY_BYTES: usize = 32;
pub const AEAD_NONCE_BYTES: usize = 12;
pub const AEAD_TAG_BYTES: usize = 16;

/// Output of a single seal operation.
///
/// All three parts are required together to decrypt; none is meaningful
/// alone, and none of them is secret.
#[derive(Debug, Clone)]
pub struct AeadSealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; AEAD_NONCE_BYTES],
    pub tag: [u8; AEAD_TAG_BYTES],
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce.
///
/// # Arguments
/// * `key` - 32-byte symmetric key
/// * `plaintext` - payload of arbitrary length (may be empty)
/// * `associated_data` - optional data bound into the tag but not encrypted
///
/// # Returns
/// Ciphertext, nonce, and tag as independent buffers.
pub fn seal(key: &[u8], plaintext: &[u8], associated_data: Option<&[u8]>) -> Result<AeadSealed> {
    if key.len() != AEAD_KEY_BYTES {
        return Err(EnvelopeError::InvalidKeyLength);
    }
    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|_| EnvelopeError::InvalidKeyLength)?;

    let mut nonce_bytes = [0u8; AEAD_NONCE_BYTES];
    OsRng.fill_bytes(&mut nonce_bytes);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(
            Nonce::from_slice(&nonce_bytes),
            associated_data.unwrap_or(&[]),
            &mut buffer,
        )
        .map_err(|_| EnvelopeError::PrimitiveFailure("AEAD encryption failed".into()))?;

    Ok(AeadSealed {
        ciphertext: buffer,
        nonce: nonce_bytes,
        tag: tag.into(),
    })
}

/// Decrypt and authenticate a sealed payload.
///
/// Fails closed: the tag is verified over the ciphertext before any
/// decryption happens, so no unauthenticated plaintext ever exists.
///
/// # Arguments
/// * `key` - 32-byte symmetric key
/// * `ciphertext` - sealed payload
/// * `nonce` - 12-byte nonce from the matching seal
/// * `tag` - 16-byte authentication tag from the matching seal
/// * `associated_data` - must match the value given at seal time
pub fn open(
    key: &[u8],
    ciphertext: &[u8],
    nonce: &[u8],
    tag: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>> {
    if key.len() != AEAD_KEY_BYTES {
        return Err(EnvelopeError::InvalidKeyLength);
    }
    if nonce.len() != AEAD_NONCE_BYTES {
        return Err(EnvelopeError::SizeMismatch {
            field: BufferKind::Nonce,
            expected: AEAD_NONCE_BYTES,
            actual: nonce.len(),
        });
    }
    if tag.len() != AEAD_TAG_BYTES {
        return Err(EnvelopeError::SizeMismatch {
            field: BufferKind::Tag,
            expected: AEAD_TAG_BYTES,
            actual: tag.len(),
        });
    }

    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|_| EnvelopeError::InvalidKeyLength)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            associated_data.unwrap_or(&[]),
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| EnvelopeError::AuthenticationFailure)?;

    Ok(Zeroizing::new(buffer))
}
