//! Length validation applied at every boundary crossing.
//!
//! Buffers are checked before they reach the KEM backend and again when the
//! backend hands results back; a length field supplied from outside is
//! never trusted.

use crate::error::{BufferKind, EnvelopeError, Result};
use crate::variant::KemVariant;

fn check(field: BufferKind, expected: usize, bytes: &[u8]) -> Result<()> {
    if bytes.len() != expected {
        return Err(EnvelopeError::SizeMismatch {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Validate an encapsulation (public) key against the variant table.
pub fn validate_public_key(variant: KemVariant, bytes: &[u8]) -> Result<()> {
    check(BufferKind::PublicKey, variant.sizes().public_key, bytes)
}

/// Validate a decapsulation (private) key against the variant table.
pub fn validate_private_key(variant: KemVariant, bytes: &[u8]) -> Result<()> {
    check(BufferKind::PrivateKey, variant.sizes().private_key, bytes)
}

/// Validate a KEM ciphertext against the variant table.
pub fn validate_kem_ciphertext(variant: KemVariant, bytes: &[u8]) -> Result<()> {
    check(BufferKind::KemCiphertext, variant.sizes().kem_ciphertext, bytes)
}

/// Validate a shared secret returned by the KEM backend.
pub fn validate_shared_secret(variant: KemVariant, bytes: &[u8]) -> Result<()> {
    check(BufferKind::SharedSecret, variant.sizes().shared_secret, bytes)
}
