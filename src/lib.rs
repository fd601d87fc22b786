//! Hybrid post-quantum envelope encryption.
//!
//! Composes an ML-KEM key encapsulation (NIST FIPS 203, via the external
//! `ml-kem` crate) with ChaCha20-Poly1305 authenticated encryption: the KEM
//! establishes a fresh 32-byte shared secret for the recipient, the AEAD
//! seals the payload under it, and the secret itself is zeroed before the
//! call returns. Secure against both classical and quantum adversaries as
//! long as the underlying lattice problem holds.
//!
//! The crate exposes two operations, [`encrypt_hybrid`] and
//! [`decrypt_hybrid`], plus the per-variant size table as queryable
//! metadata. Every buffer crossing a boundary is validated against that
//! table; a length mismatch is an error, never a truncation.
//!
//! All operations are pure functions over their inputs: no shared state, no
//! locks, safe to call concurrently from any number of threads.

pub mod aead;
pub mod error;
pub mod hybrid;
pub mod kem;
pub mod validate;
pub mod variant;

pub use aead::{AeadSealed, AEAD_KEY_BYTES, AEAD_NONCE_BYTES, AEAD_TAG_BYTES};
pub use error::{BufferKind, EnvelopeError};
pub use hybrid::{
    decrypt_hybrid, decrypt_hybrid_with, encrypt_hybrid, encrypt_hybrid_with, HybridEnvelope,
    ENVELOPE_VERSION,
};
pub use kem::{KemProvider, MlKemBackend, SharedSecret};
pub use validate::{
    validate_kem_ciphertext, validate_private_key, validate_public_key, validate_shared_secret,
};
pub use variant::{KemVariant, VariantSizes, SHARED_SECRET_BYTES};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version
pub fn get_version() -> &'static str {
    VERSION
}
