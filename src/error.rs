//! Crate-wide error taxonomy.
//!
//! Every failure aborts the whole hybrid operation; there is no partial
//! success, and nothing is retried internally. Error messages carry field
//! names and byte counts only, never key or secret material.

use thiserror::Error;

/// Identifies which buffer failed length validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    PublicKey,
    PrivateKey,
    KemCiphertext,
    SharedSecret,
    Nonce,
    Tag,
}

impl BufferKind {
    pub fn label(self) -> &'static str {
        match self {
            BufferKind::PublicKey => "public key",
            BufferKind::PrivateKey => "private key",
            BufferKind::KemCiphertext => "KEM ciphertext",
            BufferKind::SharedSecret => "shared secret",
            BufferKind::Nonce => "nonce",
            BufferKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for BufferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// A key or ciphertext buffer disagrees with the size table for the
    /// selected parameter set. Always a caller bug; never retried.
    #[error("{field} length mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        field: BufferKind,
        expected: usize,
        actual: usize,
    },

    /// The symmetric key handed to the AEAD stage was not exactly 32 bytes.
    #[error("AEAD key must be exactly 32 bytes")]
    InvalidKeyLength,

    /// Tag verification failed: tampering, or a wrong key/nonce/tag
    /// combination. No plaintext is released.
    #[error("authentication tag verification failed")]
    AuthenticationFailure,

    /// The cryptographic backend reported an internal error. Fatal to the
    /// current operation; retrying with the same inputs cannot succeed.
    #[error("cryptographic backend failure: {0}")]
    PrimitiveFailure(String),

    /// A serialized envelope could not be parsed.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// An algorithm name did not match any supported parameter set.
    #[error("unsupported KEM algorithm '{0}'")]
    UnknownAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
