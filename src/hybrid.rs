//! Hybrid envelope operations — KEM encapsulation composed with AEAD bulk
//! encryption.
//!
//! Flow: validate key lengths → encapsulate/decapsulate → seal/open under
//! the shared secret → return. Any validation or backend failure aborts the
//! whole operation; no partial result ever reaches the caller, and the
//! shared secret is zeroed before an error surfaces.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::aead::{self, AEAD_NONCE_BYTES, AEAD_TAG_BYTES};
use crate::error::{EnvelopeError, Result};
use crate::kem::{KemProvider, MlKemBackend};
use crate::validate;
use crate::variant::KemVariant;

/// Version byte of the serialized envelope layout.
pub const ENVELOPE_VERSION: u8 = 1;

const ENVELOPE_HEADER_BYTES: usize = 1 + 4 + 4 + 4;

/// Everything a recipient needs to decrypt, bundled.
///
/// The KEM ciphertext recovers the shared secret; ciphertext, nonce, and tag
/// are the AEAD output. None of the fields is secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridEnvelope {
    pub kem_ciphertext: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; AEAD_NONCE_BYTES],
    pub tag: [u8; AEAD_TAG_BYTES],
}

impl HybridEnvelope {
    /// Total serialized size in bytes.
    pub fn encoded_len(&self) -> usize {
        ENVELOPE_HEADER_BYTES
            + self.kem_ciphertext.len()
            + self.nonce.len()
            + self.tag.len()
            + self.ciphertext.len()
    }

    /// Serialize to a single buffer.
    /// Format: `[version:1][kem_len:4][nonce_len:4][tag_len:4][kem_ct][nonce][tag][ciphertext]`,
    /// lengths little-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(ENVELOPE_VERSION);
        out.extend_from_slice(&(self.kem_ciphertext.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.nonce.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.tag.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.kem_ciphertext);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse a buffer produced by [`HybridEnvelope::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENVELOPE_HEADER_BYTES {
            return Err(EnvelopeError::MalformedEnvelope("buffer shorter than header"));
        }
        if bytes[0] != ENVELOPE_VERSION {
            return Err(EnvelopeError::MalformedEnvelope("unsupported envelope version"));
        }

        let read_len = |range: std::ops::Range<usize>| -> Result<usize> {
            let raw: [u8; 4] = bytes[range]
                .try_into()
                .map_err(|_| EnvelopeError::MalformedEnvelope("bad length header"))?;
            Ok(u32::from_le_bytes(raw) as usize)
        };
        let kem_len = read_len(1..5)?;
        let nonce_len = read_len(5..9)?;
        let tag_len = read_len(9..13)?;

        if nonce_len != AEAD_NONCE_BYTES {
            return Err(EnvelopeError::MalformedEnvelope("unexpected nonce length"));
        }
        if tag_len != AEAD_TAG_BYTES {
            return Err(EnvelopeError::MalformedEnvelope("unexpected tag length"));
        }

        // Widen before summing so declared lengths cannot overflow the check
        let expected = ENVELOPE_HEADER_BYTES as u64 + kem_len as u64 + nonce_len as u64 + tag_len as u64;
        if (bytes.len() as u64) < expected {
            return Err(EnvelopeError::MalformedEnvelope("truncated payload"));
        }

        let mut offset = ENVELOPE_HEADER_BYTES;
        let kem_ciphertext = bytes[offset..offset + kem_len].to_vec();
        offset += kem_len;

        let mut nonce = [0u8; AEAD_NONCE_BYTES];
        nonce.copy_from_slice(&bytes[offset..offset + AEAD_NONCE_BYTES]);
        offset += AEAD_NONCE_BYTES;

        let mut tag = [0u8; AEAD_TAG_BYTES];
        tag.copy_from_slice(&bytes[offset..offset + AEAD_TAG_BYTES]);
        offset += AEAD_TAG_BYTES;

        let ciphertext = bytes[offset..].to_vec();

        Ok(Self {
            kem_ciphertext,
            ciphertext,
            nonce,
            tag,
        })
    }
}

/// Hybrid encryption with the default ML-KEM backend.
pub fn encrypt_hybrid(
    variant: KemVariant,
    recipient_public_key: &[u8],
    plaintext: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<HybridEnvelope> {
    encrypt_hybrid_with(
        &MlKemBackend,
        variant,
        recipient_public_key,
        plaintext,
        associated_data,
    )
}

/// Hybrid decryption with the default ML-KEM backend.
pub fn decrypt_hybrid(
    variant: KemVariant,
    recipient_private_key: &[u8],
    envelope: &HybridEnvelope,
    associated_data: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>> {
    decrypt_hybrid_with(
        &MlKemBackend,
        variant,
        recipient_private_key,
        envelope,
        associated_data,
    )
}

/// Hybrid encryption - encapsulate to the recipient, then seal the payload
/// under the resulting shared secret.
///
/// # Arguments
/// * `kem` - the KEM backend to encapsulate with
/// * `variant` - parameter set the recipient key belongs to
/// * `recipient_public_key` - encapsulation key, length fixed by `variant`
/// * `plaintext` - payload of arbitrary length
/// * `associated_data` - optional data bound into the authentication tag
///
/// # Security
/// The shared secret exists only inside this call and is zeroed before it
/// returns, success or failure. It is never part of the envelope.
pub fn encrypt_hybrid_with<K: KemProvider>(
    kem: &K,
    variant: KemVariant,
    recipient_public_key: &[u8],
    plaintext: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<HybridEnvelope> {
    log::debug!(
        "hybrid encrypt: variant={}, plaintext {} bytes, aad {} bytes",
        variant,
        plaintext.len(),
        associated_data.map(|aad| aad.len()).unwrap_or(0),
    );

    validate::validate_public_key(variant, recipient_public_key)?;

    let (kem_ciphertext, shared_secret) = kem.encapsulate(variant, recipient_public_key)?;
    // Backend output is checked like any other untrusted buffer
    validate::validate_kem_ciphertext(variant, &kem_ciphertext)?;
    validate::validate_shared_secret(variant, &shared_secret)?;

    let sealed = aead::seal(&shared_secret, plaintext, associated_data)?;
    drop(shared_secret); // zeroed here

    Ok(HybridEnvelope {
        kem_ciphertext,
        ciphertext: sealed.ciphertext,
        nonce: sealed.nonce,
        tag: sealed.tag,
    })
}

/// Hybrid decryption - decapsulate the shared secret, then open the payload.
///
/// Fails with [`EnvelopeError::AuthenticationFailure`] on any tampering of
/// ciphertext, nonce, tag, or KEM ciphertext (the latter through implicit
/// rejection: decapsulation yields a wrong secret and the tag check fails).
/// The shared secret is zeroed whether or not the tag verifies.
pub fn decrypt_hybrid_with<K: KemProvider>(
    kem: &K,
    variant: KemVariant,
    recipient_private_key: &[u8],
    envelope: &HybridEnvelope,
    associated_data: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>> {
    log::debug!(
        "hybrid decrypt: variant={}, ciphertext {} bytes",
        variant,
        envelope.ciphertext.len(),
    );

    validate::validate_private_key(variant, recipient_private_key)?;
    validate::validate_kem_ciphertext(variant, &envelope.kem_ciphertext)?;

    let shared_secret = kem.decapsulate(variant, recipient_private_key, &envelope.kem_ciphertext)?;
    validate::validate_shared_secret(variant, &shared_secret)?;

    aead::open(
        &shared_secret,
        &envelope.ciphertext,
        &envelope.nonce,
        &envelope.tag,
        associated_data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BufferKind;
    use crate::kem::{testkeys, SharedSecret};

    #[test]
    fn test_roundtrip_all_variants() {
        for variant in KemVariant::ALL {
            let (public_key, private_key) = testkeys::keypair(variant);
            let plaintext = b"lattice-sealed medical record";
            let aad = b"patient:77";

            let envelope = encrypt_hybrid(variant, &public_key, plaintext, Some(aad)).unwrap();
            assert_eq!(
                envelope.kem_ciphertext.len(),
                variant.sizes().kem_ciphertext
            );
            assert_eq!(envelope.ciphertext.len(), plaintext.len());

            let opened = decrypt_hybrid(variant, &private_key, &envelope, Some(aad)).unwrap();
            assert_eq!(*opened, plaintext.to_vec());
        }
    }

    #[test]
    fn test_roundtrip_without_associated_data() {
        let (public_key, private_key) = testkeys::keypair(KemVariant::MlKem512);
        let envelope = encrypt_hybrid(KemVariant::MlKem512, &public_key, b"plain", None).unwrap();
        let opened = decrypt_hybrid(KemVariant::MlKem512, &private_key, &envelope, None).unwrap();
        assert_eq!(*opened, b"plain".to_vec());
    }

    #[test]
    fn test_short_public_key_is_rejected() {
        let err = encrypt_hybrid(KemVariant::MlKem512, &[0u8; 799], b"data", None).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::SizeMismatch {
                field: BufferKind::PublicKey,
                expected: 800,
                actual: 799,
            }
        ));
    }

    #[test]
    fn test_cross_variant_ciphertext_is_rejected() {
        let (public_medium, _) = testkeys::keypair(KemVariant::MlKem768);
        let (_, private_low) = testkeys::keypair(KemVariant::MlKem512);

        let envelope =
            encrypt_hybrid(KemVariant::MlKem768, &public_medium, b"data", None).unwrap();

        let err =
            decrypt_hybrid(KemVariant::MlKem512, &private_low, &envelope, None).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::SizeMismatch {
                field: BufferKind::KemCiphertext,
                expected: 768,
                actual: 1088,
            }
        ));
    }

    #[test]
    fn test_single_bit_flips_are_detected() {
        let (public_key, private_key) = testkeys::keypair(KemVariant::MlKem512);
        let envelope =
            encrypt_hybrid(KemVariant::MlKem512, &public_key, b"integrity matters", None).unwrap();

        let mut tampered = envelope.clone();
        tampered.ciphertext[3] ^= 0x01;
        let err =
            decrypt_hybrid(KemVariant::MlKem512, &private_key, &tampered, None).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));

        let mut tampered = envelope.clone();
        tampered.nonce[0] ^= 0x01;
        let err =
            decrypt_hybrid(KemVariant::MlKem512, &private_key, &tampered, None).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));

        let mut tampered = envelope.clone();
        tampered.tag[7] ^= 0x01;
        let err =
            decrypt_hybrid(KemVariant::MlKem512, &private_key, &tampered, None).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));

        // A flipped KEM ciphertext decapsulates to a wrong secret (implicit
        // rejection), which then fails the tag check. Same caller-visible error.
        let mut tampered = envelope.clone();
        tampered.kem_ciphertext[100] ^= 0x01;
        let err =
            decrypt_hybrid(KemVariant::MlKem512, &private_key, &tampered, None).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));
    }

    #[test]
    fn test_wrong_recipient_key_fails_authentication() {
        let (public_key, _) = testkeys::keypair(KemVariant::MlKem512);
        let (_, other_private) = testkeys::keypair(KemVariant::MlKem512);

        let envelope = encrypt_hybrid(KemVariant::MlKem512, &public_key, b"data", None).unwrap();
        let err =
            decrypt_hybrid(KemVariant::MlKem512, &other_private, &envelope, None).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));
    }

    #[test]
    fn test_associated_data_mismatch_fails_authentication() {
        let (public_key, private_key) = testkeys::keypair(KemVariant::MlKem512);
        let envelope =
            encrypt_hybrid(KemVariant::MlKem512, &public_key, b"data", Some(b"ctx-a")).unwrap();
        let err = decrypt_hybrid(KemVariant::MlKem512, &private_key, &envelope, Some(b"ctx-b"))
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));
    }

    struct FailingKem;

    impl KemProvider for FailingKem {
        fn encapsulate(
            &self,
            _variant: KemVariant,
            _recipient_public_key: &[u8],
        ) -> Result<(Vec<u8>, SharedSecret)> {
            Err(EnvelopeError::PrimitiveFailure("backend offline".into()))
        }

        fn decapsulate(
            &self,
            _variant: KemVariant,
            _recipient_private_key: &[u8],
            _kem_ciphertext: &[u8],
        ) -> Result<SharedSecret> {
            Err(EnvelopeError::PrimitiveFailure("backend offline".into()))
        }
    }

    #[test]
    fn test_backend_failure_propagates_unchanged() {
        let (public_key, private_key) = testkeys::keypair(KemVariant::MlKem512);

        let err = encrypt_hybrid_with(&FailingKem, KemVariant::MlKem512, &public_key, b"x", None)
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::PrimitiveFailure(msg) if msg == "backend offline"));

        let envelope = encrypt_hybrid(KemVariant::MlKem512, &public_key, b"x", None).unwrap();
        let err = decrypt_hybrid_with(
            &FailingKem,
            KemVariant::MlKem512,
            &private_key,
            &envelope,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::PrimitiveFailure(msg) if msg == "backend offline"));
    }

    /// Backend that hands back a truncated shared secret.
    struct ShortSecretKem;

    impl KemProvider for ShortSecretKem {
        fn encapsulate(
            &self,
            variant: KemVariant,
            _recipient_public_key: &[u8],
        ) -> Result<(Vec<u8>, SharedSecret)> {
            Ok((
                vec![0u8; variant.sizes().kem_ciphertext],
                SharedSecret::new(vec![0u8; 16]),
            ))
        }

        fn decapsulate(
            &self,
            _variant: KemVariant,
            _recipient_private_key: &[u8],
            _kem_ciphertext: &[u8],
        ) -> Result<SharedSecret> {
            Ok(SharedSecret::new(vec![0u8; 16]))
        }
    }

    #[test]
    fn test_backend_output_is_validated_before_use() {
        let (public_key, _) = testkeys::keypair(KemVariant::MlKem512);
        let err = encrypt_hybrid_with(
            &ShortSecretKem,
            KemVariant::MlKem512,
            &public_key,
            b"x",
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::SizeMismatch {
                field: BufferKind::SharedSecret,
                expected: 32,
                actual: 16,
            }
        ));
    }

    #[test]
    fn test_envelope_bytes_roundtrip() {
        let (public_key, private_key) = testkeys::keypair(KemVariant::MlKem768);
        let envelope =
            encrypt_hybrid(KemVariant::MlKem768, &public_key, b"serialized", Some(b"aad")).unwrap();

        let bytes = envelope.to_bytes();
        assert_eq!(bytes.len(), envelope.encoded_len());
        assert_eq!(bytes[0], ENVELOPE_VERSION);

        let restored = HybridEnvelope::from_bytes(&bytes).unwrap();
        assert_eq!(restored.kem_ciphertext, envelope.kem_ciphertext);
        assert_eq!(restored.ciphertext, envelope.ciphertext);
        assert_eq!(restored.nonce, envelope.nonce);
        assert_eq!(restored.tag, envelope.tag);

        let opened =
            decrypt_hybrid(KemVariant::MlKem768, &private_key, &restored, Some(b"aad")).unwrap();
        assert_eq!(*opened, b"serialized".to_vec());
    }

    #[test]
    fn test_envelope_from_bytes_rejects_garbage() {
        let err = HybridEnvelope::from_bytes(&[]).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));

        let err = HybridEnvelope::from_bytes(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));

        // Wrong version byte
        let (public_key, _) = testkeys::keypair(KemVariant::MlKem512);
        let envelope = encrypt_hybrid(KemVariant::MlKem512, &public_key, b"x", None).unwrap();
        let mut bytes = envelope.to_bytes();
        bytes[0] = 2;
        let err = HybridEnvelope::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::MalformedEnvelope("unsupported envelope version")
        ));

        // Truncated payload
        let bytes = envelope.to_bytes();
        let err = HybridEnvelope::from_bytes(&bytes[..bytes.len() - 40]).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_no_secret_material_in_outputs_or_errors() {
        let (public_key, private_key) = testkeys::keypair(KemVariant::MlKem512);
        let envelope = encrypt_hybrid(KemVariant::MlKem512, &public_key, b"secret data", None)
            .unwrap();

        // Recover the shared secret independently and confirm it appears
        // nowhere in the envelope
        let secret = MlKemBackend
            .decapsulate(KemVariant::MlKem512, &private_key, &envelope.kem_ciphertext)
            .unwrap();
        let serialized = envelope.to_bytes();
        assert!(!serialized
            .windows(secret.len())
            .any(|window| window == &secret[..]));

        // Error strings carry field names and lengths only
        let err = encrypt_hybrid(KemVariant::MlKem512, &[0u8; 799], b"x", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "public key length mismatch: expected 800 bytes, got 799"
        );
    }
}
