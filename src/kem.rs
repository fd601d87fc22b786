//! KEM primitive boundary — ML-KEM (NIST FIPS 203) behind a capability trait.
//!
//! The lattice math itself lives in the external `ml-kem` crate (RustCrypto,
//! FIPS 203 final); this module only reconstructs keys from raw bytes, runs
//! encapsulation/decapsulation, and converts results back to byte buffers.
//! Any compliant backend can stand in for the default one, which is what the
//! round-trip tests rely on to exercise failure paths.
//!
//! ML-KEM decapsulation uses implicit rejection: a same-length forged
//! ciphertext yields `Ok` with a pseudorandom secret, not an error, so
//! decapsulation can never be used as a ciphertext-validity oracle.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{
    Encoded, EncodedSizeUser, MlKem1024, MlKem1024Params, MlKem512, MlKem512Params, MlKem768,
    MlKem768Params,
};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::error::{EnvelopeError, Result};
use crate::variant::KemVariant;

/// Shared secret as it travels between the KEM and AEAD stages.
///
/// Zeroed on drop. Its lifetime is a single hybrid call; it is never
/// returned, logged, or cached.
pub type SharedSecret = Zeroizing<Vec<u8>>;

/// Capability interface over the raw KEM primitive.
///
/// Exactly two operations; randomness is internal to the implementation.
/// Backend-internal failures surface as [`EnvelopeError::PrimitiveFailure`]
/// and are never retried: encapsulating again would silently change the
/// shared secret, and decapsulation is deterministic over its inputs.
pub trait KemProvider {
    /// Produce a KEM ciphertext for the recipient plus the shared secret.
    fn encapsulate(
        &self,
        variant: KemVariant,
        recipient_public_key: &[u8],
    ) -> Result<(Vec<u8>, SharedSecret)>;

    /// Recover the shared secret from a KEM ciphertext.
    fn decapsulate(
        &self,
        variant: KemVariant,
        recipient_private_key: &[u8],
        kem_ciphertext: &[u8],
    ) -> Result<SharedSecret>;
}

/// Default backend over the `ml-kem` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct MlKemBackend;

fn to_shared_secret(bytes: &[u8]) -> SharedSecret {
    Zeroizing::new(bytes.to_vec())
}

impl KemProvider for MlKemBackend {
    fn encapsulate(
        &self,
        variant: KemVariant,
        recipient_public_key: &[u8],
    ) -> Result<(Vec<u8>, SharedSecret)> {
        match variant {
            KemVariant::MlKem512 => {
                let ek_encoded = Encoded::<ml_kem::kem::EncapsulationKey<MlKem512Params>>::try_from(
                    recipient_public_key,
                )
                .map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-512 rejected encapsulation key".into())
                })?;
                let ek = ml_kem::kem::EncapsulationKey::<MlKem512Params>::from_bytes(&ek_encoded);
                let (ct, ss) = ek.encapsulate(&mut OsRng).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-512 encapsulation failed".into())
                })?;
                let ct_bytes: Vec<u8> = ct.iter().copied().collect();
                Ok((ct_bytes, to_shared_secret(ss.as_ref())))
            }
            KemVariant::MlKem768 => {
                let ek_encoded = Encoded::<ml_kem::kem::EncapsulationKey<MlKem768Params>>::try_from(
                    recipient_public_key,
                )
                .map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-768 rejected encapsulation key".into())
                })?;
                let ek = ml_kem::kem::EncapsulationKey::<MlKem768Params>::from_bytes(&ek_encoded);
                let (ct, ss) = ek.encapsulate(&mut OsRng).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-768 encapsulation failed".into())
                })?;
                let ct_bytes: Vec<u8> = ct.iter().copied().collect();
                Ok((ct_bytes, to_shared_secret(ss.as_ref())))
            }
            KemVariant::MlKem1024 => {
                let ek_encoded =
                    Encoded::<ml_kem::kem::EncapsulationKey<MlKem1024Params>>::try_from(
                        recipient_public_key,
                    )
                    .map_err(|_| {
                        EnvelopeError::PrimitiveFailure(
                            "ML-KEM-1024 rejected encapsulation key".into(),
                        )
                    })?;
                let ek = ml_kem::kem::EncapsulationKey::<MlKem1024Params>::from_bytes(&ek_encoded);
                let (ct, ss) = ek.encapsulate(&mut OsRng).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-1024 encapsulation failed".into())
                })?;
                let ct_bytes: Vec<u8> = ct.iter().copied().collect();
                Ok((ct_bytes, to_shared_secret(ss.as_ref())))
            }
        }
    }

    fn decapsulate(
        &self,
        variant: KemVariant,
        recipient_private_key: &[u8],
        kem_ciphertext: &[u8],
    ) -> Result<SharedSecret> {
        match variant {
            KemVariant::MlKem512 => {
                let dk_encoded = Encoded::<ml_kem::kem::DecapsulationKey<MlKem512Params>>::try_from(
                    recipient_private_key,
                )
                .map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-512 rejected decapsulation key".into())
                })?;
                let dk = ml_kem::kem::DecapsulationKey::<MlKem512Params>::from_bytes(&dk_encoded);
                let ct = ml_kem::Ciphertext::<MlKem512>::try_from(kem_ciphertext).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-512 rejected ciphertext".into())
                })?;
                let ss = dk.decapsulate(&ct).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-512 decapsulation failed".into())
                })?;
                Ok(to_shared_secret(ss.as_ref()))
            }
            KemVariant::MlKem768 => {
                let dk_encoded = Encoded::<ml_kem::kem::DecapsulationKey<MlKem768Params>>::try_from(
                    recipient_private_key,
                )
                .map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-768 rejected decapsulation key".into())
                })?;
                let dk = ml_kem::kem::DecapsulationKey::<MlKem768Params>::from_bytes(&dk_encoded);
                let ct = ml_kem::Ciphertext::<MlKem768>::try_from(kem_ciphertext).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-768 rejected ciphertext".into())
                })?;
                let ss = dk.decapsulate(&ct).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-768 decapsulation failed".into())
                })?;
                Ok(to_shared_secret(ss.as_ref()))
            }
            KemVariant::MlKem1024 => {
                let dk_encoded =
                    Encoded::<ml_kem::kem::DecapsulationKey<MlKem1024Params>>::try_from(
                        recipient_private_key,
                    )
                    .map_err(|_| {
                        EnvelopeError::PrimitiveFailure(
                            "ML-KEM-1024 rejected decapsulation key".into(),
                        )
                    })?;
                let dk = ml_kem::kem::DecapsulationKey::<MlKem1024Params>::from_bytes(&dk_encoded);
                let ct = ml_kem::Ciphertext::<MlKem1024>::try_from(kem_ciphertext).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-1024 rejected ciphertext".into())
                })?;
                let ss = dk.decapsulate(&ct).map_err(|_| {
                    EnvelopeError::PrimitiveFailure("ML-KEM-1024 decapsulation failed".into())
                })?;
                Ok(to_shared_secret(ss.as_ref()))
            }
        }
    }
}
