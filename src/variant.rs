//! ML-KEM parameter sets and their byte-size table.
//!
//! Key sizes (NIST FIPS 203):
//! - ML-KEM-512:  encapsulation key 800,  decapsulation key 1632, ciphertext 768,  shared secret 32
//! - ML-KEM-768:  encapsulation key 1184, decapsulation key 2400, ciphertext 1088, shared secret 32
//! - ML-KEM-1024: encapsulation key 1568, decapsulation key 3168, ciphertext 1568, shared secret 32

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// ML-KEM-512 parameter constants (NIST FIPS 203)
pub const MLKEM512_PK_BYTES: usize = 800;
pub const MLKEM512_SK_BYTES: usize = 1632;
pub const MLKEM512_CT_BYTES: usize = 768;

/// ML-KEM-768 parameter constants (NIST FIPS 203)
pub const MLKEM768_PK_BYTES: usize = 1184;
pub const MLKEM768_SK_BYTES: usize = 2400;
pub const MLKEM768_CT_BYTES: usize = 1088;

/// ML-KEM-1024 parameter constants (NIST FIPS 203)
pub const MLKEM1024_PK_BYTES: usize = 1568;
pub const MLKEM1024_SK_BYTES: usize = 3168;
pub const MLKEM1024_CT_BYTES: usize = 1568;

/// Shared secret size: 32 bytes for every ML-KEM parameter set
pub const SHARED_SECRET_BYTES: usize = 32;

/// Supported ML-KEM parameter sets, in increasing security order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KemVariant {
    /// NIST security category 1
    MlKem512,
    /// NIST security category 3
    MlKem768,
    /// NIST security category 5
    MlKem1024,
}

/// Byte sizes fixed by a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantSizes {
    pub public_key: usize,
    pub private_key: usize,
    pub kem_ciphertext: usize,
    pub shared_secret: usize,
}

impl KemVariant {
    pub const ALL: [KemVariant; 3] = [
        KemVariant::MlKem512,
        KemVariant::MlKem768,
        KemVariant::MlKem1024,
    ];

    /// Pure size lookup. Every buffer crossing a module boundary is checked
    /// against these values exactly; no truncation, no padding.
    pub const fn sizes(self) -> VariantSizes {
        match self {
            KemVariant::MlKem512 => VariantSizes {
                public_key: MLKEM512_PK_BYTES,
                private_key: MLKEM512_SK_BYTES,
                kem_ciphertext: MLKEM512_CT_BYTES,
                shared_secret: SHARED_SECRET_BYTES,
            },
            KemVariant::MlKem768 => VariantSizes {
                public_key: MLKEM768_PK_BYTES,
                private_key: MLKEM768_SK_BYTES,
                kem_ciphertext: MLKEM768_CT_BYTES,
                shared_secret: SHARED_SECRET_BYTES,
            },
            KemVariant::MlKem1024 => VariantSizes {
                public_key: MLKEM1024_PK_BYTES,
                private_key: MLKEM1024_SK_BYTES,
                kem_ciphertext: MLKEM1024_CT_BYTES,
                shared_secret: SHARED_SECRET_BYTES,
            },
        }
    }

    /// Canonical lowercase algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            KemVariant::MlKem512 => "ml-kem-512",
            KemVariant::MlKem768 => "ml-kem-768",
            KemVariant::MlKem1024 => "ml-kem-1024",
        }
    }

    /// NIST security category label.
    pub const fn security_level(self) -> &'static str {
        match self {
            KemVariant::MlKem512 => "NIST Level 1",
            KemVariant::MlKem768 => "NIST Level 3",
            KemVariant::MlKem1024 => "NIST Level 5",
        }
    }
}

impl std::fmt::Display for KemVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KemVariant {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ml-kem-512" => Ok(KemVariant::MlKem512),
            "ml-kem-768" => Ok(KemVariant::MlKem768),
            "ml-kem-1024" => Ok(KemVariant::MlKem1024),
            _ => Err(EnvelopeError::UnknownAlgorithm(s.to_string())),
        }
    }
}
