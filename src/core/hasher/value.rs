//! Fixed-width perceptual hash value.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of bits in a perceptual hash (8x8 DCT block)
pub const HASH_BITS: u32 = 64;

/// Length of a perceptual hash rendered as hex
pub const HASH_HEX_LEN: usize = (HASH_BITS / 4) as usize;

/// A 64-bit perceptual hash that can be compared by Hamming distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PerceptualHashValue(u64);

impl PerceptualHashValue {
    /// Wrap raw hash bits
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Parse the 16-character hex form stored alongside a recipe
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != HASH_HEX_LEN {
            return Err(HashError::InvalidHash {
                value: hex.to_string(),
                reason: format!("expected {} hex characters, got {}", HASH_HEX_LEN, hex.len()),
            });
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHash {
                value: hex.to_string(),
                reason: "not hexadecimal".to_string(),
            });
        }
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|e| HashError::InvalidHash {
                value: hex.to_string(),
                reason: e.to_string(),
            })
    }

    /// Get the raw hash bits
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Lowercase, zero-padded hex form
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Hamming distance: number of differing bits
    pub const fn distance(&self, other: &Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Similarity in `[0, 1]`, decaying linearly with distance
    pub fn similarity(&self, other: &Self) -> f64 {
        1.0 - f64::from(self.distance(other)) / f64::from(HASH_BITS)
    }
}

impl fmt::Display for PerceptualHashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for PerceptualHashValue {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for PerceptualHashValue {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PerceptualHashValue> for String {
    fn from(value: PerceptualHashValue) -> Self {
        value.to_hex()
    }
}
