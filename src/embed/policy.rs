//! Signed/unsigned interpretation policies and the embedding scale table.

use serde::{Deserialize, Serialize};

use crate::voxel::BitDepth;

/// Interpretation of stored non-negative samples.
///
/// `Unsigned` keeps the natural `[0, white]` range. `Signed` shifts the zero
/// point to a fixed mid-range constant so differences can go negative while
/// storage stays non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignPolicy {
    Unsigned,
    Signed,
}

/// Zero point of the 8-bit signed embedding.
///
/// 126 rather than 128: slightly more headroom on the positive side, where
/// gradient magnitudes land. Quantitative outputs depend on it, so it is a
/// fixed constant rather than a knob.
pub const SIGNED_ZERO_8: i64 = 126;

/// Zero point of the 16-bit signed embedding (`126 × 256`, so cross-depth
/// copies at the ×256 scale keep logical zero aligned).
pub const SIGNED_ZERO_16: i64 = SIGNED_ZERO_8 * 256;

impl SignPolicy {
    /// Stored sample representing logical zero at the given depth.
    #[inline]
    pub fn zero(self, depth: BitDepth) -> i64 {
        match (self, depth) {
            (SignPolicy::Unsigned, _) => 0,
            (SignPolicy::Signed, BitDepth::Eight) => SIGNED_ZERO_8,
            (SignPolicy::Signed, BitDepth::Sixteen) => SIGNED_ZERO_16,
        }
    }

    #[inline]
    pub fn from_signed_flag(signed: bool) -> Self {
        if signed {
            SignPolicy::Signed
        } else {
            SignPolicy::Unsigned
        }
    }
}

/// Fixed divisor applied when re-embedding between bit depths.
///
/// Chosen so an embedded value squared still fits the target width:
/// `(255/32)² < 255` and `(65535/512)² < 65535`. The 8→16 direction gains
/// headroom for free and passes values through unscaled.
#[inline]
pub fn embed_divisor(from: BitDepth, to: BitDepth) -> i64 {
    match (from, to) {
        (BitDepth::Eight, BitDepth::Eight) => 32,
        (BitDepth::Sixteen, BitDepth::Sixteen) => 512,
        (BitDepth::Eight, BitDepth::Sixteen) => 1,
        (BitDepth::Sixteen, BitDepth::Eight) => 8192,
    }
}
