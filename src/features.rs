//! Feature extraction from RSA moduli.
//!
//! Converts a hexadecimal modulus into a fixed-width vector of numeric
//! features: leading bits after the implicit top bit, a window of trailing
//! bits, the padding distance of the bit length to the next byte boundary,
//! and one small-prime residue per configured divisor. The vector stays
//! typed until the writer boundary; only the sink turns it into text.

use num_bigint::BigUint;
use num_traits::{Num, ToPrimitive};
use snafu::prelude::*;

use crate::config::FeatureConfig;
use crate::error::{BadHexSnafu, FeatureError, TooShortSnafu};

/// Extracted features for one modulus.
///
/// `lsb_bits` holds the trailing window in emission order, i.e. the order
/// of the binary substring; the matching headers count down from
/// `nlsb{lsb}` to `nlsb1` so `nlsb1` names the rightmost bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    /// Bits at positions `1..=msb` of the binary string, each 0 or 1.
    pub msb_bits: Vec<u8>,
    /// Trailing window bits, each 0 or 1.
    pub lsb_bits: Vec<u8>,
    /// `(8 - bit_length % 8) % 8`, always in `0..=7`.
    pub nblen: u8,
    /// `modulus mod d` for each configured divisor, in divisor order.
    pub residues: Vec<u64>,
}

/// One extracted row, before the group/source annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedRow {
    /// Full feature vector.
    Features(FeatureVector),
    /// Raw modulus hex, for the pass-through variant.
    Passthrough(String),
}

impl ExtractedRow {
    /// Serialize to ordered string fields for row assembly.
    pub fn into_fields(self) -> Vec<String> {
        match self {
            ExtractedRow::Features(vector) => vector.into_fields(),
            ExtractedRow::Passthrough(modulus) => vec![modulus],
        }
    }
}

impl FeatureVector {
    fn into_fields(self) -> Vec<String> {
        let mut fields =
            Vec::with_capacity(self.msb_bits.len() + self.lsb_bits.len() + 1 + self.residues.len());
        fields.extend(self.msb_bits.iter().map(|bit| bit.to_string()));
        fields.extend(self.lsb_bits.iter().map(|bit| bit.to_string()));
        fields.push(self.nblen.to_string());
        fields.extend(self.residues.iter().map(|residue| residue.to_string()));
        fields
    }
}

/// Pure extractor configured with window widths and divisors.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    /// Create a new extractor.
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Column names of the feature fields, in emission order.
    pub fn header(&self) -> Vec<String> {
        if self.config.passthrough {
            return vec!["modulus".to_string()];
        }
        let mut columns = Vec::new();
        for i in 1..=self.config.msb {
            columns.push(format!("nmsb{i}"));
        }
        for i in (1..=self.config.lsb).rev() {
            columns.push(format!("nlsb{i}"));
        }
        columns.push("nblen".to_string());
        for d in &self.config.divisors {
            columns.push(format!("nmod{d}"));
        }
        columns
    }

    /// Extract features from an unprefixed hexadecimal modulus.
    ///
    /// Deterministic and side-effect free. Fails if the hex does not parse
    /// or the modulus is too short for the configured bit windows.
    pub fn extract(&self, modulus_hex: &str) -> Result<ExtractedRow, FeatureError> {
        let modulus = BigUint::from_str_radix(modulus_hex, 16)
            .ok()
            .context(BadHexSnafu { value: modulus_hex })?;

        if self.config.passthrough {
            return Ok(ExtractedRow::Passthrough(modulus_hex.to_string()));
        }

        let msb = self.config.msb;
        let lsb = self.config.lsb;
        let bits = modulus.bits();
        // The MSB window needs the implicit leading bit plus msb more; the
        // trailing window sits lsb+2 bits from the end (fixed 2-bit tail
        // offset, kept for compatibility with existing tables).
        ensure!(
            bits >= (msb + 1) as u64 && bits >= (lsb + 2) as u64,
            TooShortSnafu { bits, msb, lsb }
        );

        let binary = modulus.to_str_radix(2);
        let length = binary.len();
        let msb_bits = bit_window(&binary[1..=msb]);
        let lsb_bits = bit_window(&binary[length - lsb - 2..length - 2]);
        let nblen = ((8 - bits % 8) % 8) as u8;
        let residues = self
            .config
            .divisors
            .iter()
            // A residue is strictly smaller than its u64 divisor.
            .map(|d| (&modulus % BigUint::from(*d)).to_u64().unwrap_or(0))
            .collect();

        Ok(ExtractedRow::Features(FeatureVector {
            msb_bits,
            lsb_bits,
            nblen,
            residues,
        }))
    }
}

fn bit_window(digits: &str) -> Vec<u8> {
    digits
        .bytes()
        .map(|digit| if digit == b'1' { 1 } else { 0 })
        .collect()
}
