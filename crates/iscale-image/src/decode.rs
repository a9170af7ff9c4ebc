use crate::sample::{float_to_byte, float_to_frac, frac_to_byte, frac_to_float};

/// Number of entries of a [`DecodeCurve::Lookup`] table.
pub const DECODE_LOOKUP_LEN: usize = 16;

/// Maps an encoded sample component onto its meaningful value.
///
/// Byte samples `b` decode as:
///
/// * `Identity { max }` - `b / 255 * max`, a plain rescale onto `[0, max]`.
/// * `Lookup(table)` - `table[b >> 4]`.
/// * `Linear { base, factor }` - `base + b * factor`.
///
/// Wide samples decode through the same formulas on their byte-scaled value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodeCurve {
    /// Samples span `[0, max]` linearly.
    Identity {
        /// Decoded value of a full-scale sample.
        max: f32,
    },
    /// Table indexed by the high nibble of the byte sample.
    Lookup([f32; DECODE_LOOKUP_LEN]),
    /// Affine decode.
    Linear {
        /// Decoded value of a zero sample.
        base: f32,
        /// Decoded increment per byte step.
        factor: f32,
    },
}

impl Default for DecodeCurve {
    fn default() -> Self {
        DecodeCurve::Identity { max: 1.0 }
    }
}

impl DecodeCurve {
    /// Whether decoding leaves samples untouched.
    pub fn is_identity(&self) -> bool {
        matches!(self, DecodeCurve::Identity { max } if *max == 1.0)
    }

    /// Decode a byte sample.
    pub fn decode_byte(&self, b: u8) -> f32 {
        match self {
            DecodeCurve::Identity { max } => b as f32 * max / 255.0,
            DecodeCurve::Lookup(table) => table[(b >> 4) as usize],
            DecodeCurve::Linear { base, factor } => base + b as f32 * factor,
        }
    }

    /// Decode a frac sample.
    pub fn decode_frac(&self, f: u16) -> f32 {
        match self {
            DecodeCurve::Identity { max } => frac_to_float(f) * max,
            DecodeCurve::Lookup(table) => table[(frac_to_byte(f) >> 4) as usize],
            DecodeCurve::Linear { base, factor } => base + frac_to_float(f) * 255.0 * factor,
        }
    }

    /// Decode a byte sample and store the result as a byte.
    pub fn decode_byte_to_byte(&self, b: u8) -> u8 {
        if self.is_identity() {
            b
        } else {
            float_to_byte(self.decode_byte(b))
        }
    }

    /// Decode a frac sample and store the result as a frac.
    pub fn decode_frac_to_frac(&self, f: u16) -> u16 {
        if self.is_identity() {
            f
        } else {
            float_to_frac(self.decode_frac(f))
        }
    }
}
