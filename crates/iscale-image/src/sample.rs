/// Number of fraction bits of a [`SampleFormat::Frac`] sample.
pub const FRAC_BITS: u32 = 15;

/// The frac value representing 1.0.
pub const FRAC_1: u16 = ((1u32 << FRAC_BITS) - (1u32 << (FRAC_BITS - 12))) as u16;

/// Representation of one sample component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleFormat {
    /// 8-bit samples, 255 is full scale.
    Byte,
    /// 15-bit fraction in 16-bit storage, [`FRAC_1`] is full scale.
    Frac,
    /// 16-bit samples, 65535 is full scale. Used for device-profile transforms.
    Word,
}

impl SampleFormat {
    /// Storage bits per sample.
    pub const fn bits(self) -> u32 {
        match self {
            SampleFormat::Byte => 8,
            SampleFormat::Frac | SampleFormat::Word => 16,
        }
    }

    /// Storage bytes per sample.
    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// The sample value representing full scale.
    pub const fn max_value(self) -> u32 {
        match self {
            SampleFormat::Byte => 0xff,
            SampleFormat::Frac => FRAC_1 as u32,
            SampleFormat::Word => 0xffff,
        }
    }
}

/// Convert a byte sample to a frac.
pub const fn byte_to_frac(b: u8) -> u16 {
    let b = b as u16;
    (b << 7) + (b >> 1) - (b >> 5)
}

/// Convert a frac sample to a byte.
pub const fn frac_to_byte(f: u16) -> u8 {
    (f >> (FRAC_BITS - 8)) as u8
}

/// Convert a frac sample to a full-range 16-bit sample.
pub const fn frac_to_word(f: u16) -> u16 {
    let f = if f > FRAC_1 { FRAC_1 as u32 } else { f as u32 };
    ((f * 0xffff + FRAC_1 as u32 / 2) / FRAC_1 as u32) as u16
}

/// Convert a frac sample to a float in `[0, 1]`.
pub fn frac_to_float(f: u16) -> f32 {
    f as f32 / FRAC_1 as f32
}

/// Convert a float to a frac, clamping to `[0, 1]`.
pub fn float_to_frac(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * FRAC_1 as f32 + 0.5) as u16
}

/// Convert a float to a byte, clamping to `[0, 1]`.
pub fn float_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// A borrowed run of samples, tagged by storage width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleSlice<'a> {
    /// 8-bit samples.
    U8(&'a [u8]),
    /// 16-bit samples, either frac or full range.
    U16(&'a [u16]),
}

impl<'a> SampleSlice<'a> {
    /// An empty slice of the given storage width.
    pub fn empty(format: SampleFormat) -> Self {
        match format {
            SampleFormat::Byte => SampleSlice::U8(&[]),
            SampleFormat::Frac | SampleFormat::Word => SampleSlice::U16(&[]),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            SampleSlice::U8(s) => s.len(),
            SampleSlice::U16(s) => s.len(),
        }
    }

    /// Whether the slice holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage bits per sample.
    pub fn bits(&self) -> u32 {
        match self {
            SampleSlice::U8(_) => 8,
            SampleSlice::U16(_) => 16,
        }
    }

    /// Sub-slice of samples `start..end`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> SampleSlice<'a> {
        match *self {
            SampleSlice::U8(s) => SampleSlice::U8(&s[start..end]),
            SampleSlice::U16(s) => SampleSlice::U16(&s[start..end]),
        }
    }
}

/// A mutable run of samples, tagged by storage width.
#[derive(Debug, PartialEq, Eq)]
pub enum SampleSliceMut<'a> {
    /// 8-bit samples.
    U8(&'a mut [u8]),
    /// 16-bit samples, either frac or full range.
    U16(&'a mut [u16]),
}

impl SampleSliceMut<'_> {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            SampleSliceMut::U8(s) => s.len(),
            SampleSliceMut::U16(s) => s.len(),
        }
    }

    /// Whether the slice holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
