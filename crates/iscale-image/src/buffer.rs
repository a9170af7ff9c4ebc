use std::collections::TryReserveError;

use crate::error::ImageError;
use crate::sample::{SampleFormat, SampleSlice};

/// Byte alignment of every region of a [`RowBuffer`].
pub const ALIGN_BITMAP_MOD: usize = 8;

/// Round `n` up to the next multiple of `align`.
pub const fn round_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

/// Allocate a zero-filled vector without aborting on allocation failure.
///
/// # Errors
///
/// Returns the reservation error if the memory is not available.
pub fn try_alloc_zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>, TryReserveError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, T::default());
    Ok(data)
}

/// Sizes of the two regions of a [`RowBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBufferLayout {
    /// Sample format written by the decode stage, `None` when the decode
    /// stage reads the source scanline in place.
    pub decode_format: Option<SampleFormat>,
    /// Samples of one decoded input scanline.
    pub decode_samples: usize,
    /// Pixels of one resampled output scanline.
    pub output_width: usize,
    /// Samples per resampled output pixel.
    pub output_samples_per_pixel: usize,
    /// Bytes per packed device pixel.
    pub device_pixel_bytes: usize,
}

impl RowBufferLayout {
    /// Bytes of the decode region, padded to [`ALIGN_BITMAP_MOD`].
    pub fn decode_bytes(&self) -> usize {
        match self.decode_format {
            Some(format) => round_up(self.decode_samples * format.bytes(), ALIGN_BITMAP_MOD),
            None => 0,
        }
    }

    /// 16-bit words of the resample region.
    ///
    /// Each output pixel reserves room for the wider of its samples and one
    /// packed device pixel, plus one alignment unit of padding.
    pub fn resample_words(&self) -> usize {
        let per_pixel = self
            .output_samples_per_pixel
            .max(self.device_pixel_bytes.div_ceil(2));
        self.output_width * per_pixel + ALIGN_BITMAP_MOD / 2
    }

    /// Total bytes of the buffer.
    pub fn byte_len(&self) -> usize {
        self.decode_bytes() + self.resample_words() * 2
    }
}

/// The decode-stage region of a [`RowBuffer`], typed by its sample width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DecodeRegion {
    /// The decode stage reads the source in place.
    #[default]
    None,
    /// 8-bit decoded samples.
    Bytes(Vec<u8>),
    /// 16-bit decoded samples.
    Words(Vec<u16>),
}

impl DecodeRegion {
    /// Capacity in samples.
    pub fn capacity(&self) -> usize {
        match self {
            DecodeRegion::None => 0,
            DecodeRegion::Bytes(b) => b.len(),
            DecodeRegion::Words(w) => w.len(),
        }
    }

    /// The first `len` byte samples.
    ///
    /// # Errors
    ///
    /// Fails if the region holds 16-bit samples or fewer than `len` samples.
    pub fn bytes_mut(&mut self, len: usize) -> Result<&mut [u8], ImageError> {
        match self {
            DecodeRegion::Bytes(b) => {
                let cap = b.len();
                b.get_mut(..len).ok_or(ImageError::BufferOverflow(cap, len))
            }
            _ => Err(ImageError::RegionFormat(8)),
        }
    }

    /// The first `len` word samples.
    ///
    /// # Errors
    ///
    /// Fails if the region holds 8-bit samples or fewer than `len` samples.
    pub fn words_mut(&mut self, len: usize) -> Result<&mut [u16], ImageError> {
        match self {
            DecodeRegion::Words(w) => {
                let cap = w.len();
                w.get_mut(..len).ok_or(ImageError::BufferOverflow(cap, len))
            }
            _ => Err(ImageError::RegionFormat(16)),
        }
    }

    /// View of the first `len` samples.
    pub fn view(&self, len: usize) -> Option<SampleSlice<'_>> {
        match self {
            DecodeRegion::None => None,
            DecodeRegion::Bytes(b) => b.get(..len).map(SampleSlice::U8),
            DecodeRegion::Words(w) => w.get(..len).map(SampleSlice::U16),
        }
    }
}

/// Scratch memory for one interpolated image render.
///
/// Holds the decoded input scanline and the resampled output scanline side by
/// side. Sized once from a [`RowBufferLayout`] and never grown.
#[derive(Clone, Debug)]
pub struct RowBuffer {
    decode: DecodeRegion,
    resample: Vec<u16>,
    row_samples: usize,
    byte_len: usize,
}

impl RowBuffer {
    /// Allocate a buffer for the given layout.
    ///
    /// # Arguments
    ///
    /// * `layout` - The region sizes.
    /// * `limit` - Optional cap on the total size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ScratchLimit`] if the layout exceeds `limit`, or
    /// [`ImageError::Allocation`] if the memory cannot be reserved. Nothing
    /// stays allocated on failure.
    pub fn allocate(layout: &RowBufferLayout, limit: Option<usize>) -> Result<Self, ImageError> {
        let byte_len = layout.byte_len();
        if let Some(limit) = limit {
            if byte_len > limit {
                return Err(ImageError::ScratchLimit(byte_len, limit));
            }
        }

        let decode = match layout.decode_format {
            None => DecodeRegion::None,
            Some(SampleFormat::Byte) => DecodeRegion::Bytes(try_alloc_zeroed(layout.decode_bytes())?),
            Some(_) => DecodeRegion::Words(try_alloc_zeroed(layout.decode_bytes() / 2)?),
        };
        let resample = try_alloc_zeroed(layout.resample_words())?;

        Ok(Self {
            decode,
            resample,
            row_samples: layout.output_width * layout.output_samples_per_pixel,
            byte_len,
        })
    }

    /// Total size in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// The decode region.
    pub fn decode(&self) -> &DecodeRegion {
        &self.decode
    }

    /// Borrow the decode region and the resampled row slot at the same time.
    pub fn split_mut(&mut self) -> (&mut DecodeRegion, &mut [u16]) {
        (&mut self.decode, &mut self.resample[..self.row_samples])
    }
}
