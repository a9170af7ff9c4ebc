use iscale_image::sample::frac_to_word;
use iscale_image::{DecodeCurve, DecodeRegion, SampleFormat, SampleSlice};

use crate::collab::ColorSpace;
use crate::error::RenderError;

/// How raw scanlines become canonical interpolation input.
///
/// Chosen once when an image is activated; it also decides the size and
/// sample width of the row buffer's decode region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// The stream reads the source scanline in place.
    Direct,
    /// Pixels are copied in reverse order.
    Mirror,
    /// 8-bit samples go through their decode curves and stay 8-bit.
    Curves,
    /// 8-bit palette indices resolve to base-space bytes.
    Indexed,
    /// Wide samples go through their decode curves as fracs.
    Wide,
    /// Wide palette indices resolve to base-space wide samples.
    IndexedWide,
}

impl DecodeStrategy {
    /// Pick the strategy for an image.
    ///
    /// # Arguments
    ///
    /// * `bits_per_component` - Source sample depth.
    /// * `indexed` - Whether samples are palette indices.
    /// * `need_decode` - Whether 8-bit samples must be decoded before resampling.
    /// * `mirrored` - Whether the horizontal scale is negative.
    /// * `managed` - Whether wide samples are kept raw for a later color transform.
    pub fn choose(
        bits_per_component: u32,
        indexed: bool,
        need_decode: bool,
        mirrored: bool,
        managed: bool,
    ) -> Self {
        let wide = bits_per_component > 8;
        match (indexed, wide) {
            (true, false) => DecodeStrategy::Indexed,
            (true, true) => DecodeStrategy::IndexedWide,
            (false, false) if need_decode => DecodeStrategy::Curves,
            (false, true) if !managed => DecodeStrategy::Wide,
            _ if mirrored => DecodeStrategy::Mirror,
            _ => DecodeStrategy::Direct,
        }
    }

    /// Sample format of the decode region, `None` when it is not used.
    pub fn region_format(&self, format_in: SampleFormat) -> Option<SampleFormat> {
        match self {
            DecodeStrategy::Direct => None,
            DecodeStrategy::Curves | DecodeStrategy::Indexed => Some(SampleFormat::Byte),
            DecodeStrategy::Wide => Some(SampleFormat::Frac),
            DecodeStrategy::Mirror | DecodeStrategy::IndexedWide => Some(format_in),
        }
    }
}

/// Converts raw scanlines of the data rectangle into canonical samples.
#[derive(Clone, Debug, PartialEq)]
pub struct RowDecoder {
    strategy: DecodeStrategy,
    width: usize,
    src_spp: usize,
    spp_decode: usize,
    bits_per_component: u32,
    mirrored: bool,
    format_in: SampleFormat,
    curves: Vec<DecodeCurve>,
}

impl RowDecoder {
    /// Create a new decoder.
    ///
    /// # Arguments
    ///
    /// * `strategy` - The decode strategy.
    /// * `width` - Pixels per row of the data rectangle.
    /// * `src_spp` - Source samples per pixel.
    /// * `spp_decode` - Decoded samples per pixel.
    /// * `bits_per_component` - Source sample depth.
    /// * `mirrored` - Whether pixels are emitted in reverse order.
    /// * `format_in` - Sample format the stream consumes.
    /// * `curves` - Decode curve of every source component.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy: DecodeStrategy,
        width: usize,
        src_spp: usize,
        spp_decode: usize,
        bits_per_component: u32,
        mirrored: bool,
        format_in: SampleFormat,
        curves: Vec<DecodeCurve>,
    ) -> Self {
        Self {
            strategy,
            width,
            src_spp,
            spp_decode,
            bits_per_component,
            mirrored,
            format_in,
            curves,
        }
    }

    /// The decode strategy.
    pub fn strategy(&self) -> DecodeStrategy {
        self.strategy
    }

    /// Samples of one decoded row.
    pub fn decoded_samples(&self) -> usize {
        self.width * self.spp_decode
    }

    /// Index of the source pixel emitted at position `i`.
    fn source_pixel(&self, i: usize) -> usize {
        if self.mirrored {
            self.width - 1 - i
        } else {
            i
        }
    }

    fn curve(&self, i: usize) -> DecodeCurve {
        self.curves.get(i).copied().unwrap_or_default()
    }

    /// Decode one raw scanline.
    ///
    /// # Arguments
    ///
    /// * `row` - The raw samples of the data rectangle, one `u8` per sample
    ///   up to 8 bits and one `u16` per sample above.
    /// * `region` - The row buffer's decode region.
    /// * `color_space` - The source color space, used for palette lookups.
    ///
    /// # Returns
    ///
    /// The canonical samples, borrowed either from `row` or from `region`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SampleFormat`] if the row's sample width does not
    /// match the depth, or [`RenderError::ShortRow`] if the row is too short.
    pub fn decode<'s>(
        &self,
        row: SampleSlice<'s>,
        region: &'s mut DecodeRegion,
        color_space: &dyn ColorSpace,
    ) -> Result<SampleSlice<'s>, RenderError> {
        let expected_bits = if self.bits_per_component > 8 { 16 } else { 8 };
        if row.bits() != expected_bits {
            return Err(RenderError::SampleFormat {
                expected: expected_bits,
                actual: row.bits(),
            });
        }
        let row_len = self.width * self.src_spp;
        if row.len() < row_len {
            return Err(RenderError::ShortRow {
                expected: row_len,
                actual: row.len(),
            });
        }

        let n = self.decoded_samples();
        let spp = self.spp_decode;
        match (self.strategy, row) {
            (DecodeStrategy::Direct, row) => Ok(row.slice(0, row_len)),

            (DecodeStrategy::Mirror, SampleSlice::U8(src)) => {
                let out = region.bytes_mut(n)?;
                for (dst, px) in out
                    .chunks_exact_mut(spp)
                    .zip(src[..row_len].chunks_exact(spp).rev())
                {
                    dst.copy_from_slice(px);
                }
                Ok(SampleSlice::U8(out))
            }

            (DecodeStrategy::Mirror, SampleSlice::U16(src)) => {
                let out = region.words_mut(n)?;
                for (dst, px) in out
                    .chunks_exact_mut(spp)
                    .zip(src[..row_len].chunks_exact(spp).rev())
                {
                    dst.copy_from_slice(px);
                }
                Ok(SampleSlice::U16(out))
            }

            (DecodeStrategy::Curves, SampleSlice::U8(src)) => {
                let out = region.bytes_mut(n)?;
                for (i, dst) in out.chunks_exact_mut(spp).enumerate() {
                    let px = self.source_pixel(i) * self.src_spp;
                    for (j, d) in dst.iter_mut().enumerate() {
                        *d = self.curve(j).decode_byte_to_byte(src[px + j]);
                    }
                }
                Ok(SampleSlice::U8(out))
            }

            (DecodeStrategy::Wide, SampleSlice::U16(src)) => {
                let out = region.words_mut(n)?;
                for (i, dst) in out.chunks_exact_mut(spp).enumerate() {
                    let px = self.source_pixel(i) * self.src_spp;
                    for (j, d) in dst.iter_mut().enumerate() {
                        *d = self.curve(j).decode_frac_to_frac(src[px + j]);
                    }
                }
                Ok(SampleSlice::U16(out))
            }

            (DecodeStrategy::Indexed, SampleSlice::U8(src)) => {
                let index_curve = self.curve(0);
                let out = region.bytes_mut(n)?;
                for (i, dst) in out.chunks_exact_mut(spp).enumerate() {
                    let index = src[self.source_pixel(i) * self.src_spp];
                    color_space.lookup_index_bytes(index_curve.decode_byte(index), dst);
                }
                Ok(SampleSlice::U8(out))
            }

            (DecodeStrategy::IndexedWide, SampleSlice::U16(src)) => {
                let index_curve = self.curve(0);
                let profile_wide = self.format_in == SampleFormat::Word;
                let out = region.words_mut(n)?;
                for (i, dst) in out.chunks_exact_mut(spp).enumerate() {
                    let index = src[self.source_pixel(i) * self.src_spp];
                    color_space.lookup_index_frac(index_curve.decode_frac(index), dst);
                    if profile_wide {
                        dst.iter_mut().for_each(|v| *v = frac_to_word(*v));
                    }
                }
                Ok(SampleSlice::U16(out))
            }

            (_, row) => Err(RenderError::SampleFormat {
                expected: expected_bits,
                actual: row.bits(),
            }),
        }
    }

    /// The empty input that drains the stream at the end of the image.
    pub fn flush(&self) -> SampleSlice<'static> {
        SampleSlice::empty(self.format_in)
    }
}
