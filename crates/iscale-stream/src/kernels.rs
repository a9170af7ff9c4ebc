use iscale_image::buffer::try_alloc_zeroed;
use num_traits::AsPrimitive;

use crate::error::StreamError;

/// Support radius of the Mitchell kernel at unit scale.
pub const MITCHELL_SUPPORT: f64 = 2.0;

const B: f64 = 1.0 / 3.0;
const C: f64 = 1.0 / 3.0;

/// Evaluate the Mitchell-Netravali cubic with `B = C = 1/3`.
///
/// # Arguments
///
/// * `x` - The distance from the kernel center in source pixels.
///
/// # Returns
///
/// The kernel weight, zero outside `(-2, 2)`.
pub fn mitchell_kernel(x: f64) -> f64 {
    let x = x.abs();
    let x2 = x * x;
    let x3 = x2 * x;
    if x < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * x3 + (-18.0 + 12.0 * B + 6.0 * C) * x2 + (6.0 - 2.0 * B))
            / 6.0
    } else if x < 2.0 {
        ((-B - 6.0 * C) * x3 + (6.0 * B + 30.0 * C) * x2 + (-12.0 * B - 48.0 * C) * x
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

/// Maps output pixel indices of one axis onto local source positions.
///
/// The mapping uses the whole-image extents and the data rectangle's leading
/// offsets, so separately rendered patches sample with the same phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMap {
    in_per_out: f64,
    out_offset: f64,
    in_offset: f64,
    len_in: usize,
}

impl AxisMap {
    /// Create a new axis mapping.
    ///
    /// # Arguments
    ///
    /// * `entire_in` - Source pixels of the whole image on the axis.
    /// * `entire_out` - Device pixels of the whole image on the axis.
    /// * `in_offset` - Source pixels before the data rectangle.
    /// * `out_offset` - Device pixels before the data rectangle.
    /// * `len_in` - Source pixels of the data rectangle.
    pub fn new(
        entire_in: usize,
        entire_out: usize,
        in_offset: usize,
        out_offset: usize,
        len_in: usize,
    ) -> Self {
        Self {
            in_per_out: entire_in as f64 / entire_out.max(1) as f64,
            out_offset: out_offset as f64,
            in_offset: in_offset as f64,
            len_in,
        }
    }

    /// Source pixels per device pixel.
    pub fn in_per_out(&self) -> f64 {
        self.in_per_out
    }

    /// Local source position of the center of output pixel `j`.
    pub fn center(&self, j: usize) -> f64 {
        (j as f64 + self.out_offset + 0.5) * self.in_per_out - 0.5 - self.in_offset
    }

    /// Local source position of the leading edge of output pixel `j`.
    pub fn edge(&self, j: usize) -> f64 {
        (j as f64 + self.out_offset) * self.in_per_out - self.in_offset
    }

    /// Clamp a source index into the data rectangle.
    pub fn clamp(&self, i: i64) -> usize {
        i.clamp(0, self.len_in.saturating_sub(1) as i64) as usize
    }

    /// Inclusive source window of output pixel `j` when the source is
    /// partitioned into consecutive reduction windows.
    ///
    /// `count_out` is the number of output pixels; the last window extends
    /// to the end of the source.
    pub fn box_window(&self, j: usize, count_out: usize) -> (usize, usize) {
        let last = self.len_in.saturating_sub(1);
        let lo = (self.edge(j).floor() as i64).clamp(0, last as i64) as usize;
        let end = if j + 1 >= count_out {
            self.len_in
        } else {
            (self.edge(j + 1).floor() as i64).clamp(0, self.len_in as i64) as usize
        };
        (lo, end.max(lo + 1).saturating_sub(1).min(last))
    }
}

/// Normalized Mitchell weights of every output pixel of one axis.
///
/// Weights are stored with a fixed stride of [`Contributions::window`] per
/// output pixel; source indices outside the data rectangle are clamped to its
/// edge when applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Contributions {
    first: Vec<i64>,
    weights: Vec<f32>,
    window: usize,
}

impl Contributions {
    /// Compute the weights for `count_out` output pixels.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Allocation`] if the tables cannot be reserved.
    pub fn new(map: &AxisMap, count_out: usize) -> Result<Self, StreamError> {
        let stretch = map.in_per_out().max(1.0);
        let support = MITCHELL_SUPPORT * stretch;
        let window = (2.0 * support).ceil() as usize + 1;

        let mut first = try_alloc_zeroed::<i64>(count_out)?;
        let mut weights = try_alloc_zeroed::<f32>(count_out * window)?;

        for (j, (start, taps)) in first
            .iter_mut()
            .zip(weights.chunks_exact_mut(window))
            .enumerate()
        {
            let center = map.center(j);
            *start = (center - support).ceil() as i64;

            let mut sum = 0.0;
            for (k, tap) in taps.iter_mut().enumerate() {
                let w = mitchell_kernel((center - (*start + k as i64) as f64) / stretch);
                *tap = w as f32;
                sum += w;
            }

            if sum.abs() > f64::EPSILON {
                taps.iter_mut().for_each(|t| *t = (*t as f64 / sum) as f32);
            } else {
                // center fell between taps of zero weight, take the nearest sample
                taps.fill(0.0);
                let nearest = (center.round() as i64 - *start).clamp(0, window as i64 - 1);
                taps[nearest as usize] = 1.0;
            }
        }

        Ok(Self {
            first,
            weights,
            window,
        })
    }

    /// First source index and weights of output pixel `j`.
    pub fn taps(&self, j: usize) -> (i64, &[f32]) {
        (
            self.first[j],
            &self.weights[j * self.window..(j + 1) * self.window],
        )
    }

    /// Filter one interleaved row.
    ///
    /// # Arguments
    ///
    /// * `map` - The axis mapping used to clamp source indices.
    /// * `src` - The source row with `spp` samples per pixel.
    /// * `dst` - The filtered row with `spp` samples per pixel.
    /// * `spp` - Samples per pixel.
    pub fn apply_row<T: AsPrimitive<f32>>(
        &self,
        map: &AxisMap,
        src: &[T],
        dst: &mut [f32],
        spp: usize,
    ) {
        for (j, out) in dst.chunks_exact_mut(spp).enumerate() {
            let (start, taps) = self.taps(j);
            out.fill(0.0);
            for (k, &w) in taps.iter().enumerate() {
                if w == 0.0 {
                    continue;
                }
                let base = map.clamp(start + k as i64) * spp;
                for (c, o) in out.iter_mut().enumerate() {
                    *o += w * src[base + c].as_();
                }
            }
        }
    }
}

/// Re-quantize a filtered value from the input scale onto the output scale.
pub fn quantize(value: f32, in_max: f32, out_max: f32) -> u16 {
    (value * out_max / in_max).round().clamp(0.0, out_max) as u16
}
