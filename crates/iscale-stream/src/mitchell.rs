use iscale_image::buffer::try_alloc_zeroed;
use iscale_image::{SampleSlice, ScaleParams};

use crate::cursor::InputCursor;
use crate::error::StreamError;
use crate::kernels::{mitchell_kernel, quantize, AxisMap, Contributions, MITCHELL_SUPPORT};
use crate::stream::{check_output, check_width, ScaleStream, StreamStatus};

/// Separable Mitchell-Netravali resampler.
///
/// Every input row is filtered horizontally once and kept in a ring of
/// `f32` rows; an output row is produced as soon as every input row its
/// vertical window touches has arrived. Rows past the bottom edge are
/// replicated from the last row received when the input is flushed.
pub struct MitchellScaler {
    params: ScaleParams,
    spp: usize,
    x_map: AxisMap,
    x_contrib: Contributions,
    y_map: AxisMap,
    y_support: f64,
    y_stretch: f64,
    y_weights: Vec<f32>,
    acc: Vec<f32>,
    ring: Vec<f32>,
    ring_rows: usize,
    rows_in: usize,
    rows_out: usize,
    active: bool,
    in_max: f32,
    out_max: f32,
}

impl MitchellScaler {
    /// Create a new scaler.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Allocation`] if the working memory cannot be
    /// reserved.
    pub fn new(params: ScaleParams) -> Result<Self, StreamError> {
        let g = &params.geometry;
        let spp = params.spp_interp;

        let x_map = AxisMap::new(
            g.entire_in.width,
            g.entire_out.width,
            g.src_x_offset,
            g.dst_x_offset,
            params.width_in(),
        );
        let x_contrib = Contributions::new(&x_map, params.width_out())?;

        let y_map = AxisMap::new(
            g.entire_in.height,
            g.entire_out.height,
            g.src_y_offset,
            g.dst_y_offset,
            params.height_in(),
        );
        let y_stretch = y_map.in_per_out().max(1.0);
        let y_support = MITCHELL_SUPPORT * y_stretch;
        let window = (2.0 * y_support).ceil() as usize + 1;
        let ring_rows = window.min(params.height_in());

        Ok(Self {
            spp,
            x_map,
            x_contrib,
            y_map,
            y_support,
            y_stretch,
            y_weights: try_alloc_zeroed(window)?,
            acc: try_alloc_zeroed(params.width_out() * spp)?,
            ring: try_alloc_zeroed(ring_rows * params.width_out() * spp)?,
            ring_rows,
            rows_in: 0,
            rows_out: 0,
            active: false,
            in_max: params.format_in.max_value() as f32,
            out_max: params.format_out.max_value() as f32,
            params,
        })
    }

    fn row_len(&self) -> usize {
        self.params.width_out() * self.spp
    }

    /// First tap and inclusive clamped source rows of output row `j`.
    fn vertical_window(&self, j: usize) -> (i64, usize, usize) {
        let center = self.y_map.center(j);
        let first = (center - self.y_support).ceil() as i64;
        let last = first + self.y_weights.len() as i64 - 1;
        (first, self.y_map.clamp(first), self.y_map.clamp(last))
    }

    fn push_row(&mut self, row: SampleSlice<'_>) {
        if self.rows_in >= self.params.height_in() {
            return;
        }
        let len = self.row_len();
        let slot = (self.rows_in % self.ring_rows) * len;
        let dst = &mut self.ring[slot..slot + len];
        match row {
            SampleSlice::U8(src) => self.x_contrib.apply_row(&self.x_map, src, dst, self.spp),
            SampleSlice::U16(src) => self.x_contrib.apply_row(&self.x_map, src, dst, self.spp),
        }
        self.rows_in += 1;
    }

    fn emit(&mut self, output: &mut [u16]) {
        let j = self.rows_out;
        let center = self.y_map.center(j);
        let (first, _, _) = self.vertical_window(j);
        let newest = self.rows_in.saturating_sub(1) as i64;

        let mut sum = 0.0;
        for (k, w) in self.y_weights.iter_mut().enumerate() {
            let v = mitchell_kernel((center - (first + k as i64) as f64) / self.y_stretch);
            *w = v as f32;
            sum += v;
        }
        if sum.abs() > f64::EPSILON {
            self.y_weights
                .iter_mut()
                .for_each(|w| *w = (*w as f64 / sum) as f32);
        } else {
            self.y_weights.fill(0.0);
            let nearest = (center.round() as i64 - first).clamp(0, self.y_weights.len() as i64 - 1);
            self.y_weights[nearest as usize] = 1.0;
        }

        let len = self.row_len();
        self.acc.fill(0.0);
        for (k, &w) in self.y_weights.iter().enumerate() {
            if w == 0.0 {
                continue;
            }
            // rows below the last one received replicate it
            let row = (self.y_map.clamp(first + k as i64) as i64).min(newest) as usize;
            let slot = (row % self.ring_rows) * len;
            for (a, &v) in self.acc.iter_mut().zip(&self.ring[slot..slot + len]) {
                *a += w * v;
            }
        }
        for (o, &a) in output[..len].iter_mut().zip(&self.acc) {
            *o = quantize(a, self.in_max, self.out_max);
        }

        self.active = self.params.is_row_active(j);
        self.rows_out += 1;
    }
}

impl ScaleStream for MitchellScaler {
    fn params(&self) -> &ScaleParams {
        &self.params
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn process(
        &mut self,
        input: &mut InputCursor<'_>,
        output: &mut [u16],
        last: bool,
    ) -> Result<StreamStatus, StreamError> {
        check_output(output, &self.params)?;
        check_width(input, &self.params)?;

        let row_len = self.params.input_row_samples();
        loop {
            if self.rows_out >= self.params.height_out() {
                return Ok(StreamStatus::EndOfStream);
            }

            let (_, _, needed) = self.vertical_window(self.rows_out);
            if needed < self.rows_in {
                self.emit(output);
                return Ok(StreamStatus::OutputReady);
            }

            match input.take(row_len) {
                Some(row) => self.push_row(row),
                None if !input.is_exhausted() => {
                    return Err(StreamError::PartialRow {
                        expected: row_len,
                        actual: input.remaining(),
                    })
                }
                None if last && self.rows_in > 0 => {
                    self.emit(output);
                    return Ok(StreamStatus::OutputReady);
                }
                None if last => return Ok(StreamStatus::EndOfStream),
                None => return Ok(StreamStatus::NeedsInput),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::tests::{run_stream, square_params};
    use iscale_image::{Polarity, FRAC_1};
    use rand::Rng;

    #[test]
    fn upscale_constant_image() -> Result<(), StreamError> {
        let params = square_params(2, 8, 3, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let rows = [255u8; 12];
        let produced = run_stream(&mut scaler, &rows)?;

        assert_eq!(produced.len(), 8);
        for row in produced {
            assert_eq!(row.len(), 24);
            assert!(row.iter().all(|&v| v == FRAC_1));
        }
        Ok(())
    }

    #[test]
    fn upscale_gradient_is_monotonic() -> Result<(), StreamError> {
        let params = square_params(4, 16, 1, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let rows: Vec<u8> = (0..4).flat_map(|_| [0u8, 85, 170, 255]).collect();
        let produced = run_stream(&mut scaler, &rows)?;

        assert_eq!(produced.len(), 16);
        let row = &produced[7];
        assert!(row.windows(2).all(|w| w[0] <= w[1] + 64));
        assert!(row[0] < FRAC_1 / 16);
        assert!(row[15] > FRAC_1 - FRAC_1 / 16);
        Ok(())
    }

    #[test]
    fn one_row_per_call() -> Result<(), StreamError> {
        let params = square_params(2, 8, 1, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let mut out = vec![0u16; 8];

        // the first row alone cannot complete any output row
        let first = [10u8, 10];
        let mut cursor = InputCursor::new(SampleSlice::U8(&first));
        assert_eq!(
            scaler.process(&mut cursor, &mut out, false)?,
            StreamStatus::NeedsInput
        );
        assert!(cursor.is_exhausted());

        let second = [10u8, 10];
        let mut cursor = InputCursor::new(SampleSlice::U8(&second));
        let mut ready = 0;
        while scaler.process(&mut cursor, &mut out, false)? == StreamStatus::OutputReady {
            ready += 1;
        }
        assert_eq!(ready, 8);
        assert_eq!(
            scaler.process(&mut cursor, &mut out, true)?,
            StreamStatus::EndOfStream
        );
        Ok(())
    }

    #[test]
    fn partial_row_is_an_error() -> Result<(), StreamError> {
        let params = square_params(2, 8, 3, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let mut out = vec![0u16; 24];
        let mut cursor = InputCursor::new(SampleSlice::U8(&[1, 2, 3, 4]));
        assert_eq!(
            scaler.process(&mut cursor, &mut out, false),
            Err(StreamError::PartialRow {
                expected: 6,
                actual: 4
            })
        );
        Ok(())
    }

    #[test]
    fn output_slot_too_small() -> Result<(), StreamError> {
        let params = square_params(2, 8, 1, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let mut out = vec![0u16; 4];
        let mut cursor = InputCursor::new(SampleSlice::U8(&[1, 2]));
        assert_eq!(
            scaler.process(&mut cursor, &mut out, false),
            Err(StreamError::OutputTooSmall {
                expected: 8,
                actual: 4
            })
        );
        Ok(())
    }

    #[test]
    fn early_flush_replicates_last_row() -> Result<(), StreamError> {
        let params = square_params(4, 8, 1, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let produced = run_stream(&mut scaler, &[200u8; 4])?;

        assert_eq!(produced.len(), 8);
        let expected = quantize(200.0, 255.0, FRAC_1 as f32);
        for row in produced {
            for v in row {
                assert!(v.abs_diff(expected) <= 1);
            }
        }
        Ok(())
    }

    #[test]
    fn constant_images_stay_constant() -> Result<(), StreamError> {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let src = rng.random_range(1..12u32);
            let dst = rng.random_range(1..40i64);
            let spp = rng.random_range(1..5usize);
            let value: u8 = rng.random();

            let params = square_params(src, dst, spp, Polarity::Additive)?;
            let mut scaler = MitchellScaler::new(params)?;
            let rows = vec![value; (src * src) as usize * spp];
            let produced = run_stream(&mut scaler, &rows)?;

            assert_eq!(produced.len(), dst as usize, "{src} -> {dst}");
            let expected = quantize(value as f32, 255.0, FRAC_1 as f32);
            for v in produced.concat() {
                assert!(v.abs_diff(expected) <= 1, "{src} -> {dst}: {v} != {expected}");
            }
        }
        Ok(())
    }

    #[test]
    fn downscale_averages() -> Result<(), StreamError> {
        let params = square_params(8, 2, 1, Polarity::Additive)?;
        let mut scaler = MitchellScaler::new(params)?;
        let rows: Vec<u8> = (0..8)
            .flat_map(|_| [0u8, 255, 0, 255, 0, 255, 0, 255])
            .collect();
        let produced = run_stream(&mut scaler, &rows)?;

        assert_eq!(produced.len(), 2);
        let mid = FRAC_1 / 2;
        for v in produced.concat() {
            assert!(v.abs_diff(mid) < FRAC_1 / 5, "{v} far from {mid}");
        }
        Ok(())
    }
}
