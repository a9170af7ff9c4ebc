use iscale_image::buffer::try_alloc_zeroed;
use iscale_image::{Polarity, SampleSlice, ScaleParams};
use num_traits::AsPrimitive;

use crate::cursor::InputCursor;
use crate::error::StreamError;
use crate::kernels::{quantize, AxisMap};
use crate::stream::{check_output, check_width, ScaleStream, StreamStatus};

/// Reduction filter that keeps the darkest pixel of every window.
///
/// The source is partitioned into rectangular windows, one per output pixel.
/// Darkness is the component sum: smallest on additive devices, largest on
/// subtractive ones. Thin dark lines survive the reduction instead of being
/// averaged into gray.
pub struct DetailDownscaler {
    params: ScaleParams,
    spp: usize,
    x_windows: Vec<(usize, usize)>,
    y_map: AxisMap,
    acc: Vec<f32>,
    score: Vec<f32>,
    filled: bool,
    darker_is_lower: bool,
    rows_in: usize,
    rows_out: usize,
    active: bool,
    in_max: f32,
    out_max: f32,
}

impl DetailDownscaler {
    /// Create a new downscaler.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnknownPolarity`] if the device polarity is not
    /// known, or [`StreamError::Allocation`] if the working memory cannot be
    /// reserved.
    pub fn new(params: ScaleParams) -> Result<Self, StreamError> {
        let darker_is_lower = match params.polarity {
            Polarity::Additive => true,
            Polarity::Subtractive => false,
            Polarity::Unknown => return Err(StreamError::UnknownPolarity),
        };
        let g = &params.geometry;
        let spp = params.spp_interp;
        let width_out = params.width_out();

        let x_map = AxisMap::new(
            g.entire_in.width,
            g.entire_out.width,
            g.src_x_offset,
            g.dst_x_offset,
            params.width_in(),
        );
        let mut x_windows = Vec::new();
        x_windows.try_reserve_exact(width_out)?;
        x_windows.extend((0..width_out).map(|j| x_map.box_window(j, width_out)));

        Ok(Self {
            spp,
            x_windows,
            y_map: AxisMap::new(
                g.entire_in.height,
                g.entire_out.height,
                g.src_y_offset,
                g.dst_y_offset,
                params.height_in(),
            ),
            acc: try_alloc_zeroed(width_out * spp)?,
            score: try_alloc_zeroed(width_out)?,
            filled: false,
            darker_is_lower,
            rows_in: 0,
            rows_out: 0,
            active: false,
            in_max: params.format_in.max_value() as f32,
            out_max: params.format_out.max_value() as f32,
            params,
        })
    }

    fn is_darker(&self, candidate: f32, current: f32) -> bool {
        if self.darker_is_lower {
            candidate < current
        } else {
            candidate > current
        }
    }

    fn merge_row<T: AsPrimitive<f32>>(&mut self, row: &[T]) {
        let spp = self.spp;
        for (j, &(lo, hi)) in self.x_windows.iter().enumerate() {
            let mut best = lo;
            let mut best_score = f32::NAN;
            for x in lo..=hi {
                let s: f32 = row[x * spp..(x + 1) * spp].iter().map(|v| v.as_()).sum();
                if x == lo || self.is_darker(s, best_score) {
                    best = x;
                    best_score = s;
                }
            }
            if !self.filled || self.is_darker(best_score, self.score[j]) {
                self.score[j] = best_score;
                for (a, v) in self.acc[j * spp..(j + 1) * spp]
                    .iter_mut()
                    .zip(&row[best * spp..(best + 1) * spp])
                {
                    *a = v.as_();
                }
            }
        }
        self.filled = true;
    }

    fn push_row(&mut self, row: SampleSlice<'_>) {
        if self.rows_in >= self.params.height_in() {
            return;
        }
        match row {
            SampleSlice::U8(src) => self.merge_row(src),
            SampleSlice::U16(src) => self.merge_row(src),
        }
        self.rows_in += 1;
    }

    fn emit(&mut self, output: &mut [u16]) {
        for (o, &a) in output.iter_mut().zip(&self.acc) {
            *o = quantize(a, self.in_max, self.out_max);
        }
        self.filled = false;
        self.active = self.params.is_row_active(self.rows_out);
        self.rows_out += 1;
    }
}

impl ScaleStream for DetailDownscaler {
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
        let height_out = self.params.height_out();
        loop {
            if self.rows_out >= height_out {
                return Ok(StreamStatus::EndOfStream);
            }

            let (_, hi) = self.y_map.box_window(self.rows_out, height_out);
            if hi < self.rows_in {
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
                // missing rows repeat whatever the window last held
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
    use iscale_image::sample::byte_to_frac;
    use iscale_image::FRAC_1;

    #[test]
    fn thin_dark_line_survives() -> Result<(), StreamError> {
        let params = square_params(8, 2, 1, Polarity::Additive)?;
        let mut scaler = DetailDownscaler::new(params)?;

        // a one pixel dark column at x = 5 on white
        let mut rows = vec![255u8; 64];
        for y in 0..8 {
            rows[y * 8 + 5] = 0;
        }
        let produced = run_stream(&mut scaler, &rows)?;

        assert_eq!(produced, vec![vec![FRAC_1, 0], vec![FRAC_1, 0]]);
        Ok(())
    }

    #[test]
    fn subtractive_keeps_largest_sum() -> Result<(), StreamError> {
        let params = square_params(4, 2, 2, Polarity::Subtractive)?;
        let mut scaler = DetailDownscaler::new(params)?;

        let mut rows = vec![0u8; 4 * 4 * 2];
        // pixel (1, 2) carries ink in both channels, pixel (0, 3) in one
        rows[(2 * 4 + 1) * 2] = 100;
        rows[(2 * 4 + 1) * 2 + 1] = 100;
        rows[(3 * 4) * 2] = 150;
        let produced = run_stream(&mut scaler, &rows)?;

        assert_eq!(produced.len(), 2);
        assert_eq!(produced[0], vec![0; 4]);
        let ink = byte_to_frac(100);
        assert!(produced[1][0].abs_diff(ink) <= 1);
        assert!(produced[1][1].abs_diff(ink) <= 1);
        assert_eq!(&produced[1][2..], &[0, 0]);
        Ok(())
    }

    #[test]
    fn flush_repeats_last_window() -> Result<(), StreamError> {
        let params = square_params(6, 3, 1, Polarity::Additive)?;
        let mut scaler = DetailDownscaler::new(params)?;

        // only the first two rows arrive
        let rows = [9u8, 9, 7, 7, 5, 5, 9, 9, 7, 7, 5, 5];
        let produced = run_stream(&mut scaler, &rows)?;

        assert_eq!(produced.len(), 3);
        assert_eq!(produced[1], produced[0]);
        assert_eq!(produced[2], produced[0]);
        Ok(())
    }

    #[test]
    fn rejects_unknown_polarity() -> Result<(), StreamError> {
        let params = square_params(4, 2, 1, Polarity::Unknown)?;
        assert!(matches!(
            DetailDownscaler::new(params),
            Err(StreamError::UnknownPolarity)
        ));
        Ok(())
    }
}
