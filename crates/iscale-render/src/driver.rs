use iscale_image::{DecodeRegion, SampleSlice, ScaleParams};

use crate::collab::{Device, DeviceColor};
use crate::descriptor::ImageDescriptor;
use crate::error::RenderError;

/// One resampled row ready to be written to the device.
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    /// The whole resampled row, `width_out * spp_interp` samples.
    pub samples: &'a [u16],
    /// Parameters of the render.
    pub params: &'a ScaleParams,
    /// Device x of the first painted pixel.
    pub x: i64,
    /// Device row.
    pub y: i64,
}

impl Line<'_> {
    /// Number of pixels painted on the device.
    pub fn painted_width(&self) -> usize {
        self.params.geometry.clip_out.width
    }

    /// Pixels of the row left of the clip rectangle.
    pub fn left_margin(&self) -> usize {
        self.params.geometry.left_margin_out
    }
}

/// Turns resampled rows into device fills.
///
/// Both drivers share the geometry and decode stages; they differ in how a
/// resampled sample tuple becomes a device color.
pub trait RenderDriver {
    /// Check per-scanline preconditions before any work is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanline cannot be rendered.
    fn begin_row(&self, _image: &ImageDescriptor<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    /// Transform decoded samples before they are resampled.
    ///
    /// The default passes `decoded` through. `scratch` is owned by the caller
    /// for the duration of one scanline.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch memory cannot be reserved.
    fn early_transform<'s>(
        &self,
        _image: &ImageDescriptor<'_>,
        decoded: SampleSlice<'s>,
        _params: &ScaleParams,
        _scratch: &'s mut DecodeRegion,
    ) -> Result<SampleSlice<'s>, RenderError> {
        Ok(decoded)
    }

    /// Write the painted part of one resampled row.
    ///
    /// # Errors
    ///
    /// Returns an error if a color cannot be resolved or a fill fails; the
    /// rest of the row is not written.
    fn render_line(
        &mut self,
        image: &ImageDescriptor<'_>,
        device: &mut dyn Device,
        line: &Line<'_>,
    ) -> Result<(), RenderError>;
}

/// Number of consecutive pixels from `start` with the same sample tuple.
///
/// Always at least one and never past `end`.
pub(crate) fn run_length(samples: &[u16], spp: usize, start: usize, end: usize) -> usize {
    let first = &samples[start * spp..(start + 1) * spp];
    let rest = &samples[(start + 1) * spp..end * spp];
    let same = match first {
        [v] => rest.iter().take_while(|s| *s == v).count(),
        [a, b, c] => rest
            .chunks_exact(3)
            .take_while(|p| p[0] == *a && p[1] == *b && p[2] == *c)
            .count(),
        [a, b, c, d] => rest
            .chunks_exact(4)
            .take_while(|p| p[0] == *a && p[1] == *b && p[2] == *c && p[3] == *d)
            .count(),
        _ => rest.chunks_exact(spp).take_while(|p| *p == first).count(),
    };
    1 + same
}

/// Resolve and fill `count` pixels, packing runs of identical tuples.
///
/// A pure color is resolved once per run and filled with a single call; a
/// composite color is filled pixel by pixel.
///
/// # Arguments
///
/// * `samples` - Tuples of the painted pixels, `spp` samples each.
/// * `spp` - Samples per pixel.
/// * `x` - Device x of the first pixel.
/// * `y` - Device row.
/// * `device` - The device receiving the fills.
/// * `resolve` - Maps one tuple to a device color.
pub(crate) fn pack_runs<F>(
    samples: &[u16],
    spp: usize,
    x: i64,
    y: i64,
    device: &mut dyn Device,
    mut resolve: F,
) -> Result<(), RenderError>
where
    F: FnMut(&[u16], &dyn Device) -> Result<DeviceColor, RenderError>,
{
    let count = samples.len() / spp;
    let mut i = 0;
    while i < count {
        let color = resolve(&samples[i * spp..(i + 1) * spp], &*device)?;
        match color {
            DeviceColor::Pure(index) => {
                let run = run_length(samples, spp, i, count);
                device.fill_run(x + i as i64, y, run, index)?;
                i += run;
            }
            composite => {
                device.fill_composite(x + i as i64, y, &composite)?;
                i += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_length_fast_paths() {
        assert_eq!(run_length(&[5, 5, 5, 6], 1, 0, 4), 3);
        assert_eq!(run_length(&[5, 5, 5, 6], 1, 3, 4), 1);
        assert_eq!(run_length(&[5, 5, 5, 5], 1, 1, 3), 2);

        let rgb = [1, 2, 3, 1, 2, 3, 1, 2, 4];
        assert_eq!(run_length(&rgb, 3, 0, 3), 2);

        let cmyk = [1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4];
        assert_eq!(run_length(&cmyk, 4, 0, 3), 3);
        assert_eq!(run_length(&cmyk, 4, 1, 2), 1);
    }

    #[test]
    fn run_length_full_tuple() {
        let two = [7, 8, 7, 8, 7, 9];
        assert_eq!(run_length(&two, 2, 0, 3), 2);

        let five = [1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        assert_eq!(run_length(&five, 5, 0, 2), 2);
    }
}
