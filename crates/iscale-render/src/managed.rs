use iscale_image::buffer::try_alloc_zeroed;
use iscale_image::{DecodeRegion, ImageError, SampleSlice, SampleSliceMut, ScaleParams};

use crate::collab::{ColorLink, Device, DeviceColor};
use crate::descriptor::ImageDescriptor;
use crate::driver::{pack_runs, Line, RenderDriver};
use crate::error::RenderError;

/// Render driver for sources with an embedded profile.
///
/// Samples go through the image's color transform link in batches: once per
/// input row before resampling when enlarging, or once per resampled row
/// otherwise. Transformed 16-bit tuples are encoded by the device, or routed
/// through its transfer function and halftoning when those are required.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManagedDriver {
    early_cm: bool,
    must_halftone: bool,
    has_transfer: bool,
    spp_cm: usize,
}

impl ManagedDriver {
    /// Create a driver.
    ///
    /// # Arguments
    ///
    /// * `early_cm` - Whether the transform runs before resampling.
    /// * `must_halftone` - Whether the device halftones.
    /// * `has_transfer` - Whether the device applies a transfer function.
    /// * `spp_cm` - Components of the device profile.
    pub fn new(early_cm: bool, must_halftone: bool, has_transfer: bool, spp_cm: usize) -> Self {
        Self {
            early_cm,
            must_halftone,
            has_transfer,
            spp_cm,
        }
    }

    /// Whether the transform runs before resampling.
    pub fn early_cm(&self) -> bool {
        self.early_cm
    }

    fn link<'i>(&self, image: &'i ImageDescriptor<'_>) -> Result<&'i dyn ColorLink, RenderError> {
        image
            .color_link
            .as_deref()
            .ok_or(RenderError::MissingColorTransform)
    }
}

impl RenderDriver for ManagedDriver {
    fn begin_row(&self, image: &ImageDescriptor<'_>) -> Result<(), RenderError> {
        self.link(image).map(|_| ())
    }

    fn early_transform<'s>(
        &self,
        image: &ImageDescriptor<'_>,
        decoded: SampleSlice<'s>,
        params: &ScaleParams,
        scratch: &'s mut DecodeRegion,
    ) -> Result<SampleSlice<'s>, RenderError> {
        let link = self.link(image)?;
        if !self.early_cm || link.is_identity() || decoded.is_empty() {
            return Ok(decoded);
        }

        let pixels = params.width_in();
        let len = pixels * self.spp_cm;
        let dst = match decoded {
            SampleSlice::U8(_) => {
                *scratch = DecodeRegion::Bytes(try_alloc_zeroed(len).map_err(ImageError::from)?);
                SampleSliceMut::U8(scratch.bytes_mut(len)?)
            }
            SampleSlice::U16(_) => {
                *scratch = DecodeRegion::Words(try_alloc_zeroed(len).map_err(ImageError::from)?);
                SampleSliceMut::U16(scratch.words_mut(len)?)
            }
        };
        link.map_buffer(decoded, dst, pixels, params.spp_decode, self.spp_cm);
        Ok(scratch.view(len).unwrap_or(decoded))
    }

    fn render_line(
        &mut self,
        image: &ImageDescriptor<'_>,
        device: &mut dyn Device,
        line: &Line<'_>,
    ) -> Result<(), RenderError> {
        let link = self.link(image)?;
        let params = line.params;

        let transformed;
        let (samples, spp) = if link.is_identity() || self.early_cm {
            (line.samples, params.spp_interp)
        } else {
            let pixels = params.width_out();
            let mut cm: Vec<u16> =
                try_alloc_zeroed(pixels * self.spp_cm).map_err(ImageError::from)?;
            link.map_buffer(
                SampleSlice::U16(&line.samples[..pixels * params.spp_interp]),
                SampleSliceMut::U16(&mut cm),
                pixels,
                params.spp_interp,
                self.spp_cm,
            );
            transformed = cm;
            (&transformed[..], self.spp_cm)
        };

        let start = line.left_margin() * spp;
        let painted = &samples[start..start + line.painted_width() * spp];
        let post_process = self.must_halftone || self.has_transfer;
        let (transfer, halftone) = (self.has_transfer, self.must_halftone);

        pack_runs(painted, spp, line.x, line.y, device, |px, dev| {
            if post_process {
                return Ok(dev.transfer_halftone(px, transfer, halftone));
            }
            Ok(match dev.encode_color(px) {
                Some(index) => DeviceColor::Pure(index),
                None => DeviceColor::Composite(px.to_vec()),
            })
        })
    }
}
