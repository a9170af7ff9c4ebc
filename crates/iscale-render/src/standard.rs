use iscale_image::sample::frac_to_float;
use iscale_image::DecodeCurve;

use crate::collab::{ColorSpace, Device};
use crate::descriptor::ImageDescriptor;
use crate::driver::{pack_runs, Line, RenderDriver};
use crate::error::RenderError;

/// Render driver that remaps every resampled tuple through the color space.
///
/// Resampled samples are fracs. Device-accurate spaces take them as they
/// are; other spaces get float components, decoded through the image's
/// decode curves unless the tuple is a resolved palette entry or a Lab
/// encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardDriver {
    indexed: bool,
    is_lab: bool,
    curves: Vec<DecodeCurve>,
}

impl StandardDriver {
    /// Create a driver for an image.
    pub fn new(image: &ImageDescriptor<'_>) -> Self {
        let cs = image.color_space;
        Self {
            indexed: cs.is_indexed(),
            is_lab: cs.is_lab(),
            curves: (0..cs.num_components()).map(|i| image.curve(i)).collect(),
        }
    }
}

impl RenderDriver for StandardDriver {
    fn render_line(
        &mut self,
        image: &ImageDescriptor<'_>,
        device: &mut dyn Device,
        line: &Line<'_>,
    ) -> Result<(), RenderError> {
        let cs = image.color_space;
        let actual: &dyn ColorSpace = cs.base_space().unwrap_or(cs);
        let device_accurate = actual.is_device_accurate();
        let raw_floats = self.indexed || self.is_lab;

        let spp = line.params.spp_interp;
        let start = line.left_margin() * spp;
        let painted = &line.samples[start..start + line.painted_width() * spp];

        let mut values = vec![0.0f32; spp];
        pack_runs(painted, spp, line.x, line.y, device, |px, dev| {
            if device_accurate {
                return Ok(actual.remap_concrete_color(px, dev)?);
            }
            for (j, (v, &s)) in values.iter_mut().zip(px).enumerate() {
                *v = if raw_floats {
                    frac_to_float(s)
                } else {
                    self.curves.get(j).copied().unwrap_or_default().decode_frac(s)
                };
            }
            Ok(actual.remap_color(&values, dev)?)
        })
    }
}
