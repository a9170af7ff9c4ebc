use iscale_image::{
    AxisScale, DecodeRegion, ImageError, InterpolationConfig, PatchGeometry, Polarity, RowBuffer,
    RowBufferLayout, SampleFormat, SampleSlice, ScaleParams,
};
use iscale_stream::{init_stream, FilterKind, InputCursor, ScaleStream, StreamError, StreamStatus};

use crate::collab::{ColorSpace, Device, RenderingParams};
use crate::decoder::{DecodeStrategy, RowDecoder};
use crate::descriptor::{ImageDescriptor, Orientation};
use crate::driver::{Line, RenderDriver};
use crate::error::RenderError;
use crate::managed::ManagedDriver;
use crate::standard::StandardDriver;

/// Image features the interpolated path does not handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsupportedFeature {
    /// Mask-color keying.
    MaskColor,
    /// Alpha samples.
    Alpha,
    /// Stencil masks.
    Masked,
    /// Anything but portrait orientation.
    Orientation,
}

/// Why an image is rendered without interpolation.
#[derive(Clone, Debug, PartialEq)]
pub enum InactiveReason {
    /// Interpolation was not requested.
    NotRequested,
    /// The image uses a feature the interpolated path does not handle.
    Unsupported(UnsupportedFeature),
    /// The image rectangles are not consistent.
    InvalidGeometry(ImageError),
    /// The whole image rounds to zero device pixels on an axis.
    DegenerateGeometry,
    /// A halftone device is neither enlarged enough nor reduced on both axes.
    HalftoneRestricted,
    /// The detail-preserving downscale needs a known device polarity.
    UnknownPolarity,
    /// The row buffer could not be allocated.
    ScratchAllocation(ImageError),
    /// The scaling stream could not be initialized.
    FilterInit(StreamError),
    /// The device could not build a color transform for the source.
    NoColorLink,
}

/// Input for one call of [`InterpolatedImage::process_row`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowInput<'a> {
    /// One raw scanline of the data rectangle.
    Row(SampleSlice<'a>),
    /// No more scanlines; drain the stream.
    Flush,
}

/// Outcome of one [`InterpolatedImage::process_row`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowStatus {
    /// The scanline was consumed and more are expected.
    NeedsInput,
    /// Every output row has been written.
    Complete,
}

/// An activated interpolated render of one image.
///
/// Owns the scaling stream, the row buffer and the render driver for the
/// lifetime of the render; dropping it releases all of them.
pub struct InterpolatedImage<D> {
    stream: Box<dyn ScaleStream>,
    filter: FilterKind,
    buffer: RowBuffer,
    decoder: RowDecoder,
    driver: D,
    x: i64,
    y: i64,
    dy: i64,
    line: usize,
}

impl<D: RenderDriver> InterpolatedImage<D> {
    /// The parameters of the render.
    pub fn params(&self) -> &ScaleParams {
        self.stream.params()
    }

    /// The resampling filter in use.
    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    /// The render driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The row decoder.
    pub fn decoder(&self) -> &RowDecoder {
        &self.decoder
    }

    /// Size of the row buffer in bytes.
    pub fn scratch_bytes(&self) -> usize {
        self.buffer.byte_len()
    }

    /// Device position of the first painted pixel of the first output row.
    pub fn origin(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Output rows produced so far, painted or not.
    pub fn rows_out(&self) -> usize {
        self.line
    }

    /// Decode one scanline, resample it and write every completed row.
    ///
    /// # Arguments
    ///
    /// * `image` - The image being painted.
    /// * `device` - The device receiving the fills.
    /// * `input` - The next scanline, or [`RowInput::Flush`] after the last.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of this image.
    pub fn process_row(
        &mut self,
        image: &ImageDescriptor<'_>,
        device: &mut dyn Device,
        input: RowInput<'_>,
    ) -> Result<RowStatus, RenderError> {
        let Self {
            stream,
            buffer,
            decoder,
            driver,
            x,
            y,
            dy,
            line,
            ..
        } = self;

        driver.begin_row(image)?;
        let params = *stream.params();
        let (region, resampled) = buffer.split_mut();

        let last = matches!(input, RowInput::Flush);
        let decoded = match input {
            RowInput::Row(row) => decoder.decode(row, region, image.color_space)?,
            RowInput::Flush => decoder.flush(),
        };
        let mut scratch = DecodeRegion::None;
        let canonical = driver.early_transform(image, decoded, &params, &mut scratch)?;

        let mut cursor = InputCursor::new(canonical);
        loop {
            let status = stream.process(&mut cursor, resampled, last)?;
            if status == StreamStatus::OutputReady {
                if stream.is_active() {
                    let row_y = *y + *line as i64 * *dy;
                    log::trace!("interpolated row {} at y = {}", line, row_y);
                    driver.render_line(
                        image,
                        device,
                        &Line {
                            samples: resampled,
                            params: &params,
                            x: *x,
                            y: row_y,
                        },
                    )?;
                }
                *line += 1;
            }
            match status {
                StreamStatus::OutputReady => continue,
                StreamStatus::NeedsInput => return Ok(RowStatus::NeedsInput),
                StreamStatus::EndOfStream => return Ok(RowStatus::Complete),
            }
        }
    }
}

/// The activation decision for one image.
pub enum Interpolation {
    /// Render without interpolation.
    Inactive(InactiveReason),
    /// Interpolate and remap through the color space.
    Standard(InterpolatedImage<StandardDriver>),
    /// Interpolate and transform through the color link.
    Managed(InterpolatedImage<ManagedDriver>),
}

impl Interpolation {
    /// Whether the image is rendered with interpolation.
    pub fn is_active(&self) -> bool {
        !matches!(self, Interpolation::Inactive(_))
    }

    /// Why interpolation is off, if it is.
    pub fn inactive_reason(&self) -> Option<&InactiveReason> {
        match self {
            Interpolation::Inactive(reason) => Some(reason),
            _ => None,
        }
    }

    /// Parameters of an active render.
    pub fn params(&self) -> Option<&ScaleParams> {
        match self {
            Interpolation::Inactive(_) => None,
            Interpolation::Standard(image) => Some(image.params()),
            Interpolation::Managed(image) => Some(image.params()),
        }
    }

    /// Filter of an active render.
    pub fn filter(&self) -> Option<FilterKind> {
        match self {
            Interpolation::Inactive(_) => None,
            Interpolation::Standard(image) => Some(image.filter()),
            Interpolation::Managed(image) => Some(image.filter()),
        }
    }

    /// Feed one scanline to the active render.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotActive`] if the image was not activated, or
    /// any error of [`InterpolatedImage::process_row`].
    pub fn process_row(
        &mut self,
        image: &ImageDescriptor<'_>,
        device: &mut dyn Device,
        input: RowInput<'_>,
    ) -> Result<RowStatus, RenderError> {
        match self {
            Interpolation::Inactive(_) => Err(RenderError::NotActive),
            Interpolation::Standard(render) => render.process_row(image, device, input),
            Interpolation::Managed(render) => render.process_row(image, device, input),
        }
    }
}

impl std::fmt::Debug for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interpolation::Inactive(reason) => f.debug_tuple("Inactive").field(reason).finish(),
            Interpolation::Standard(image) => f
                .debug_struct("Standard")
                .field("filter", &image.filter)
                .field("params", image.params())
                .finish(),
            Interpolation::Managed(image) => f
                .debug_struct("Managed")
                .field("filter", &image.filter)
                .field("params", image.params())
                .finish(),
        }
    }
}

/// Profile-path settings shared by the decode and render stages.
struct ManagedSetup {
    early_cm: bool,
    curves_needed: bool,
    is_lab: bool,
}

/// Whether the source can go through the device profile transform.
fn managed_eligible(image: &ImageDescriptor<'_>, device: &dyn Device) -> bool {
    let cs = image.color_space;
    let has_profile =
        cs.profile().is_some() || cs.base_space().is_some_and(|base| base.profile().is_some());
    let bits = image.bits_per_component;
    has_profile
        && device.profile_components() == device.color_info().num_components
        && device.uses_standard_color_mapping()
        && (bits <= 8 || bits == 16)
}

/// The space a color link transforms from.
fn link_source<'a>(cs: &'a dyn ColorSpace) -> &'a dyn ColorSpace {
    if cs.is_cie() {
        if let Some(icc) = cs.icc_equivalent() {
            return icc;
        }
    }
    cs.base_space().unwrap_or(cs)
}

fn unsupported_feature(image: &ImageDescriptor<'_>) -> Option<UnsupportedFeature> {
    if image.mask_color {
        Some(UnsupportedFeature::MaskColor)
    } else if image.orientation != Orientation::Portrait {
        Some(UnsupportedFeature::Orientation)
    } else if image.masked {
        Some(UnsupportedFeature::Masked)
    } else if image.alpha {
        Some(UnsupportedFeature::Alpha)
    } else {
        None
    }
}

fn patch_geometry(
    image: &ImageDescriptor<'_>,
) -> Result<(AxisScale, AxisScale, PatchGeometry), ImageError> {
    let x_scale = AxisScale::new(image.width, image.dst_width)?;
    let y_scale = AxisScale::new(image.height, image.dst_height)?;
    let geometry = PatchGeometry::new(&x_scale, &y_scale, image.data_rect, image.clip_rect)?;
    Ok((x_scale, y_scale, geometry))
}

fn inactive(reason: InactiveReason) -> Interpolation {
    log::debug!("interpolation inactive: {:?}", reason);
    Interpolation::Inactive(reason)
}

/// Decide whether and how an image is interpolated, and set up the render.
///
/// Never fails: every infeasible configuration, allocation failure or
/// initialization failure yields [`Interpolation::Inactive`] and the caller
/// falls back to the non-interpolated renderer. On the managed path the
/// color transform link is built if the descriptor has none, and cached on
/// it.
///
/// # Arguments
///
/// * `image` - The image to paint.
/// * `device` - The output device.
/// * `config` - Thresholds and limits.
pub fn select_interpolation(
    image: &mut ImageDescriptor<'_>,
    device: &dyn Device,
    config: &InterpolationConfig,
) -> Interpolation {
    if !image.interpolate {
        return inactive(InactiveReason::NotRequested);
    }
    if let Some(feature) = unsupported_feature(image) {
        return inactive(InactiveReason::Unsupported(feature));
    }

    let managed = managed_eligible(image, device);

    let (x_scale, y_scale, geometry) = match patch_geometry(image) {
        Ok(g) => g,
        Err(err) => return inactive(InactiveReason::InvalidGeometry(err)),
    };
    if geometry.is_degenerate() {
        return inactive(InactiveReason::DegenerateGeometry);
    }

    let cs = image.color_space;
    let indexed = cs.is_indexed();
    let spp_decode = cs.base_space().unwrap_or(cs).num_components();
    let early_cm = managed && geometry.data_out.height > geometry.entire_in.height;
    let spp_interp = if early_cm {
        device.profile_components()
    } else {
        spp_decode
    };

    let wide = image.bits_per_component > 8;
    let format_in = match (wide, managed) {
        (false, _) => SampleFormat::Byte,
        (true, true) => SampleFormat::Word,
        (true, false) => SampleFormat::Frac,
    };
    let format_out = if managed {
        SampleFormat::Word
    } else {
        SampleFormat::Frac
    };

    let info = device.color_info();
    let params = ScaleParams {
        geometry,
        format_in,
        format_out,
        spp_decode,
        spp_interp,
        polarity: info.polarity,
        early_cm,
    };

    let filter = if config.is_halftone(info.levels()) {
        if params.enlarges_by(config.halftone_min_enlargement) {
            FilterKind::Mitchell
        } else if params.reduces() {
            if info.polarity == Polarity::Unknown {
                return inactive(InactiveReason::UnknownPolarity);
            }
            FilterKind::DetailDownscale
        } else {
            return inactive(InactiveReason::HalftoneRestricted);
        }
    } else {
        FilterKind::Mitchell
    };

    let setup = if managed {
        let source = link_source(cs);
        let is_lab = source.is_lab();
        Some(ManagedSetup {
            early_cm,
            curves_needed: image.has_decode_curves() && !is_lab,
            is_lab,
        })
    } else {
        None
    };

    let need_decode = match &setup {
        Some(s) => !(((image.device_color || s.is_lab) && !s.curves_needed) || cs.is_cie()),
        None => !(image.device_color || cs.is_cie() || cs.is_lab()),
    };
    let mirrored = x_scale.is_mirrored();
    let strategy = DecodeStrategy::choose(
        image.bits_per_component,
        indexed,
        need_decode,
        mirrored,
        managed,
    );

    let layout = RowBufferLayout {
        decode_format: strategy.region_format(format_in),
        decode_samples: params.width_in() * spp_decode,
        output_width: params.width_out(),
        output_samples_per_pixel: spp_interp,
        device_pixel_bytes: info.pixel_bytes(),
    };
    let buffer = match RowBuffer::allocate(&layout, config.scratch_limit) {
        Ok(buffer) => buffer,
        Err(err) => return inactive(InactiveReason::ScratchAllocation(err)),
    };
    let stream = match init_stream(filter, params) {
        Ok(stream) => stream,
        Err(err) => return inactive(InactiveReason::FilterInit(err)),
    };

    let curves = (0..image.source_components())
        .map(|i| image.curve(i))
        .collect();
    let decoder = RowDecoder::new(
        strategy,
        params.width_in(),
        image.source_components(),
        spp_decode,
        image.bits_per_component,
        mirrored,
        format_in,
        curves,
    );

    if managed && image.color_link.is_none() {
        let rendering = RenderingParams::image(image.rendering_intent);
        image.color_link = device.build_color_link(link_source(cs), &rendering);
        if image.color_link.is_none() {
            return inactive(InactiveReason::NoColorLink);
        }
    }

    // device position of the data rectangle's first device-left pixel
    let lead = if mirrored {
        (x_scale.src_extent() as usize - geometry.src_x_offset) as i64
    } else {
        image.data_rect.x as i64
    };
    let x = image.origin_x.pixround()
        + x_scale.rounded_edge(lead)
        + geometry.left_margin_out as i64;
    let mut y = image.origin_y.pixround() + y_scale.rounded_edge(image.data_rect.y as i64);
    let dy = if y_scale.is_mirrored() {
        y -= 1;
        -1
    } else {
        1
    };

    log::debug!(
        "interpolation active: {} {:?} filter, {} -> {}, {} samples per pixel, {:?} decode, {} scratch bytes",
        if managed { "managed" } else { "standard" },
        filter,
        geometry.data_in,
        geometry.data_out,
        spp_interp,
        strategy,
        buffer.byte_len()
    );

    match setup {
        Some(setup) => {
            let driver = ManagedDriver::new(
                setup.early_cm,
                device.must_halftone(),
                device.has_transfer(),
                device.profile_components(),
            );
            Interpolation::Managed(InterpolatedImage {
                stream,
                filter,
                buffer,
                decoder,
                driver,
                x,
                y,
                dy,
                line: 0,
            })
        }
        None => Interpolation::Standard(InterpolatedImage {
            stream,
            filter,
            buffer,
            decoder,
            driver: StandardDriver::new(image),
            x,
            y,
            dy,
            line: 0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{DeviceColor, ProfileInfo};
    use crate::error::RemapError;

    struct Space {
        components: usize,
        profile: Option<ProfileInfo>,
        cie: bool,
        base: Option<Box<Space>>,
    }

    impl Space {
        fn device(components: usize) -> Self {
            Self {
                components,
                profile: None,
                cie: false,
                base: None,
            }
        }
    }

    impl ColorSpace for Space {
        fn num_components(&self) -> usize {
            self.components
        }
        fn base_space(&self) -> Option<&dyn ColorSpace> {
            self.base.as_deref().map(|b| b as &dyn ColorSpace)
        }
        fn profile(&self) -> Option<ProfileInfo> {
            self.profile
        }
        fn is_cie(&self) -> bool {
            self.cie
        }
        fn icc_equivalent(&self) -> Option<&dyn ColorSpace> {
            self.base_space()
        }
        fn is_device_accurate(&self) -> bool {
            true
        }
        fn remap_color(&self, _: &[f32], _: &dyn Device) -> Result<DeviceColor, RemapError> {
            Ok(DeviceColor::Pure(0))
        }
        fn remap_concrete_color(&self, _: &[u16], _: &dyn Device) -> Result<DeviceColor, RemapError> {
            Ok(DeviceColor::Pure(0))
        }
    }

    #[test]
    fn features_rejected_in_order() {
        let gray = Space::device(1);
        let mut image = ImageDescriptor::new(4, 4, 8, &gray);
        assert_eq!(unsupported_feature(&image), None);

        image.alpha = true;
        assert_eq!(unsupported_feature(&image), Some(UnsupportedFeature::Alpha));
        image.masked = true;
        assert_eq!(unsupported_feature(&image), Some(UnsupportedFeature::Masked));
        image.orientation = Orientation::Landscape;
        assert_eq!(
            unsupported_feature(&image),
            Some(UnsupportedFeature::Orientation)
        );
        image.mask_color = true;
        assert_eq!(unsupported_feature(&image), Some(UnsupportedFeature::MaskColor));
    }

    #[test]
    fn link_source_prefers_profile_equivalent() {
        let rgb = Space::device(3);
        assert_eq!(link_source(&rgb).num_components(), 3);

        let indexed = Space {
            base: Some(Box::new(Space::device(4))),
            ..Space::device(1)
        };
        assert_eq!(link_source(&indexed).num_components(), 4);

        let cie = Space {
            cie: true,
            base: Some(Box::new(Space {
                profile: Some(ProfileInfo {
                    num_components: 3,
                    is_lab: true,
                }),
                ..Space::device(3)
            })),
            ..Space::device(3)
        };
        assert!(link_source(&cie).is_lab());
    }

    #[test]
    fn inactive_reports_reason() {
        let decision = inactive(InactiveReason::NotRequested);
        assert!(!decision.is_active());
        assert_eq!(decision.inactive_reason(), Some(&InactiveReason::NotRequested));
        assert_eq!(decision.params(), None);
        assert_eq!(decision.filter(), None);
    }
}
