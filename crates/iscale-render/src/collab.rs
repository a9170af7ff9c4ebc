//! Interfaces of the collaborators an interpolated render talks to.
//!
//! The device owns pixel storage, color encoding and its output profile; the
//! color space owns remapping of source colors; a color link is a configured
//! source to device transform. Implementations live outside this crate.

use iscale_image::{Polarity, SampleSlice, SampleSliceMut};

use crate::error::{DeviceError, RemapError};

/// An encoded device color.
pub type ColorIndex = u64;

/// Color capabilities of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorInfo {
    /// Color components per device pixel.
    pub num_components: usize,
    /// Highest gray level of a single-component device.
    pub max_gray: u32,
    /// Highest level per component of a multi-component device.
    pub max_color: u32,
    /// Whether higher values are lighter or darker.
    pub polarity: Polarity,
    /// Bits per device pixel.
    pub depth: u32,
}

impl ColorInfo {
    /// Highest level the device can produce per channel.
    pub fn levels(&self) -> u32 {
        if self.num_components == 1 {
            self.max_gray
        } else {
            self.max_color
        }
    }

    /// Bytes per device pixel, rounded up.
    pub fn pixel_bytes(&self) -> usize {
        self.depth.div_ceil(8) as usize
    }
}

/// A device color for one pixel or a run of pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceColor {
    /// An encoded color that can be filled in runs.
    Pure(ColorIndex),
    /// A color that must be filled pixel by pixel (halftone, pattern, unencodable).
    Composite(Vec<u16>),
}

/// Rendering intent of a color transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderingIntent {
    /// Perceptual.
    #[default]
    Perceptual,
    /// Media-relative colorimetric.
    RelativeColorimetric,
    /// Saturation.
    Saturation,
    /// ICC-absolute colorimetric.
    AbsoluteColorimetric,
}

/// Kind of object a color transform is built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GraphicsType {
    /// Vector graphics.
    Vector,
    /// Sampled images.
    #[default]
    Image,
    /// Text.
    Text,
}

/// Parameters for building a color transform link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderingParams {
    /// The rendering intent.
    pub rendering_intent: RenderingIntent,
    /// Whether black point compensation is applied.
    pub black_point_compensation: bool,
    /// The object type the link is built for.
    pub graphics_type: GraphicsType,
}

impl RenderingParams {
    /// Parameters for an interpolated image with the given intent.
    pub fn image(rendering_intent: RenderingIntent) -> Self {
        Self {
            rendering_intent,
            black_point_compensation: true,
            graphics_type: GraphicsType::Image,
        }
    }
}

/// An embedded device-independent color profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Components of the profile's color space.
    pub num_components: usize,
    /// Whether the profile encodes CIE Lab.
    pub is_lab: bool,
}

/// A configured source to device color transform.
pub trait ColorLink {
    /// Whether the transform leaves samples untouched.
    fn is_identity(&self) -> bool;

    /// Transform `pixels` interleaved pixels.
    ///
    /// `src` and `dst` have the same sample width; `src` holds
    /// `pixels * src_components` samples and `dst` at least
    /// `pixels * dst_components`.
    fn map_buffer(
        &self,
        src: SampleSlice<'_>,
        dst: SampleSliceMut<'_>,
        pixels: usize,
        src_components: usize,
        dst_components: usize,
    );
}

/// A source color space.
pub trait ColorSpace {
    /// Components per pixel of samples in this space.
    fn num_components(&self) -> usize;

    /// The base space of an indexed space.
    fn base_space(&self) -> Option<&dyn ColorSpace> {
        None
    }

    /// Whether samples are palette indices.
    fn is_indexed(&self) -> bool {
        self.base_space().is_some()
    }

    /// The embedded profile, if the space carries one.
    fn profile(&self) -> Option<ProfileInfo> {
        None
    }

    /// Whether this is a CIE-class space, decoded only after resampling.
    fn is_cie(&self) -> bool {
        false
    }

    /// Whether samples are a Lab encoding.
    fn is_lab(&self) -> bool {
        self.profile().is_some_and(|p| p.is_lab)
    }

    /// The profile-based equivalent of a PostScript CIE space.
    fn icc_equivalent(&self) -> Option<&dyn ColorSpace> {
        None
    }

    /// Whether frac samples can go straight to [`ColorSpace::remap_concrete_color`].
    fn is_device_accurate(&self) -> bool;

    /// Map decoded float components to a device color.
    fn remap_color(&self, values: &[f32], device: &dyn Device) -> Result<DeviceColor, RemapError>;

    /// Map device-accurate frac components to a device color.
    fn remap_concrete_color(
        &self,
        values: &[u16],
        device: &dyn Device,
    ) -> Result<DeviceColor, RemapError>;

    /// Resolve a palette coordinate to base-space byte components.
    ///
    /// Only called on indexed spaces.
    fn lookup_index_bytes(&self, _index: f32, _out: &mut [u8]) {}

    /// Resolve a palette coordinate to base-space frac components.
    ///
    /// Only called on indexed spaces.
    fn lookup_index_frac(&self, _index: f32, _out: &mut [u16]) {}
}

/// An output device.
pub trait Device {
    /// Color capabilities of the device.
    fn color_info(&self) -> ColorInfo;

    /// Components of the device's output profile.
    fn profile_components(&self) -> usize;

    /// Whether the device maps colors with the standard procedures.
    fn uses_standard_color_mapping(&self) -> bool {
        true
    }

    /// Whether colors must be halftoned.
    fn must_halftone(&self) -> bool {
        false
    }

    /// Whether a transfer function is installed.
    fn has_transfer(&self) -> bool {
        false
    }

    /// Encode 16-bit profile-space components to a color index.
    fn encode_color(&self, values: &[u16]) -> Option<ColorIndex>;

    /// Apply the transfer function and/or halftoning to 16-bit components.
    fn transfer_halftone(&self, values: &[u16], transfer: bool, halftone: bool) -> DeviceColor;

    /// Fill `width` pixels of row `y` starting at `x` with a pure color.
    fn fill_run(&mut self, x: i64, y: i64, width: usize, color: ColorIndex)
        -> Result<(), DeviceError>;

    /// Fill the single pixel at `(x, y)`.
    fn fill_composite(&mut self, x: i64, y: i64, color: &DeviceColor) -> Result<(), DeviceError>;

    /// Build a transform from `source` to the device's output profile.
    fn build_color_link(
        &self,
        source: &dyn ColorSpace,
        params: &RenderingParams,
    ) -> Option<Box<dyn ColorLink>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_component_count() {
        let gray = ColorInfo {
            num_components: 1,
            max_gray: 1,
            max_color: 255,
            polarity: Polarity::Additive,
            depth: 1,
        };
        assert_eq!(gray.levels(), 1);
        assert_eq!(gray.pixel_bytes(), 1);

        let cmyk = ColorInfo {
            num_components: 4,
            max_color: 255,
            depth: 32,
            ..gray
        };
        assert_eq!(cmyk.levels(), 255);
        assert_eq!(cmyk.pixel_bytes(), 4);
    }

    #[test]
    fn image_rendering_params() {
        let params = RenderingParams::image(RenderingIntent::Saturation);
        assert!(params.black_point_compensation);
        assert_eq!(params.graphics_type, GraphicsType::Image);
        assert_eq!(params.rendering_intent, RenderingIntent::Saturation);
    }
}
