use iscale_image::{DecodeCurve, Fixed, Rect};

use crate::collab::{ColorLink, ColorSpace, RenderingIntent};

/// How the image axes map onto device axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Source rows map onto device rows.
    #[default]
    Portrait,
    /// Source rows map onto device columns.
    Landscape,
    /// Rotated or skewed.
    Skewed,
}

/// The image being painted.
///
/// Owned by the caller for one image paint. The color transform link is
/// created lazily on activation and cached here; the caller releases it by
/// dropping the descriptor.
pub struct ImageDescriptor<'a> {
    /// Source pixels per row of the whole image.
    pub width: u32,
    /// Source rows of the whole image.
    pub height: u32,
    /// Source region supplied for this render.
    pub data_rect: Rect,
    /// Part of the data rectangle that is painted.
    pub clip_rect: Rect,
    /// Signed device width of the whole image; negative mirrors horizontally.
    pub dst_width: Fixed,
    /// Signed device height of the whole image; negative flips vertically.
    pub dst_height: Fixed,
    /// Device position of the source origin, x.
    pub origin_x: Fixed,
    /// Device position of the source origin, y.
    pub origin_y: Fixed,
    /// Orientation of the image on the device.
    pub orientation: Orientation,
    /// Bits per sample component.
    pub bits_per_component: u32,
    /// The source color space.
    pub color_space: &'a dyn ColorSpace,
    /// Per-component decode curves of the source samples.
    pub decode: Vec<DecodeCurve>,
    /// Whether samples are device colors needing no decode.
    pub device_color: bool,
    /// Whether interpolation was requested.
    pub interpolate: bool,
    /// Whether mask-color keying is used.
    pub mask_color: bool,
    /// Whether the image is a mask.
    pub masked: bool,
    /// Whether samples carry alpha.
    pub alpha: bool,
    /// Rendering intent for color transforms.
    pub rendering_intent: RenderingIntent,
    /// Cached source to device color transform.
    pub color_link: Option<Box<dyn ColorLink>>,
}

impl<'a> ImageDescriptor<'a> {
    /// Create a descriptor painting the whole image at one device pixel per
    /// source pixel.
    ///
    /// # Arguments
    ///
    /// * `width` - Source pixels per row.
    /// * `height` - Source rows.
    /// * `bits_per_component` - Bits per sample component.
    /// * `color_space` - The source color space.
    pub fn new(
        width: u32,
        height: u32,
        bits_per_component: u32,
        color_space: &'a dyn ColorSpace,
    ) -> Self {
        let full = Rect::new(0, 0, width, height);
        Self {
            width,
            height,
            data_rect: full,
            clip_rect: full,
            dst_width: Fixed::from_int(width as i64),
            dst_height: Fixed::from_int(height as i64),
            origin_x: Fixed::ZERO,
            origin_y: Fixed::ZERO,
            orientation: Orientation::Portrait,
            bits_per_component,
            color_space,
            decode: Vec::new(),
            device_color: true,
            interpolate: true,
            mask_color: false,
            masked: false,
            alpha: false,
            rendering_intent: RenderingIntent::default(),
            color_link: None,
        }
    }

    /// Set the signed device extent of the whole image.
    pub fn with_scale(mut self, dst_width: Fixed, dst_height: Fixed) -> Self {
        self.dst_width = dst_width;
        self.dst_height = dst_height;
        self
    }

    /// Set the device position of the source origin.
    pub fn with_origin(mut self, x: Fixed, y: Fixed) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    /// Set the supplied region; the clip rectangle is reset to cover it.
    pub fn with_data_rect(mut self, rect: Rect) -> Self {
        self.data_rect = rect;
        self.clip_rect = rect;
        self
    }

    /// Set the painted part of the data rectangle.
    pub fn with_clip_rect(mut self, rect: Rect) -> Self {
        self.clip_rect = rect;
        self
    }

    /// Set the per-component decode curves.
    ///
    /// Samples decoded through non-identity curves are not device colors.
    pub fn with_decode(mut self, decode: Vec<DecodeCurve>) -> Self {
        self.device_color = decode.iter().all(DecodeCurve::is_identity);
        self.decode = decode;
        self
    }

    /// Source samples per pixel.
    pub fn source_components(&self) -> usize {
        self.color_space.num_components()
    }

    /// Decode curve of component `i`, identity when none was given.
    pub fn curve(&self, i: usize) -> DecodeCurve {
        self.decode.get(i).copied().unwrap_or_default()
    }

    /// Whether any component has a non-identity decode curve.
    pub fn has_decode_curves(&self) -> bool {
        (0..self.source_components()).any(|i| !self.curve(i).is_identity())
    }
}

impl std::fmt::Debug for ImageDescriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDescriptor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_rect", &self.data_rect)
            .field("clip_rect", &self.clip_rect)
            .field("dst_width", &self.dst_width)
            .field("dst_height", &self.dst_height)
            .field("bits_per_component", &self.bits_per_component)
            .field("components", &self.source_components())
            .field("interpolate", &self.interpolate)
            .field("has_color_link", &self.color_link.is_some())
            .finish_non_exhaustive()
    }
}
