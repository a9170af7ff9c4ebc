use crate::error::ImageError;

/// Number of fractional bits of a device-space [`Fixed`] coordinate.
pub const FIXED_SHIFT: u32 = 8;

/// The fixed-point value of one device pixel.
pub const FIXED_ONE: i64 = 1 << FIXED_SHIFT;

const FIXED_HALF: i64 = FIXED_ONE / 2;

/// A device-space coordinate with [`FIXED_SHIFT`] fractional bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixed(pub i64);

impl Fixed {
    /// The zero coordinate.
    pub const ZERO: Fixed = Fixed(0);

    /// Create a fixed-point value from a whole number of pixels.
    pub const fn from_int(pixels: i64) -> Self {
        Fixed(pixels << FIXED_SHIFT)
    }

    /// Create a fixed-point value from a float, rounding to the nearest step.
    pub fn from_f64(value: f64) -> Self {
        Fixed((value * FIXED_ONE as f64).round() as i64)
    }

    /// Absolute value.
    pub const fn abs(self) -> Self {
        Fixed(self.0.abs())
    }

    /// Whether the value is strictly negative.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Round to the nearest pixel, halves going up.
    pub const fn pixround(self) -> i64 {
        (self.0 + FIXED_HALF) >> FIXED_SHIFT
    }

    /// Round to the nearest pixel, halves going away from zero.
    ///
    /// Negative boundaries round as the mirror image of positive ones, so a
    /// mirrored patch has the same size as its unmirrored counterpart.
    pub const fn pixround_perfect(self) -> i64 {
        if self.0 < 0 && (self.0 & (FIXED_ONE - 1)) == FIXED_HALF {
            self.0 >> FIXED_SHIFT
        } else {
            self.pixround()
        }
    }
}

/// Image size in pixels
///
/// # Examples
///
/// ```
/// use iscale_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

/// A rectangle in source pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right-most column, or `None` if it does not fit a `u32`.
    pub const fn right(&self) -> Option<u32> {
        self.x.checked_add(self.width)
    }

    /// One past the bottom row, or `None` if it does not fit a `u32`.
    pub const fn bottom(&self) -> Option<u32> {
        self.y.checked_add(self.height)
    }

    /// Whether `other` lies completely inside this rectangle.
    ///
    /// A rectangle whose far edges overflow contains nothing and is contained
    /// by nothing.
    pub const fn contains(&self, other: &Rect) -> bool {
        match (self.right(), self.bottom(), other.right(), other.bottom()) {
            (Some(right), Some(bottom), Some(other_right), Some(other_bottom)) => {
                other.x >= self.x
                    && other.y >= self.y
                    && other_right <= right
                    && other_bottom <= bottom
            }
            _ => false,
        }
    }
}

/// Maps source pixel positions on one axis onto device space.
///
/// The device extent is signed: a negative extent flips the axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisScale {
    src_extent: u32,
    dst_extent: Fixed,
}

impl AxisScale {
    /// Create a new axis mapping.
    ///
    /// # Arguments
    ///
    /// * `src_extent` - The number of source pixels on the axis.
    /// * `dst_extent` - The signed device extent of the whole axis.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ZeroSourceExtent`] if `src_extent` is zero.
    pub fn new(src_extent: u32, dst_extent: Fixed) -> Result<Self, ImageError> {
        if src_extent == 0 {
            return Err(ImageError::ZeroSourceExtent);
        }
        Ok(Self {
            src_extent,
            dst_extent,
        })
    }

    /// Number of source pixels on the axis.
    pub fn src_extent(&self) -> u32 {
        self.src_extent
    }

    /// Signed device extent of the axis.
    pub fn dst_extent(&self) -> Fixed {
        self.dst_extent
    }

    /// Whether the axis runs backwards in device space.
    pub fn is_mirrored(&self) -> bool {
        self.dst_extent.is_negative()
    }

    /// The unrounded device position of a source boundary.
    pub fn edge(&self, pos: i64) -> Fixed {
        Fixed(pos * self.dst_extent.0 / self.src_extent as i64)
    }

    /// The device pixel boundary of a source boundary.
    pub fn rounded_edge(&self, pos: i64) -> i64 {
        self.edge(pos).pixround_perfect()
    }

    /// Device size of `len` source pixels starting at `start`.
    ///
    /// Computed from the rounded boundaries, never from the rounded length,
    /// so that adjacent spans always tile without gaps or overlap.
    pub fn span(&self, start: u32, len: u32) -> usize {
        let near = self.rounded_edge(start as i64);
        let far = self.rounded_edge(start as i64 + len as i64);
        (far - near).unsigned_abs() as usize
    }

    /// Device size of the whole axis.
    pub fn entire(&self) -> usize {
        self.dst_extent.abs().pixround() as usize
    }
}

/// Input and output sizes of one image patch, derived from rounded boundaries.
///
/// The data rectangle is the part of the image supplied for this render; the
/// clip rectangle is the part of it that is painted. Horizontal offsets and
/// margins are measured from the device-left edge, which is the source right
/// edge when the horizontal axis is mirrored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatchGeometry {
    /// Size of the whole source image.
    pub entire_in: ImageSize,
    /// Size of the whole image in device pixels.
    pub entire_out: ImageSize,
    /// Size of the data rectangle.
    pub data_in: ImageSize,
    /// Device size of the data rectangle.
    pub data_out: ImageSize,
    /// Device size of the clip rectangle.
    pub clip_out: ImageSize,
    /// Source columns between the leading image edge and the data rectangle.
    pub src_x_offset: usize,
    /// Source rows above the data rectangle.
    pub src_y_offset: usize,
    /// Device columns between the leading image edge and the data rectangle.
    pub dst_x_offset: usize,
    /// Device rows between the image top and the data rectangle.
    pub dst_y_offset: usize,
    /// Device columns between the data and clip rectangles' leading edges.
    pub left_margin_out: usize,
    /// Device rows between the data and clip rectangles' top edges.
    pub top_margin_out: usize,
}

impl PatchGeometry {
    /// Compute the geometry of a patch.
    ///
    /// # Arguments
    ///
    /// * `x_scale` - The horizontal mapping of the whole image.
    /// * `y_scale` - The vertical mapping of the whole image.
    /// * `data_rect` - The source rectangle supplied for this render.
    /// * `clip_rect` - The source rectangle that is painted.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidRect`] if the data rectangle is not inside
    /// the image or the clip rectangle is not inside the data rectangle.
    pub fn new(
        x_scale: &AxisScale,
        y_scale: &AxisScale,
        data_rect: Rect,
        clip_rect: Rect,
    ) -> Result<Self, ImageError> {
        let image_rect = Rect::new(0, 0, x_scale.src_extent(), y_scale.src_extent());
        if !image_rect.contains(&data_rect) {
            return Err(ImageError::InvalidRect(data_rect, image_rect));
        }
        if !data_rect.contains(&clip_rect) {
            return Err(ImageError::InvalidRect(clip_rect, data_rect));
        }

        // no overflow once both rectangles passed `contains`
        let data_right = data_rect.x + data_rect.width;
        let clip_right = clip_rect.x + clip_rect.width;

        let (src_x_offset, dst_x_offset, left_margin_out) = if x_scale.is_mirrored() {
            let lead = x_scale.src_extent() - data_right;
            (
                lead,
                x_scale.span(data_right, lead),
                x_scale.span(clip_right, data_right - clip_right),
            )
        } else {
            (
                data_rect.x,
                x_scale.span(0, data_rect.x),
                x_scale.span(data_rect.x, clip_rect.x - data_rect.x),
            )
        };

        Ok(Self {
            entire_in: ImageSize {
                width: x_scale.src_extent() as usize,
                height: y_scale.src_extent() as usize,
            },
            entire_out: ImageSize {
                width: x_scale.entire(),
                height: y_scale.entire(),
            },
            data_in: ImageSize {
                width: data_rect.width as usize,
                height: data_rect.height as usize,
            },
            data_out: ImageSize {
                width: x_scale.span(data_rect.x, data_rect.width),
                height: y_scale.span(data_rect.y, data_rect.height),
            },
            clip_out: ImageSize {
                width: x_scale.span(clip_rect.x, clip_rect.width),
                height: y_scale.span(clip_rect.y, clip_rect.height),
            },
            src_x_offset: src_x_offset as usize,
            src_y_offset: data_rect.y as usize,
            dst_x_offset,
            dst_y_offset: y_scale.span(0, data_rect.y),
            left_margin_out,
            top_margin_out: y_scale.span(data_rect.y, clip_rect.y - data_rect.y),
        })
    }

    /// Whether the whole image collapses to nothing on the device.
    pub fn is_degenerate(&self) -> bool {
        self.entire_out.width == 0 || self.entire_out.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn pixround_halves() {
        assert_eq!(Fixed(384).pixround(), 2);
        assert_eq!(Fixed(384).pixround_perfect(), 2);
        assert_eq!(Fixed(-384).pixround(), -1);
        assert_eq!(Fixed(-384).pixround_perfect(), -2);
        assert_eq!(Fixed(-383).pixround_perfect(), -1);
        assert_eq!(Fixed::from_int(3).pixround_perfect(), 3);
    }

    #[test]
    fn span_is_mirror_symmetric() -> Result<(), ImageError> {
        let fwd = AxisScale::new(7, Fixed::from_f64(10.5))?;
        let bwd = AxisScale::new(7, Fixed::from_f64(-10.5))?;
        for start in 0..7 {
            for len in 0..(7 - start) {
                assert_eq!(fwd.span(start, len), bwd.span(start, len));
            }
        }
        Ok(())
    }

    #[test]
    fn adjacent_spans_tile() -> Result<(), ImageError> {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let src = rng.random_range(1..500u32);
            let dst = Fixed(rng.random_range(-200_000..200_000i64));
            let scale = AxisScale::new(src, dst)?;
            let a = rng.random_range(0..=src);
            let b = rng.random_range(a..=src);
            let c = rng.random_range(b..=src);
            assert_eq!(
                scale.span(a, b - a) + scale.span(b, c - b),
                scale.span(a, c - a),
                "src={src} dst={dst:?} a={a} b={b} c={c}"
            );
        }
        Ok(())
    }

    #[test]
    fn patch_geometry_margins() -> Result<(), ImageError> {
        let xs = AxisScale::new(10, Fixed::from_int(40))?;
        let ys = AxisScale::new(10, Fixed::from_int(20))?;
        let geom = PatchGeometry::new(&xs, &ys, Rect::new(2, 1, 6, 8), Rect::new(3, 3, 4, 5))?;
        assert_eq!(geom.entire_out, ImageSize { width: 40, height: 20 });
        assert_eq!(geom.data_out, ImageSize { width: 24, height: 16 });
        assert_eq!(geom.clip_out, ImageSize { width: 16, height: 10 });
        assert_eq!(geom.dst_x_offset, 8);
        assert_eq!(geom.left_margin_out, 4);
        assert_eq!(geom.top_margin_out, 4);
        assert!(!geom.is_degenerate());
        Ok(())
    }

    #[test]
    fn patch_geometry_mirrored_margins() -> Result<(), ImageError> {
        let xs = AxisScale::new(10, Fixed::from_int(-40))?;
        let ys = AxisScale::new(10, Fixed::from_int(20))?;
        let geom = PatchGeometry::new(&xs, &ys, Rect::new(2, 0, 6, 10), Rect::new(3, 0, 4, 10))?;
        assert_eq!(geom.src_x_offset, 2);
        assert_eq!(geom.dst_x_offset, 8);
        assert_eq!(geom.left_margin_out, 4);
        assert_eq!(geom.data_out.width, 24);
        Ok(())
    }

    #[test]
    fn patch_geometry_rejects_outside_clip() -> Result<(), ImageError> {
        let xs = AxisScale::new(10, Fixed::from_int(10))?;
        let res = PatchGeometry::new(&xs, &xs, Rect::new(0, 0, 5, 5), Rect::new(4, 0, 3, 3));
        assert!(matches!(res, Err(ImageError::InvalidRect(..))));
        Ok(())
    }

    #[test]
    fn overflowing_rect_is_rejected() -> Result<(), ImageError> {
        let far = Rect::new(u32::MAX, 0, 2, 4);
        assert_eq!(far.right(), None);
        assert_eq!(far.bottom(), Some(4));

        let xs = AxisScale::new(4, Fixed::from_int(8))?;
        let whole = Rect::new(0, 0, 4, 4);
        assert!(!whole.contains(&far));
        assert!(!far.contains(&whole));
        assert!(matches!(
            PatchGeometry::new(&xs, &xs, far, far),
            Err(ImageError::InvalidRect(..))
        ));
        assert!(matches!(
            PatchGeometry::new(&xs, &xs, whole, Rect::new(0, 1, 1, u32::MAX)),
            Err(ImageError::InvalidRect(..))
        ));
        Ok(())
    }

    #[test]
    fn degenerate_output() -> Result<(), ImageError> {
        let xs = AxisScale::new(100, Fixed(100))?;
        let ys = AxisScale::new(100, Fixed::from_int(10))?;
        let rect = Rect::new(0, 0, 100, 100);
        let geom = PatchGeometry::new(&xs, &ys, rect, rect)?;
        assert_eq!(geom.entire_out.width, 0);
        assert!(geom.is_degenerate());
        assert!(matches!(
            AxisScale::new(0, Fixed::ZERO),
            Err(ImageError::ZeroSourceExtent)
        ));
        Ok(())
    }
}
