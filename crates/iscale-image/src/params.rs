use crate::geometry::PatchGeometry;
use crate::sample::SampleFormat;

/// How a device's color values relate to ink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// Higher values are lighter (RGB, gray).
    Additive,
    /// Higher values are darker (CMYK).
    Subtractive,
    /// Polarity is not known (e.g. palette devices).
    #[default]
    Unknown,
}

/// Immutable parameters of one interpolated render.
///
/// Derived once by the strategy selector and copied into the scaling stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleParams {
    /// Rounded input/output sizes, offsets and margins.
    pub geometry: PatchGeometry,
    /// Representation of samples fed to the stream.
    pub format_in: SampleFormat,
    /// Representation of samples produced by the stream.
    pub format_out: SampleFormat,
    /// Samples per pixel after decoding (base space when indexed).
    pub spp_decode: usize,
    /// Samples per pixel seen by the interpolator.
    pub spp_interp: usize,
    /// Device color polarity.
    pub polarity: Polarity,
    /// Whether the color transform runs before resampling.
    pub early_cm: bool,
}

impl ScaleParams {
    /// Input pixels per scanline of the data rectangle.
    pub fn width_in(&self) -> usize {
        self.geometry.data_in.width
    }

    /// Input scanlines of the data rectangle.
    pub fn height_in(&self) -> usize {
        self.geometry.data_in.height
    }

    /// Output pixels per resampled row.
    pub fn width_out(&self) -> usize {
        self.geometry.data_out.width
    }

    /// Resampled rows of the data rectangle.
    pub fn height_out(&self) -> usize {
        self.geometry.data_out.height
    }

    /// Samples of one input row as fed to the stream.
    pub fn input_row_samples(&self) -> usize {
        self.width_in() * self.spp_interp
    }

    /// Samples of one resampled row.
    pub fn output_row_samples(&self) -> usize {
        self.width_out() * self.spp_interp
    }

    /// Whether output row `row` lies inside the clip rectangle.
    pub fn is_row_active(&self, row: usize) -> bool {
        let top = self.geometry.top_margin_out;
        row >= top && row < top + self.geometry.clip_out.height
    }

    /// Whether both axes are enlarged by at least `ratio`.
    pub fn enlarges_by(&self, ratio: usize) -> bool {
        self.width_out() >= self.width_in() * ratio && self.height_out() >= self.height_in() * ratio
    }

    /// Whether both axes are reduced.
    pub fn reduces(&self) -> bool {
        self.width_out() < self.width_in() && self.height_out() < self.height_in()
    }
}
