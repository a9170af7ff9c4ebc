use iscale_image::ImageError;
use iscale_stream::StreamError;

/// Error reported by a device fill primitive.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Device fill failed: {0}")]
pub struct DeviceError(pub String);

/// Error reported by a color space remap.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Color remap failed: {0}")]
pub struct RemapError(pub String);

/// An error type for the render module.
///
/// Every variant aborts the current image only.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Error raised by the scaling stream.
    #[error("Scaling stream failed. {0}")]
    Stream(#[from] StreamError),

    /// Error when a managed render runs without a color transform link.
    #[error("Managed render has no color transform link")]
    MissingColorTransform,

    /// Error raised by a device fill.
    #[error(transparent)]
    DeviceFill(#[from] DeviceError),

    /// Error raised by a color space remap.
    #[error(transparent)]
    ColorRemap(#[from] RemapError),

    /// Error when a scanline holds fewer samples than a row of the data rectangle.
    #[error("Scanline holds {actual} samples but {expected} are required")]
    ShortRow {
        /// Samples of a full row.
        expected: usize,
        /// Samples supplied.
        actual: usize,
    },

    /// Error when a scanline's sample width does not match the image depth.
    #[error("Scanline has {actual}-bit samples but the image needs {expected}-bit samples")]
    SampleFormat {
        /// Storage bits the image needs.
        expected: u32,
        /// Storage bits supplied.
        actual: u32,
    },

    /// Error related to the row buffer or geometry.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error when rows are fed to an image that was not activated.
    #[error("Interpolation is not active for this image")]
    NotActive,
}
