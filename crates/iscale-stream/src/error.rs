use iscale_image::ImageError;

/// An error type for the stream module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Error related to the image parameters.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error when the filter working memory cannot be reserved.
    #[error("Failed to allocate filter working memory. {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    /// Error when the input ends in the middle of a row.
    #[error("Input holds {actual} samples but a full row needs {expected}")]
    PartialRow {
        /// Samples of a full row.
        expected: usize,
        /// Samples left in the input.
        actual: usize,
    },

    /// Error when the output slot cannot hold a resampled row.
    #[error("Output holds {actual} samples but a resampled row needs {expected}")]
    OutputTooSmall {
        /// Samples of a resampled row.
        expected: usize,
        /// Samples of the output slot.
        actual: usize,
    },

    /// Error when the input sample width does not match the parameters.
    #[error("Input has {0}-bit samples but the stream expects {1}-bit samples")]
    SampleWidth(u32, u32),

    /// Error when the detail-preserving downscale has no polarity to work with.
    #[error("The detail-preserving downscale needs a known device polarity")]
    UnknownPolarity,

    /// Error when the stream has no input or output pixels.
    #[error("Stream geometry is empty")]
    EmptyGeometry,
}
