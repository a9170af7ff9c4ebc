use crate::geometry::Rect;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Error when a source extent used as a divisor is zero.
    #[error("Source extent must be greater than zero")]
    ZeroSourceExtent,

    /// Error when a rectangle does not fit inside its container.
    #[error("Rectangle {0:?} does not fit inside {1:?}")]
    InvalidRect(Rect, Rect),

    /// Error when the scratch memory cannot be reserved.
    #[error("Failed to allocate scratch memory. {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    /// Error when the scratch memory would exceed the configured limit.
    #[error("Scratch memory of {0} bytes exceeds the limit of {1} bytes")]
    ScratchLimit(usize, usize),

    /// Error when a buffer region is asked for more samples than it holds.
    #[error("Buffer region holds {0} samples but {1} were requested")]
    BufferOverflow(usize, usize),

    /// Error when a buffer region is asked for the wrong sample width.
    #[error("Buffer region does not hold {0}-bit samples")]
    RegionFormat(u32),
}
