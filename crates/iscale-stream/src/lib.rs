#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Input cursor over one canonical scanline.
pub mod cursor;

/// Detail-preserving downscale filter for halftone devices.
pub mod downscale;

/// Error types for the stream module.
pub mod error;

/// Filter kernels and per-axis sample mapping.
pub mod kernels;

/// Mitchell-Netravali resampling filter.
pub mod mitchell;

/// The stream transform contract.
pub mod stream;

pub use crate::cursor::InputCursor;
pub use crate::downscale::DetailDownscaler;
pub use crate::error::StreamError;
pub use crate::mitchell::MitchellScaler;
pub use crate::stream::{init_stream, FilterKind, ScaleStream, StreamStatus};
