#![deny(missing_docs)]
//! Geometry, sample formats and scratch buffers for interpolated image rendering

/// Scratch buffers shared by the decode and resample stages.
pub mod buffer;

/// Tunable thresholds of the interpolation strategy.
pub mod config;

/// Per-component decode curves.
pub mod decode;

/// Error types for the image module.
pub mod error;

/// Fixed-point device geometry and rounded patch sizes.
pub mod geometry;

/// Scale parameters shared between the selector and the stream engine.
pub mod params;

/// Sample representations and tagged sample views.
pub mod sample;

pub use crate::buffer::{DecodeRegion, RowBuffer, RowBufferLayout, ALIGN_BITMAP_MOD};
pub use crate::config::InterpolationConfig;
pub use crate::decode::DecodeCurve;
pub use crate::error::ImageError;
pub use crate::geometry::{AxisScale, Fixed, ImageSize, PatchGeometry, Rect};
pub use crate::params::{Polarity, ScaleParams};
pub use crate::sample::{SampleFormat, SampleSlice, SampleSliceMut, FRAC_1};
