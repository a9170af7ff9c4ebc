#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Device, color space and color transform collaborators.
pub mod collab;

/// Row decoding into the canonical interpolation input.
pub mod decoder;

/// The image being painted.
pub mod descriptor;

/// Render driver contract and run-length packing.
pub mod driver;

/// Error types for the render module.
pub mod error;

/// Render driver for profile-managed sources.
pub mod managed;

/// Interpolation strategy selection and the per-image render entry point.
pub mod selector;

/// Render driver for sources remapped through the color space.
pub mod standard;

pub use crate::collab::{
    ColorIndex, ColorInfo, ColorLink, ColorSpace, Device, DeviceColor, GraphicsType, ProfileInfo,
    RenderingIntent, RenderingParams,
};
pub use crate::decoder::{DecodeStrategy, RowDecoder};
pub use crate::descriptor::{ImageDescriptor, Orientation};
pub use crate::driver::{Line, RenderDriver};
pub use crate::error::{DeviceError, RemapError, RenderError};
pub use crate::managed::ManagedDriver;
pub use crate::selector::{
    select_interpolation, InactiveReason, InterpolatedImage, Interpolation, RowInput, RowStatus,
    UnsupportedFeature,
};
pub use crate::standard::StandardDriver;
