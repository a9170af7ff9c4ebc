#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use iscale_image as image;

#[doc(inline)]
pub use iscale_stream as stream;

#[doc(inline)]
pub use iscale_render as render;
