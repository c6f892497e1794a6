//! Rasterium - fixed-size RGBA raster buffers.
//!
//! A small image crate for renderers that write pixels directly: a
//! zero-initialized RGBA8 buffer with checked and unchecked pixel access,
//! in-place reset, row blitting, and PNG emission.

mod color;
mod error;
mod image;

pub use color::Color;
pub use error::{Error, Result};
pub use image::Image;
