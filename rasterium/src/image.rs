use std::path::Path;

use crate::{Color, Error, Result};

/// Bytes per RGBA pixel.
const PIXEL_BYTES: usize = 4;

/// A fixed-size RGBA8 raster, row-major, zero-initialized (fully transparent
/// black).
///
/// Invariant: `data.len() == width * height * 4`.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    /// Create a zero-initialized image.
    pub fn new(width: u32, height: u32) -> Image {
        Image {
            width,
            height,
            data: vec![0; width as usize * height as usize * PIXEL_BYTES],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the raw RGBA bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image, returning its RGBA bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * PIXEL_BYTES
    }

    /// Set a pixel with bounds checking.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let i = self.offset(x, y);
        self.data[i..i + PIXEL_BYTES].copy_from_slice(&color.to_rgba());
        Ok(())
    }

    /// Set a pixel without bounds checking.
    ///
    /// # Safety
    ///
    /// The caller must guarantee `x < width && y < height`.
    #[inline]
    pub unsafe fn set_pixel_unchecked(&mut self, x: u32, y: u32, color: Color) {
        debug_assert!(x < self.width && y < self.height);
        let i = self.offset(x, y);
        self.data
            .get_unchecked_mut(i..i + PIXEL_BYTES)
            .copy_from_slice(&color.to_rgba());
    }

    /// Get a pixel with bounds checking.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Color> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let i = self.offset(x, y);
        Ok(Color::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    /// Zero-fill the buffer in place. Never reallocates.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Copy the first `rows` rows of `src` into this image with the top-left
    /// corner at `(dst_x, dst_y)`. Destination pixels are overwritten,
    /// transparent source pixels included.
    pub fn blit_rows(&mut self, src: &Image, dst_x: u32, dst_y: u32, rows: u32) -> Result<()> {
        if rows > src.height {
            return Err(Error::OutOfBounds {
                x: 0,
                y: rows,
                width: src.width,
                height: src.height,
            });
        }
        if dst_x + src.width > self.width || dst_y + rows > self.height {
            return Err(Error::OutOfBounds {
                x: dst_x + src.width,
                y: dst_y + rows,
                width: self.width,
                height: self.height,
            });
        }
        let row_bytes = src.width as usize * PIXEL_BYTES;
        for row in 0..rows {
            let src_start = row as usize * row_bytes;
            let dst_start = self.offset(dst_x, dst_y + row);
            self.data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src.data[src_start..src_start + row_bytes]);
        }
        Ok(())
    }

    /// Write the image as an 8-bit RGBA PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }
}
