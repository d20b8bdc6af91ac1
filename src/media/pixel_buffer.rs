// SPDX-License-Identifier: GPL-3.0-only

//! Converted frame contents handed to decoders

use image::{GrayImage, RgbImage};

/// Sample layout a decoder consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferFormat {
    /// One luminance byte per pixel, read straight from the Y plane
    Luma,
    /// Packed 8-bit RGB
    Rgb,
}

/// An immutable image derived from a [`Frame`](crate::camera::Frame)
///
/// Owns its samples; nothing refers back to the frame it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Luma(GrayImage),
    Rgb(RgbImage),
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        match self {
            PixelBuffer::Luma(img) => img.width(),
            PixelBuffer::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PixelBuffer::Luma(img) => img.height(),
            PixelBuffer::Rgb(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn format(&self) -> BufferFormat {
        match self {
            PixelBuffer::Luma(_) => BufferFormat::Luma,
            PixelBuffer::Rgb(_) => BufferFormat::Rgb,
        }
    }

    /// Luminance view of the buffer
    ///
    /// RGB pixels are reduced with `(r + 2g + b) / 4`, the weighting
    /// barcode binarizers conventionally use.
    pub fn to_luma(&self) -> GrayImage {
        match self {
            PixelBuffer::Luma(img) => img.clone(),
            PixelBuffer::Rgb(img) => GrayImage::from_fn(img.width(), img.height(), |x, y| {
                let [r, g, b] = img.get_pixel(x, y).0;
                let luma = (r as u32 + 2 * g as u32 + b as u32) / 4;
                image::Luma([luma as u8])
            }),
        }
    }
}
