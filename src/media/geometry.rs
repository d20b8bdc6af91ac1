// SPDX-License-Identifier: GPL-3.0-only

//! Rotation and region-of-interest cropping
//!
//! Rotation is lossless (samples are reindexed, never interpolated) and is
//! only applied for perpendicular rotation hints. Scanline decoders read
//! upside-down symbols fine, so 0° and 180° frames pass through untouched.

use crate::camera::FrameRotation;
use crate::media::PixelBuffer;
use image::imageops;
use serde::{Deserialize, Serialize};

/// Crop rectangle in buffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl ScanRegion {
    /// Check the region lies inside a `width` x `height` buffer
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.left as u64 + self.width as u64 <= width as u64
            && self.top as u64 + self.height as u64 <= height as u64
    }
}

/// Rotate a buffer clockwise by a multiple of 90 degrees
///
/// # Panics
///
/// Panics if `degrees` is not 0, 90, 180 or 270.
pub fn rotate(buffer: PixelBuffer, degrees: u32) -> PixelBuffer {
    match (degrees, buffer) {
        (0, buffer) => buffer,
        (90, PixelBuffer::Luma(img)) => PixelBuffer::Luma(imageops::rotate90(&img)),
        (90, PixelBuffer::Rgb(img)) => PixelBuffer::Rgb(imageops::rotate90(&img)),
        (180, PixelBuffer::Luma(img)) => PixelBuffer::Luma(imageops::rotate180(&img)),
        (180, PixelBuffer::Rgb(img)) => PixelBuffer::Rgb(imageops::rotate180(&img)),
        (270, PixelBuffer::Luma(img)) => PixelBuffer::Luma(imageops::rotate270(&img)),
        (270, PixelBuffer::Rgb(img)) => PixelBuffer::Rgb(imageops::rotate270(&img)),
        (other, _) => panic!("rotation must be 0, 90, 180 or 270 degrees, got {}", other),
    }
}

/// Apply a frame's rotation hint if it is perpendicular
///
/// Returns the buffer and the rotation still outstanding for the decoder.
pub fn apply_rotation_hint(
    buffer: PixelBuffer,
    rotation: FrameRotation,
) -> (PixelBuffer, FrameRotation) {
    if rotation.swaps_dimensions() {
        (rotate(buffer, rotation.degrees()), FrameRotation::None)
    } else {
        (buffer, rotation)
    }
}

/// Compute the centered scan region for a buffer
///
/// In portrait the region is a square whose side is `width_ratio` of the
/// buffer's short side (the sensor's height, whether or not the frame has
/// already been rotated upright). In landscape the ratios apply to width
/// and height respectively. Ratios are expected in (0, 1]; the result is
/// clamped to at least one pixel and never exceeds the buffer.
pub fn compute_region(
    buffer: &PixelBuffer,
    width_ratio: f64,
    height_ratio: f64,
    is_portrait: bool,
) -> ScanRegion {
    let (buffer_width, buffer_height) = buffer.dimensions();

    let scale = |extent: u32, ratio: f64| -> u32 {
        ((extent as f64 * ratio) as u32).clamp(1u32.min(extent), extent)
    };

    let (width, height) = if is_portrait {
        let side = scale(buffer_width.min(buffer_height), width_ratio);
        (side, side)
    } else {
        (
            scale(buffer_width, width_ratio),
            scale(buffer_height, height_ratio),
        )
    };

    ScanRegion {
        left: (buffer_width - width) / 2,
        top: (buffer_height - height) / 2,
        width,
        height,
    }
}

/// Extract a sub-rectangle
///
/// The region must come from [`compute_region`] on the same buffer.
pub fn crop(buffer: &PixelBuffer, region: ScanRegion) -> PixelBuffer {
    debug_assert!(
        region.fits_within(buffer.width(), buffer.height()),
        "scan region {:?} outside {}x{} buffer",
        region,
        buffer.width(),
        buffer.height()
    );

    let ScanRegion {
        left,
        top,
        width,
        height,
    } = region;

    match buffer {
        PixelBuffer::Luma(img) => {
            PixelBuffer::Luma(imageops::crop_imm(img, left, top, width, height).to_image())
        }
        PixelBuffer::Rgb(img) => {
            PixelBuffer::Rgb(imageops::crop_imm(img, left, top, width, height).to_image())
        }
    }
}

/// Rotate (if perpendicular), then crop to the centered scan region
///
/// Returns the prepared buffer and the rotation still outstanding.
pub fn prepare(
    buffer: PixelBuffer,
    rotation: FrameRotation,
    width_ratio: f64,
    height_ratio: f64,
    is_portrait: bool,
) -> (PixelBuffer, FrameRotation) {
    let (rotated, residual) = apply_rotation_hint(buffer, rotation);
    let region = compute_region(&rotated, width_ratio, height_ratio, is_portrait);
    (crop(&rotated, region), residual)
}
